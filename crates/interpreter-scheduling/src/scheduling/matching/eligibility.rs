use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::super::domain::{
    CertificationTier, Interpreter, Job, JobId, JobStatus, LanguageId, Modality,
    UnavailabilityBlock,
};
use super::super::overlap::TimeWindow;
use super::MatchTarget;

/// Everything the gates need to know about one candidate.
#[derive(Debug, Clone, Copy)]
pub struct CandidateContext<'a> {
    pub interpreter: &'a Interpreter,
    pub unavailability: &'a [UnavailabilityBlock],
    /// Jobs currently assigned to the interpreter.
    pub bookings: &'a [Job],
    /// Jobs the interpreter has declined.
    pub declined_jobs: &'a [Job],
}

/// Data carried forward from a candidate that cleared every gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Qualification {
    pub certification: CertificationTier,
    pub proficiency_rank: Option<i32>,
    pub preference_rank: Option<i32>,
    pub reasons: Vec<String>,
}

/// Why a candidate was kept out of the eligible list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionReason {
    LanguageNotQualified {
        language_id: LanguageId,
    },
    NotLocal,
    UnsupportedModality {
        modality: Modality,
    },
    Unavailable {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        note: Option<String>,
    },
    DoubleBooked {
        job_id: JobId,
    },
    RecentlyDeclined {
        job_id: JobId,
        window_minutes: i64,
    },
}

impl RejectionReason {
    pub fn summary(&self) -> String {
        match self {
            RejectionReason::LanguageNotQualified { language_id } => {
                format!("not certified or registered in {language_id}")
            }
            RejectionReason::NotLocal => "not local".to_string(),
            RejectionReason::UnsupportedModality { modality } => {
                format!("does not support {modality}")
            }
            RejectionReason::Unavailable { start, end, note } => {
                let base = format!(
                    "unavailable from {} to {}",
                    start.format("%Y-%m-%d %H:%M"),
                    end.format("%Y-%m-%d %H:%M")
                );
                match note {
                    Some(note) if !note.trim().is_empty() => format!("{base} ({})", note.trim()),
                    _ => base,
                }
            }
            RejectionReason::DoubleBooked { job_id } => {
                format!("already booked for job {job_id}")
            }
            RejectionReason::RecentlyDeclined {
                job_id,
                window_minutes,
            } => format!(
                "declined job {job_id} within {} of this job",
                describe_minutes(*window_minutes)
            ),
        }
    }

    /// Availability-class reasons, as opposed to qualification mismatches.
    pub fn is_availability(&self) -> bool {
        matches!(
            self,
            RejectionReason::Unavailable { .. }
                | RejectionReason::DoubleBooked { .. }
                | RejectionReason::RecentlyDeclined { .. }
        )
    }
}

fn describe_minutes(minutes: i64) -> String {
    match minutes {
        60 => "1 hour".to_string(),
        m if m > 0 && m % 60 == 0 => format!("{} hours", m / 60),
        m => format!("{m} minutes"),
    }
}

/// Run the language, modality, and availability gates in order, stopping at the first failure.
pub(crate) fn screen(
    target: &MatchTarget,
    candidate: &CandidateContext<'_>,
    recontact_window: Duration,
) -> Result<Qualification, RejectionReason> {
    let mut reasons = Vec::new();

    let (record, certification) = candidate
        .interpreter
        .language(&target.language_id)
        .and_then(|record| record.certification.map(|tier| (record, tier)))
        .ok_or_else(|| RejectionReason::LanguageNotQualified {
            language_id: target.language_id.clone(),
        })?;
    reasons.push(format!("{} in language", certification.label()));

    check_modality(target.modality, candidate.interpreter, &mut reasons)?;

    if let Some(window) = target.window {
        check_unavailability(&window, candidate.unavailability)?;
        check_bookings(&target.job_id, &window, candidate.bookings)?;
        check_recent_declines(
            &target.job_id,
            &window,
            candidate.declined_jobs,
            recontact_window,
        )?;
    }

    Ok(Qualification {
        certification,
        proficiency_rank: record.proficiency_rank,
        preference_rank: record.preference_rank,
        reasons,
    })
}

fn check_modality(
    modality: Modality,
    interpreter: &Interpreter,
    reasons: &mut Vec<String>,
) -> Result<(), RejectionReason> {
    if modality == Modality::Tbd {
        return Ok(());
    }

    if modality == Modality::InPerson {
        if !interpreter.is_local {
            return Err(RejectionReason::NotLocal);
        }
        reasons.push("Local interpreter".to_string());
    }

    if !interpreter.modality_preferences.contains(&modality) {
        return Err(RejectionReason::UnsupportedModality { modality });
    }
    reasons.push(format!("Supports {modality}"));

    Ok(())
}

fn check_unavailability(
    window: &TimeWindow,
    blocks: &[UnavailabilityBlock],
) -> Result<(), RejectionReason> {
    match blocks.iter().find(|block| window.overlaps(&block.window())) {
        Some(block) => Err(RejectionReason::Unavailable {
            start: block.start,
            end: block.end,
            note: block.reason.clone(),
        }),
        None => Ok(()),
    }
}

fn check_bookings(
    job_id: &JobId,
    window: &TimeWindow,
    bookings: &[Job],
) -> Result<(), RejectionReason> {
    let clash = bookings.iter().find(|booked| {
        &booked.id != job_id
            && booked.status != JobStatus::Cancelled
            && booked
                .window()
                .map(|other| window.overlaps(&other))
                .unwrap_or(false)
    });

    match clash {
        Some(booked) => Err(RejectionReason::DoubleBooked {
            job_id: booked.id.clone(),
        }),
        None => Ok(()),
    }
}

pub(crate) fn check_recent_declines(
    job_id: &JobId,
    window: &TimeWindow,
    declined_jobs: &[Job],
    recontact_window: Duration,
) -> Result<(), RejectionReason> {
    if recontact_window <= Duration::zero() {
        return Ok(());
    }

    let nearby = declined_jobs.iter().find(|declined| {
        &declined.id != job_id
            && declined
                .window()
                .map(|other| other.widened(recontact_window).overlaps(window))
                .unwrap_or(false)
    });

    match nearby {
        Some(declined) => Err(RejectionReason::RecentlyDeclined {
            job_id: declined.id.clone(),
            window_minutes: recontact_window.num_minutes(),
        }),
        None => Ok(()),
    }
}
