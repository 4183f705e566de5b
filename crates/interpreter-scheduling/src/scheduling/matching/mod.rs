mod config;
mod eligibility;
mod ranking;

pub use config::ScoringConfig;
pub use eligibility::{CandidateContext, RejectionReason};
pub use ranking::compare;

pub(crate) use eligibility::check_recent_declines;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{CertificationTier, InterpreterId, JobId, LanguageId, Modality};
use super::overlap::TimeWindow;

/// The job attributes matching depends on, validated at the service boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTarget {
    pub job_id: JobId,
    pub language_id: LanguageId,
    pub modality: Modality,
    pub window: Option<TimeWindow>,
}

/// An interpreter that cleared every gate, with the score and reasons behind its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedInterpreter {
    pub interpreter_id: InterpreterId,
    pub name: String,
    pub certification: CertificationTier,
    pub score: i32,
    pub proficiency_rank: Option<i32>,
    pub preference_rank: Option<i32>,
    pub match_reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedInterpreter {
    pub interpreter_id: InterpreterId,
    pub name: String,
    pub reason: RejectionReason,
    pub summary: String,
}

/// Result of matching one job against the directory. An empty `eligible` list is a valid result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    pub job_id: JobId,
    pub language_id: LanguageId,
    pub eligible: Vec<RankedInterpreter>,
    pub rejected: Vec<RejectedInterpreter>,
}

/// Stateless evaluator that screens and ranks candidates for a job.
#[derive(Debug, Clone)]
pub struct MatchingEngine {
    scoring: ScoringConfig,
    recontact_window: Duration,
}

impl MatchingEngine {
    pub fn new(scoring: ScoringConfig, recontact_window: Duration) -> Self {
        Self {
            scoring,
            recontact_window,
        }
    }

    pub fn recontact_window(&self) -> Duration {
        self.recontact_window
    }

    pub fn evaluate<'a, I>(&self, target: &MatchTarget, candidates: I) -> MatchReport
    where
        I: IntoIterator<Item = CandidateContext<'a>>,
    {
        let mut eligible = Vec::new();
        let mut rejected = Vec::new();

        for candidate in candidates {
            let interpreter = candidate.interpreter;
            match eligibility::screen(target, &candidate, self.recontact_window) {
                Ok(qualification) => {
                    let (score, match_reasons) = ranking::score(&qualification, &self.scoring);
                    eligible.push(RankedInterpreter {
                        interpreter_id: interpreter.id.clone(),
                        name: interpreter.name.clone(),
                        certification: qualification.certification,
                        score,
                        proficiency_rank: qualification.proficiency_rank,
                        preference_rank: qualification.preference_rank,
                        match_reasons,
                    });
                }
                Err(reason) => {
                    debug!(
                        job_id = %target.job_id,
                        interpreter_id = %interpreter.id,
                        reason = %reason.summary(),
                        "interpreter rejected"
                    );
                    rejected.push(RejectedInterpreter {
                        interpreter_id: interpreter.id.clone(),
                        name: interpreter.name.clone(),
                        summary: reason.summary(),
                        reason,
                    });
                }
            }
        }

        eligible.sort_by(compare);
        rejected.sort_by(|a, b| a.interpreter_id.cmp(&b.interpreter_id));

        MatchReport {
            job_id: target.job_id.clone(),
            language_id: target.language_id.clone(),
            eligible,
            rejected,
        }
    }
}
