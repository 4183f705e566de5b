use crate::infra::SeedData;
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use clap::Args;
use interpreter_scheduling::config::AppConfig;
use interpreter_scheduling::error::AppError;
use interpreter_scheduling::scheduling::{
    CertificationTier, ClientRequest, ClientRequestId, InMemorySchedulingStore,
    InMemoryStatusAudit, Interpreter, InterpreterId, InterpreterLanguage, Job, JobId,
    LanguageId, MatchReport, Modality, NewClientRequest, SchedulingConfig, SchedulingService,
    UnavailabilityBlock,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct MatchArgs {
    /// Seed file holding the interpreter directory and jobs
    #[arg(long)]
    pub(crate) seed: PathBuf,
    /// Job to rank interpreters for
    #[arg(long)]
    pub(crate) job: String,
    /// Print the full match report as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Hearing date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Stop after printing the ranked matches.
    #[arg(long)]
    pub(crate) skip_outreach: bool,
}

pub(crate) fn run_match(args: MatchArgs) -> Result<(), AppError> {
    let MatchArgs { seed, job, json } = args;

    let config = AppConfig::load()?;
    let store = Arc::new(SeedData::from_path(&seed)?.into_store());
    let service = SchedulingService::new(
        store,
        Arc::new(InMemoryStatusAudit::default()),
        config.scheduling,
    );

    let report = service.compute_matches(&JobId(job))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render_matches(&report);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        date,
        skip_outreach,
    } = args;
    let date = date.unwrap_or_else(|| Local::now().date_naive());

    let store = Arc::new(sample_directory(date));
    let audit = Arc::new(InMemoryStatusAudit::default());
    let service = SchedulingService::new(store, audit, SchedulingConfig::default());
    let job_id = JobId("demo-hearing".to_string());

    println!("Interpreter scheduling demo ({date})");
    let report = service.compute_matches(&job_id)?;
    render_matches(&report);

    if skip_outreach {
        return Ok(());
    }

    println!("\nOutreach");
    let mut candidates = report.eligible.iter().map(|c| c.interpreter_id.clone());
    let first = candidates.next();
    let second = candidates.next();

    if let Some(first) = &first {
        service.mark_contacted(&job_id, first, Some("called chambers line".to_string()))?;
        service.mark_declined(&job_id, first, Some("conflict with trial".to_string()))?;
        println!("- {} contacted and declined", first);
    }

    let Some(second) = second.or(first) else {
        println!("- nobody left to contact");
        return Ok(());
    };
    match service.mark_contacted(&job_id, &second, None) {
        Ok(_) => println!("- {} contacted", second),
        Err(err) => println!("- {} could not be contacted: {}", second, err),
    }
    match service.mark_confirmed(&job_id, &second, Some("accepted by email".to_string())) {
        Ok(_) => println!("- {} confirmed", second),
        Err(err) => println!("- confirmation failed: {}", err),
    }

    let board = service.outreach_board(&job_id)?;
    println!(
        "Board: {} pending | {} confirmed | {} declined | {} not yet contacted",
        board.attempts.pending.len(),
        board.attempts.confirmed.len(),
        board.attempts.declined.len(),
        board.not_contacted.len()
    );

    println!("\nSecond language");
    if let Some(adjustment) = service.preview_client_request(&job_id)? {
        println!("- warning: {}", adjustment.warning());
    }
    service.add_client_request(
        &job_id,
        NewClientRequest {
            language_id: LanguageId("por".to_string()),
            case_number: Some("FECR-D-0002".to_string()),
            notes: Some("co-defendant".to_string()),
        },
        true,
    )?;
    let details = service.job_details(&job_id)?;
    println!(
        "- job now runs {} minutes with {} client requests",
        details.job.duration_minutes,
        details.client_requests.len()
    );

    println!("\nStatus history");
    for entry in service.status_history(&job_id)? {
        println!(
            "- {} -> {} by {} at {}",
            entry.old_status,
            entry.new_status,
            entry.actor,
            entry.changed_at.format("%H:%M:%S")
        );
    }

    Ok(())
}

fn render_matches(report: &MatchReport) {
    println!(
        "Job {} ({}): {} eligible, {} rejected",
        report.job_id,
        report.language_id,
        report.eligible.len(),
        report.rejected.len()
    );
    for (position, candidate) in report.eligible.iter().enumerate() {
        let preference = candidate
            .preference_rank
            .map(|rank| format!("preference {rank}"))
            .unwrap_or_else(|| "no preference".to_string());
        println!(
            "  {}. {} [{}] score {} | {} | {}",
            position + 1,
            candidate.name,
            candidate.interpreter_id,
            candidate.score,
            preference,
            candidate.match_reasons.join(", ")
        );
    }
    for rejected in &report.rejected {
        println!(
            "  x {} [{}]: {}",
            rejected.name, rejected.interpreter_id, rejected.summary
        );
    }
}

fn at(date: NaiveDate, hour: u32) -> Option<DateTime<Utc>> {
    date.and_hms_opt(hour, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn spanish(
    certification: CertificationTier,
    proficiency_rank: Option<i32>,
    preference_rank: Option<i32>,
) -> InterpreterLanguage {
    InterpreterLanguage {
        language_id: LanguageId("spa".to_string()),
        certification: Some(certification),
        proficiency_rank,
        preference_rank,
    }
}

fn sample_interpreter(
    id: &str,
    name: &str,
    is_local: bool,
    modalities: &[Modality],
    language: InterpreterLanguage,
) -> Interpreter {
    Interpreter {
        id: InterpreterId(id.to_string()),
        name: name.to_string(),
        email: Some(format!("{id}@interpreters.example")),
        phone: None,
        is_local,
        modality_preferences: modalities.iter().copied().collect(),
        languages: vec![language],
    }
}

fn sample_directory(date: NaiveDate) -> InMemorySchedulingStore {
    let store = InMemorySchedulingStore::default();

    store.insert_job(Job::new(
        JobId("demo-hearing".to_string()),
        at(date, 10),
        at(date, 12),
        Modality::Zoom,
    ));
    store.seed_client_request(ClientRequest {
        id: ClientRequestId("demo-cr-1".to_string()),
        job_id: JobId("demo-hearing".to_string()),
        language_id: LanguageId("spa".to_string()),
        case_number: Some("FECR-D-0001".to_string()),
        notes: None,
    });

    store.insert_interpreter(sample_interpreter(
        "int-lucia",
        "Lucia Ortega",
        true,
        &[Modality::Zoom, Modality::InPerson],
        spanish(CertificationTier::Registered, Some(2), Some(1)),
    ));
    store.insert_interpreter(sample_interpreter(
        "int-mateo",
        "Mateo Ruiz",
        false,
        &[Modality::Zoom, Modality::Phone],
        spanish(CertificationTier::Certified, Some(1), None),
    ));
    store.insert_interpreter(sample_interpreter(
        "int-sofia",
        "Sofia Marquez",
        true,
        &[Modality::Zoom],
        spanish(CertificationTier::Certified, Some(3), Some(2)),
    ));
    store.insert_interpreter(sample_interpreter(
        "int-diego",
        "Diego Fuentes",
        true,
        &[Modality::InPerson],
        spanish(CertificationTier::Certified, None, None),
    ));
    store.insert_interpreter(sample_interpreter(
        "int-elena",
        "Elena Vidal",
        true,
        &[Modality::Zoom],
        spanish(CertificationTier::Certified, Some(1), None),
    ));
    if let (Some(start), Some(end)) = (at(date, 11), at(date, 13)) {
        store.insert_unavailability(UnavailabilityBlock {
            interpreter_id: InterpreterId("int-elena".to_string()),
            start,
            end,
            reason: Some("deposition".to_string()),
        });
    }

    store
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_directory_ranks_preferences_first() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 2).expect("valid date");
        let service = SchedulingService::new(
            Arc::new(sample_directory(date)),
            Arc::new(InMemoryStatusAudit::default()),
            SchedulingConfig::default(),
        );

        let report = service
            .compute_matches(&JobId("demo-hearing".to_string()))
            .expect("matches computed");
        let order: Vec<_> = report
            .eligible
            .iter()
            .map(|candidate| candidate.interpreter_id.0.as_str())
            .collect();
        assert_eq!(order, vec!["int-lucia", "int-sofia", "int-mateo"]);
        assert_eq!(report.rejected.len(), 2);
    }

    #[test]
    fn demo_runs_end_to_end() {
        let args = DemoArgs {
            date: NaiveDate::from_ymd_opt(2025, 4, 2),
            skip_outreach: false,
        };
        run_demo(args).expect("demo completes");
    }
}
