use chrono::NaiveDate;
use interpreter_scheduling::error::AppError;
use interpreter_scheduling::scheduling::{
    ClientRequest, InMemorySchedulingStore, Interpreter, Job, UnavailabilityBlock,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Directory, jobs, and requests loaded into the in-memory store at startup.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SeedData {
    #[serde(default)]
    pub(crate) interpreters: Vec<Interpreter>,
    #[serde(default)]
    pub(crate) jobs: Vec<Job>,
    #[serde(default)]
    pub(crate) client_requests: Vec<ClientRequest>,
    #[serde(default)]
    pub(crate) unavailability: Vec<UnavailabilityBlock>,
}

impl SeedData {
    pub(crate) fn from_json(raw: &str) -> Result<Self, AppError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub(crate) fn from_path(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub(crate) fn into_store(self) -> InMemorySchedulingStore {
        let store = InMemorySchedulingStore::default();
        for interpreter in self.interpreters {
            store.insert_interpreter(interpreter);
        }
        for job in self.jobs {
            store.insert_job(job);
        }
        for request in self.client_requests {
            store.seed_client_request(request);
        }
        for block in self.unavailability {
            store.insert_unavailability(block);
        }
        store
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Store seeded from `path`, or empty when no seed file is given.
pub(crate) fn load_store(path: Option<&Path>) -> Result<InMemorySchedulingStore, AppError> {
    match path {
        Some(path) => Ok(SeedData::from_path(path)?.into_store()),
        None => Ok(InMemorySchedulingStore::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interpreter_scheduling::scheduling::{JobId, SchedulingRepository};

    const SEED: &str = r#"{
        "interpreters": [{
            "id": "int-1",
            "name": "Lucia Ortega",
            "is_local": true,
            "modality_preferences": ["Zoom", "In-Person"],
            "languages": [{ "language_id": "spa", "certification": "Certified" }]
        }],
        "jobs": [{
            "id": "job-1",
            "start": "2025-04-02T14:00:00Z",
            "end": "2025-04-02T16:00:00Z",
            "modality": "In-Person",
            "status": "Initial",
            "duration_minutes": 120,
            "interpreter_id": null,
            "location_id": null
        }],
        "client_requests": [{
            "id": "cr-1",
            "job_id": "job-1",
            "language_id": "spa",
            "case_number": "FECR-1",
            "notes": null
        }]
    }"#;

    #[test]
    fn seed_json_populates_the_store() {
        let store = SeedData::from_json(SEED).expect("seed parses").into_store();

        let job = store
            .job(&JobId("job-1".to_string()))
            .expect("read succeeds")
            .expect("job seeded");
        assert_eq!(job.version, 0);
        assert_eq!(store.interpreters().expect("read succeeds").len(), 1);
        assert_eq!(
            store
                .client_requests(&job.id)
                .expect("read succeeds")
                .len(),
            1
        );
    }

    #[test]
    fn malformed_seed_is_reported() {
        match SeedData::from_json("{ \"jobs\": [{ \"id\": 4 }] }") {
            Err(AppError::Seed(_)) => {}
            other => panic!("expected seed error, got {other:?}"),
        }
    }

    #[test]
    fn dates_are_parsed_strictly() {
        assert_eq!(
            parse_date(" 2025-04-02 "),
            Ok(NaiveDate::from_ymd_opt(2025, 4, 2).expect("valid date"))
        );
        assert!(parse_date("04/02/2025").is_err());
    }

    #[test]
    fn missing_seed_path_yields_empty_store() {
        let store = load_store(None).expect("empty store");
        assert!(store.interpreters().expect("read succeeds").is_empty());
    }
}
