use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::scheduling::domain::{
    AssignmentAttempt, AttemptStatus, CertificationTier, ClientRequest, ClientRequestId,
    Interpreter, InterpreterId, InterpreterLanguage, Job, JobId, LanguageId, Modality,
    NewClientRequest, StatusHistoryEntry, UnavailabilityBlock,
};
use crate::scheduling::repository::{
    AuditError, FixedClock, RepositoryError, SchedulingRepository, StatusAuditSink,
};
use crate::scheduling::{
    scheduling_router, InMemorySchedulingStore, InMemoryStatusAudit, SchedulingConfig,
    SchedulingService,
};

pub(super) type MemoryService = SchedulingService<InMemorySchedulingStore, InMemoryStatusAudit>;

pub(super) fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 2, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn spanish() -> LanguageId {
    LanguageId("spa".to_string())
}

pub(super) fn job_id(id: &str) -> JobId {
    JobId(id.to_string())
}

pub(super) fn interpreter_id(id: &str) -> InterpreterId {
    InterpreterId(id.to_string())
}

pub(super) fn qualified(
    tier: Option<CertificationTier>,
    proficiency_rank: Option<i32>,
    preference_rank: Option<i32>,
) -> InterpreterLanguage {
    InterpreterLanguage {
        language_id: spanish(),
        certification: tier,
        proficiency_rank,
        preference_rank,
    }
}

pub(super) fn interpreter(
    id: &str,
    is_local: bool,
    modalities: &[Modality],
    languages: Vec<InterpreterLanguage>,
) -> Interpreter {
    Interpreter {
        id: interpreter_id(id),
        name: format!("Interpreter {}", id.to_uppercase()),
        email: Some(format!("{id}@interpreters.example")),
        phone: None,
        is_local,
        modality_preferences: modalities.iter().copied().collect::<BTreeSet<_>>(),
        languages,
    }
}

/// Certified Spanish, local, every modality.
pub(super) fn certified(id: &str) -> Interpreter {
    interpreter(
        id,
        true,
        &[Modality::Zoom, Modality::InPerson, Modality::Phone],
        vec![qualified(Some(CertificationTier::Certified), None, None)],
    )
}

pub(super) fn job(id: &str, start: (u32, u32), end: (u32, u32), modality: Modality) -> Job {
    Job::new(
        job_id(id),
        Some(at(start.0, start.1)),
        Some(at(end.0, end.1)),
        modality,
    )
}

pub(super) fn spanish_request(id: &str, job: &str) -> ClientRequest {
    ClientRequest {
        id: ClientRequestId(id.to_string()),
        job_id: job_id(job),
        language_id: spanish(),
        case_number: Some("CR-2025-0042".to_string()),
        notes: None,
    }
}

pub(super) fn unavailable(id: &str, start: (u32, u32), end: (u32, u32)) -> UnavailabilityBlock {
    UnavailabilityBlock {
        interpreter_id: interpreter_id(id),
        start: at(start.0, start.1),
        end: at(end.0, end.1),
        reason: Some("medical appointment".to_string()),
    }
}

/// Store holding `job-1`, a two-hour Spanish Zoom job from 10:00 to 12:00.
pub(super) fn seeded_store() -> Arc<InMemorySchedulingStore> {
    let store = Arc::new(InMemorySchedulingStore::default());
    store.insert_job(job("job-1", (10, 0), (12, 0), Modality::Zoom));
    store.seed_client_request(spanish_request("cr-seed-1", "job-1"));
    store
}

pub(super) fn service_over<R, A>(repository: Arc<R>, audit: Arc<A>) -> SchedulingService<R, A>
where
    R: SchedulingRepository + 'static,
    A: StatusAuditSink + 'static,
{
    SchedulingService::new(repository, audit, SchedulingConfig::default())
        .with_clock(Arc::new(FixedClock(at(9, 0))))
}

pub(super) fn build_service() -> (
    MemoryService,
    Arc<InMemorySchedulingStore>,
    Arc<InMemoryStatusAudit>,
) {
    let store = seeded_store();
    let audit = Arc::new(InMemoryStatusAudit::default());
    let service = service_over(store.clone(), audit.clone());
    (service, store, audit)
}

pub(super) fn eligible_ids(service: &MemoryService, job: &str) -> Vec<String> {
    service
        .compute_matches(&job_id(job))
        .expect("matches computed")
        .eligible
        .into_iter()
        .map(|candidate| candidate.interpreter_id.0)
        .collect()
}

/// Audit sink whose writes always fail.
#[derive(Default)]
pub(super) struct FailingAudit;

impl StatusAuditSink for FailingAudit {
    fn record(&self, _entry: StatusHistoryEntry) -> Result<(), AuditError> {
        Err(AuditError::Unavailable("history table offline".to_string()))
    }

    fn history(&self, _job_id: &JobId) -> Result<Vec<StatusHistoryEntry>, AuditError> {
        Err(AuditError::Unavailable("history table offline".to_string()))
    }
}

/// Reads work, every write fails.
pub(super) struct ReadOnlyStore {
    pub(super) inner: Arc<InMemorySchedulingStore>,
}

impl SchedulingRepository for ReadOnlyStore {
    fn job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        self.inner.job(id)
    }

    fn client_requests(&self, job_id: &JobId) -> Result<Vec<ClientRequest>, RepositoryError> {
        self.inner.client_requests(job_id)
    }

    fn interpreters(&self) -> Result<Vec<Interpreter>, RepositoryError> {
        self.inner.interpreters()
    }

    fn interpreter(&self, id: &InterpreterId) -> Result<Option<Interpreter>, RepositoryError> {
        self.inner.interpreter(id)
    }

    fn unavailability(
        &self,
        interpreter_id: &InterpreterId,
    ) -> Result<Vec<UnavailabilityBlock>, RepositoryError> {
        self.inner.unavailability(interpreter_id)
    }

    fn jobs_assigned_to(&self, interpreter_id: &InterpreterId) -> Result<Vec<Job>, RepositoryError> {
        self.inner.jobs_assigned_to(interpreter_id)
    }

    fn attempts_for_job(&self, job_id: &JobId) -> Result<Vec<AssignmentAttempt>, RepositoryError> {
        self.inner.attempts_for_job(job_id)
    }

    fn attempts_for_interpreter(
        &self,
        interpreter_id: &InterpreterId,
    ) -> Result<Vec<AssignmentAttempt>, RepositoryError> {
        self.inner.attempts_for_interpreter(interpreter_id)
    }

    fn attempt(
        &self,
        job_id: &JobId,
        interpreter_id: &InterpreterId,
    ) -> Result<Option<AssignmentAttempt>, RepositoryError> {
        self.inner.attempt(job_id, interpreter_id)
    }

    fn put_attempt(
        &self,
        _attempt: AssignmentAttempt,
        _expected: Option<AttemptStatus>,
    ) -> Result<AssignmentAttempt, RepositoryError> {
        Err(offline())
    }

    fn delete_attempt(
        &self,
        _job_id: &JobId,
        _interpreter_id: &InterpreterId,
    ) -> Result<(), RepositoryError> {
        Err(offline())
    }

    fn update_job(&self, _job: Job) -> Result<Job, RepositoryError> {
        Err(offline())
    }

    fn confirm_assignment(
        &self,
        _attempt: AssignmentAttempt,
        _expected: AttemptStatus,
        _job: Job,
    ) -> Result<(AssignmentAttempt, Job), RepositoryError> {
        Err(offline())
    }

    fn insert_client_request(
        &self,
        _job_id: &JobId,
        _request: NewClientRequest,
        _expected_existing: usize,
        _job_update: Option<Job>,
    ) -> Result<ClientRequest, RepositoryError> {
        Err(offline())
    }
}

/// Store that commits one competing client request right after the first request listing,
/// so the caller acts on a count that is already stale.
pub(super) struct RacingRequestStore {
    pub(super) inner: Arc<InMemorySchedulingStore>,
    pub(super) competitor: Mutex<Option<NewClientRequest>>,
}

impl RacingRequestStore {
    pub(super) fn new(inner: Arc<InMemorySchedulingStore>, competitor: NewClientRequest) -> Self {
        Self {
            inner,
            competitor: Mutex::new(Some(competitor)),
        }
    }
}

impl SchedulingRepository for RacingRequestStore {
    fn job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        self.inner.job(id)
    }

    fn client_requests(&self, job_id: &JobId) -> Result<Vec<ClientRequest>, RepositoryError> {
        let seen = self.inner.client_requests(job_id)?;
        let competitor = self.competitor.lock().expect("competitor lock").take();
        if let Some(request) = competitor {
            self.inner
                .insert_client_request(job_id, request, seen.len(), None)?;
        }
        Ok(seen)
    }

    fn interpreters(&self) -> Result<Vec<Interpreter>, RepositoryError> {
        self.inner.interpreters()
    }

    fn interpreter(&self, id: &InterpreterId) -> Result<Option<Interpreter>, RepositoryError> {
        self.inner.interpreter(id)
    }

    fn unavailability(
        &self,
        interpreter_id: &InterpreterId,
    ) -> Result<Vec<UnavailabilityBlock>, RepositoryError> {
        self.inner.unavailability(interpreter_id)
    }

    fn jobs_assigned_to(&self, interpreter_id: &InterpreterId) -> Result<Vec<Job>, RepositoryError> {
        self.inner.jobs_assigned_to(interpreter_id)
    }

    fn attempts_for_job(&self, job_id: &JobId) -> Result<Vec<AssignmentAttempt>, RepositoryError> {
        self.inner.attempts_for_job(job_id)
    }

    fn attempts_for_interpreter(
        &self,
        interpreter_id: &InterpreterId,
    ) -> Result<Vec<AssignmentAttempt>, RepositoryError> {
        self.inner.attempts_for_interpreter(interpreter_id)
    }

    fn attempt(
        &self,
        job_id: &JobId,
        interpreter_id: &InterpreterId,
    ) -> Result<Option<AssignmentAttempt>, RepositoryError> {
        self.inner.attempt(job_id, interpreter_id)
    }

    fn put_attempt(
        &self,
        attempt: AssignmentAttempt,
        expected: Option<AttemptStatus>,
    ) -> Result<AssignmentAttempt, RepositoryError> {
        self.inner.put_attempt(attempt, expected)
    }

    fn delete_attempt(
        &self,
        job_id: &JobId,
        interpreter_id: &InterpreterId,
    ) -> Result<(), RepositoryError> {
        self.inner.delete_attempt(job_id, interpreter_id)
    }

    fn update_job(&self, job: Job) -> Result<Job, RepositoryError> {
        self.inner.update_job(job)
    }

    fn confirm_assignment(
        &self,
        attempt: AssignmentAttempt,
        expected: AttemptStatus,
        job: Job,
    ) -> Result<(AssignmentAttempt, Job), RepositoryError> {
        self.inner.confirm_assignment(attempt, expected, job)
    }

    fn insert_client_request(
        &self,
        job_id: &JobId,
        request: NewClientRequest,
        expected_existing: usize,
        job_update: Option<Job>,
    ) -> Result<ClientRequest, RepositoryError> {
        self.inner
            .insert_client_request(job_id, request, expected_existing, job_update)
    }
}

fn offline() -> RepositoryError {
    RepositoryError::Unavailable("database offline".to_string())
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    scheduling_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn assert_conflict_response(response: &Response) {
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
