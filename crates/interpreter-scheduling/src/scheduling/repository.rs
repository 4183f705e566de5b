use chrono::{DateTime, Utc};

use super::domain::{
    AssignmentAttempt, AttemptStatus, ClientRequest, Interpreter, InterpreterId, Job, JobId,
    NewClientRequest, StatusHistoryEntry, UnavailabilityBlock,
};

/// Storage abstraction so the engine can be exercised against any backing store.
///
/// Every write is conditional. Implementations must apply each write as one linearizable step
/// and report a failed precondition as [`RepositoryError::Conflict`] without changing anything.
pub trait SchedulingRepository: Send + Sync {
    fn job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;
    fn client_requests(&self, job_id: &JobId) -> Result<Vec<ClientRequest>, RepositoryError>;
    fn interpreters(&self) -> Result<Vec<Interpreter>, RepositoryError>;
    fn interpreter(&self, id: &InterpreterId) -> Result<Option<Interpreter>, RepositoryError>;
    fn unavailability(
        &self,
        interpreter_id: &InterpreterId,
    ) -> Result<Vec<UnavailabilityBlock>, RepositoryError>;
    fn jobs_assigned_to(&self, interpreter_id: &InterpreterId) -> Result<Vec<Job>, RepositoryError>;
    fn attempts_for_job(&self, job_id: &JobId) -> Result<Vec<AssignmentAttempt>, RepositoryError>;
    fn attempts_for_interpreter(
        &self,
        interpreter_id: &InterpreterId,
    ) -> Result<Vec<AssignmentAttempt>, RepositoryError>;
    fn attempt(
        &self,
        job_id: &JobId,
        interpreter_id: &InterpreterId,
    ) -> Result<Option<AssignmentAttempt>, RepositoryError>;

    /// Store the attempt for its pair when the stored one is absent (`expected == None`) or
    /// currently has status `expected`.
    fn put_attempt(
        &self,
        attempt: AssignmentAttempt,
        expected: Option<AttemptStatus>,
    ) -> Result<AssignmentAttempt, RepositoryError>;

    fn delete_attempt(
        &self,
        job_id: &JobId,
        interpreter_id: &InterpreterId,
    ) -> Result<(), RepositoryError>;

    /// Replace the job when the stored `version` equals `job.version`; returns the stored copy
    /// with its version bumped.
    fn update_job(&self, job: Job) -> Result<Job, RepositoryError>;

    /// Write the confirmed attempt and the updated job together, or neither.
    fn confirm_assignment(
        &self,
        attempt: AssignmentAttempt,
        expected: AttemptStatus,
        job: Job,
    ) -> Result<(AssignmentAttempt, Job), RepositoryError>;

    /// Attach the request under a store-assigned id when the job still holds exactly
    /// `expected_existing` requests. The version-checked job update, when given, is written in the
    /// same step; on any failed precondition neither is written.
    fn insert_client_request(
        &self,
        job_id: &JobId,
        request: NewClientRequest,
        expected_existing: usize,
        job_update: Option<Job>,
    ) -> Result<ClientRequest, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("conditional write rejected: {0}")]
    Conflict(String),
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Append-only sink for job status history.
pub trait StatusAuditSink: Send + Sync {
    fn record(&self, entry: StatusHistoryEntry) -> Result<(), AuditError>;
    fn history(&self, job_id: &JobId) -> Result<Vec<StatusHistoryEntry>, AuditError>;
}

/// Audit write error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuditError {
    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}

/// Time source injected into the service so transitions can be pinned in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
