use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::domain::{
    AssignmentAttempt, AttemptStatus, ClientRequest, ClientRequestId, Interpreter, InterpreterId,
    Job, JobId, NewClientRequest, StatusHistoryEntry, UnavailabilityBlock,
};
use super::repository::{AuditError, RepositoryError, SchedulingRepository, StatusAuditSink};

#[derive(Debug, Default)]
struct StoreState {
    jobs: BTreeMap<JobId, Job>,
    client_requests: Vec<ClientRequest>,
    interpreters: BTreeMap<InterpreterId, Interpreter>,
    unavailability: Vec<UnavailabilityBlock>,
    attempts: BTreeMap<(JobId, InterpreterId), AssignmentAttempt>,
    client_request_sequence: u64,
}

impl StoreState {
    fn check_job_version(&self, job: &Job) -> Result<(), RepositoryError> {
        let stored = self.jobs.get(&job.id).ok_or(RepositoryError::NotFound)?;
        if stored.version != job.version {
            return Err(RepositoryError::Conflict(format!(
                "job {} changed since it was read (version {} != {})",
                job.id, stored.version, job.version
            )));
        }
        Ok(())
    }

    fn write_job(&mut self, mut job: Job) -> Job {
        job.version += 1;
        self.jobs.insert(job.id.clone(), job.clone());
        job
    }

    /// Next `cr-NNNNNN` id not already held by a stored request, seeded ones included.
    fn next_client_request_id(&mut self) -> ClientRequestId {
        loop {
            self.client_request_sequence += 1;
            let id = ClientRequestId(format!("cr-{:06}", self.client_request_sequence));
            if !self.client_requests.iter().any(|existing| existing.id == id) {
                return id;
            }
        }
    }

    fn check_attempt(
        &self,
        attempt: &AssignmentAttempt,
        expected: Option<AttemptStatus>,
    ) -> Result<(), RepositoryError> {
        let key = (attempt.job_id.clone(), attempt.interpreter_id.clone());
        let stored = self.attempts.get(&key).map(|stored| stored.status);
        if stored != expected {
            return Err(RepositoryError::Conflict(format!(
                "attempt for job {} and interpreter {} is {}",
                attempt.job_id,
                attempt.interpreter_id,
                stored.map(AttemptStatus::label).unwrap_or("absent")
            )));
        }
        Ok(())
    }
}

/// Mutex-guarded store; every trait method runs under one lock and is therefore linearizable.
#[derive(Debug, Default)]
pub struct InMemorySchedulingStore {
    state: Mutex<StoreState>,
}

impl InMemorySchedulingStore {
    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert_interpreter(&self, interpreter: Interpreter) {
        self.state()
            .interpreters
            .insert(interpreter.id.clone(), interpreter);
    }

    pub fn insert_job(&self, job: Job) {
        self.state().jobs.insert(job.id.clone(), job);
    }

    pub fn insert_unavailability(&self, block: UnavailabilityBlock) {
        self.state().unavailability.push(block);
    }

    /// Seed a client request without running the duration rule.
    pub fn seed_client_request(&self, request: ClientRequest) {
        self.state().client_requests.push(request);
    }

    /// Delete a job together with the client requests and attempts it owns.
    pub fn remove_job(&self, job_id: &JobId) -> bool {
        let mut state = self.state();
        let removed = state.jobs.remove(job_id).is_some();
        state
            .client_requests
            .retain(|request| &request.job_id != job_id);
        state.attempts.retain(|(job, _), _| job != job_id);
        removed
    }
}

impl SchedulingRepository for InMemorySchedulingStore {
    fn job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(self.state().jobs.get(id).cloned())
    }

    fn client_requests(&self, job_id: &JobId) -> Result<Vec<ClientRequest>, RepositoryError> {
        Ok(self
            .state()
            .client_requests
            .iter()
            .filter(|request| &request.job_id == job_id)
            .cloned()
            .collect())
    }

    fn interpreters(&self) -> Result<Vec<Interpreter>, RepositoryError> {
        Ok(self.state().interpreters.values().cloned().collect())
    }

    fn interpreter(&self, id: &InterpreterId) -> Result<Option<Interpreter>, RepositoryError> {
        Ok(self.state().interpreters.get(id).cloned())
    }

    fn unavailability(
        &self,
        interpreter_id: &InterpreterId,
    ) -> Result<Vec<UnavailabilityBlock>, RepositoryError> {
        Ok(self
            .state()
            .unavailability
            .iter()
            .filter(|block| &block.interpreter_id == interpreter_id)
            .cloned()
            .collect())
    }

    fn jobs_assigned_to(&self, interpreter_id: &InterpreterId) -> Result<Vec<Job>, RepositoryError> {
        Ok(self
            .state()
            .jobs
            .values()
            .filter(|job| job.interpreter_id.as_ref() == Some(interpreter_id))
            .cloned()
            .collect())
    }

    fn attempts_for_job(&self, job_id: &JobId) -> Result<Vec<AssignmentAttempt>, RepositoryError> {
        Ok(self
            .state()
            .attempts
            .values()
            .filter(|attempt| &attempt.job_id == job_id)
            .cloned()
            .collect())
    }

    fn attempts_for_interpreter(
        &self,
        interpreter_id: &InterpreterId,
    ) -> Result<Vec<AssignmentAttempt>, RepositoryError> {
        Ok(self
            .state()
            .attempts
            .values()
            .filter(|attempt| &attempt.interpreter_id == interpreter_id)
            .cloned()
            .collect())
    }

    fn attempt(
        &self,
        job_id: &JobId,
        interpreter_id: &InterpreterId,
    ) -> Result<Option<AssignmentAttempt>, RepositoryError> {
        Ok(self
            .state()
            .attempts
            .get(&(job_id.clone(), interpreter_id.clone()))
            .cloned())
    }

    fn put_attempt(
        &self,
        attempt: AssignmentAttempt,
        expected: Option<AttemptStatus>,
    ) -> Result<AssignmentAttempt, RepositoryError> {
        let mut state = self.state();
        if !state.jobs.contains_key(&attempt.job_id) {
            return Err(RepositoryError::NotFound);
        }
        state.check_attempt(&attempt, expected)?;
        state.attempts.insert(
            (attempt.job_id.clone(), attempt.interpreter_id.clone()),
            attempt.clone(),
        );
        Ok(attempt)
    }

    fn delete_attempt(
        &self,
        job_id: &JobId,
        interpreter_id: &InterpreterId,
    ) -> Result<(), RepositoryError> {
        self.state()
            .attempts
            .remove(&(job_id.clone(), interpreter_id.clone()))
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn update_job(&self, job: Job) -> Result<Job, RepositoryError> {
        let mut state = self.state();
        state.check_job_version(&job)?;
        Ok(state.write_job(job))
    }

    fn confirm_assignment(
        &self,
        attempt: AssignmentAttempt,
        expected: AttemptStatus,
        job: Job,
    ) -> Result<(AssignmentAttempt, Job), RepositoryError> {
        let mut state = self.state();
        state.check_attempt(&attempt, Some(expected))?;
        state.check_job_version(&job)?;

        state.attempts.insert(
            (attempt.job_id.clone(), attempt.interpreter_id.clone()),
            attempt.clone(),
        );
        let job = state.write_job(job);
        Ok((attempt, job))
    }

    fn insert_client_request(
        &self,
        job_id: &JobId,
        request: NewClientRequest,
        expected_existing: usize,
        job_update: Option<Job>,
    ) -> Result<ClientRequest, RepositoryError> {
        let mut state = self.state();
        if !state.jobs.contains_key(job_id) {
            return Err(RepositoryError::NotFound);
        }
        let existing = state
            .client_requests
            .iter()
            .filter(|stored| &stored.job_id == job_id)
            .count();
        if existing != expected_existing {
            return Err(RepositoryError::Conflict(format!(
                "job {job_id} has {existing} client requests, expected {expected_existing}"
            )));
        }
        if let Some(job) = &job_update {
            state.check_job_version(job)?;
        }

        let stored = ClientRequest {
            id: state.next_client_request_id(),
            job_id: job_id.clone(),
            language_id: request.language_id,
            case_number: request.case_number,
            notes: request.notes,
        };
        state.client_requests.push(stored.clone());
        if let Some(job) = job_update {
            state.write_job(job);
        }
        Ok(stored)
    }
}

/// Status history kept in memory in append order.
#[derive(Debug, Default)]
pub struct InMemoryStatusAudit {
    entries: Mutex<Vec<StatusHistoryEntry>>,
}

impl InMemoryStatusAudit {
    pub fn entries(&self) -> Vec<StatusHistoryEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StatusAuditSink for InMemoryStatusAudit {
    fn record(&self, entry: StatusHistoryEntry) -> Result<(), AuditError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
        Ok(())
    }

    fn history(&self, job_id: &JobId) -> Result<Vec<StatusHistoryEntry>, AuditError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|entry| &entry.job_id == job_id)
            .cloned()
            .collect())
    }
}
