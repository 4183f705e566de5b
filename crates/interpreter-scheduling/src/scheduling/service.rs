use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::config::SchedulingConfig;
use super::domain::{
    AssignmentAttempt, AttemptStatus, ClientRequest, Interpreter, InterpreterId, Job, JobId,
    JobStatus, NewClientRequest, StatusHistoryEntry, UnavailabilityBlock,
};
use super::duration::{self, DurationAdjustment};
use super::lifecycle::{self, StatusTransition, SYSTEM_ACTOR};
use super::matching::{self, CandidateContext, MatchReport, MatchTarget, MatchingEngine};
use super::outreach::{self, AttemptGroups, OutreachAction, OutreachBoard, TransitionError};
use super::overlap::TimeWindow;
use super::repository::{
    AuditError, Clock, RepositoryError, SchedulingRepository, StatusAuditSink, SystemClock,
};

/// Service composing the matching engine, outreach state machine, and job lifecycle over the
/// injected store and audit sink.
pub struct SchedulingService<R, A> {
    repository: Arc<R>,
    audit: Arc<A>,
    clock: Arc<dyn Clock>,
    engine: MatchingEngine,
    config: SchedulingConfig,
}

/// Job as written, plus a warning when its history entry could not be recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobUpdate {
    pub job: Job,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_warning: Option<String>,
}

/// Confirmed attempt with the job it assigned, plus the history warning when there is one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub attempt: AssignmentAttempt,
    pub job: Job,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDetails {
    pub job: Job,
    pub client_requests: Vec<ClientRequest>,
}

impl<R, A> SchedulingService<R, A>
where
    R: SchedulingRepository + 'static,
    A: StatusAuditSink + 'static,
{
    pub fn new(repository: Arc<R>, audit: Arc<A>, config: SchedulingConfig) -> Self {
        let engine = MatchingEngine::new(config.scoring.clone(), config.recontact_window());
        Self {
            repository,
            audit,
            clock: Arc::new(SystemClock),
            engine,
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Screen and rank every interpreter in the directory for a job.
    pub fn compute_matches(&self, job_id: &JobId) -> Result<MatchReport, SchedulingError> {
        let job = self.load_job(job_id)?;
        let target = self.match_target(&job)?;
        let interpreters = self.repository.interpreters()?;

        let mut candidates = Vec::with_capacity(interpreters.len());
        for interpreter in interpreters {
            candidates.push(self.candidate_data(&target, interpreter)?);
        }

        let report = self.engine.evaluate(
            &target,
            candidates.iter().map(|candidate| CandidateContext {
                interpreter: &candidate.interpreter,
                unavailability: &candidate.unavailability,
                bookings: &candidate.bookings,
                declined_jobs: &candidate.declined_jobs,
            }),
        );

        info!(
            job_id = %job_id,
            eligible = report.eligible.len(),
            rejected = report.rejected.len(),
            "computed interpreter matches"
        );
        Ok(report)
    }

    /// Grouped attempts plus the ranked interpreters nobody has reached out to yet.
    pub fn outreach_board(&self, job_id: &JobId) -> Result<OutreachBoard, SchedulingError> {
        let report = self.compute_matches(job_id)?;
        let attempts = self.repository.attempts_for_job(job_id)?;
        let not_contacted = outreach::not_yet_contacted(&report.eligible, &attempts);

        Ok(OutreachBoard {
            job_id: job_id.clone(),
            attempts: AttemptGroups::from_attempts(attempts),
            not_contacted,
        })
    }

    pub fn mark_contacted(
        &self,
        job_id: &JobId,
        interpreter_id: &InterpreterId,
        notes: Option<String>,
    ) -> Result<AssignmentAttempt, SchedulingError> {
        let job = self.load_open_job(job_id)?;
        self.load_interpreter(interpreter_id)?;

        if let Some(window) = job_window(&job)? {
            let declined_jobs = self.declined_jobs(interpreter_id, job_id)?;
            if let Err(reason) = matching::check_recent_declines(
                job_id,
                &window,
                &declined_jobs,
                self.engine.recontact_window(),
            ) {
                return Err(SchedulingError::PreconditionFailed(format!(
                    "interpreter {interpreter_id} cannot be contacted yet: {}",
                    reason.summary()
                )));
            }
        }

        self.apply_outreach(job_id, interpreter_id, OutreachAction::Contact, notes)
    }

    pub fn mark_pending(
        &self,
        job_id: &JobId,
        interpreter_id: &InterpreterId,
        notes: Option<String>,
    ) -> Result<AssignmentAttempt, SchedulingError> {
        self.load_job(job_id)?;
        self.apply_outreach(job_id, interpreter_id, OutreachAction::AwaitResponse, notes)
    }

    pub fn mark_declined(
        &self,
        job_id: &JobId,
        interpreter_id: &InterpreterId,
        notes: Option<String>,
    ) -> Result<AssignmentAttempt, SchedulingError> {
        self.load_job(job_id)?;
        self.apply_outreach(job_id, interpreter_id, OutreachAction::Decline, notes)
    }

    /// Confirm the attempt and assign the interpreter to the job in one atomic write.
    pub fn mark_confirmed(
        &self,
        job_id: &JobId,
        interpreter_id: &InterpreterId,
        notes: Option<String>,
    ) -> Result<Confirmation, SchedulingError> {
        let job = self.load_open_job(job_id)?;
        self.load_interpreter(interpreter_id)?;

        if job.status == JobStatus::Confirmed {
            if let Some(current) = job.interpreter_id.as_ref().filter(|id| *id != interpreter_id)
            {
                return Err(SchedulingError::PreconditionFailed(format!(
                    "job {job_id} is already confirmed with interpreter {current}"
                )));
            }
        }

        let Some(current) = self.repository.attempt(job_id, interpreter_id)? else {
            return Err(TransitionError {
                action: OutreachAction::Confirm,
                from: None,
            }
            .into());
        };
        let confirmed = outreach::transition(
            job_id,
            interpreter_id,
            Some(&current),
            OutreachAction::Confirm,
            self.clock.now(),
            notes,
        )?;

        let mut updated = job;
        let transition = lifecycle::confirm(&mut updated, interpreter_id.clone());

        let (attempt, job) = self
            .repository
            .confirm_assignment(confirmed, current.status, updated)
            .map_err(|err| {
                if let RepositoryError::Conflict(detail) = &err {
                    warn!(
                        job_id = %job_id,
                        interpreter_id = %interpreter_id,
                        %detail,
                        "confirmation lost to a concurrent write"
                    );
                }
                SchedulingError::from(err)
            })?;

        info!(
            job_id = %job_id,
            interpreter_id = %interpreter_id,
            from = %transition.from,
            to = %transition.to,
            "interpreter confirmed"
        );
        let audit_warning = self.record_transition(transition, &job, SYSTEM_ACTOR);

        Ok(Confirmation {
            attempt,
            job,
            audit_warning,
        })
    }

    /// Delete the attempt record entirely. A job already confirmed through it stays assigned.
    pub fn undo_attempt(
        &self,
        job_id: &JobId,
        interpreter_id: &InterpreterId,
    ) -> Result<(), SchedulingError> {
        self.load_job(job_id)?;
        self.repository
            .delete_attempt(job_id, interpreter_id)
            .map_err(|err| match err {
                RepositoryError::NotFound => SchedulingError::NotFound {
                    entity: "attempt",
                    id: format!("{job_id}/{interpreter_id}"),
                },
                other => other.into(),
            })?;

        info!(job_id = %job_id, interpreter_id = %interpreter_id, "outreach attempt removed");
        Ok(())
    }

    pub fn assign_interpreter(
        &self,
        job_id: &JobId,
        interpreter_id: &InterpreterId,
        actor: Option<&str>,
    ) -> Result<JobUpdate, SchedulingError> {
        let mut job = self.load_open_job(job_id)?;
        self.load_interpreter(interpreter_id)?;

        let transition = lifecycle::assign(&mut job, interpreter_id.clone());
        self.write_job(job, transition, actor.unwrap_or(SYSTEM_ACTOR))
    }

    /// Clear the interpreter and reset the job to `Initial`; attempt history is untouched.
    pub fn unassign_interpreter(
        &self,
        job_id: &JobId,
        actor: Option<&str>,
    ) -> Result<JobUpdate, SchedulingError> {
        let mut job = self.load_job(job_id)?;
        let transition = lifecycle::unassign(&mut job);
        self.write_job(job, transition, actor.unwrap_or(SYSTEM_ACTOR))
    }

    /// Explicit operator status write; always audited.
    pub fn set_status(
        &self,
        job_id: &JobId,
        status: JobStatus,
        actor: &str,
    ) -> Result<JobUpdate, SchedulingError> {
        let actor = actor.trim();
        if actor.is_empty() {
            return Err(SchedulingError::Validation(
                "status changes require an actor".to_string(),
            ));
        }

        let mut job = self.load_job(job_id)?;
        let transition = lifecycle::set_status(&mut job, status);
        self.write_job(job, transition, actor)
    }

    pub fn status_history(
        &self,
        job_id: &JobId,
    ) -> Result<Vec<StatusHistoryEntry>, SchedulingError> {
        self.load_job(job_id)?;
        Ok(self.audit.history(job_id)?)
    }

    /// The duration change attaching one more client request would require, if any.
    pub fn preview_client_request(
        &self,
        job_id: &JobId,
    ) -> Result<Option<DurationAdjustment>, SchedulingError> {
        let job = self.load_job(job_id)?;
        let existing = self.repository.client_requests(job_id)?;
        Ok(duration::required_adjustment(
            existing.len(),
            job.duration_minutes,
            self.config.multi_language_duration_minutes,
        ))
    }

    /// Attach a client request; a required duration change is written with it or not at all.
    pub fn add_client_request(
        &self,
        job_id: &JobId,
        request: NewClientRequest,
        confirm_duration_change: bool,
    ) -> Result<ClientRequest, SchedulingError> {
        if request.language_id.0.trim().is_empty() {
            return Err(SchedulingError::Validation(
                "client request needs a language".to_string(),
            ));
        }

        let job = self.load_job(job_id)?;
        let existing = self.repository.client_requests(job_id)?;
        let adjustment = duration::required_adjustment(
            existing.len(),
            job.duration_minutes,
            self.config.multi_language_duration_minutes,
        );

        let job_update = match adjustment {
            Some(adjustment) if !confirm_duration_change => {
                return Err(SchedulingError::PreconditionFailed(format!(
                    "{}; confirm the duration change to add this request",
                    adjustment.warning()
                )));
            }
            Some(adjustment) => Some(Job {
                duration_minutes: adjustment.proposed_minutes,
                ..job
            }),
            None => None,
        };

        let stored = self.repository.insert_client_request(
            job_id,
            request,
            existing.len(),
            job_update,
        )?;

        info!(
            job_id = %job_id,
            language_id = %stored.language_id,
            duration_adjusted = adjustment.is_some(),
            "client request added"
        );
        Ok(stored)
    }

    pub fn job_details(&self, job_id: &JobId) -> Result<JobDetails, SchedulingError> {
        let job = self.load_job(job_id)?;
        let client_requests = self.repository.client_requests(job_id)?;
        Ok(JobDetails {
            job,
            client_requests,
        })
    }

    fn load_job(&self, job_id: &JobId) -> Result<Job, SchedulingError> {
        self.repository
            .job(job_id)?
            .ok_or_else(|| SchedulingError::NotFound {
                entity: "job",
                id: job_id.to_string(),
            })
    }

    fn load_open_job(&self, job_id: &JobId) -> Result<Job, SchedulingError> {
        let job = self.load_job(job_id)?;
        if job.status.is_terminal() {
            return Err(SchedulingError::PreconditionFailed(format!(
                "job {job_id} is {}",
                job.status
            )));
        }
        Ok(job)
    }

    fn load_interpreter(
        &self,
        interpreter_id: &InterpreterId,
    ) -> Result<Interpreter, SchedulingError> {
        self.repository
            .interpreter(interpreter_id)?
            .ok_or_else(|| SchedulingError::NotFound {
                entity: "interpreter",
                id: interpreter_id.to_string(),
            })
    }

    /// The first client request's language stands for the whole job.
    fn match_target(&self, job: &Job) -> Result<MatchTarget, SchedulingError> {
        let requests = self.repository.client_requests(&job.id)?;
        let language_id = requests
            .into_iter()
            .next()
            .map(|request| request.language_id)
            .filter(|language| !language.0.trim().is_empty())
            .ok_or_else(|| {
                SchedulingError::Validation(format!(
                    "job {} has no client request language to match on",
                    job.id
                ))
            })?;

        Ok(MatchTarget {
            job_id: job.id.clone(),
            language_id,
            modality: job.modality,
            window: job_window(job)?,
        })
    }

    fn candidate_data(
        &self,
        target: &MatchTarget,
        interpreter: Interpreter,
    ) -> Result<CandidateData, SchedulingError> {
        if target.window.is_none() {
            return Ok(CandidateData {
                interpreter,
                unavailability: Vec::new(),
                bookings: Vec::new(),
                declined_jobs: Vec::new(),
            });
        }

        let unavailability = self.repository.unavailability(&interpreter.id)?;
        let bookings = self.repository.jobs_assigned_to(&interpreter.id)?;
        let declined_jobs = self.declined_jobs(&interpreter.id, &target.job_id)?;

        Ok(CandidateData {
            interpreter,
            unavailability,
            bookings,
            declined_jobs,
        })
    }

    /// Other jobs this interpreter has declined.
    fn declined_jobs(
        &self,
        interpreter_id: &InterpreterId,
        excluding: &JobId,
    ) -> Result<Vec<Job>, SchedulingError> {
        let mut jobs = Vec::new();
        for attempt in self.repository.attempts_for_interpreter(interpreter_id)? {
            if attempt.status != AttemptStatus::Declined || &attempt.job_id == excluding {
                continue;
            }
            if let Some(job) = self.repository.job(&attempt.job_id)? {
                jobs.push(job);
            }
        }
        Ok(jobs)
    }

    fn apply_outreach(
        &self,
        job_id: &JobId,
        interpreter_id: &InterpreterId,
        action: OutreachAction,
        notes: Option<String>,
    ) -> Result<AssignmentAttempt, SchedulingError> {
        let current = self.repository.attempt(job_id, interpreter_id)?;
        let next = outreach::transition(
            job_id,
            interpreter_id,
            current.as_ref(),
            action,
            self.clock.now(),
            notes,
        )?;

        let stored = self
            .repository
            .put_attempt(next, current.map(|attempt| attempt.status))?;

        info!(
            job_id = %job_id,
            interpreter_id = %interpreter_id,
            status = %stored.status,
            "outreach attempt updated"
        );
        Ok(stored)
    }

    fn write_job(
        &self,
        job: Job,
        transition: StatusTransition,
        actor: &str,
    ) -> Result<JobUpdate, SchedulingError> {
        let job = self.repository.update_job(job)?;
        info!(
            job_id = %job.id,
            from = %transition.from,
            to = %transition.to,
            actor,
            "job status updated"
        );
        let audit_warning = self.record_transition(transition, &job, actor);
        Ok(JobUpdate { job, audit_warning })
    }

    /// History writes never undo the status change they describe; failures come back as a
    /// warning for the operator.
    fn record_transition(
        &self,
        transition: StatusTransition,
        job: &Job,
        actor: &str,
    ) -> Option<String> {
        let entry = transition.history_entry(job, self.clock.now(), actor);
        match self.audit.record(entry) {
            Ok(()) => None,
            Err(err) => {
                warn!(
                    job_id = %job.id,
                    from = %transition.from,
                    to = %transition.to,
                    error = %err,
                    "status history entry was not recorded"
                );
                Some(format!(
                    "status changed to {} but the history entry was not recorded: {err}",
                    transition.to
                ))
            }
        }
    }
}

/// The job window, refusing one that ends at or before its start.
fn job_window(job: &Job) -> Result<Option<TimeWindow>, SchedulingError> {
    match job.window() {
        Some(window) if window.end <= window.start => Err(SchedulingError::Validation(format!(
            "job {} ends at or before its start",
            job.id
        ))),
        window => Ok(window),
    }
}

struct CandidateData {
    interpreter: Interpreter,
    unavailability: Vec<UnavailabilityBlock>,
    bookings: Vec<Job>,
    declined_jobs: Vec<Job>,
}

/// Error raised by the scheduling service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulingError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Storage(#[source] RepositoryError),
}

impl From<RepositoryError> for SchedulingError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Conflict(detail) => Self::PreconditionFailed(detail),
            RepositoryError::NotFound => Self::NotFound {
                entity: "record",
                id: "requested".to_string(),
            },
            unavailable @ RepositoryError::Unavailable(_) => Self::Storage(unavailable),
        }
    }
}

impl From<AuditError> for SchedulingError {
    fn from(value: AuditError) -> Self {
        Self::Storage(RepositoryError::Unavailable(value.to_string()))
    }
}

impl From<TransitionError> for SchedulingError {
    fn from(value: TransitionError) -> Self {
        Self::PreconditionFailed(value.to_string())
    }
}
