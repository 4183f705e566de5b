use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{InterpreterId, Job, JobStatus, StatusHistoryEntry};

/// Actor recorded for status changes the engine derives on its own.
pub const SYSTEM_ACTOR: &str = "system";

/// A status change applied to a job, ready to be written to the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    pub from: JobStatus,
    pub to: JobStatus,
}

impl StatusTransition {
    pub fn history_entry(
        self,
        job: &Job,
        changed_at: DateTime<Utc>,
        actor: &str,
    ) -> StatusHistoryEntry {
        StatusHistoryEntry {
            job_id: job.id.clone(),
            old_status: self.from,
            new_status: self.to,
            changed_at,
            actor: actor.to_string(),
        }
    }
}

/// Explicit operator write; any target status is accepted.
pub fn set_status(job: &mut Job, status: JobStatus) -> StatusTransition {
    let from = job.status;
    job.status = status;
    StatusTransition { from, to: status }
}

/// Direct assignment outside the outreach flow parks the job in `Pending`.
pub fn assign(job: &mut Job, interpreter_id: InterpreterId) -> StatusTransition {
    job.interpreter_id = Some(interpreter_id);
    set_status(job, JobStatus::Pending)
}

/// A confirmed attempt assigns the interpreter and confirms the job.
pub fn confirm(job: &mut Job, interpreter_id: InterpreterId) -> StatusTransition {
    job.interpreter_id = Some(interpreter_id);
    set_status(job, JobStatus::Confirmed)
}

/// Clearing the interpreter sends the job back to `Initial`.
pub fn unassign(job: &mut Job) -> StatusTransition {
    job.interpreter_id = None;
    set_status(job, JobStatus::Initial)
}
