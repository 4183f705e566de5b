use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::overlap::TimeWindow;

/// Identifier wrapper for scheduled jobs (commitment blocks).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

/// Identifier wrapper for interpreters in the directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InterpreterId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LanguageId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientRequestId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for InterpreterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the interpretation is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Modality {
    Zoom,
    #[serde(rename = "In-Person")]
    InPerson,
    Phone,
    #[serde(rename = "TBD")]
    Tbd,
}

impl Modality {
    pub const fn label(self) -> &'static str {
        match self {
            Modality::Zoom => "Zoom",
            Modality::InPerson => "In-Person",
            Modality::Phone => "Phone",
            Modality::Tbd => "TBD",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Job-level lifecycle status. `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    Initial,
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    #[serde(rename = "Needs Info")]
    NeedsInfo,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            JobStatus::Initial => "Initial",
            JobStatus::Pending => "Pending",
            JobStatus::Confirmed => "Confirmed",
            JobStatus::Completed => "Completed",
            JobStatus::Cancelled => "Cancelled",
            JobStatus::NeedsInfo => "Needs Info",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A scheduled interpretation engagement.
///
/// `version` is bumped by the store on every write and backs the conditional updates that
/// serialise concurrent confirmations of the same job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub modality: Modality,
    pub status: JobStatus,
    pub duration_minutes: u32,
    pub interpreter_id: Option<InterpreterId>,
    pub location_id: Option<LocationId>,
    #[serde(default)]
    pub version: u64,
}

impl Job {
    /// New job in `Initial` with its duration derived from the time window.
    pub fn new(
        id: JobId,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        modality: Modality,
    ) -> Self {
        let duration_minutes = match (start, end) {
            (Some(start), Some(end)) if end > start => {
                u32::try_from((end - start).num_minutes()).unwrap_or(u32::MAX)
            }
            _ => 0,
        };

        Self {
            id,
            start,
            end,
            modality,
            status: JobStatus::Initial,
            duration_minutes,
            interpreter_id: None,
            location_id: None,
            version: 0,
        }
    }

    /// The job window, when both endpoints are known.
    pub fn window(&self) -> Option<TimeWindow> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(TimeWindow::new(start, end)),
            _ => None,
        }
    }
}

/// One language/case attached to a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRequest {
    pub id: ClientRequestId,
    pub job_id: JobId,
    pub language_id: LanguageId,
    pub case_number: Option<String>,
    pub notes: Option<String>,
}

/// Caller-supplied payload for attaching a new client request to a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClientRequest {
    pub language_id: LanguageId,
    #[serde(default)]
    pub case_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Per-(interpreter, language) qualification level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertificationTier {
    Certified,
    Registered,
}

impl CertificationTier {
    pub const fn label(self) -> &'static str {
        match self {
            CertificationTier::Certified => "Certified",
            CertificationTier::Registered => "Registered",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpreterLanguage {
    pub language_id: LanguageId,
    pub certification: Option<CertificationTier>,
    #[serde(default)]
    pub proficiency_rank: Option<i32>,
    #[serde(default)]
    pub preference_rank: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interpreter {
    pub id: InterpreterId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub is_local: bool,
    pub modality_preferences: BTreeSet<Modality>,
    pub languages: Vec<InterpreterLanguage>,
}

impl Interpreter {
    pub fn language(&self, language_id: &LanguageId) -> Option<&InterpreterLanguage> {
        self.languages
            .iter()
            .find(|record| &record.language_id == language_id)
    }
}

/// Operator-entered block of time an interpreter cannot work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailabilityBlock {
    pub interpreter_id: InterpreterId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl UnavailabilityBlock {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start, self.end)
    }
}

/// Outreach status for one (job, interpreter) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Contacted,
    Pending,
    Declined,
    Confirmed,
}

impl AttemptStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AttemptStatus::Contacted => "contacted",
            AttemptStatus::Pending => "pending",
            AttemptStatus::Declined => "declined",
            AttemptStatus::Confirmed => "confirmed",
        }
    }

    /// `contacted` and `pending` both mean the interpreter has not answered yet.
    pub const fn is_awaiting_response(self) -> bool {
        matches!(self, AttemptStatus::Contacted | AttemptStatus::Pending)
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentAttempt {
    pub job_id: JobId,
    pub interpreter_id: InterpreterId,
    pub status: AttemptStatus,
    pub contacted_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Append-only audit record written for every job status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub job_id: JobId,
    pub old_status: JobStatus,
    pub new_status: JobStatus,
    pub changed_at: DateTime<Utc>,
    pub actor: String,
}
