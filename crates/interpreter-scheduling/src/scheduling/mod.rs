//! Interpreter matching, outreach tracking, and job lifecycle for court interpretation work.
//!
//! The service layer is synchronous and generic over its storage and audit ports so the same
//! engine runs against the in-memory store, a database adapter, or test doubles.

pub mod config;
pub mod domain;
pub mod duration;
pub mod lifecycle;
pub mod matching;
pub mod memory;
pub mod outreach;
pub mod overlap;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use config::SchedulingConfig;
pub use domain::{
    AssignmentAttempt, AttemptStatus, CertificationTier, ClientRequest, ClientRequestId,
    Interpreter, InterpreterId, InterpreterLanguage, Job, JobId, JobStatus, LanguageId,
    LocationId, Modality, NewClientRequest, StatusHistoryEntry, UnavailabilityBlock,
};
pub use duration::DurationAdjustment;
pub use lifecycle::{StatusTransition, SYSTEM_ACTOR};
pub use matching::{
    MatchReport, MatchTarget, MatchingEngine, RankedInterpreter, RejectedInterpreter,
    RejectionReason, ScoringConfig,
};
pub use memory::{InMemorySchedulingStore, InMemoryStatusAudit};
pub use outreach::{AttemptGroups, OutreachAction, OutreachBoard, TransitionError};
pub use overlap::TimeWindow;
pub use repository::{
    AuditError, Clock, FixedClock, RepositoryError, SchedulingRepository, StatusAuditSink,
    SystemClock,
};
pub use router::scheduling_router;
pub use service::{Confirmation, JobDetails, JobUpdate, SchedulingError, SchedulingService};
