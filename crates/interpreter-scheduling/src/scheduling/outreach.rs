use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{AssignmentAttempt, AttemptStatus, InterpreterId, JobId};
use super::matching::RankedInterpreter;

/// Operator actions that move an attempt through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutreachAction {
    Contact,
    AwaitResponse,
    Decline,
    Confirm,
}

impl OutreachAction {
    pub const fn label(self) -> &'static str {
        match self {
            OutreachAction::Contact => "mark contacted",
            OutreachAction::AwaitResponse => "mark pending",
            OutreachAction::Decline => "mark declined",
            OutreachAction::Confirm => "mark confirmed",
        }
    }
}

/// Refused transition; `from` is `None` when no attempt exists for the pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub action: OutreachAction,
    pub from: Option<AttemptStatus>,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let from = match self.from {
            Some(status) => status.label(),
            None => "not started",
        };
        write!(
            f,
            "cannot {} an interpreter whose outreach is {}",
            self.action.label(),
            from
        )
    }
}

impl std::error::Error for TransitionError {}

/// Apply `action` to the current attempt for a pair, producing the record to store.
///
/// | from | contact | await | decline | confirm |
/// |---|---|---|---|---|
/// | absent | contacted | - | - | - |
/// | contacted | - | pending | declined | confirmed |
/// | pending | - | - | declined | confirmed |
/// | declined | contacted (overwrite) | - | - | - |
/// | confirmed | - | - | - | - |
pub fn transition(
    job_id: &JobId,
    interpreter_id: &InterpreterId,
    current: Option<&AssignmentAttempt>,
    action: OutreachAction,
    now: DateTime<Utc>,
    notes: Option<String>,
) -> Result<AssignmentAttempt, TransitionError> {
    let from = current.map(|attempt| attempt.status);
    let refused = TransitionError { action, from };

    match (action, current) {
        (OutreachAction::Contact, None) => Ok(AssignmentAttempt {
            job_id: job_id.clone(),
            interpreter_id: interpreter_id.clone(),
            status: AttemptStatus::Contacted,
            contacted_at: now,
            responded_at: None,
            notes,
        }),
        (OutreachAction::Contact, Some(attempt)) if attempt.status == AttemptStatus::Declined => {
            Ok(AssignmentAttempt {
                status: AttemptStatus::Contacted,
                contacted_at: now,
                responded_at: None,
                notes: notes.or_else(|| attempt.notes.clone()),
                ..attempt.clone()
            })
        }
        (OutreachAction::AwaitResponse, Some(attempt))
            if attempt.status == AttemptStatus::Contacted =>
        {
            Ok(AssignmentAttempt {
                status: AttemptStatus::Pending,
                notes: notes.or_else(|| attempt.notes.clone()),
                ..attempt.clone()
            })
        }
        (OutreachAction::Decline, Some(attempt)) if attempt.status.is_awaiting_response() => {
            Ok(responded(attempt, AttemptStatus::Declined, now, notes))
        }
        (OutreachAction::Confirm, Some(attempt)) if attempt.status.is_awaiting_response() => {
            Ok(responded(attempt, AttemptStatus::Confirmed, now, notes))
        }
        _ => Err(refused),
    }
}

fn responded(
    attempt: &AssignmentAttempt,
    status: AttemptStatus,
    now: DateTime<Utc>,
    notes: Option<String>,
) -> AssignmentAttempt {
    AssignmentAttempt {
        status,
        responded_at: Some(now),
        notes: notes.or_else(|| attempt.notes.clone()),
        ..attempt.clone()
    }
}

/// Attempts for one job grouped the way operators read them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptGroups {
    pub pending: Vec<AssignmentAttempt>,
    pub confirmed: Vec<AssignmentAttempt>,
    pub declined: Vec<AssignmentAttempt>,
}

impl AttemptGroups {
    pub fn from_attempts(attempts: Vec<AssignmentAttempt>) -> Self {
        let mut groups = Self::default();
        for attempt in attempts {
            match attempt.status {
                AttemptStatus::Contacted | AttemptStatus::Pending => groups.pending.push(attempt),
                AttemptStatus::Confirmed => groups.confirmed.push(attempt),
                AttemptStatus::Declined => groups.declined.push(attempt),
            }
        }
        for group in [
            &mut groups.pending,
            &mut groups.confirmed,
            &mut groups.declined,
        ] {
            group.sort_by(|a, b| {
                a.contacted_at
                    .cmp(&b.contacted_at)
                    .then_with(|| a.interpreter_id.cmp(&b.interpreter_id))
            });
        }
        groups
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.confirmed.is_empty() && self.declined.is_empty()
    }
}

/// Outreach view for a job: grouped attempts plus ranked candidates nobody has contacted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutreachBoard {
    pub job_id: JobId,
    pub attempts: AttemptGroups,
    pub not_contacted: Vec<RankedInterpreter>,
}

/// Ranked list minus every interpreter with any attempt record, keeping rank order.
pub fn not_yet_contacted(
    eligible: &[RankedInterpreter],
    attempts: &[AssignmentAttempt],
) -> Vec<RankedInterpreter> {
    let attempted: BTreeSet<&InterpreterId> =
        attempts.iter().map(|attempt| &attempt.interpreter_id).collect();
    eligible
        .iter()
        .filter(|candidate| !attempted.contains(&candidate.interpreter_id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 2, 15, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn ids() -> (JobId, InterpreterId) {
        (JobId("job-1".to_string()), InterpreterId("int-1".to_string()))
    }

    fn contacted() -> AssignmentAttempt {
        let (job, interpreter) = ids();
        transition(
            &job,
            &interpreter,
            None,
            OutreachAction::Contact,
            now(),
            Some("left voicemail".to_string()),
        )
        .expect("first contact allowed")
    }

    #[test]
    fn contact_creates_attempt_with_timestamp() {
        let attempt = contacted();
        assert_eq!(attempt.status, AttemptStatus::Contacted);
        assert_eq!(attempt.contacted_at, now());
        assert!(attempt.responded_at.is_none());
        assert_eq!(attempt.notes.as_deref(), Some("left voicemail"));
    }

    #[test]
    fn contacting_twice_is_refused() {
        let (job, interpreter) = ids();
        let attempt = contacted();
        let err = transition(
            &job,
            &interpreter,
            Some(&attempt),
            OutreachAction::Contact,
            now(),
            None,
        )
        .expect_err("second contact refused");
        assert_eq!(err.from, Some(AttemptStatus::Contacted));
        assert!(err.to_string().contains("contacted"));
    }

    #[test]
    fn confirm_without_attempt_is_refused() {
        let (job, interpreter) = ids();
        let err = transition(&job, &interpreter, None, OutreachAction::Confirm, now(), None)
            .expect_err("confirm needs prior contact");
        assert_eq!(err.from, None);
        assert!(err.to_string().contains("not started"));
    }

    #[test]
    fn contacted_can_resolve_directly() {
        let (job, interpreter) = ids();
        let later = now() + Duration::minutes(30);
        let attempt = contacted();

        let declined = transition(
            &job,
            &interpreter,
            Some(&attempt),
            OutreachAction::Decline,
            later,
            None,
        )
        .expect("decline allowed");
        assert_eq!(declined.status, AttemptStatus::Declined);
        assert_eq!(declined.responded_at, Some(later));
        assert_eq!(declined.notes.as_deref(), Some("left voicemail"));

        let confirmed = transition(
            &job,
            &interpreter,
            Some(&attempt),
            OutreachAction::Confirm,
            later,
            Some("accepted by phone".to_string()),
        )
        .expect("confirm allowed");
        assert_eq!(confirmed.status, AttemptStatus::Confirmed);
        assert_eq!(confirmed.notes.as_deref(), Some("accepted by phone"));
    }

    #[test]
    fn pending_only_follows_contacted() {
        let (job, interpreter) = ids();
        let pending = transition(
            &job,
            &interpreter,
            Some(&contacted()),
            OutreachAction::AwaitResponse,
            now(),
            None,
        )
        .expect("pending allowed");
        assert_eq!(pending.status, AttemptStatus::Pending);

        let again = transition(
            &job,
            &interpreter,
            Some(&pending),
            OutreachAction::AwaitResponse,
            now(),
            None,
        );
        assert!(again.is_err());

        let confirmed = transition(
            &job,
            &interpreter,
            Some(&pending),
            OutreachAction::Confirm,
            now(),
            None,
        )
        .expect("pending can be confirmed");
        assert_eq!(confirmed.status, AttemptStatus::Confirmed);
    }

    #[test]
    fn recontact_after_decline_overwrites() {
        let (job, interpreter) = ids();
        let declined = transition(
            &job,
            &interpreter,
            Some(&contacted()),
            OutreachAction::Decline,
            now(),
            None,
        )
        .expect("decline allowed");

        let later = now() + Duration::hours(3);
        let recontacted = transition(
            &job,
            &interpreter,
            Some(&declined),
            OutreachAction::Contact,
            later,
            None,
        )
        .expect("recontact allowed");
        assert_eq!(recontacted.status, AttemptStatus::Contacted);
        assert_eq!(recontacted.contacted_at, later);
        assert!(recontacted.responded_at.is_none());
    }

    #[test]
    fn resolved_attempts_are_final() {
        let (job, interpreter) = ids();
        let confirmed = transition(
            &job,
            &interpreter,
            Some(&contacted()),
            OutreachAction::Confirm,
            now(),
            None,
        )
        .expect("confirm allowed");

        for action in [
            OutreachAction::Contact,
            OutreachAction::AwaitResponse,
            OutreachAction::Decline,
            OutreachAction::Confirm,
        ] {
            assert!(
                transition(&job, &interpreter, Some(&confirmed), action, now(), None).is_err(),
                "{action:?} must be refused after confirmation"
            );
        }
    }

    #[test]
    fn groups_fold_contacted_into_pending() {
        let (job, _) = ids();
        let make = |id: &str, status: AttemptStatus, minutes: i64| AssignmentAttempt {
            job_id: job.clone(),
            interpreter_id: InterpreterId(id.to_string()),
            status,
            contacted_at: now() + Duration::minutes(minutes),
            responded_at: None,
            notes: None,
        };

        let groups = AttemptGroups::from_attempts(vec![
            make("c", AttemptStatus::Pending, 5),
            make("a", AttemptStatus::Contacted, 0),
            make("b", AttemptStatus::Declined, 1),
            make("d", AttemptStatus::Confirmed, 2),
        ]);

        let pending: Vec<_> = groups
            .pending
            .iter()
            .map(|attempt| attempt.interpreter_id.0.as_str())
            .collect();
        assert_eq!(pending, vec!["a", "c"]);
        assert_eq!(groups.declined.len(), 1);
        assert_eq!(groups.confirmed.len(), 1);
        assert!(!groups.is_empty());
    }
}
