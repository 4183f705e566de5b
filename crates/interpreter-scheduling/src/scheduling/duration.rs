use serde::{Deserialize, Serialize};

/// Duration change a caller must acknowledge before another client request is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationAdjustment {
    pub current_minutes: u32,
    pub proposed_minutes: u32,
}

impl DurationAdjustment {
    pub fn warning(&self) -> String {
        format!(
            "adding another language changes the job duration from {} to {} minutes",
            self.current_minutes, self.proposed_minutes
        )
    }
}

/// A job gaining its second (or later) request must run at least `threshold_minutes`.
pub fn required_adjustment(
    existing_requests: usize,
    current_minutes: u32,
    threshold_minutes: u32,
) -> Option<DurationAdjustment> {
    if existing_requests == 0 || current_minutes >= threshold_minutes {
        return None;
    }

    Some(DurationAdjustment {
        current_minutes,
        proposed_minutes: threshold_minutes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_request_never_adjusts() {
        assert_eq!(required_adjustment(0, 60, 180), None);
    }

    #[test]
    fn second_request_raises_short_jobs() {
        let adjustment = required_adjustment(1, 120, 180).expect("adjustment required");
        assert_eq!(adjustment.current_minutes, 120);
        assert_eq!(adjustment.proposed_minutes, 180);
        assert!(adjustment.warning().contains("from 120 to 180"));
    }

    #[test]
    fn long_jobs_are_left_alone() {
        assert_eq!(required_adjustment(1, 180, 180), None);
        assert_eq!(required_adjustment(3, 240, 180), None);
    }
}
