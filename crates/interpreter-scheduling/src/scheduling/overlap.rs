use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// True when the half-open ranges `[a_start, a_end)` and `[b_start, b_end)` share an instant.
/// Ranges that merely touch at an endpoint do not overlap.
pub fn overlaps<T: PartialOrd>(a_start: T, a_end: T, b_start: T, b_end: T) -> bool {
    a_start < b_end && b_start < a_end
}

/// Half-open time range used for job windows and unavailability blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        overlaps(self.start, self.end, other.start, other.end)
    }

    /// The same window extended by `margin` on both sides.
    pub fn widened(&self, margin: Duration) -> TimeWindow {
        TimeWindow {
            start: self.start - margin,
            end: self.end + margin,
        }
    }
}
