use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::matching::ScoringConfig;

/// Engine dials loaded alongside the application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// Interpreters who declined a job this close to another job are not recontacted for it.
    pub recontact_window_minutes: u32,
    /// Minimum duration of a job carrying more than one client request.
    pub multi_language_duration_minutes: u32,
    pub scoring: ScoringConfig,
}

impl SchedulingConfig {
    pub fn recontact_window(&self) -> Duration {
        Duration::minutes(i64::from(self.recontact_window_minutes))
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            recontact_window_minutes: 120,
            multi_language_duration_minutes: 180,
            scoring: ScoringConfig::default(),
        }
    }
}
