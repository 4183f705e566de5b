use serde::{Deserialize, Serialize};

/// Weights applied to interpreters that clear every eligibility gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub certified_score: i32,
    pub registered_score: i32,
    pub proficiency_weight: i32,
    /// Worst proficiency rank that still earns a bonus; rank 1 is best.
    pub proficiency_ceiling: i32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            certified_score: 100,
            registered_score: 50,
            proficiency_weight: 5,
            proficiency_ceiling: 5,
        }
    }
}
