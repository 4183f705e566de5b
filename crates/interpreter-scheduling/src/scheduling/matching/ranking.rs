use std::cmp::Ordering;

use super::super::domain::CertificationTier;
use super::config::ScoringConfig;
use super::eligibility::Qualification;

/// Base tier score plus the clamped proficiency bonus, with the reason trail extended.
pub(crate) fn score(qualification: &Qualification, config: &ScoringConfig) -> (i32, Vec<String>) {
    let mut reasons = qualification.reasons.clone();
    let mut total = match qualification.certification {
        CertificationTier::Certified => config.certified_score,
        CertificationTier::Registered => config.registered_score,
    };

    if let Some(rank) = qualification.proficiency_rank {
        let bonus = proficiency_bonus(rank, config);
        total += bonus;
        reasons.push(format!("Proficiency rank {rank} (+{bonus})"));
    }

    (total, reasons)
}

/// `(ceiling - rank) * weight` with the rank held inside `1..=ceiling`.
pub(crate) fn proficiency_bonus(rank: i32, config: &ScoringConfig) -> i32 {
    let ceiling = config.proficiency_ceiling.max(1);
    let rank = rank.clamp(1, ceiling);
    (ceiling - rank) * config.proficiency_weight
}

/// Ranking order: any preference rank beats none, lower preference rank wins, then higher
/// score, then interpreter id so equal entries always land in the same place.
pub fn compare(a: &super::RankedInterpreter, b: &super::RankedInterpreter) -> Ordering {
    let by_preference = match (a.preference_rank, b.preference_rank) {
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(left), Some(right)) => left.cmp(&right),
        (None, None) => Ordering::Equal,
    };

    by_preference
        .then_with(|| b.score.cmp(&a.score))
        .then_with(|| a.interpreter_id.cmp(&b.interpreter_id))
}
