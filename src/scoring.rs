//! Risk scoring
//!
//! Turns a completed check-in into a risk classification and a ranked list of
//! contributing factors. Everything here is a pure function of its inputs.
//!
//! The wellbeing score is a weighted average of the five axes with stress
//! inverted so that "higher = better" holds on every axis; the risk score is
//! its complement. Contributors are emitted only for axes past their
//! deficiency trigger and are normalized relative to each other.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{CheckinData, ContextData, SLIDER_MAX, SLIDER_NEUTRAL};

/// Weight of sleep consistency in the wellbeing score
pub const SLEEP_WEIGHT: f64 = 0.25;
/// Weight of (inverted) stress in the wellbeing score
pub const STRESS_WEIGHT: f64 = 0.25;
/// Weight of mood stability in the wellbeing score
pub const MOOD_WEIGHT: f64 = 0.2;
/// Weight of routine regularity in the wellbeing score
pub const ROUTINE_WEIGHT: f64 = 0.15;
/// Weight of recovery feeling in the wellbeing score
pub const RECOVERY_WEIGHT: f64 = 0.15;

/// Risk scores below this are `Low`
pub const MEDIUM_THRESHOLD: f64 = 35.0;
/// Risk scores at or above this are `High`
pub const HIGH_THRESHOLD: f64 = 60.0;

/// Maximum number of contributors reported
pub const MAX_CONTRIBUTORS: usize = 4;

/// Raw magnitude added per selected influence tag
pub const CONTEXT_WEIGHT_PER_TAG: i64 = 8;

/// Risk classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Classify a risk score using half-open bands; boundaries go to the higher band
    pub fn from_score(risk_score: f64) -> Self {
        if risk_score < MEDIUM_THRESHOLD {
            RiskLevel::Low
        } else if risk_score < HIGH_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }

    /// Short message shown under the level gauge
    pub fn message(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Looking good! Keep up the healthy habits.",
            RiskLevel::Medium => "Some areas need attention.",
            RiskLevel::High => "Consider taking extra care of yourself.",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of risk classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Weighted wellbeing score (0-100, higher = better)
    pub wellbeing_score: f64,
    /// Complement of the wellbeing score (0-100, higher = worse)
    pub risk_score: f64,
    pub level: RiskLevel,
}

/// Named factor that can explain part of an elevated risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributorKind {
    Sleep,
    Stress,
    Routine,
    Context,
    Mood,
    Recovery,
}

impl ContributorKind {
    /// Evaluation order; also the tie-break order
    pub const ORDER: [ContributorKind; 6] = [
        ContributorKind::Sleep,
        ContributorKind::Stress,
        ContributorKind::Routine,
        ContributorKind::Context,
        ContributorKind::Mood,
        ContributorKind::Recovery,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ContributorKind::Sleep => "Sleep inconsistency",
            ContributorKind::Stress => "Elevated stress",
            ContributorKind::Routine => "Routine disruption",
            ContributorKind::Context => "Context factors",
            ContributorKind::Mood => "Mood fluctuations",
            ContributorKind::Recovery => "Poor recovery",
        }
    }
}

/// A contributor with its magnitude.
///
/// Straight out of [`raw_contributors`] `value` is the raw magnitude; after
/// [`rank_contributors`] it is a percentage of the triggered total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub kind: ContributorKind,
    pub name: String,
    pub value: i64,
}

impl Contributor {
    fn new(kind: ContributorKind, value: i64) -> Self {
        Self {
            kind,
            name: kind.label().to_string(),
            value,
        }
    }
}

/// Round half up, matching how slider-derived magnitudes have always been rounded
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Compute the wellbeing and risk scores and classify them.
///
/// Inputs are clamped to [0, 100] first since stored records are not
/// schema-validated.
pub fn assess_risk(data: &CheckinData) -> RiskAssessment {
    let data = data.clamped();
    let normalized_stress = f64::from(SLIDER_MAX - data.stress_level);

    let wellbeing_score = f64::from(data.sleep_consistency) * SLEEP_WEIGHT
        + normalized_stress * STRESS_WEIGHT
        + f64::from(data.mood_stability) * MOOD_WEIGHT
        + f64::from(data.routine_regularity) * ROUTINE_WEIGHT
        + f64::from(data.recovery_feeling) * RECOVERY_WEIGHT;

    let risk_score = 100.0 - wellbeing_score;

    RiskAssessment {
        wellbeing_score,
        risk_score,
        level: RiskLevel::from_score(risk_score),
    }
}

/// Triggered contributors with raw magnitudes, in evaluation order
pub fn raw_contributors(data: &CheckinData, context: &ContextData) -> Vec<Contributor> {
    let data = data.clamped();
    let mut contributors = Vec::new();

    for kind in ContributorKind::ORDER {
        let raw = match kind {
            ContributorKind::Sleep => deficit(data.sleep_consistency, 0.8),
            ContributorKind::Stress => {
                (data.stress_level > SLIDER_NEUTRAL)
                    .then(|| round_half_up(f64::from(data.stress_level - SLIDER_NEUTRAL) * 0.8))
            }
            ContributorKind::Routine => deficit(data.routine_regularity, 0.6),
            ContributorKind::Context => context
                .has_context_factors()
                .then(|| context.influences.len() as i64 * CONTEXT_WEIGHT_PER_TAG),
            ContributorKind::Mood => deficit(data.mood_stability, 0.5),
            ContributorKind::Recovery => deficit(data.recovery_feeling, 0.5),
        };

        if let Some(value) = raw {
            contributors.push(Contributor::new(kind, value));
        }
    }

    contributors
}

/// Magnitude of an axis sitting below the neutral midpoint
fn deficit(value: i32, factor: f64) -> Option<i64> {
    (value < SLIDER_NEUTRAL).then(|| round_half_up(f64::from(SLIDER_NEUTRAL - value) * factor))
}

/// Ranked contributors as percentages of the triggered total, at most four.
///
/// The divisor is the sum of the triggered magnitudes only (minimum 1), so
/// percentages are relative to each other rather than to an absolute scale.
/// Truncation keeps evaluation order, not the largest values.
pub fn rank_contributors(data: &CheckinData, context: &ContextData) -> Vec<Contributor> {
    let raw = raw_contributors(data, context);
    let total = raw.iter().map(|c| c.value).sum::<i64>().max(1) as f64;

    raw.into_iter()
        .map(|c| Contributor {
            value: round_half_up(c.value as f64 / total * 100.0),
            ..c
        })
        .take(MAX_CONTRIBUTORS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CheckinField, Influence};
    use pretty_assertions::assert_eq;

    fn checkin(sleep: i32, stress: i32, mood: i32, routine: i32, recovery: i32) -> CheckinData {
        CheckinData {
            sleep_consistency: sleep,
            stress_level: stress,
            mood_stability: mood,
            routine_regularity: routine,
            recovery_feeling: recovery,
        }
    }

    fn values(contributors: &[Contributor]) -> Vec<(ContributorKind, i64)> {
        contributors.iter().map(|c| (c.kind, c.value)).collect()
    }

    #[test]
    fn test_neutral_checkin_is_medium_with_no_contributors() {
        let data = CheckinData::default();
        let assessment = assess_risk(&data);

        assert!((assessment.wellbeing_score - 50.0).abs() < 1e-9);
        assert!((assessment.risk_score - 50.0).abs() < 1e-9);
        assert_eq!(assessment.level, RiskLevel::Medium);
        assert!(rank_contributors(&data, &ContextData::default()).is_empty());
    }

    #[test]
    fn test_poor_checkin_scenario() {
        let data = checkin(20, 90, 30, 20, 20);
        let assessment = assess_risk(&data);

        assert!((assessment.wellbeing_score - 19.5).abs() < 1e-9);
        assert!((assessment.risk_score - 80.5).abs() < 1e-9);
        assert_eq!(assessment.level, RiskLevel::High);

        let raw = raw_contributors(&data, &ContextData::default());
        assert_eq!(
            values(&raw),
            vec![
                (ContributorKind::Sleep, 24),
                (ContributorKind::Stress, 32),
                (ContributorKind::Routine, 18),
                (ContributorKind::Mood, 10),
                (ContributorKind::Recovery, 15),
            ]
        );

        let ranked = rank_contributors(&data, &ContextData::default());
        assert_eq!(
            values(&ranked),
            vec![
                (ContributorKind::Sleep, 24),
                (ContributorKind::Stress, 32),
                (ContributorKind::Routine, 18),
                (ContributorKind::Mood, 10),
            ]
        );
        assert_eq!(ranked[1].name, "Elevated stress");
    }

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(34.999), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(35.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(59.999), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(60.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(100.0), RiskLevel::High);
    }

    #[test]
    fn test_extremes_stay_in_range() {
        let best = assess_risk(&checkin(100, 0, 100, 100, 100));
        assert!(best.risk_score.abs() < 1e-9);
        assert_eq!(best.level, RiskLevel::Low);

        let worst = assess_risk(&checkin(0, 100, 0, 0, 0));
        assert!((worst.risk_score - 100.0).abs() < 1e-9);
        assert_eq!(worst.level, RiskLevel::High);
    }

    #[test]
    fn test_risk_score_bounded_across_grid() {
        for v in (0..=100).step_by(10) {
            for stress in (0..=100).step_by(25) {
                let assessment = assess_risk(&checkin(v, stress, 100 - v, v, 50));
                assert!(assessment.risk_score >= -1e-9 && assessment.risk_score <= 100.0 + 1e-9);
            }
        }
    }

    #[test]
    fn test_out_of_range_inputs_are_clamped() {
        let wild = checkin(-40, 400, 50, 50, 50);
        let clamped = checkin(0, 100, 50, 50, 50);

        assert_eq!(assess_risk(&wild), assess_risk(&clamped));
        assert_eq!(
            rank_contributors(&wild, &ContextData::default()),
            rank_contributors(&clamped, &ContextData::default())
        );
    }

    #[test]
    fn test_triggers_are_strict() {
        let data = CheckinData::default()
            .with_value(CheckinField::SleepConsistency, 49)
            .with_value(CheckinField::StressLevel, 51);
        let raw = raw_contributors(&data, &ContextData::default());

        // 1 * 0.8 rounds to 1 for both
        assert_eq!(
            values(&raw),
            vec![(ContributorKind::Sleep, 1), (ContributorKind::Stress, 1)]
        );
    }

    #[test]
    fn test_half_values_round_up() {
        // (50 - 45) * 0.5 = 2.5
        let data = CheckinData::default().with_value(CheckinField::MoodStability, 45);
        let raw = raw_contributors(&data, &ContextData::default());
        assert_eq!(values(&raw), vec![(ContributorKind::Mood, 3)]);
    }

    #[test]
    fn test_context_contributor() {
        let context = ContextData::default()
            .toggled(Influence::Exams)
            .toggled(Influence::Deadlines);
        let raw = raw_contributors(&CheckinData::default(), &context);
        assert_eq!(values(&raw), vec![(ContributorKind::Context, 16)]);

        let ranked = rank_contributors(&CheckinData::default(), &context);
        assert_eq!(values(&ranked), vec![(ContributorKind::Context, 100)]);
    }

    #[test]
    fn test_none_tag_never_contributes() {
        let context = ContextData::default().toggled(Influence::None);
        assert!(raw_contributors(&CheckinData::default(), &context).is_empty());
    }

    #[test]
    fn test_context_sits_between_routine_and_mood() {
        let data = checkin(40, 50, 40, 40, 50);
        let context = ContextData::default().toggled(Influence::Travel);
        let kinds: Vec<ContributorKind> = raw_contributors(&data, &context)
            .iter()
            .map(|c| c.kind)
            .collect();

        assert_eq!(
            kinds,
            vec![
                ContributorKind::Sleep,
                ContributorKind::Routine,
                ContributorKind::Context,
                ContributorKind::Mood,
            ]
        );
    }

    #[test]
    fn test_truncation_keeps_evaluation_order_not_magnitude() {
        // Recovery has the largest raw magnitude but is evaluated last
        let data = checkin(49, 51, 49, 49, 0);
        let context = ContextData::default().toggled(Influence::Health);
        let ranked = rank_contributors(&data, &context);

        assert_eq!(ranked.len(), MAX_CONTRIBUTORS);
        assert!(ranked.iter().all(|c| c.kind != ContributorKind::Recovery));
    }

    #[test]
    fn test_percentages_sum_to_hundred_without_truncation() {
        let data = checkin(30, 70, 50, 50, 50);
        let ranked = rank_contributors(&data, &ContextData::default());

        assert_eq!(values(&ranked), vec![(ContributorKind::Sleep, 50), (ContributorKind::Stress, 50)]);
        assert_eq!(ranked.iter().map(|c| c.value).sum::<i64>(), 100);
    }

    #[test]
    fn test_contributor_values_non_negative_and_bounded() {
        for sleep in (0..=100).step_by(20) {
            for stress in (0..=100).step_by(20) {
                let data = checkin(sleep, stress, 100 - sleep, stress, sleep);
                let ranked = rank_contributors(&data, &ContextData::default());
                assert!(ranked.len() <= MAX_CONTRIBUTORS);
                assert!(ranked.iter().all(|c| c.value >= 0 && c.value <= 100));
            }
        }
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let data = checkin(12, 77, 34, 56, 21);
        let context = ContextData::default().toggled(Influence::Family);

        assert_eq!(assess_risk(&data), assess_risk(&data));
        assert_eq!(rank_contributors(&data, &context), rank_contributors(&data, &context));
    }
}
