//! Results report
//!
//! Assembles everything the results screen shows from a session snapshot: the
//! risk assessment, ranked contributors, chart series and feedback state.
//!
//! The report is rebuilt from the current state every time it is requested.
//! A few values are illustrative decoration only (the trend history, the
//! 7-day projection and the confidence figure); none of them feed back into the
//! assessment or the contributors.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CheckinError;
use crate::scoring::{assess_risk, rank_contributors, Contributor, RiskAssessment, RiskLevel};
use crate::types::{Accuracy, AppState, CheckinData, ContextData, FeedbackData, SLIDER_MAX};
use crate::{PRODUCER_NAME, SILENTRISK_VERSION};

/// Shown when no contributor triggers
pub const NO_FACTORS_MESSAGE: &str = "Great news! No significant risk factors detected.";

/// Shown once the user has answered the accuracy question
pub const FEEDBACK_THANKS: &str = "Thanks for your feedback! This helps improve future insights.";

/// Footer shown on every report
pub const DISCLAIMER: &str =
    "SilentRisk is not a medical tool. If concerns persist, consider professional help.";

/// Caption under the projection
pub const PROJECTION_NOTE: &str = "Projection, not diagnosis.";

/// Lowest decorative confidence value
pub const CONFIDENCE_BASE: u32 = 68;
/// Width of the decorative confidence range
pub const CONFIDENCE_SPREAD: u32 = 15;

/// Illustrative history shown before today's point: (day, stress, sleep)
const TREND_HISTORY: [(&str, i32, i32); 6] = [
    ("Mon", 45, 65),
    ("Tue", 52, 58),
    ("Wed", 48, 62),
    ("Thu", 60, 55),
    ("Fri", 55, 60),
    ("Sat", 40, 70),
];

/// Report producer metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
}

/// One axis of the behavior balance radar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadarAxis {
    pub subject: String,
    pub value: i32,
    pub full_mark: i32,
}

/// One day of the stress/sleep trend chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub day: String,
    pub stress: i32,
    pub sleep: i32,
}

/// "What if this continues?" projection (illustrative)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    pub current: RiskLevel,
    pub projected: RiskLevel,
    pub horizon_days: u32,
    pub note: String,
}

/// Feedback state for the accuracy question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackSummary {
    pub accuracy: Option<Accuracy>,
    /// Thank-you note, present once an answer was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledgement: Option<String>,
}

/// Everything the results screen renders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsReport {
    pub report_id: String,
    pub producer: ReportProducer,
    pub computed_at_utc: DateTime<Utc>,
    pub assessment: RiskAssessment,
    /// Message matching the risk level
    pub headline: String,
    pub contributors: Vec<Contributor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_factors_message: Option<String>,
    pub radar: Vec<RadarAxis>,
    /// Illustrative history plus today's point
    pub trend: Vec<TrendPoint>,
    pub projection: Projection,
    /// Decorative display value, not derived from the inputs
    pub confidence_pct: u32,
    pub feedback: FeedbackSummary,
    pub disclaimer: String,
}

impl ResultsReport {
    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, CheckinError> {
        serde_json::to_string_pretty(self).map_err(CheckinError::JsonError)
    }
}

/// Level shown for the 7-day "if this continues" projection
pub fn projected_level(level: RiskLevel) -> RiskLevel {
    match level {
        RiskLevel::Low => RiskLevel::Medium,
        RiskLevel::Medium | RiskLevel::High => RiskLevel::High,
    }
}

/// Radar axes from the check-in answers (stress is shown as answered, not inverted)
pub fn radar_axes(data: &CheckinData) -> Vec<RadarAxis> {
    let data = data.clamped();
    [
        ("Sleep", data.sleep_consistency),
        ("Stress", data.stress_level),
        ("Mood", data.mood_stability),
        ("Routine", data.routine_regularity),
        ("Recovery", data.recovery_feeling),
    ]
    .into_iter()
    .map(|(subject, value)| RadarAxis {
        subject: subject.to_string(),
        value,
        full_mark: SLIDER_MAX,
    })
    .collect()
}

/// Trend series: the fixed illustrative week followed by today's answers
pub fn trend_series(data: &CheckinData) -> Vec<TrendPoint> {
    let data = data.clamped();
    let today = TrendPoint {
        day: "Today".to_string(),
        stress: SLIDER_MAX - data.stress_level,
        sleep: data.sleep_consistency,
    };

    TREND_HISTORY
        .iter()
        .map(|(day, stress, sleep)| TrendPoint {
            day: day.to_string(),
            stress: *stress,
            sleep: *sleep,
        })
        .chain(std::iter::once(today))
        .collect()
}

/// Builds [`ResultsReport`]s; owns the RNG behind the decorative confidence value
pub struct ReportBuilder {
    rng: StdRng,
    instance_id: Option<String>,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportBuilder {
    /// Builder with an OS-seeded RNG and fresh report ids
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            instance_id: None,
        }
    }

    /// Builder with a fixed seed, for reproducible decoration
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            instance_id: None,
        }
    }

    /// Use a fixed report id instead of a fresh UUID per report
    pub fn with_report_id(mut self, id: impl Into<String>) -> Self {
        self.instance_id = Some(id.into());
        self
    }

    /// Build the report for a full session snapshot
    pub fn build(&mut self, state: &AppState) -> ResultsReport {
        self.build_parts(&state.checkin_data, &state.context_data, &state.feedback_data)
    }

    /// Build a report straight from check-in and context data
    pub fn build_parts(
        &mut self,
        checkin: &CheckinData,
        context: &ContextData,
        feedback: &FeedbackData,
    ) -> ResultsReport {
        let assessment = assess_risk(checkin);
        let contributors = rank_contributors(checkin, context);
        let no_factors_message = contributors
            .is_empty()
            .then(|| NO_FACTORS_MESSAGE.to_string());

        let confidence_pct = CONFIDENCE_BASE + self.rng.random_range(0..CONFIDENCE_SPREAD);

        ResultsReport {
            report_id: self
                .instance_id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: SILENTRISK_VERSION.to_string(),
            },
            computed_at_utc: Utc::now(),
            headline: assessment.level.message().to_string(),
            assessment,
            contributors,
            no_factors_message,
            radar: radar_axes(checkin),
            trend: trend_series(checkin),
            projection: Projection {
                current: assessment.level,
                projected: projected_level(assessment.level),
                horizon_days: 7,
                note: PROJECTION_NOTE.to_string(),
            },
            confidence_pct,
            feedback: FeedbackSummary {
                accuracy: feedback.accuracy,
                acknowledgement: feedback.accuracy.map(|_| FEEDBACK_THANKS.to_string()),
            },
            disclaimer: DISCLAIMER.to_string(),
        }
    }
}
