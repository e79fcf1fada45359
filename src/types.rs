//! Core types for a SilentRisk check-in session
//!
//! This module defines the data structures that make up the persisted session
//! record: the five check-in answers, the contextual influences, the feedback
//! answer, the active screen, and the `AppState` aggregate that owns them all.
//!
//! Field names serialize in camelCase so the stored record keeps the shape the
//! client screens read and write.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CheckinError;

/// Lowest value a check-in slider can hold
pub const SLIDER_MIN: i32 = 0;
/// Highest value a check-in slider can hold
pub const SLIDER_MAX: i32 = 100;
/// Neutral midpoint every slider starts at
pub const SLIDER_NEUTRAL: i32 = 50;

/// Clamp an externally supplied slider value into the valid range
pub fn clamp_slider(value: i32) -> i32 {
    value.clamp(SLIDER_MIN, SLIDER_MAX)
}

/// Screens of the check-in flow, in forward order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    Splash,
    Consent,
    Checkin,
    Context,
    Results,
}

impl Screen {
    /// All screens in forward order
    pub const ALL: [Screen; 5] = [
        Screen::Splash,
        Screen::Consent,
        Screen::Checkin,
        Screen::Context,
        Screen::Results,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Screen::Splash => "splash",
            Screen::Consent => "consent",
            Screen::Checkin => "checkin",
            Screen::Context => "context",
            Screen::Results => "results",
        }
    }

    /// Whether reaching this screen requires recorded consent
    pub fn requires_consent(&self) -> bool {
        matches!(self, Screen::Checkin | Screen::Context | Screen::Results)
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the five self-reported check-in axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckinField {
    SleepConsistency,
    StressLevel,
    MoodStability,
    RoutineRegularity,
    RecoveryFeeling,
}

impl CheckinField {
    /// All fields in question order
    pub const ALL: [CheckinField; 5] = [
        CheckinField::SleepConsistency,
        CheckinField::StressLevel,
        CheckinField::MoodStability,
        CheckinField::RoutineRegularity,
        CheckinField::RecoveryFeeling,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckinField::SleepConsistency => "sleepConsistency",
            CheckinField::StressLevel => "stressLevel",
            CheckinField::MoodStability => "moodStability",
            CheckinField::RoutineRegularity => "routineRegularity",
            CheckinField::RecoveryFeeling => "recoveryFeeling",
        }
    }
}

impl FromStr for CheckinField {
    type Err = CheckinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CheckinField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| CheckinError::UnknownField(s.to_string()))
    }
}

/// The five check-in answers, each in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckinData {
    /// Sleep consistency (higher = more consistent)
    pub sleep_consistency: i32,
    /// Stress slider (low = very overwhelmed, high = calm and in control)
    pub stress_level: i32,
    /// Emotional stability (higher = more stable)
    pub mood_stability: i32,
    /// Structure of the day (higher = more structured)
    pub routine_regularity: i32,
    /// How refreshed rest left the user (higher = more refreshed)
    pub recovery_feeling: i32,
}

impl Default for CheckinData {
    fn default() -> Self {
        Self {
            sleep_consistency: SLIDER_NEUTRAL,
            stress_level: SLIDER_NEUTRAL,
            mood_stability: SLIDER_NEUTRAL,
            routine_regularity: SLIDER_NEUTRAL,
            recovery_feeling: SLIDER_NEUTRAL,
        }
    }
}

impl CheckinData {
    /// Read a single field
    pub fn get(&self, field: CheckinField) -> i32 {
        match field {
            CheckinField::SleepConsistency => self.sleep_consistency,
            CheckinField::StressLevel => self.stress_level,
            CheckinField::MoodStability => self.mood_stability,
            CheckinField::RoutineRegularity => self.routine_regularity,
            CheckinField::RecoveryFeeling => self.recovery_feeling,
        }
    }

    /// Copy with one field overwritten (value is clamped)
    pub fn with_value(&self, field: CheckinField, value: i32) -> Self {
        let value = clamp_slider(value);
        let mut next = *self;
        match field {
            CheckinField::SleepConsistency => next.sleep_consistency = value,
            CheckinField::StressLevel => next.stress_level = value,
            CheckinField::MoodStability => next.mood_stability = value,
            CheckinField::RoutineRegularity => next.routine_regularity = value,
            CheckinField::RecoveryFeeling => next.recovery_feeling = value,
        }
        next
    }

    /// Copy with a partial update merged in
    pub fn merged(&self, patch: &CheckinPatch) -> Self {
        patch
            .entries()
            .into_iter()
            .fold(*self, |data, (field, value)| data.with_value(field, value))
    }

    /// Copy with every field clamped into [0, 100]
    pub fn clamped(&self) -> Self {
        Self {
            sleep_consistency: clamp_slider(self.sleep_consistency),
            stress_level: clamp_slider(self.stress_level),
            mood_stability: clamp_slider(self.mood_stability),
            routine_regularity: clamp_slider(self.routine_regularity),
            recovery_feeling: clamp_slider(self.recovery_feeling),
        }
    }
}

/// Partial check-in update; absent fields are left unchanged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckinPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_consistency: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress_level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood_stability: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routine_regularity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_feeling: Option<i32>,
}

impl CheckinPatch {
    fn entries(&self) -> Vec<(CheckinField, i32)> {
        [
            (CheckinField::SleepConsistency, self.sleep_consistency),
            (CheckinField::StressLevel, self.stress_level),
            (CheckinField::MoodStability, self.mood_stability),
            (CheckinField::RoutineRegularity, self.routine_regularity),
            (CheckinField::RecoveryFeeling, self.recovery_feeling),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
        .collect()
    }
}

/// Contextual influence tag from the fixed vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Influence {
    Exams,
    Deadlines,
    Travel,
    Health,
    Family,
    /// Explicit "nothing in particular"; exclusive with every other tag
    None,
}

impl Influence {
    /// All tags in display order
    pub const ALL: [Influence; 6] = [
        Influence::Exams,
        Influence::Deadlines,
        Influence::Travel,
        Influence::Health,
        Influence::Family,
        Influence::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Influence::Exams => "exams",
            Influence::Deadlines => "deadlines",
            Influence::Travel => "travel",
            Influence::Health => "health",
            Influence::Family => "family",
            Influence::None => "none",
        }
    }

    /// Human-readable chip label
    pub fn label(&self) -> &'static str {
        match self {
            Influence::Exams => "Exams",
            Influence::Deadlines => "Deadlines",
            Influence::Travel => "Travel",
            Influence::Health => "Health",
            Influence::Family => "Family",
            Influence::None => "None",
        }
    }
}

impl FromStr for Influence {
    type Err = CheckinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Influence::ALL
            .into_iter()
            .find(|tag| tag.as_str() == needle)
            .ok_or_else(|| CheckinError::UnknownInfluence(s.to_string()))
    }
}

/// Contextual influences plus free-form notes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextData {
    /// Selected tags in selection order
    pub influences: Vec<Influence>,
    /// Advisory notes; never read by scoring
    pub additional_notes: String,
}

impl ContextData {
    pub fn contains(&self, tag: Influence) -> bool {
        self.influences.contains(&tag)
    }

    /// Copy with `tag` toggled, keeping `none` exclusive with every other tag
    pub fn toggled(&self, tag: Influence) -> Self {
        let influences = if tag == Influence::None {
            if self.contains(Influence::None) {
                Vec::new()
            } else {
                vec![Influence::None]
            }
        } else {
            let mut filtered: Vec<Influence> = self
                .influences
                .iter()
                .copied()
                .filter(|i| *i != Influence::None)
                .collect();
            if filtered.contains(&tag) {
                filtered.retain(|i| *i != tag);
            } else {
                filtered.push(tag);
            }
            filtered
        };

        Self {
            influences,
            additional_notes: self.additional_notes.clone(),
        }
    }

    /// Copy with the influence list replaced, deduplicated and made exclusive
    pub fn with_influences(&self, influences: &[Influence]) -> Self {
        Self {
            influences: normalize_influences(influences),
            additional_notes: self.additional_notes.clone(),
        }
    }

    /// Copy with the notes replaced
    pub fn with_notes(&self, notes: impl Into<String>) -> Self {
        Self {
            influences: self.influences.clone(),
            additional_notes: notes.into(),
        }
    }

    /// Whether any real influence (not `none`) is selected
    pub fn has_context_factors(&self) -> bool {
        !self.influences.is_empty() && !self.contains(Influence::None)
    }
}

/// Deduplicate preserving first occurrence; drop `none` if any other tag is present
fn normalize_influences(influences: &[Influence]) -> Vec<Influence> {
    let mut out: Vec<Influence> = Vec::with_capacity(influences.len());
    for tag in influences {
        if !out.contains(tag) {
            out.push(*tag);
        }
    }
    if out.len() > 1 {
        out.retain(|i| *i != Influence::None);
    }
    out
}

/// User agreement with the shown result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accuracy {
    Yes,
    Somewhat,
    No,
}

impl Accuracy {
    pub const ALL: [Accuracy; 3] = [Accuracy::Yes, Accuracy::Somewhat, Accuracy::No];

    pub fn as_str(&self) -> &'static str {
        match self {
            Accuracy::Yes => "yes",
            Accuracy::Somewhat => "somewhat",
            Accuracy::No => "no",
        }
    }
}

impl FromStr for Accuracy {
    type Err = CheckinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Accuracy::ALL
            .into_iter()
            .find(|a| a.as_str() == needle)
            .ok_or_else(|| CheckinError::UnknownField(format!("accuracy '{s}'")))
    }
}

/// Feedback on the results screen; informational only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackData {
    pub accuracy: Option<Accuracy>,
}

/// The whole session: single source of truth, persisted after every change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub current_screen: Screen,
    pub checkin_data: CheckinData,
    pub context_data: ContextData,
    pub feedback_data: FeedbackData,
    /// Sticky once set; cleared only by a reset
    pub has_consented: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            current_screen: Screen::Splash,
            checkin_data: CheckinData::default(),
            context_data: ContextData::default(),
            feedback_data: FeedbackData::default(),
            has_consented: false,
        }
    }
}

impl AppState {
    /// Re-establish invariants on a record that came from outside.
    ///
    /// Identity for every state the update operations can produce.
    pub fn sanitized(self) -> Self {
        let current_screen = if self.current_screen.requires_consent() && !self.has_consented {
            Screen::Consent
        } else {
            self.current_screen
        };

        Self {
            current_screen,
            checkin_data: self.checkin_data.clamped(),
            context_data: self.context_data.with_influences(&self.context_data.influences),
            feedback_data: self.feedback_data,
            has_consented: self.has_consented,
        }
    }
}
