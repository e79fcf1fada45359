//! Screen flow
//!
//! The check-in walks five screens in a fixed order:
//! splash → consent → checkin → context → results.
//!
//! Screen changes are driven by an explicit transition table ([`transition`]);
//! any (screen, action) pair not in the table is rejected without touching the
//! session. Inside the checkin screen a cursor walks the five questions; running
//! off either end of the question list is what moves the flow to the next or
//! previous screen.

use serde::{Deserialize, Serialize};

use crate::error::CheckinError;
use crate::report::{ReportBuilder, ResultsReport};
use crate::session::Session;
use crate::storage::StateStorage;
use crate::types::{Accuracy, AppState, CheckinField, Influence, Screen};

/// User actions that can move the flow between screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// "Get Started" on the splash screen
    GetStarted,
    /// Agree to the consent terms and continue
    AcceptConsent,
    /// One step backward
    Back,
    /// Finish the last check-in question
    CompleteCheckin,
    /// "Analyze My Risk" on the context screen
    Analyze,
    /// Discard everything and start a new check-in
    StartOver,
}

/// Side effect that accompanies a screen change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Record consent in the same snapshot as the screen change
    RecordConsent,
    /// Purge storage and return to defaults
    Reset,
}

/// Transition table: the screen `action` leads to from `from`, with its side effect
pub fn transition(from: Screen, action: Action) -> Option<(Screen, Effect)> {
    let next = match (from, action) {
        (Screen::Splash, Action::GetStarted) => (Screen::Consent, Effect::None),
        (Screen::Consent, Action::Back) => (Screen::Splash, Effect::None),
        (Screen::Consent, Action::AcceptConsent) => (Screen::Checkin, Effect::RecordConsent),
        (Screen::Checkin, Action::Back) => (Screen::Consent, Effect::None),
        (Screen::Checkin, Action::CompleteCheckin) => (Screen::Context, Effect::None),
        (Screen::Context, Action::Back) => (Screen::Checkin, Effect::None),
        (Screen::Context, Action::Analyze) => (Screen::Results, Effect::None),
        (Screen::Results, Action::StartOver) => (Screen::Splash, Effect::Reset),
        _ => return None,
    };
    Some(next)
}

/// Actions legal from `screen`
pub fn available_actions(screen: Screen) -> Vec<Action> {
    [
        Action::GetStarted,
        Action::AcceptConsent,
        Action::Back,
        Action::CompleteCheckin,
        Action::Analyze,
        Action::StartOver,
    ]
    .into_iter()
    .filter(|action| transition(screen, *action).is_some())
    .collect()
}

/// One slider question of the check-in screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Question {
    pub field: CheckinField,
    pub prompt: &'static str,
    /// Label at the 0 end of the slider
    pub low_label: &'static str,
    /// Label at the 100 end of the slider
    pub high_label: &'static str,
}

/// The check-in questions, in order
pub const QUESTIONS: [Question; 5] = [
    Question {
        field: CheckinField::SleepConsistency,
        prompt: "How consistent was your sleep last night?",
        low_label: "Poor",
        high_label: "Excellent",
    },
    Question {
        field: CheckinField::StressLevel,
        prompt: "How overwhelmed did you feel today?",
        low_label: "Very overwhelmed",
        high_label: "Calm & in control",
    },
    Question {
        field: CheckinField::MoodStability,
        prompt: "How emotionally stable did you feel today?",
        low_label: "Unstable",
        high_label: "Very stable",
    },
    Question {
        field: CheckinField::RoutineRegularity,
        prompt: "How structured was your day today?",
        low_label: "Very chaotic",
        high_label: "Very structured",
    },
    Question {
        field: CheckinField::RecoveryFeeling,
        prompt: "After rest or sleep, how refreshed did you feel?",
        low_label: "Not refreshed",
        high_label: "Fully refreshed",
    },
];

/// Drives a [`Session`] through the screens
pub struct FlowController<S: StateStorage> {
    session: Session<S>,
    question: usize,
    reports: ReportBuilder,
}

impl<S: StateStorage> FlowController<S> {
    /// Restore a controller from `storage`; the flow resumes on the stored screen
    pub fn open(storage: S) -> Self {
        Self::with_session(Session::open(storage))
    }

    pub fn with_session(session: Session<S>) -> Self {
        Self {
            session,
            question: 0,
            reports: ReportBuilder::new(),
        }
    }

    /// Replace the report builder (e.g. to pin decorative values in tests)
    pub fn with_report_builder(mut self, reports: ReportBuilder) -> Self {
        self.reports = reports;
        self
    }

    pub fn state(&self) -> &AppState {
        self.session.state()
    }

    pub fn screen(&self) -> Screen {
        self.session.state().current_screen
    }

    pub fn session(&self) -> &Session<S> {
        &self.session
    }

    pub fn into_session(self) -> Session<S> {
        self.session
    }

    /// Apply a screen-level action
    pub fn dispatch(&mut self, action: Action) -> Result<Screen, CheckinError> {
        let from = self.screen();
        let (to, effect) =
            transition(from, action).ok_or(CheckinError::IllegalTransition { from, action })?;

        // Checkin is left forward from the last question and backward from the first
        if from == Screen::Checkin {
            let at_boundary = match action {
                Action::CompleteCheckin => self.question + 1 == QUESTIONS.len(),
                Action::Back => self.question == 0,
                _ => true,
            };
            if !at_boundary {
                return Err(CheckinError::OutOfSequence {
                    action,
                    position: self.question + 1,
                });
            }
        }

        match effect {
            Effect::None => {
                self.session.set_screen(to)?;
            }
            Effect::RecordConsent => {
                self.session.consent_and_enter(to)?;
            }
            Effect::Reset => {
                self.session.reset()?;
            }
        }

        // Coming back from context lands on the last question so back/forward stay symmetric
        if to == Screen::Checkin {
            self.question = if from == Screen::Context {
                QUESTIONS.len() - 1
            } else {
                0
            };
        }

        tracing::debug!(%from, %to, ?action, "screen transition");
        Ok(to)
    }

    pub fn get_started(&mut self) -> Result<Screen, CheckinError> {
        self.dispatch(Action::GetStarted)
    }

    pub fn accept_consent(&mut self) -> Result<Screen, CheckinError> {
        self.dispatch(Action::AcceptConsent)
    }

    pub fn back(&mut self) -> Result<Screen, CheckinError> {
        self.dispatch(Action::Back)
    }

    pub fn analyze(&mut self) -> Result<Screen, CheckinError> {
        self.dispatch(Action::Analyze)
    }

    pub fn start_over(&mut self) -> Result<Screen, CheckinError> {
        self.dispatch(Action::StartOver)
    }

    fn require_screen(&self, expected: Screen) -> Result<(), CheckinError> {
        let actual = self.screen();
        if actual == expected {
            Ok(())
        } else {
            Err(CheckinError::WrongScreen { expected, actual })
        }
    }

    /// Index of the active question (0-based)
    pub fn question_index(&self) -> usize {
        self.question
    }

    pub fn current_question(&self) -> &'static Question {
        &QUESTIONS[self.question]
    }

    /// `(position, total)` for the progress indicator, position 1-based
    pub fn progress(&self) -> (usize, usize) {
        (self.question + 1, QUESTIONS.len())
    }

    /// Set the answer to the active question
    pub fn answer(&mut self, value: i32) -> Result<&AppState, CheckinError> {
        self.require_screen(Screen::Checkin)?;
        let field = self.current_question().field;
        self.session.set_checkin_value(field, value)
    }

    /// Advance to the next question; past the last one, complete the check-in
    pub fn next_question(&mut self) -> Result<Screen, CheckinError> {
        self.require_screen(Screen::Checkin)?;
        if self.question + 1 < QUESTIONS.len() {
            self.question += 1;
            Ok(Screen::Checkin)
        } else {
            self.dispatch(Action::CompleteCheckin)
        }
    }

    /// Go back one question; before the first one, go back to consent
    pub fn previous_question(&mut self) -> Result<Screen, CheckinError> {
        self.require_screen(Screen::Checkin)?;
        if self.question > 0 {
            self.question -= 1;
            Ok(Screen::Checkin)
        } else {
            self.dispatch(Action::Back)
        }
    }

    /// Jump straight to question `index`
    pub fn jump_to_question(&mut self, index: usize) -> Result<(), CheckinError> {
        self.require_screen(Screen::Checkin)?;
        if index >= QUESTIONS.len() {
            return Err(CheckinError::QuestionOutOfRange(index));
        }
        self.question = index;
        Ok(())
    }

    pub fn toggle_influence(&mut self, tag: Influence) -> Result<&AppState, CheckinError> {
        self.require_screen(Screen::Context)?;
        self.session.toggle_influence(tag)
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) -> Result<&AppState, CheckinError> {
        self.require_screen(Screen::Context)?;
        self.session.set_notes(notes)
    }

    pub fn record_feedback(&mut self, accuracy: Accuracy) -> Result<&AppState, CheckinError> {
        self.require_screen(Screen::Results)?;
        self.session.set_feedback(accuracy)
    }

    /// Results for the current state, recomputed on every call.
    ///
    /// `None` unless the results screen is active.
    pub fn results(&mut self) -> Option<ResultsReport> {
        if self.screen() != Screen::Results {
            return None;
        }
        Some(self.reports.build(self.session.state()))
    }
}
