//! Error types for SilentRisk

use crate::flow::Action;
use crate::types::Screen;
use thiserror::Error;

/// Errors that can occur while running a check-in session
#[derive(Debug, Error)]
pub enum CheckinError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Unknown influence tag: {0}")]
    UnknownInfluence(String),

    #[error("Unknown check-in field: {0}")]
    UnknownField(String),

    #[error("Action {action:?} is not allowed from the {from} screen")]
    IllegalTransition { from: Screen, action: Action },

    #[error("This needs the {expected} screen, but the {actual} screen is active")]
    WrongScreen { expected: Screen, actual: Screen },

    #[error("The {0} screen cannot be entered before consent is recorded")]
    ConsentRequired(Screen),

    #[error("Action {action:?} is not allowed at question {position}")]
    OutOfSequence { action: Action, position: usize },

    #[error("Question index {0} is out of range")]
    QuestionOutOfRange(usize),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
