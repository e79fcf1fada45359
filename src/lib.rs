//! SilentRisk - On-device wellbeing check-in engine
//!
//! A user answers five sliders (sleep, stress, mood, routine, recovery), can
//! tag what influenced their week, and gets back a risk level with the factors
//! behind it. Everything runs locally:
//! session state → screen flow → scoring → results report.
//!
//! ## Modules
//!
//! - **Session**: the persisted `AppState`, saved after every change
//! - **Flow**: the splash → consent → checkin → context → results screens
//! - **Scoring**: risk classification and contributor ranking
//!
//! SilentRisk is not a medical tool and makes no diagnostic claims.

pub mod auth;
pub mod config;
pub mod error;
pub mod flow;
pub mod report;
pub mod scoring;
pub mod session;
pub mod storage;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use error::CheckinError;
pub use flow::{Action, FlowController};
pub use report::{ReportBuilder, ResultsReport};
pub use scoring::{assess_risk, rank_contributors, Contributor, RiskAssessment, RiskLevel};
pub use session::Session;
pub use storage::{FileStorage, MemoryStorage, StateStorage};
pub use types::{AppState, CheckinData, ContextData, Influence, Screen};

/// SilentRisk version embedded in every report
pub const SILENTRISK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "silentrisk";
