#![forbid(unsafe_code)]

//! `waypoint-web` drives the guided tour from a browser host.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment (JS) pushes viewport
//!   signals, DOM measurements, user input, and sign-in changes.
//! - **Deterministic time**: the host advances a monotonic clock explicitly;
//!   settle delays fire from [`TourSession::step`], never from a timer thread.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! The session produces a [`TourFrame`] for the presentation shell to paint
//! and a queue of [`SessionOutputs`] (menu requests, persistence results).

pub mod logging;
pub mod session;

use serde::{Deserialize, Serialize};
use waypoint_core::viewport::LayoutClass;
use waypoint_tour::{
    ConfigError, MatchStrategy, NavRequest, PersistOutcome, StepGeometry, TerminalAction,
};

pub use session::{SessionEvent, StepResult, TourInput, TourSession};

/// Session error type.
#[derive(Debug)]
pub enum SessionError {
    /// Host JSON could not be decoded, or a frame could not be encoded.
    Json(serde_json::Error),
    /// Configuration from the environment was rejected.
    Config(ConfigError),
}

impl core::fmt::Display for SessionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "json error: {err}"),
            Self::Config(err) => write!(f, "config error: {err}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Config(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<ConfigError> for SessionError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Everything the presentation shell needs to paint the active step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourFrame {
    pub step_id: String,
    pub title: String,
    pub description: String,
    pub layout: LayoutClass,
    /// 1-based position, for "step 3 of 9".
    pub step_number: usize,
    pub step_count: usize,
    pub is_first: bool,
    /// The shell labels the forward button "Finish" on the last step.
    pub is_last: bool,
    /// `None` until the settle delay has elapsed and the landmark was measured.
    pub geometry: Option<StepGeometry>,
    /// How the landmark was found; `None` on a miss or before measuring.
    pub strategy: Option<MatchStrategy>,
}

impl TourFrame {
    /// Whether the step has been measured and positioned.
    #[must_use]
    pub fn is_measured(&self) -> bool {
        self.geometry.is_some()
    }
}

/// Captured side effects since the last [`TourSession::take_outputs`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionOutputs {
    /// Menu open/close requests, in emission order.
    pub nav_requests: Vec<NavRequest>,
    /// Terminal actions and what happened to their write.
    pub persisted: Vec<(TerminalAction, PersistOutcome)>,
    /// Runs that ended (completed or skipped).
    pub finished: Vec<TerminalAction>,
    /// Number of times the frame changed.
    pub frames: u64,
}

impl SessionOutputs {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nav_requests.is_empty()
            && self.persisted.is_empty()
            && self.finished.is_empty()
            && self.frames == 0
    }
}
