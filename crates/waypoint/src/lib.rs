#![forbid(unsafe_code)]

//! Waypoint public facade crate.
//!
//! Re-exports the types a host application needs from the internal crates
//! and offers a prelude for day-to-day usage.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use waypoint_core::clock::{DeterministicClock, FixedWallClock, SystemWallClock, WallClock};
pub use waypoint_core::geometry::{Rect, Sides, Size};
pub use waypoint_core::viewport::{LayoutChange, LayoutClass, ViewportClassifier, ViewportSignals};

// --- Tour re-exports -------------------------------------------------------

pub use waypoint_tour::{
    Catalog, CatalogError, ConfigError, DegradedPersistencePolicy, DomQuery, DomSnapshot,
    MatchStrategy, MemoryStatusStore, NavRequest, NavigationShell, PersistOutcome, Placement,
    Resolution, StepGeometry, StoreError, TerminalAction, TooltipAnchor, TourConfig, TourMachine,
    TourState, TourStatusRecorder, TourStatusStore, TourStep, UserTourStatus, select_catalog,
};
#[cfg(feature = "state-persistence")]
pub use waypoint_tour::FileStatusStore;

// --- Session re-exports ----------------------------------------------------

#[cfg(feature = "web")]
pub use waypoint_web::{
    SessionError, SessionEvent, SessionOutputs, StepResult, TourFrame, TourInput, TourSession,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for Waypoint hosts.
#[derive(Debug)]
pub enum Error {
    /// Tour status backend failure.
    Store(StoreError),
    /// A custom catalog failed validation.
    Catalog(CatalogError),
    /// Rejected configuration.
    Config(ConfigError),
    /// Host bridge failure.
    #[cfg(feature = "web")]
    Session(SessionError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Catalog(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
            #[cfg(feature = "web")]
            Self::Session(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<CatalogError> for Error {
    fn from(err: CatalogError) -> Self {
        Self::Catalog(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

#[cfg(feature = "web")]
impl From<SessionError> for Error {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}

/// Standard result type for Waypoint APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        DomSnapshot, Error, LayoutClass, NavigationShell, Rect, Result, Size, TourConfig,
        TourMachine, TourStatusRecorder, ViewportSignals,
    };

    #[cfg(feature = "web")]
    pub use crate::{SessionEvent, TourFrame, TourInput, TourSession};

    pub use crate::{core, tour};
    #[cfg(feature = "web")]
    pub use crate::web;
}

pub use waypoint_core as core;
pub use waypoint_tour as tour;
#[cfg(feature = "web")]
pub use waypoint_web as web;
