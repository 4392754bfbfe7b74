#![forbid(unsafe_code)]

//! Guided tour engine: step catalogs, the tour state machine, landmark
//! resolution, tooltip positioning, settle-delay scheduling, and persistence
//! of the per-user completion flag.
//!
//! Nothing here touches a DOM, a timer, or a network. The host feeds
//! measurements and time in; transitions and geometry come out.

pub mod catalog;
pub mod config;
pub mod dom;
pub mod machine;
pub mod persistence;
pub mod positioner;
pub mod resolver;
pub mod settle;

pub use catalog::{Catalog, CatalogError, Placement, TourStep, select_catalog};
pub use config::{ConfigError, TourConfig};
pub use dom::{DomQuery, DomSnapshot, ElementNode, LinkNode};
pub use machine::{
    NavRequest, NavigationShell, TourAdvanceReason, TourEffect, TourMachine, TourProgress,
    TourState, Transition,
};
pub use persistence::{
    DegradedPersistencePolicy, MemoryStatusStore, PersistOutcome, StoreError, StoreResult,
    TerminalAction, TerminalRecord, TourStatusRecorder, TourStatusStore, UserTourStatus,
    should_offer_tour,
};
#[cfg(feature = "state-persistence")]
pub use persistence::FileStatusStore;
pub use positioner::{PositionRequest, StepGeometry, TooltipAnchor, position};
pub use resolver::{MatchStrategy, Resolution, ResolvedTarget, resolve};
pub use settle::{SettleHandle, SettleScheduler};
