#![forbid(unsafe_code)]

//! Tour configuration.
//!
//! Every timing and spacing constant the engine uses lives here rather than
//! inline. Defaults match the shipped web application; hosts can override
//! them with builder methods or `WAYPOINT_*` environment variables.

use std::env;
use std::fmt;
use std::time::Duration;

use waypoint_core::geometry::{Rect, Size};
use waypoint_core::viewport::DEFAULT_COMPACT_BREAKPOINT;

use crate::persistence::DegradedPersistencePolicy;

/// Errors produced while building a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment override could not be parsed.
    InvalidEnv { key: &'static str, value: String },
    /// A value is out of its allowed range.
    OutOfRange { field: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEnv { key, value } => write!(f, "invalid value for {key}: {value:?}"),
            Self::OutOfRange { field, reason } => write!(f, "{field} out of range: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration for the tour engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TourConfig {
    /// Viewport width below which the layout is compact.
    pub compact_breakpoint: f64,

    /// Settle delay before resolving compact step 0, while the menu animates.
    pub first_compact_settle: Duration,

    /// Settle delay before resolving any other step.
    pub settle: Duration,

    /// Minimum distance between the tooltip and every viewport edge.
    pub edge_margin: f64,

    /// Gap between the landmark and the tooltip (wide layout).
    pub tooltip_offset: f64,

    /// Estimated tooltip box on wide layouts.
    pub wide_tooltip: Size,

    /// Estimated tooltip box on compact layouts; width shrinks to fit.
    pub compact_tooltip: Size,

    /// Padding around the highlighted landmark.
    pub highlight_padding: f64,

    /// Highlight used on compact layouts when a step misses and the host did
    /// not report the navigation region bounds.
    pub fallback_nav_region: Rect,

    /// What to do when writing the terminal status fails.
    pub persistence_policy: DegradedPersistencePolicy,
}

impl Default for TourConfig {
    fn default() -> Self {
        Self {
            compact_breakpoint: DEFAULT_COMPACT_BREAKPOINT,
            first_compact_settle: Duration::from_millis(800),
            settle: Duration::from_millis(100),
            edge_margin: 20.0,
            tooltip_offset: 20.0,
            wide_tooltip: Size::new(320.0, 200.0),
            compact_tooltip: Size::new(340.0, 220.0),
            highlight_padding: 8.0,
            fallback_nav_region: Rect::new(0.0, 64.0, 280.0, 480.0),
            persistence_policy: DegradedPersistencePolicy::LogAndContinue,
        }
    }
}

impl TourConfig {
    #[must_use]
    pub fn with_compact_breakpoint(mut self, width: f64) -> Self {
        self.compact_breakpoint = width;
        self
    }

    #[must_use]
    pub fn with_settle_delays(mut self, first_compact: Duration, settle: Duration) -> Self {
        self.first_compact_settle = first_compact;
        self.settle = settle;
        self
    }

    #[must_use]
    pub fn with_edge_margin(mut self, margin: f64) -> Self {
        self.edge_margin = margin;
        self
    }

    #[must_use]
    pub fn with_persistence_policy(mut self, policy: DegradedPersistencePolicy) -> Self {
        self.persistence_policy = policy;
        self
    }

    /// Settle delay for the given step on the given layout.
    #[must_use]
    pub fn settle_delay(&self, compact: bool, step_index: usize) -> Duration {
        if compact && step_index == 0 {
            self.first_compact_settle
        } else {
            self.settle
        }
    }

    /// Check that all spacing values are usable.
    pub fn validate(&self) -> ConfigResult<()> {
        let non_negative = [
            ("compact_breakpoint", self.compact_breakpoint),
            ("edge_margin", self.edge_margin),
            ("tooltip_offset", self.tooltip_offset),
            ("highlight_padding", self.highlight_padding),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::OutOfRange {
                    field,
                    reason: format!("expected a finite, non-negative value, got {value}"),
                });
            }
        }
        for (field, size) in [
            ("wide_tooltip", self.wide_tooltip),
            ("compact_tooltip", self.compact_tooltip),
        ] {
            if !(size.width > 0.0 && size.height > 0.0) {
                return Err(ConfigError::OutOfRange {
                    field,
                    reason: format!("tooltip estimate must be positive, got {size:?}"),
                });
            }
        }
        Ok(())
    }

    /// Defaults with `WAYPOINT_*` environment overrides applied.
    pub fn from_env() -> ConfigResult<Self> {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        if let Some(value) = lookup("WAYPOINT_COMPACT_BREAKPOINT") {
            self.compact_breakpoint = parse("WAYPOINT_COMPACT_BREAKPOINT", &value)?;
        }
        if let Some(value) = lookup("WAYPOINT_SETTLE_MS") {
            self.settle = Duration::from_millis(parse("WAYPOINT_SETTLE_MS", &value)?);
        }
        if let Some(value) = lookup("WAYPOINT_FIRST_COMPACT_SETTLE_MS") {
            self.first_compact_settle =
                Duration::from_millis(parse("WAYPOINT_FIRST_COMPACT_SETTLE_MS", &value)?);
        }
        if let Some(value) = lookup("WAYPOINT_EDGE_MARGIN") {
            self.edge_margin = parse("WAYPOINT_EDGE_MARGIN", &value)?;
        }
        if let Some(value) = lookup("WAYPOINT_PERSISTENCE_POLICY") {
            self.persistence_policy = DegradedPersistencePolicy::parse(&value).ok_or(
                ConfigError::InvalidEnv {
                    key: "WAYPOINT_PERSISTENCE_POLICY",
                    value,
                },
            )?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Serialize configuration to a JSONL evidence line.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        format!(
            r#"{{"event":"tour_config","compact_breakpoint":{:.1},"first_compact_settle_ms":{},"settle_ms":{},"edge_margin":{:.1},"tooltip_offset":{:.1},"highlight_padding":{:.1},"persistence_policy":"{}"}}"#,
            self.compact_breakpoint,
            self.first_compact_settle.as_millis(),
            self.settle.as_millis(),
            self.edge_margin,
            self.tooltip_offset,
            self.highlight_padding,
            self.persistence_policy.as_str(),
        )
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key,
        value: value.to_string(),
    })
}
