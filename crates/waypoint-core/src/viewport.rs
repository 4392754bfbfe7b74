#![forbid(unsafe_code)]

//! Viewport classification: compact (mobile-like) vs wide (desktop-like).
//!
//! # Detection Strategy
//!
//! A viewport is [`LayoutClass::Compact`] when any one of these holds:
//! - the page runs inside the native application wrapper,
//! - the user agent matches a known mobile-device pattern,
//! - the viewport is narrower than the compact breakpoint (768px by default).
//!
//! With no signals at all (a non-browser harness) the result is
//! [`LayoutClass::Wide`].
//!
//! # Invariants
//!
//! 1. **Determinism**: the same signals always produce the same class.
//! 2. **Flip-only notification**: [`ViewportClassifier::observe`] reports a
//!    [`LayoutChange`] only when the class actually changes, so a storm of
//!    resize events with the same class is a no-op.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::geometry::Size;

/// Default width (logical px) below which the layout is compact.
pub const DEFAULT_COMPACT_BREAKPOINT: f64 = 768.0;

static MOBILE_USER_AGENT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)Android|webOS|iPhone|iPad|iPod|BlackBerry|IEMobile|Opera Mini").ok()
});

/// The two supported viewport classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutClass {
    /// Mobile-like: collapsible navigation, bottom-anchored tooltip.
    Compact,
    /// Desktop-like: persistent navigation, tooltip beside its landmark.
    #[default]
    Wide,
}

impl LayoutClass {
    #[must_use]
    pub const fn is_compact(self) -> bool {
        matches!(self, Self::Compact)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Wide => "wide",
        }
    }
}

/// Platform signals the host reports on load and on every resize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewportSignals {
    /// Running inside the native application wrapper.
    pub native_wrapper: bool,
    /// `navigator.userAgent`, when available.
    pub user_agent: Option<String>,
    /// Current viewport size, when available.
    pub viewport: Option<Size>,
}

impl ViewportSignals {
    /// Signals for a plain browser window of the given size.
    #[must_use]
    pub fn browser(width: f64, height: f64) -> Self {
        Self {
            native_wrapper: false,
            user_agent: None,
            viewport: Some(Size::new(width, height)),
        }
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    #[must_use]
    pub fn with_native_wrapper(mut self, native: bool) -> Self {
        self.native_wrapper = native;
        self
    }
}

/// Whether a user agent string names a known mobile device family.
#[must_use]
pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    MOBILE_USER_AGENT
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(user_agent))
}

/// Classify a set of signals against a breakpoint.
#[must_use]
pub fn classify(signals: &ViewportSignals, compact_breakpoint: f64) -> LayoutClass {
    let narrow = signals
        .viewport
        .is_some_and(|size| size.width < compact_breakpoint);
    let mobile_agent = signals
        .user_agent
        .as_deref()
        .is_some_and(is_mobile_user_agent);

    if signals.native_wrapper || mobile_agent || narrow {
        LayoutClass::Compact
    } else {
        LayoutClass::Wide
    }
}

/// A change of layout class observed on resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutChange {
    pub from: LayoutClass,
    pub to: LayoutClass,
}

/// Stateful classifier that remembers the last class it reported.
#[derive(Debug, Clone)]
pub struct ViewportClassifier {
    compact_breakpoint: f64,
    current: LayoutClass,
    viewport: Option<Size>,
}

impl Default for ViewportClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_COMPACT_BREAKPOINT)
    }
}

impl ViewportClassifier {
    /// Create a classifier with no signals observed yet (class is `Wide`).
    #[must_use]
    pub fn new(compact_breakpoint: f64) -> Self {
        Self {
            compact_breakpoint,
            current: LayoutClass::Wide,
            viewport: None,
        }
    }

    /// Create a classifier and immediately classify `signals`.
    #[must_use]
    pub fn with_signals(compact_breakpoint: f64, signals: &ViewportSignals) -> Self {
        let mut classifier = Self::new(compact_breakpoint);
        let _ = classifier.observe(signals);
        classifier
    }

    #[must_use]
    pub const fn current(&self) -> LayoutClass {
        self.current
    }

    /// Last viewport size seen, if the host has reported one.
    #[must_use]
    pub const fn viewport(&self) -> Option<Size> {
        self.viewport
    }

    #[must_use]
    pub const fn compact_breakpoint(&self) -> f64 {
        self.compact_breakpoint
    }

    /// Re-evaluate with fresh signals. Returns the change, if the class flipped.
    pub fn observe(&mut self, signals: &ViewportSignals) -> Option<LayoutChange> {
        if signals.viewport.is_some() {
            self.viewport = signals.viewport;
        }
        let next = classify(signals, self.compact_breakpoint);
        if next == self.current {
            return None;
        }
        let change = LayoutChange {
            from: self.current,
            to: next,
        };
        tracing::debug!(
            from = change.from.as_str(),
            to = change.to.as_str(),
            width = ?signals.viewport.map(|size| size.width),
            "viewport layout class changed"
        );
        self.current = next;
        Some(change)
    }
}
