#![forbid(unsafe_code)]

//! Subscriber installation for native hosts and test harnesses.
//!
//! The filter is read from `WAYPOINT_LOG` (same syntax as `RUST_LOG`) and
//! defaults to `info`. With the `tracing-json` feature every event is one
//! JSON line.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "WAYPOINT_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Logging setup error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    /// A global subscriber is already installed.
    SubscriberAlreadySet,
}

impl core::fmt::Display for LoggingError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SubscriberAlreadySet => write!(f, "a global tracing subscriber is already set"),
        }
    }
}

impl std::error::Error for LoggingError {}

/// Filter from `WAYPOINT_LOG`, falling back to `info` when unset or invalid.
#[must_use]
pub fn env_filter() -> EnvFilter {
    filter_from(std::env::var(LOG_ENV).ok().as_deref())
}

fn filter_from(directive: Option<&str>) -> EnvFilter {
    directive
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns [`LoggingError::SubscriberAlreadySet`] if another subscriber was
/// installed first.
pub fn init_logging() -> Result<(), LoggingError> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true);

    #[cfg(feature = "tracing-json")]
    let result = builder.json().try_init();
    #[cfg(not(feature = "tracing-json"))]
    let result = builder.try_init();

    result.map_err(|_| LoggingError::SubscriberAlreadySet)?;
    tracing::debug!(filter_env = LOG_ENV, "logging initialised");
    Ok(())
}
