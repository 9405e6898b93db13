//! Collection schedule and controller errors.

use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;
use crate::scraper::ScraperError;

/// Minimum allowed interval (1 second).
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Errors raised while driving collection cycles.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The cron expression could not be parsed.
    #[error("invalid cron expression '{expr}': {reason}")]
    InvalidCron { expr: String, reason: String },

    /// Scheduler error.
    #[error("scheduler error: {0}")]
    Scheduler(String),

    /// The receiver configuration is unusable.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The scraper could not start.
    #[error("scraper error: {0}")]
    Scraper(#[from] ScraperError),
}

/// When collection cycles fire.
///
/// Either a fixed interval or a 6-field cron expression
/// (`sec min hour day month weekday`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    /// Fixed interval between cycles, at least [`MIN_INTERVAL`].
    Interval(Duration),

    /// Cron expression, e.g. `"0 */5 * * * *"` for every 5 minutes.
    Cron(String),
}

impl Schedule {
    /// Create an interval schedule, clamped to [`MIN_INTERVAL`].
    pub fn interval(duration: Duration) -> Self {
        if duration < MIN_INTERVAL {
            tracing::warn!(
                requested = ?duration,
                min_interval = ?MIN_INTERVAL,
                "Collection interval below minimum, using minimum"
            );
            Self::Interval(MIN_INTERVAL)
        } else {
            Self::Interval(duration)
        }
    }

    /// Create a cron schedule with immediate validation.
    ///
    /// # Errors
    /// Returns [`ControllerError::InvalidCron`] if the expression does not parse.
    pub fn cron(expr: impl AsRef<str>) -> Result<Self, ControllerError> {
        use std::str::FromStr;

        let expr = expr.as_ref();
        cron::Schedule::from_str(expr).map_err(|e| ControllerError::InvalidCron {
            expr: expr.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self::Cron(expr.to_string()))
    }
}

impl std::fmt::Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interval(d) => write!(f, "every {}", humantime::format_duration(*d)),
            Self::Cron(expr) => write!(f, "cron: {expr}"),
        }
    }
}
