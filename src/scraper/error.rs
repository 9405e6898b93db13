//! Scraper error types.
//!
//! [`ScraperError`] is returned by lifecycle operations; [`ScrapeError`] is the
//! combined per-target failure report of one collection cycle.

use std::fmt;

use thiserror::Error;

use crate::metrics::ErrorType;
use crate::probe::ProbeError;

/// Lifecycle errors.
#[derive(Debug, Error)]
pub enum ScraperError {
    /// Every configured target failed to produce a pinger.
    #[error("no valid pingers could be created")]
    NoValidPingers,
}

/// Failure of a single target within one cycle.
#[derive(Debug, Error)]
pub enum TargetError {
    /// The target is configured but has no live handle.
    #[error("target {endpoint}: pinger not found for target: {endpoint}")]
    PingerNotFound { endpoint: String },

    /// The probe sequence failed at the transport level.
    #[error("target {endpoint}: ping failed: {source}")]
    PingFailed {
        endpoint: String,
        error_type: ErrorType,
        #[source]
        source: ProbeError,
    },

    /// The probe task panicked or was aborted.
    #[error("target {endpoint}: probe task failed: {reason}")]
    TaskFailed { endpoint: String, reason: String },
}

impl TargetError {
    /// Endpoint the failure belongs to.
    pub fn endpoint(&self) -> &str {
        match self {
            Self::PingerNotFound { endpoint }
            | Self::PingFailed { endpoint, .. }
            | Self::TaskFailed { endpoint, .. } => endpoint,
        }
    }

    /// Classified category, if the failure came from the transport.
    pub fn error_type(&self) -> Option<ErrorType> {
        match self {
            Self::PingFailed { error_type, .. } => Some(*error_type),
            _ => None,
        }
    }
}

/// Every per-target failure of one cycle.
///
/// Order follows task completion and is not stable between runs.
#[derive(Debug)]
pub struct ScrapeError {
    errors: Vec<TargetError>,
}

impl ScrapeError {
    /// Combine target failures; `None` when there are none.
    pub fn from_errors(errors: Vec<TargetError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    pub fn errors(&self) -> &[TargetError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<TargetError> {
        self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Failure recorded for `endpoint`, if any.
    pub fn for_endpoint(&self, endpoint: &str) -> Option<&TargetError> {
        self.errors.iter().find(|e| e.endpoint() == endpoint)
    }
}

impl fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ScrapeError {}
