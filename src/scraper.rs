//! Probe execution core.
//!
//! [`PingScraper`] owns a [`TargetRegistry`] of long-lived pingers and, on
//! every cycle, probes all targets concurrently. Per-target failures are
//! classified with [`categorize_error`], recorded as `ping.errors` points and
//! combined into one [`ScrapeError`]; they never abort the cycle.

mod classify;
mod error;
mod ping;
mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use classify::{categorize_error, categorize_message};
pub use error::{ScrapeError, ScraperError, TargetError};
pub use ping::{CycleOutcome, PingScraper};
pub use registry::TargetRegistry;
