//! Collection controller.
//!
//! Decides when a ping cycle fires and where its batch goes. The
//! [`ScrapeController`] runs a [`PingScraper`](crate::scraper::PingScraper)
//! on a [`Schedule`] and hands every batch to a [`MetricsConsumer`].

mod consumer;
mod runner;
mod schedule;

pub use consumer::{ChannelConsumer, ConsumerError, LogConsumer, MetricsConsumer};
pub use runner::{DEFAULT_SHUTDOWN_TIMEOUT, JobInfo, ScrapeController};
pub use schedule::{ControllerError, MIN_INTERVAL, Schedule};
