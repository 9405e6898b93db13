//! pingcheck - ICMP Reachability Prober
//!
//! Periodically pings a set of targets, measures round-trip latency and
//! packet loss, and emits the results as labeled metric data points. The
//! crate can be embedded as a library or run as the `pingcheck` binary.
//!
//! # Architecture
//!
//! - **Probe**: ICMP probe sequences behind the `Pinger` / `PingerFactory` traits
//! - **Scraper**: Concurrent per-target fan-out, metric recording, error aggregation
//! - **Metrics**: Per-cycle data point accumulation and batch hand-off
//! - **Controller**: Interval or cron scheduling and batch delivery
//! - **Config**: YAML configuration with environment expansion and validation
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use pingcheck::{LogConsumer, PingScraper, ReceiverConfig, ScrapeController};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ReceiverConfig::load("configs/config.yaml")?;
//!     let scraper = PingScraper::with_icmp(config);
//!     let controller = ScrapeController::new(scraper, Arc::new(LogConsumer::new())).await?;
//!
//!     controller.start().await?;
//!     tokio::signal::ctrl_c().await?;
//!     controller.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod controller;
pub mod metrics;
pub mod probe;
pub mod scraper;

pub use config::{ConfigError, MetricsConfig, ReceiverConfig, TargetConfig};
pub use controller::{
    ChannelConsumer, ControllerError, LogConsumer, MetricsConsumer, Schedule, ScrapeController,
};
pub use metrics::{DataPoint, ErrorType, MetricBatch, MetricName, MetricValue, MetricsBuilder};
pub use probe::{Pinger, PingerFactory, PingerSettings, ProbeError, Statistics};
pub use scraper::{CycleOutcome, PingScraper, ScrapeError, ScraperError, TargetError};
