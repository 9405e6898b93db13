//! Configuration module for the ping receiver.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Collection schedule (interval or cron) and cycle deadline
//! - Ping targets (endpoint, count, timeout, interval)
//! - Per-metric enable switches

mod metrics;
mod receiver;
mod target;
mod validation;

pub use metrics::{MetricConfig, MetricsConfig};
pub use receiver::{DEFAULT_COLLECTION_INTERVAL, ReceiverConfig};
pub use target::TargetConfig;
pub use validation::{ConfigError, expand_env_vars};
