//! Ping target configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A configured ping target.
///
/// Zero values for `count`, `timeout` and `interval` mean "use the default"
/// (4 packets, 5s, 1s); see [`crate::probe::PingerSettings::from_target`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Endpoint to ping (hostname or IP).
    pub endpoint: String,
    /// Number of packets to send (default: 4).
    #[serde(default)]
    pub count: i32,
    /// Timeout for the whole probe sequence (default: 5s).
    #[serde(default, with = "humantime_serde")]
    pub timeout: Duration,
    /// Interval between packets (default: 1s).
    #[serde(default, with = "humantime_serde")]
    pub interval: Duration,
}

impl TargetConfig {
    /// Create a target with every parameter left at its default.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            count: 0,
            timeout: Duration::ZERO,
            interval: Duration::ZERO,
        }
    }

    /// Set the packet count.
    pub fn with_count(mut self, count: i32) -> Self {
        self.count = count;
        self
    }

    /// Set the probe timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the inter-packet interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}
