//! Per-metric enable switches.

use serde::{Deserialize, Serialize};

use crate::metrics::MetricName;

fn default_enabled() -> bool {
    true
}

/// Settings for a single metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricConfig {
    /// Record this metric (default: true).
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Which metrics the scraper records. Every metric is enabled by default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    #[serde(rename = "ping.duration")]
    pub ping_duration: MetricConfig,
    #[serde(rename = "ping.duration.min")]
    pub ping_duration_min: MetricConfig,
    #[serde(rename = "ping.duration.max")]
    pub ping_duration_max: MetricConfig,
    #[serde(rename = "ping.duration.avg")]
    pub ping_duration_avg: MetricConfig,
    #[serde(rename = "ping.duration.stddev")]
    pub ping_duration_stddev: MetricConfig,
    #[serde(rename = "ping.packet_loss")]
    pub ping_packet_loss: MetricConfig,
    #[serde(rename = "ping.packets.sent")]
    pub ping_packets_sent: MetricConfig,
    #[serde(rename = "ping.packets.received")]
    pub ping_packets_received: MetricConfig,
    #[serde(rename = "ping.errors")]
    pub ping_errors: MetricConfig,
}

impl MetricsConfig {
    fn entry(&self, metric: MetricName) -> &MetricConfig {
        match metric {
            MetricName::PingDuration => &self.ping_duration,
            MetricName::PingDurationMin => &self.ping_duration_min,
            MetricName::PingDurationMax => &self.ping_duration_max,
            MetricName::PingDurationAvg => &self.ping_duration_avg,
            MetricName::PingDurationStddev => &self.ping_duration_stddev,
            MetricName::PingPacketLoss => &self.ping_packet_loss,
            MetricName::PingPacketsSent => &self.ping_packets_sent,
            MetricName::PingPacketsReceived => &self.ping_packets_received,
            MetricName::PingErrors => &self.ping_errors,
        }
    }

    fn entry_mut(&mut self, metric: MetricName) -> &mut MetricConfig {
        match metric {
            MetricName::PingDuration => &mut self.ping_duration,
            MetricName::PingDurationMin => &mut self.ping_duration_min,
            MetricName::PingDurationMax => &mut self.ping_duration_max,
            MetricName::PingDurationAvg => &mut self.ping_duration_avg,
            MetricName::PingDurationStddev => &mut self.ping_duration_stddev,
            MetricName::PingPacketLoss => &mut self.ping_packet_loss,
            MetricName::PingPacketsSent => &mut self.ping_packets_sent,
            MetricName::PingPacketsReceived => &mut self.ping_packets_received,
            MetricName::PingErrors => &mut self.ping_errors,
        }
    }

    /// Whether `metric` should be recorded.
    pub fn is_enabled(&self, metric: MetricName) -> bool {
        self.entry(metric).enabled
    }

    /// Toggle a single metric.
    pub fn set_enabled(&mut self, metric: MetricName, enabled: bool) {
        self.entry_mut(metric).enabled = enabled;
    }

    /// Builder-style variant of [`Self::set_enabled`] that disables `metric`.
    #[must_use]
    pub fn without(mut self, metric: MetricName) -> Self {
        self.set_enabled(metric, false);
        self
    }
}
