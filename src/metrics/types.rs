//! Core data types for the metric sink.
//!
//! - [`MetricName`]: Catalogue of the data points a cycle may produce
//! - [`ErrorType`]: Coarse classification attached to `ping.errors` points
//! - [`DataPoint`] / [`MetricBatch`]: One cycle's worth of recorded values

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Metric identifiers emitted by the ping scraper.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
    EnumIter,
)]
pub enum MetricName {
    /// Per-packet round-trip time. Only produced when RTT samples are retained.
    #[serde(rename = "ping.duration")]
    #[strum(serialize = "ping.duration")]
    PingDuration,
    /// Minimum round-trip time of the probe sequence.
    #[serde(rename = "ping.duration.min")]
    #[strum(serialize = "ping.duration.min")]
    PingDurationMin,
    /// Maximum round-trip time of the probe sequence.
    #[serde(rename = "ping.duration.max")]
    #[strum(serialize = "ping.duration.max")]
    PingDurationMax,
    /// Average round-trip time of the probe sequence.
    #[serde(rename = "ping.duration.avg")]
    #[strum(serialize = "ping.duration.avg")]
    PingDurationAvg,
    /// Standard deviation of the round-trip times.
    #[serde(rename = "ping.duration.stddev")]
    #[strum(serialize = "ping.duration.stddev")]
    PingDurationStddev,
    /// Ratio of lost packets (0.0 to 1.0).
    #[serde(rename = "ping.packet_loss")]
    #[strum(serialize = "ping.packet_loss")]
    PingPacketLoss,
    /// Echo requests sent.
    #[serde(rename = "ping.packets.sent")]
    #[strum(serialize = "ping.packets.sent")]
    PingPacketsSent,
    /// Echo replies received.
    #[serde(rename = "ping.packets.received")]
    #[strum(serialize = "ping.packets.received")]
    PingPacketsReceived,
    /// Probe failures, labeled with the classified error type.
    #[serde(rename = "ping.errors")]
    #[strum(serialize = "ping.errors")]
    PingErrors,
}

impl MetricName {
    /// Unit string in UCUM notation.
    pub fn unit(&self) -> &'static str {
        match self {
            Self::PingDuration
            | Self::PingDurationMin
            | Self::PingDurationMax
            | Self::PingDurationAvg
            | Self::PingDurationStddev => "ms",
            Self::PingPacketLoss => "1",
            Self::PingPacketsSent | Self::PingPacketsReceived => "{packets}",
            Self::PingErrors => "{errors}",
        }
    }

    /// Human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::PingDuration => "Round-trip time of a single echo request",
            Self::PingDurationMin => "Minimum round-trip time",
            Self::PingDurationMax => "Maximum round-trip time",
            Self::PingDurationAvg => "Average round-trip time",
            Self::PingDurationStddev => "Standard deviation of round-trip times",
            Self::PingPacketLoss => "Ratio of echo requests without a reply",
            Self::PingPacketsSent => "Number of echo requests sent",
            Self::PingPacketsReceived => "Number of echo replies received",
            Self::PingErrors => "Number of failed probe sequences",
        }
    }
}

/// Error classification attached to `ping.errors` data points.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ErrorType {
    /// The probe (or the whole cycle) ran out of time.
    Timeout,
    /// The endpoint could not be resolved.
    DnsFailure,
    /// No route to the target network.
    NetworkUnreachable,
    /// Raw socket access was refused by the OS.
    PermissionDenied,
    /// Anything else.
    Unknown,
}

/// Numeric payload of a data point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(i64),
    Double(f64),
}

impl MetricValue {
    /// Value widened to `f64`.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Int(v) => v as f64,
            Self::Double(v) => v,
        }
    }
}

/// Labels attached to every data point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    /// Configured target endpoint (hostname or IP).
    pub endpoint: String,
    /// Resolved address; empty when resolution did not complete.
    pub ip: String,
    /// Present only on `ping.errors` points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ErrorType>,
}

/// A single recorded value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub metric: MetricName,
    pub ts: DateTime<Utc>,
    pub value: MetricValue,
    pub attributes: Attributes,
}

impl DataPoint {
    /// Create a data point labeled with endpoint and resolved IP.
    pub fn new(
        metric: MetricName,
        ts: DateTime<Utc>,
        value: MetricValue,
        endpoint: impl Into<String>,
        ip: impl Into<String>,
    ) -> Self {
        Self {
            metric,
            ts,
            value,
            attributes: Attributes {
                endpoint: endpoint.into(),
                ip: ip.into(),
                error_type: None,
            },
        }
    }

    /// Attach an error classification.
    pub fn with_error_type(mut self, error_type: ErrorType) -> Self {
        self.attributes.error_type = Some(error_type);
        self
    }
}

/// Data points accumulated during one collection cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricBatch {
    /// When the batch was handed off.
    pub emitted_at: DateTime<Utc>,
    /// Recorded points in recording order.
    pub points: Vec<DataPoint>,
}

impl MetricBatch {
    pub fn new(points: Vec<DataPoint>) -> Self {
        Self {
            emitted_at: Utc::now(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    /// Points of a single metric.
    pub fn points_for(&self, metric: MetricName) -> impl Iterator<Item = &DataPoint> {
        self.points.iter().filter(move |p| p.metric == metric)
    }

    /// Points labeled with the given endpoint.
    pub fn points_for_endpoint<'a>(
        &'a self,
        endpoint: &'a str,
    ) -> impl Iterator<Item = &'a DataPoint> + 'a {
        self.points
            .iter()
            .filter(move |p| p.attributes.endpoint == endpoint)
    }
}
