//! Per-cycle metric accumulator.
//!
//! Callers serialize access (the scraper wraps the builder in a mutex);
//! [`MetricsBuilder::emit`] hands the buffered points off and leaves the
//! builder empty for the next cycle.

use chrono::{DateTime, Utc};

use crate::metrics::types::{DataPoint, ErrorType, MetricBatch, MetricName, MetricValue};

/// Initial buffer capacity; a cycle records at most ~8 points per target.
const DEFAULT_CAPACITY: usize = 64;

/// Accumulates data points for the current collection cycle.
#[derive(Debug)]
pub struct MetricsBuilder {
    points: Vec<DataPoint>,
}

impl Default for MetricsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsBuilder {
    pub fn new() -> Self {
        Self {
            points: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    /// Number of points buffered since the last emit.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn push(
        &mut self,
        metric: MetricName,
        ts: DateTime<Utc>,
        value: MetricValue,
        endpoint: &str,
        ip: &str,
    ) {
        self.points
            .push(DataPoint::new(metric, ts, value, endpoint, ip));
    }

    pub fn record_ping_duration_data_point(
        &mut self,
        ts: DateTime<Utc>,
        value_ms: f64,
        endpoint: &str,
        ip: &str,
    ) {
        self.push(MetricName::PingDuration, ts, MetricValue::Double(value_ms), endpoint, ip);
    }

    pub fn record_ping_duration_min_data_point(
        &mut self,
        ts: DateTime<Utc>,
        value_ms: f64,
        endpoint: &str,
        ip: &str,
    ) {
        self.push(MetricName::PingDurationMin, ts, MetricValue::Double(value_ms), endpoint, ip);
    }

    pub fn record_ping_duration_max_data_point(
        &mut self,
        ts: DateTime<Utc>,
        value_ms: f64,
        endpoint: &str,
        ip: &str,
    ) {
        self.push(MetricName::PingDurationMax, ts, MetricValue::Double(value_ms), endpoint, ip);
    }

    pub fn record_ping_duration_avg_data_point(
        &mut self,
        ts: DateTime<Utc>,
        value_ms: f64,
        endpoint: &str,
        ip: &str,
    ) {
        self.push(MetricName::PingDurationAvg, ts, MetricValue::Double(value_ms), endpoint, ip);
    }

    pub fn record_ping_duration_stddev_data_point(
        &mut self,
        ts: DateTime<Utc>,
        value_ms: f64,
        endpoint: &str,
        ip: &str,
    ) {
        self.push(
            MetricName::PingDurationStddev,
            ts,
            MetricValue::Double(value_ms),
            endpoint,
            ip,
        );
    }

    /// Record packet loss as a ratio. Values outside `[0.0, 1.0]` are clamped.
    pub fn record_ping_packet_loss_data_point(
        &mut self,
        ts: DateTime<Utc>,
        ratio: f64,
        endpoint: &str,
        ip: &str,
    ) {
        let ratio = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) };
        self.push(MetricName::PingPacketLoss, ts, MetricValue::Double(ratio), endpoint, ip);
    }

    pub fn record_ping_packets_sent_data_point(
        &mut self,
        ts: DateTime<Utc>,
        count: i64,
        endpoint: &str,
        ip: &str,
    ) {
        self.push(MetricName::PingPacketsSent, ts, MetricValue::Int(count), endpoint, ip);
    }

    pub fn record_ping_packets_received_data_point(
        &mut self,
        ts: DateTime<Utc>,
        count: i64,
        endpoint: &str,
        ip: &str,
    ) {
        self.push(MetricName::PingPacketsReceived, ts, MetricValue::Int(count), endpoint, ip);
    }

    pub fn record_ping_errors_data_point(
        &mut self,
        ts: DateTime<Utc>,
        count: i64,
        endpoint: &str,
        ip: &str,
        error_type: ErrorType,
    ) {
        self.points.push(
            DataPoint::new(MetricName::PingErrors, ts, MetricValue::Int(count), endpoint, ip)
                .with_error_type(error_type),
        );
    }

    /// Hand off everything recorded so far and reset the buffer.
    pub fn emit(&mut self) -> MetricBatch {
        let points = std::mem::replace(&mut self.points, Vec::with_capacity(DEFAULT_CAPACITY));
        MetricBatch::new(points)
    }
}
