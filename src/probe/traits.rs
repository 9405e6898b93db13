//! Core prober traits and types.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::TargetConfig;

/// Packets per probe sequence when the target leaves `count` unset.
pub const DEFAULT_COUNT: usize = 4;

/// Largest sequence length; ICMP sequence numbers are 16 bits wide.
pub const MAX_COUNT: usize = u16::MAX as usize;

/// Overall probe timeout when the target leaves `timeout` unset.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Gap between echo requests when the target leaves `interval` unset.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Errors produced while creating or running a pinger.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The endpoint did not resolve to any address.
    #[error("lookup {host}: no such host ({reason})")]
    Resolve { host: String, reason: String },

    /// Socket creation or I/O failed.
    #[error("socket error: {0}")]
    Socket(#[from] std::io::Error),

    /// The ICMP transport reported an error other than a lost packet.
    #[error("transport error: {0}")]
    Transport(String),

    /// The cycle was cancelled before the sequence finished.
    #[error("probe cancelled before completion")]
    Cancelled,

    /// The handle was released by `stop()`.
    #[error("pinger stopped")]
    Stopped,
}

/// Effective parameters bound into a pinger handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingerSettings {
    /// Echo requests per sequence.
    pub count: usize,
    /// Upper bound for the whole sequence.
    pub timeout: Duration,
    /// Pause between consecutive requests.
    pub interval: Duration,
    /// Use raw sockets instead of unprivileged datagram sockets.
    pub privileged: bool,
    /// Keep every RTT sample in [`Statistics::rtts`].
    pub record_rtts: bool,
}

impl Default for PingerSettings {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_INTERVAL,
            privileged: false,
            record_rtts: false,
        }
    }
}

impl PingerSettings {
    /// Build settings for a configured target.
    ///
    /// Zero values are replaced with the defaults and `count` is capped at
    /// [`MAX_COUNT`]. Windows only supports raw ICMP sockets, so
    /// `privileged` is forced on there. RTT retention is always off so
    /// long-running handles do not grow.
    pub fn from_target(target: &TargetConfig, privileged: bool) -> Self {
        let count = match usize::try_from(target.count) {
            Ok(0) | Err(_) => DEFAULT_COUNT,
            Ok(n) => n.min(MAX_COUNT),
        };
        let timeout = if target.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            target.timeout
        };
        let interval = if target.interval.is_zero() {
            DEFAULT_INTERVAL
        } else {
            target.interval
        };

        let privileged = if cfg!(windows) {
            tracing::debug!(endpoint = %target.endpoint, "Windows detected, using privileged mode");
            true
        } else {
            privileged
        };

        Self {
            count,
            timeout,
            interval,
            privileged,
            record_rtts: false,
        }
    }
}

/// Aggregate result of one probe sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    /// Address the requests were sent to.
    pub addr: IpAddr,
    pub packets_sent: usize,
    pub packets_recv: usize,
    /// Percentage of requests without a reply (0 to 100).
    pub packet_loss: f64,
    pub min_rtt: Duration,
    pub max_rtt: Duration,
    pub avg_rtt: Duration,
    pub std_dev_rtt: Duration,
    /// Individual samples; empty unless retention was requested.
    pub rtts: Vec<Duration>,
}

impl Statistics {
    /// Compute aggregates from the received round-trip samples.
    ///
    /// With no samples every duration is zero and loss is 100% (or 0% when
    /// nothing was sent). The standard deviation is the population one.
    pub fn from_samples(
        addr: IpAddr,
        packets_sent: usize,
        samples: &[Duration],
        retain_samples: bool,
    ) -> Self {
        let packets_recv = samples.len();
        let packet_loss = if packets_sent == 0 {
            0.0
        } else {
            packets_sent.saturating_sub(packets_recv) as f64 / packets_sent as f64 * 100.0
        };

        let (min_rtt, max_rtt, avg_rtt, std_dev_rtt) = if samples.is_empty() {
            (Duration::ZERO, Duration::ZERO, Duration::ZERO, Duration::ZERO)
        } else {
            let min = samples.iter().min().copied().unwrap_or_default();
            let max = samples.iter().max().copied().unwrap_or_default();
            let total: u128 = samples.iter().map(Duration::as_nanos).sum();
            let n = samples.len() as u128;
            let mean = total as f64 / n as f64;
            let variance = samples
                .iter()
                .map(|d| {
                    let delta = d.as_nanos() as f64 - mean;
                    delta * delta
                })
                .sum::<f64>()
                / n as f64;
            (
                min,
                max,
                Duration::from_nanos((total / n) as u64),
                Duration::from_nanos(variance.sqrt() as u64),
            )
        };

        Self {
            addr,
            packets_sent,
            packets_recv,
            packet_loss,
            min_rtt,
            max_rtt,
            avg_rtt,
            std_dev_rtt,
            rtts: if retain_samples {
                samples.to_vec()
            } else {
                Vec::new()
            },
        }
    }
}

/// A reusable probe handle bound to one endpoint.
///
/// Implementations must tolerate `run` being called once per cycle for the
/// lifetime of the process, and must fail fast after `stop`.
#[async_trait::async_trait]
pub trait Pinger: Send + Sync + 'static {
    /// Endpoint this handle was created for.
    fn endpoint(&self) -> &str;

    /// Effective parameters.
    fn settings(&self) -> &PingerSettings;

    /// Run one probe sequence. Must return promptly once `cancel` fires.
    async fn run(&self, cancel: &CancellationToken) -> Result<Statistics, ProbeError>;

    /// Release the handle. Subsequent runs fail with [`ProbeError::Stopped`].
    fn stop(&self);
}

/// Creates pinger handles; resolution of the endpoint happens here.
#[async_trait::async_trait]
pub trait PingerFactory: Send + Sync + 'static {
    async fn create(
        &self,
        endpoint: &str,
        settings: PingerSettings,
    ) -> Result<Arc<dyn Pinger>, ProbeError>;
}
