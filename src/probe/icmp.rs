//! ICMP echo prober backed by `surge-ping`.
//!
//! One [`IcmpPinger`] owns one ICMP client socket for its endpoint and reuses
//! it for every cycle until [`Pinger::stop`] is called.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use socket2::Type;
use surge_ping::{Client, Config, ICMP, PingIdentifier, PingSequence, SurgeError};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::probe::traits::{Pinger, PingerFactory, PingerSettings, ProbeError, Statistics};

/// Echo payload size, matching the classic `ping` default.
const PAYLOAD_SIZE: usize = 56;

/// Resolve hostname to IP address.
pub(crate) async fn resolve_host(host: &str) -> Result<IpAddr, ProbeError> {
    // First, try to parse as an IP address directly
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }

    let addrs = tokio::net::lookup_host(format!("{host}:0"))
        .await
        .map_err(|e| ProbeError::Resolve {
            host: host.to_string(),
            reason: e.to_string(),
        })?;
    addrs
        .into_iter()
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| ProbeError::Resolve {
            host: host.to_string(),
            reason: "no addresses found".to_string(),
        })
}

/// Creates [`IcmpPinger`] handles.
#[derive(Debug, Clone, Copy, Default)]
pub struct IcmpPingerFactory;

#[async_trait::async_trait]
impl PingerFactory for IcmpPingerFactory {
    async fn create(
        &self,
        endpoint: &str,
        settings: PingerSettings,
    ) -> Result<Arc<dyn Pinger>, ProbeError> {
        let pinger = IcmpPinger::new(endpoint, settings).await?;
        Ok(Arc::new(pinger))
    }
}

/// ICMP echo handle bound to one resolved endpoint.
pub struct IcmpPinger {
    endpoint: String,
    addr: IpAddr,
    settings: PingerSettings,
    client: Client,
    ident: PingIdentifier,
    stopped: CancellationToken,
}

impl std::fmt::Debug for IcmpPinger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IcmpPinger")
            .field("endpoint", &self.endpoint)
            .field("addr", &self.addr)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl IcmpPinger {
    /// Resolve `endpoint` and open an ICMP client for it.
    pub async fn new(endpoint: &str, settings: PingerSettings) -> Result<Self, ProbeError> {
        let addr = resolve_host(endpoint).await?;

        let mut builder = Config::builder();
        if addr.is_ipv6() {
            builder = builder.kind(ICMP::V6);
        }
        if settings.privileged {
            builder = builder.sock_type_hint(Type::RAW);
        }
        let client = Client::new(&builder.build())?;

        tracing::debug!(
            endpoint = %endpoint,
            addr = %addr,
            privileged = settings.privileged,
            "Created ICMP pinger"
        );

        Ok(Self {
            endpoint: endpoint.to_string(),
            addr,
            settings,
            client,
            ident: PingIdentifier(rand::random()),
            stopped: CancellationToken::new(),
        })
    }

    /// Resolved target address.
    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    /// Sleep for `duration` unless cancelled or stopped first.
    async fn pause(&self, duration: Duration, cancel: &CancellationToken) -> Result<(), ProbeError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProbeError::Cancelled),
            _ = self.stopped.cancelled() => Err(ProbeError::Stopped),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl Pinger for IcmpPinger {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn settings(&self) -> &PingerSettings {
        &self.settings
    }

    async fn run(&self, cancel: &CancellationToken) -> Result<Statistics, ProbeError> {
        if self.stopped.is_cancelled() {
            return Err(ProbeError::Stopped);
        }

        let deadline = Instant::now() + self.settings.timeout;
        let payload = [0u8; PAYLOAD_SIZE];
        let mut pinger = self.client.pinger(self.addr, self.ident).await;
        let mut samples = Vec::with_capacity(self.settings.count);
        let mut sent = 0usize;

        for seq in 0..self.settings.count {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            pinger.timeout(remaining);
            sent += 1;

            let reply = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ProbeError::Cancelled),
                _ = self.stopped.cancelled() => return Err(ProbeError::Stopped),
                // count never exceeds MAX_COUNT, so seq fits in 16 bits.
                reply = pinger.ping(PingSequence(seq as u16), &payload) => reply,
            };

            match reply {
                Ok((_, rtt)) => {
                    tracing::debug!(
                        endpoint = %self.endpoint,
                        seq,
                        rtt_ms = rtt.as_secs_f64() * 1000.0,
                        "Received packet"
                    );
                    samples.push(rtt);
                }
                Err(SurgeError::Timeout { .. }) => {
                    tracing::debug!(endpoint = %self.endpoint, seq, "Packet lost");
                }
                Err(e) => return Err(ProbeError::Transport(e.to_string())),
            }

            if seq + 1 < self.settings.count {
                let remaining = deadline.saturating_duration_since(Instant::now());
                self.pause(self.settings.interval.min(remaining), cancel)
                    .await?;
            }
        }

        Ok(Statistics::from_samples(
            self.addr,
            sent,
            &samples,
            self.settings.record_rtts,
        ))
    }

    fn stop(&self) {
        self.stopped.cancel();
    }
}
