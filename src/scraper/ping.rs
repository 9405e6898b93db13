//! Concurrent probe coordinator.
//!
//! Every cycle fans out one task per target, runs the probes in parallel
//! and funnels the results into a per-cycle [`MetricsBuilder`]. A failing
//! target never blocks the others; its error is folded into the cycle's
//! combined [`ScrapeError`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::{MetricsConfig, ReceiverConfig, TargetConfig};
use crate::metrics::{MetricBatch, MetricName, MetricsBuilder};
use crate::probe::{IcmpPingerFactory, PingerFactory, ProbeError, Statistics};
use crate::scraper::classify::categorize_error;
use crate::scraper::error::{ScrapeError, ScraperError, TargetError};
use crate::scraper::registry::TargetRegistry;

/// Result of one collection cycle.
pub type CycleOutcome = (MetricBatch, Option<ScrapeError>);

fn millis(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1_000_000.0
}

/// Probe coordinator for the configured targets.
pub struct PingScraper {
    config: ReceiverConfig,
    enabled: Arc<MetricsConfig>,
    factory: Arc<dyn PingerFactory>,
    registry: Arc<TargetRegistry>,
}

impl std::fmt::Debug for PingScraper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PingScraper")
            .field("targets", &self.config.targets.len())
            .field("privileged", &self.config.privileged)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl PingScraper {
    /// Create a scraper that obtains its pingers from `factory`.
    pub fn new(config: ReceiverConfig, factory: Arc<dyn PingerFactory>) -> Self {
        let enabled = Arc::new(config.metrics.clone());
        Self {
            config,
            enabled,
            factory,
            registry: Arc::new(TargetRegistry::new()),
        }
    }

    /// Create a scraper backed by real ICMP sockets.
    pub fn with_icmp(config: ReceiverConfig) -> Self {
        Self::new(config, Arc::new(IcmpPingerFactory))
    }

    pub fn config(&self) -> &ReceiverConfig {
        &self.config
    }

    pub fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    /// Create one pinger per configured target.
    ///
    /// # Errors
    /// Returns [`ScraperError::NoValidPingers`] if no target could be set up.
    pub async fn start(&self, cancel: &CancellationToken) -> Result<(), ScraperError> {
        let count = self
            .registry
            .initialize(
                &self.config.targets,
                self.factory.as_ref(),
                self.config.privileged,
                cancel,
            )
            .await?;

        tracing::info!(
            pingers = count,
            targets = self.config.targets.len(),
            privileged = self.config.privileged,
            "Ping scraper started"
        );
        Ok(())
    }

    /// Stop and release every pinger. Idempotent; never fails.
    pub async fn shutdown(&self) -> Result<(), ScraperError> {
        self.registry.teardown().await;
        tracing::info!("Ping scraper stopped");
        Ok(())
    }

    /// Run one cycle over the configured targets.
    pub async fn scrape(&self, cancel: &CancellationToken) -> CycleOutcome {
        self.run_cycle(cancel, &self.config.targets).await
    }

    /// Probe `targets` concurrently and return the cycle's batch together
    /// with every per-target failure.
    ///
    /// All tasks observe `cancel`; a cancelled probe counts as a failure of
    /// its target. Repeated endpoints are probed once. Every call records
    /// into its own sink, so overlapping cycles never share points.
    pub async fn run_cycle(
        &self,
        cancel: &CancellationToken,
        targets: &[TargetConfig],
    ) -> CycleOutcome {
        let started = Instant::now();
        let sink = Arc::new(Mutex::new(MetricsBuilder::new()));
        let mut seen = HashSet::with_capacity(targets.len());
        let mut tasks: JoinSet<Result<(), TargetError>> = JoinSet::new();
        let mut task_endpoints = HashMap::with_capacity(targets.len());

        for target in targets {
            if !seen.insert(target.endpoint.as_str()) {
                continue;
            }
            let endpoint = target.endpoint.clone();
            let handle = tasks.spawn(probe_target(
                endpoint.clone(),
                Arc::clone(&self.registry),
                Arc::clone(&sink),
                Arc::clone(&self.enabled),
                cancel.clone(),
            ));
            task_endpoints.insert(handle.id(), endpoint);
        }

        let mut errors = Vec::new();
        while let Some(joined) = tasks.join_next_with_id().await {
            let failure = match joined {
                Ok((_, Ok(()))) => None,
                Ok((_, Err(e))) => Some(e),
                Err(join_err) => Some(TargetError::TaskFailed {
                    endpoint: task_endpoints
                        .remove(&join_err.id())
                        .unwrap_or_default(),
                    reason: join_err.to_string(),
                }),
            };
            if let Some(err) = failure {
                tracing::warn!(endpoint = %err.endpoint(), error = %err, "Ping target failed");
                errors.push(err);
            }
        }

        let batch = sink.lock().await.emit();
        tracing::debug!(
            targets = seen.len(),
            points = batch.len(),
            failed = errors.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Ping cycle completed"
        );

        (batch, ScrapeError::from_errors(errors))
    }
}

/// Probe a single target and record its outcome.
async fn probe_target(
    endpoint: String,
    registry: Arc<TargetRegistry>,
    sink: Arc<Mutex<MetricsBuilder>>,
    enabled: Arc<MetricsConfig>,
    cancel: CancellationToken,
) -> Result<(), TargetError> {
    let Some(pinger) = registry.lookup(&endpoint).await else {
        return Err(TargetError::PingerNotFound { endpoint });
    };

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ProbeError::Cancelled),
        result = pinger.run(&cancel) => result,
    };

    match result {
        Ok(stats) => {
            record_statistics(&sink, &enabled, &endpoint, &stats).await;
            Ok(())
        }
        Err(source) => {
            let error_type = categorize_error(Some(&source));
            if enabled.is_enabled(MetricName::PingErrors) {
                sink.lock().await.record_ping_errors_data_point(
                    Utc::now(),
                    1,
                    &endpoint,
                    "",
                    error_type,
                );
            }
            Err(TargetError::PingFailed {
                endpoint,
                error_type,
                source,
            })
        }
    }
}

async fn record_statistics(
    sink: &Mutex<MetricsBuilder>,
    enabled: &MetricsConfig,
    endpoint: &str,
    stats: &Statistics,
) {
    let ts = Utc::now();
    let ip = stats.addr.to_string();
    let mut mb = sink.lock().await;

    if enabled.is_enabled(MetricName::PingDuration) {
        for rtt in &stats.rtts {
            mb.record_ping_duration_data_point(ts, millis(*rtt), endpoint, &ip);
        }
    }
    if enabled.is_enabled(MetricName::PingDurationMin) && !stats.min_rtt.is_zero() {
        mb.record_ping_duration_min_data_point(ts, millis(stats.min_rtt), endpoint, &ip);
    }
    if enabled.is_enabled(MetricName::PingDurationMax) && !stats.max_rtt.is_zero() {
        mb.record_ping_duration_max_data_point(ts, millis(stats.max_rtt), endpoint, &ip);
    }
    if enabled.is_enabled(MetricName::PingDurationAvg) && !stats.avg_rtt.is_zero() {
        mb.record_ping_duration_avg_data_point(ts, millis(stats.avg_rtt), endpoint, &ip);
    }
    if enabled.is_enabled(MetricName::PingDurationStddev) && !stats.std_dev_rtt.is_zero() {
        mb.record_ping_duration_stddev_data_point(ts, millis(stats.std_dev_rtt), endpoint, &ip);
    }
    // Loss is undefined when nothing went out.
    if enabled.is_enabled(MetricName::PingPacketLoss) && stats.packets_sent > 0 {
        mb.record_ping_packet_loss_data_point(ts, stats.packet_loss / 100.0, endpoint, &ip);
    }
    if enabled.is_enabled(MetricName::PingPacketsSent) {
        mb.record_ping_packets_sent_data_point(ts, stats.packets_sent as i64, endpoint, &ip);
    }
    if enabled.is_enabled(MetricName::PingPacketsReceived) {
        mb.record_ping_packets_received_data_point(ts, stats.packets_recv as i64, endpoint, &ip);
    }
}
