//! Destinations for emitted metric batches.

use std::io::Write;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::metrics::{MetricBatch, MetricName};

/// Errors returned by a [`MetricsConsumer`].
#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("failed to serialize batch: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write batch: {0}")]
    Io(#[from] std::io::Error),

    /// The receiving side is gone.
    #[error("metric channel closed")]
    Closed,
}

/// Receives one batch per completed cycle.
#[async_trait::async_trait]
pub trait MetricsConsumer: Send + Sync + 'static {
    async fn consume(&self, batch: MetricBatch) -> Result<(), ConsumerError>;
}

/// Logs a summary of every batch and optionally prints it as a JSON line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogConsumer {
    json: bool,
}

impl LogConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also write each batch to stdout as one JSON line.
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

#[async_trait::async_trait]
impl MetricsConsumer for LogConsumer {
    async fn consume(&self, batch: MetricBatch) -> Result<(), ConsumerError> {
        let errors = batch.points_for(MetricName::PingErrors).count();
        tracing::info!(
            points = batch.len(),
            errors,
            emitted_at = %batch.emitted_at,
            "Metric batch emitted"
        );

        for point in batch.points_for(MetricName::PingDurationAvg) {
            tracing::debug!(
                endpoint = %point.attributes.endpoint,
                ip = %point.attributes.ip,
                avg_ms = point.value.as_f64(),
                "Average round-trip time"
            );
        }

        if self.json {
            let line = serde_json::to_string(&batch)?;
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{line}")?;
            stdout.flush()?;
        }
        Ok(())
    }
}

/// Forwards batches into an mpsc channel, for embedding the receiver.
#[derive(Debug, Clone)]
pub struct ChannelConsumer {
    tx: mpsc::Sender<MetricBatch>,
}

impl ChannelConsumer {
    /// Create a consumer and the receiving end of its channel.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<MetricBatch>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait::async_trait]
impl MetricsConsumer for ChannelConsumer {
    async fn consume(&self, batch: MetricBatch) -> Result<(), ConsumerError> {
        self.tx.send(batch).await.map_err(|_| ConsumerError::Closed)
    }
}
