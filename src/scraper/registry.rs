//! Target registry holding one live pinger handle per endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::config::TargetConfig;
use crate::probe::{Pinger, PingerFactory, PingerSettings};
use crate::scraper::error::ScraperError;

/// Process-lifetime map from endpoint to its pinger.
///
/// Populated once by [`initialize`](Self::initialize), read concurrently by
/// every cycle through [`lookup`](Self::lookup), and cleared by
/// [`teardown`](Self::teardown).
#[derive(Default)]
pub struct TargetRegistry {
    pingers: RwLock<HashMap<String, Arc<dyn Pinger>>>,
}

impl std::fmt::Debug for TargetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetRegistry")
            .field(
                "pinger_count",
                &self.pingers.try_read().map(|p| p.len()).unwrap_or(0),
            )
            .finish_non_exhaustive()
    }
}

impl TargetRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pinger for every target.
    ///
    /// Targets whose pinger cannot be created are logged and skipped, as are
    /// repeated endpoints. Creation stops early when `cancel` fires.
    ///
    /// Returns the number of live handles.
    ///
    /// # Errors
    /// Returns [`ScraperError::NoValidPingers`] when the registry ends up empty.
    pub async fn initialize(
        &self,
        targets: &[TargetConfig],
        factory: &dyn PingerFactory,
        privileged: bool,
        cancel: &CancellationToken,
    ) -> Result<usize, ScraperError> {
        let mut created: HashMap<String, Arc<dyn Pinger>> = HashMap::with_capacity(targets.len());

        for (i, target) in targets.iter().enumerate() {
            if created.contains_key(&target.endpoint) {
                tracing::warn!(endpoint = %target.endpoint, "Duplicate target endpoint, skipping");
                continue;
            }

            let settings = PingerSettings::from_target(target, privileged);
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::warn!(
                        created = created.len(),
                        remaining = targets.len() - i,
                        "Pinger creation cancelled"
                    );
                    break;
                }
                result = factory.create(&target.endpoint, settings) => result,
            };

            match result {
                Ok(pinger) => {
                    created.insert(target.endpoint.clone(), pinger);
                }
                Err(e) => {
                    tracing::error!(
                        endpoint = %target.endpoint,
                        error = %e,
                        "Failed to create pinger"
                    );
                }
            }
        }

        let mut pingers = self.pingers.write().await;
        for (endpoint, pinger) in created {
            if pingers.contains_key(&endpoint) {
                tracing::warn!(endpoint = %endpoint, "Pinger already registered, keeping existing");
                pinger.stop();
                continue;
            }
            pingers.insert(endpoint, pinger);
        }

        if pingers.is_empty() {
            return Err(ScraperError::NoValidPingers);
        }
        Ok(pingers.len())
    }

    /// Handle for `endpoint`, if one was created.
    pub async fn lookup(&self, endpoint: &str) -> Option<Arc<dyn Pinger>> {
        self.pingers.read().await.get(endpoint).cloned()
    }

    /// Stop every handle and clear the registry. Safe to call repeatedly.
    pub async fn teardown(&self) {
        let mut pingers = self.pingers.write().await;
        for (endpoint, pinger) in pingers.drain() {
            pinger.stop();
            tracing::debug!(endpoint = %endpoint, "Stopped pinger");
        }
    }

    /// Number of live handles.
    pub async fn len(&self) -> usize {
        self.pingers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pingers.read().await.is_empty()
    }

    /// Registered endpoints, sorted.
    pub async fn endpoints(&self) -> Vec<String> {
        let mut endpoints: Vec<String> = self.pingers.read().await.keys().cloned().collect();
        endpoints.sort();
        endpoints
    }
}
