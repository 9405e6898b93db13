//! In-memory pinger doubles for scraper and controller tests.

use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::probe::{Pinger, PingerFactory, PingerSettings, ProbeError, Statistics};

/// What a fake pinger does when run.
#[derive(Debug, Clone)]
pub(crate) enum FakeOutcome {
    /// Return these statistics.
    Stats(Statistics),
    /// Fail with a transport error carrying this message.
    Fail(String),
    /// Block until cancelled.
    Hang,
}

/// Statistics with three of four replies at 10/20/30ms.
pub(crate) fn sample_stats(addr: IpAddr) -> Statistics {
    Statistics::from_samples(
        addr,
        4,
        &[
            Duration::from_millis(10),
            Duration::from_millis(20),
            Duration::from_millis(30),
        ],
        false,
    )
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub(crate) struct FakePinger {
    endpoint: String,
    settings: PingerSettings,
    outcome: FakeOutcome,
    stopped: AtomicBool,
    in_flight: AtomicBool,
    runs: AtomicUsize,
}

impl FakePinger {
    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub(crate) fn run_count(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Pinger for FakePinger {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn settings(&self) -> &PingerSettings {
        &self.settings
    }

    async fn run(&self, cancel: &CancellationToken) -> Result<Statistics, ProbeError> {
        if self.is_stopped() {
            return Err(ProbeError::Stopped);
        }
        assert!(
            !self.in_flight.swap(true, Ordering::SeqCst),
            "pinger for {} invoked concurrently",
            self.endpoint
        );
        // Cleared on drop too, since the caller may abandon this future.
        let _in_flight = InFlight(&self.in_flight);
        self.runs.fetch_add(1, Ordering::SeqCst);

        // Yield so sibling tasks interleave with this one.
        tokio::task::yield_now().await;

        match &self.outcome {
            FakeOutcome::Stats(stats) => Ok(stats.clone()),
            FakeOutcome::Fail(message) => Err(ProbeError::Transport(message.clone())),
            FakeOutcome::Hang => {
                cancel.cancelled().await;
                Err(ProbeError::Cancelled)
            }
        }
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Factory handing out [`FakePinger`]s. Unknown endpoints succeed with
/// [`sample_stats`] unless marked unresolvable.
#[derive(Default)]
pub(crate) struct FakeFactory {
    outcomes: HashMap<String, FakeOutcome>,
    unresolvable: HashSet<String>,
    created: Mutex<HashMap<String, Arc<FakePinger>>>,
    cancel_after: Option<(String, CancellationToken)>,
}

impl FakeFactory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_outcome(mut self, endpoint: &str, outcome: FakeOutcome) -> Self {
        self.outcomes.insert(endpoint.to_string(), outcome);
        self
    }

    pub(crate) fn with_unresolvable(mut self, endpoint: &str) -> Self {
        self.unresolvable.insert(endpoint.to_string());
        self
    }

    /// Cancel `token` once the handle for `endpoint` has been created.
    pub(crate) fn with_cancel_after(mut self, endpoint: &str, token: CancellationToken) -> Self {
        self.cancel_after = Some((endpoint.to_string(), token));
        self
    }

    /// Handle created for `endpoint`, if any.
    pub(crate) fn created(&self, endpoint: &str) -> Option<Arc<FakePinger>> {
        self.created
            .lock()
            .expect("fake factory lock poisoned")
            .get(endpoint)
            .cloned()
    }

    pub(crate) fn created_count(&self) -> usize {
        self.created.lock().expect("fake factory lock poisoned").len()
    }
}

#[async_trait::async_trait]
impl PingerFactory for FakeFactory {
    async fn create(
        &self,
        endpoint: &str,
        settings: PingerSettings,
    ) -> Result<Arc<dyn Pinger>, ProbeError> {
        if self.unresolvable.contains(endpoint) {
            return Err(ProbeError::Resolve {
                host: endpoint.to_string(),
                reason: "fake resolver".to_string(),
            });
        }

        let outcome = self
            .outcomes
            .get(endpoint)
            .cloned()
            .unwrap_or_else(|| FakeOutcome::Stats(sample_stats(IpAddr::V4(Ipv4Addr::LOCALHOST))));
        let pinger = Arc::new(FakePinger {
            endpoint: endpoint.to_string(),
            settings,
            outcome,
            stopped: AtomicBool::new(false),
            in_flight: AtomicBool::new(false),
            runs: AtomicUsize::new(0),
        });
        self.created
            .lock()
            .expect("fake factory lock poisoned")
            .insert(endpoint.to_string(), Arc::clone(&pinger));
        if let Some((trigger, token)) = &self.cancel_after
            && trigger == endpoint
        {
            token.cancel();
        }
        Ok(pinger)
    }
}
