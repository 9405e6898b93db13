//! Scheduled execution of ping cycles.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;

use crate::controller::consumer::MetricsConsumer;
use crate::controller::schedule::{ControllerError, Schedule};
use crate::scraper::{CycleOutcome, PingScraper};

/// Default timeout for graceful shutdown (5 seconds).
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Metadata about the registered collection job.
#[derive(Debug, Clone)]
pub struct JobInfo {
    /// Job UUID.
    pub id: uuid::Uuid,
    /// Schedule description.
    pub schedule: String,
}

/// Everything one cycle needs, cloned into each scheduled invocation.
#[derive(Clone)]
struct CycleRunner {
    scraper: Arc<PingScraper>,
    consumer: Arc<dyn MetricsConsumer>,
    shutdown: CancellationToken,
    timeout: Option<Duration>,
    in_flight: Arc<Mutex<()>>,
}

impl CycleRunner {
    /// Run one scheduled cycle unless the previous one is still going.
    async fn tick(&self) {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::warn!("Previous ping cycle still running, skipping tick");
            return;
        };
        if self.shutdown.is_cancelled() {
            return;
        }

        let (batch, err) = self.collect().await;
        if let Some(err) = err {
            tracing::warn!(failed = err.len(), error = %err, "Ping cycle completed with errors");
        }
        if let Err(e) = self.consumer.consume(batch).await {
            tracing::error!(error = %e, "Failed to hand off metric batch");
        }
    }

    /// Scrape under a child of the shutdown token, bounded by the cycle
    /// timeout when one is set.
    async fn collect(&self) -> CycleOutcome {
        let start = Instant::now();
        let cancel = self.shutdown.child_token();

        let deadline = self.timeout.map(|timeout| {
            let token = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                tracing::warn!(timeout = ?timeout, "Ping cycle deadline reached, cancelling probes");
                token.cancel();
            })
        });

        let outcome = self.scraper.scrape(&cancel).await;
        if let Some(deadline) = deadline {
            deadline.abort();
        }

        tracing::debug!(duration_ms = start.elapsed().as_millis() as u64, "Ping cycle finished");
        outcome
    }
}

/// Drives a [`PingScraper`] on its configured schedule.
///
/// Uses `tokio-cron-scheduler` for both fixed-interval and cron schedules.
/// Cycles never overlap: a tick that fires while the previous cycle is still
/// running is skipped.
pub struct ScrapeController {
    scheduler: JobScheduler,
    runner: CycleRunner,
    schedule: Schedule,
    job: RwLock<Option<JobInfo>>,
}

impl std::fmt::Debug for ScrapeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrapeController")
            .field("schedule", &self.schedule)
            .field("timeout", &self.runner.timeout)
            .field("scraper", &self.runner.scraper)
            .finish_non_exhaustive()
    }
}

impl ScrapeController {
    /// Create a controller for `scraper`, delivering batches to `consumer`.
    ///
    /// # Errors
    /// Fails if the schedule is invalid or the scheduler cannot be created.
    pub async fn new(
        scraper: PingScraper,
        consumer: Arc<dyn MetricsConsumer>,
    ) -> Result<Self, ControllerError> {
        let schedule = scraper.config().schedule()?;
        let timeout = scraper.config().cycle_timeout();
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| ControllerError::Scheduler(e.to_string()))?;

        Ok(Self {
            scheduler,
            runner: CycleRunner {
                scraper: Arc::new(scraper),
                consumer,
                shutdown: CancellationToken::new(),
                timeout,
                in_flight: Arc::new(Mutex::new(())),
            },
            schedule,
            job: RwLock::new(None),
        })
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn scraper(&self) -> &PingScraper {
        &self.runner.scraper
    }

    /// Registered job, once started.
    pub async fn job(&self) -> Option<JobInfo> {
        self.job.read().await.clone()
    }

    /// Start the scraper, register the collection job and start the scheduler.
    ///
    /// The first cycle runs immediately; later ones follow the schedule.
    ///
    /// # Errors
    /// Fails if no pinger could be created or the scheduler rejects the job.
    pub async fn start(&self) -> Result<JobInfo, ControllerError> {
        self.runner.scraper.start(&self.runner.shutdown).await?;

        let job = self.create_job()?;
        let job_id = self
            .scheduler
            .add(job)
            .await
            .map_err(|e| ControllerError::Scheduler(e.to_string()))?;
        self.scheduler
            .start()
            .await
            .map_err(|e| ControllerError::Scheduler(e.to_string()))?;

        let info = JobInfo {
            id: job_id,
            schedule: self.schedule.to_string(),
        };
        *self.job.write().await = Some(info.clone());
        tracing::info!(job_id = %job_id, schedule = %info.schedule, "Ping collection scheduled");

        let runner = self.runner.clone();
        tokio::spawn(async move { runner.tick().await });

        Ok(info)
    }

    /// Run one cycle outside the schedule and return its outcome directly.
    ///
    /// Waits for a scheduled cycle in progress to finish first.
    pub async fn collect_once(&self) -> CycleOutcome {
        let _guard = self.runner.in_flight.lock().await;
        self.runner.collect().await
    }

    /// Gracefully shut down with the default timeout.
    pub async fn shutdown(self) -> Result<(), ControllerError> {
        self.shutdown_with_timeout(DEFAULT_SHUTDOWN_TIMEOUT).await
    }

    /// Cancel in-flight probes, stop the scheduler and release every pinger.
    ///
    /// Pingers are released even if the scheduler fails to stop in time.
    pub async fn shutdown_with_timeout(mut self, timeout: Duration) -> Result<(), ControllerError> {
        self.runner.shutdown.cancel();

        let result = match tokio::time::timeout(timeout, async {
            self.scheduler
                .shutdown()
                .await
                .map_err(|e| ControllerError::Scheduler(e.to_string()))?;
            // Let a cancelled cycle finish recording before pingers go away.
            let _guard = self.runner.in_flight.lock().await;
            Ok::<_, ControllerError>(())
        })
        .await
        {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout = ?timeout, "Ping controller shutdown timed out");
                Ok(())
            }
        };

        self.runner.scraper.shutdown().await?;
        if result.is_ok() {
            tracing::info!("Ping controller shutdown complete");
        }
        result
    }

    fn create_job(&self) -> Result<Job, ControllerError> {
        let runner = self.runner.clone();
        let callback = move |_: uuid::Uuid, _: JobScheduler| {
            let runner = runner.clone();
            Box::pin(async move { runner.tick().await })
                as std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>
        };

        match &self.schedule {
            Schedule::Interval(d) => Job::new_repeated_async(*d, callback),
            Schedule::Cron(expr) => Job::new_cron_job_async(expr, callback),
        }
        .map_err(|e| ControllerError::Scheduler(e.to_string()))
    }
}
