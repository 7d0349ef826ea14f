//! Scheduler service wrapper around tokio-cron-scheduler.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono_tz::Tz;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::parse_timezone;
use crate::jitter::{JitterConfig, TimeoutConfig};
use crate::overlap::OverlapGuard;
use crate::registry::{JobOutput, JobRegistry, JobResult};
use crate::{SchedulerConfig, SchedulerError};

/// Validate a 6-field cron expression (second minute hour day month weekday).
///
/// ```
/// use curator_scheduler::validate_cron_expression;
///
/// assert!(validate_cron_expression("0 45 9 * * *").is_ok());
/// assert!(validate_cron_expression("9:45 daily").is_err());
/// ```
pub fn validate_cron_expression(expr: &str) -> Result<(), SchedulerError> {
    Job::new_async(expr, |_uuid, _lock| Box::pin(async {}))
        .map(|_| ())
        .map_err(|e| SchedulerError::InvalidCron(format!("'{}': {}", expr, e)))
}

/// Owns the cron scheduler, the job registry and the shutdown token.
pub struct SchedulerService {
    scheduler: JobScheduler,
    config: SchedulerConfig,
    registry: Arc<JobRegistry>,
    shutdown_token: CancellationToken,
    is_running: AtomicBool,
}

impl SchedulerService {
    /// Create a scheduler. Jobs do not fire until [`start`](Self::start).
    pub async fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        config.parse_timezone()?;
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            scheduler,
            config,
            registry: Arc::new(JobRegistry::new()),
            shutdown_token: CancellationToken::new(),
            is_running: AtomicBool::new(false),
        })
    }

    pub async fn start(&self) -> Result<(), SchedulerError> {
        if self.is_running.swap(true, Ordering::SeqCst) {
            return Err(SchedulerError::AlreadyRunning);
        }
        self.scheduler.start().await?;
        info!(jobs = self.registry.job_count(), "Scheduler started");
        Ok(())
    }

    /// Cancel running jobs, wait for them up to the shutdown timeout, then stop.
    pub async fn shutdown(&mut self) -> Result<(), SchedulerError> {
        if !self.is_running.load(Ordering::SeqCst) {
            return Err(SchedulerError::NotRunning);
        }

        info!("Initiating scheduler shutdown");
        self.shutdown_token.cancel();

        let deadline = Instant::now() + Duration::from_secs(self.config.shutdown_timeout_secs);
        while self.registry.get_all_status().iter().any(|s| s.is_running) {
            if Instant::now() >= deadline {
                warn!("Jobs still running at shutdown deadline");
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        if let Err(e) = self.scheduler.shutdown().await {
            warn!("Error during scheduler shutdown: {}", e);
        }

        self.is_running.store(false, Ordering::SeqCst);
        info!("Scheduler shutdown complete");
        Ok(())
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    pub fn registry(&self) -> Arc<JobRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Register a cron job with overlap, jitter and overrun handling.
    ///
    /// Each tick waits out the jitter, claims the job's single run slot, runs
    /// `job_fn` to completion and records the outcome in the registry. A tick
    /// that finds the slot taken is skipped. `timezone` falls back to the
    /// configured default.
    pub async fn register_job<F, Fut>(
        &self,
        name: &str,
        cron_expr: &str,
        timezone: Option<&str>,
        jitter: JitterConfig,
        timeout: TimeoutConfig,
        job_fn: F,
    ) -> Result<uuid::Uuid, SchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<JobOutput, String>> + Send + 'static,
    {
        let tz: Tz = match timezone {
            Some(tz) => parse_timezone(tz)?,
            None => self.config.parse_timezone()?,
        };
        validate_cron_expression(cron_expr)?;

        self.registry.register(name, cron_expr, tz.name());

        let runner = Arc::new(JobRunner {
            name: name.to_string(),
            registry: Arc::clone(&self.registry),
            guard: OverlapGuard::new(),
            jitter,
            timeout,
            shutdown: self.shutdown_token.clone(),
        });
        let job_fn = Arc::new(job_fn);

        let job = Job::new_async_tz(cron_expr, tz, move |_uuid, _lock| {
            let runner = Arc::clone(&runner);
            let job_fn = Arc::clone(&job_fn);
            Box::pin(async move {
                runner.run(|| job_fn()).await;
            })
        })
        .map_err(|e| SchedulerError::InvalidCron(e.to_string()))?;

        let uuid = self.scheduler.add(job).await?;
        info!(job = %name, uuid = %uuid, cron = %cron_expr, timezone = %tz.name(), "Job registered");
        Ok(uuid)
    }
}

/// Per-job execution policy shared by every tick of that job.
pub(crate) struct JobRunner {
    pub(crate) name: String,
    pub(crate) registry: Arc<JobRegistry>,
    pub(crate) guard: OverlapGuard,
    pub(crate) jitter: JitterConfig,
    pub(crate) timeout: TimeoutConfig,
    pub(crate) shutdown: CancellationToken,
}

impl JobRunner {
    pub(crate) async fn run<F, Fut>(&self, job_fn: F) -> JobResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<JobOutput, String>>,
    {
        let delay = self.jitter.generate_jitter();
        if !delay.is_zero() {
            debug!(job = %self.name, jitter_ms = delay.as_millis(), "Applying jitter delay");
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.shutdown.cancelled() => {}
            }
        }

        if self.shutdown.is_cancelled() {
            return self.skip("shutting down");
        }

        let Some(_slot) = self.guard.try_acquire() else {
            return self.skip("previous run still active");
        };

        self.registry.record_start(&self.name);
        info!(job = %self.name, "Job started");
        let start = Instant::now();

        let run = job_fn();
        tokio::pin!(run);
        let mut overran = None;
        let outcome = match self.timeout.duration() {
            Some(limit) => match tokio::time::timeout(limit, &mut run).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(
                        job = %self.name,
                        limit_secs = limit.as_secs(),
                        "Job overran its time limit, waiting for it to finish"
                    );
                    overran = Some(limit);
                    run.await
                }
            },
            None => run.await,
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let (result, mut metadata) = match outcome {
            Ok(output) => {
                info!(job = %self.name, duration_ms, "Job completed");
                (JobResult::Success, output.metadata)
            }
            Err(reason) => {
                error!(job = %self.name, duration_ms, error = %reason, "Job failed");
                (JobResult::Failed(reason), BTreeMap::new())
            }
        };
        if let Some(limit) = overran {
            metadata.insert("overran_limit_secs".to_string(), limit.as_secs().to_string());
        }

        self.registry
            .record_complete(&self.name, result.clone(), duration_ms, metadata);
        result
    }

    fn skip(&self, reason: &str) -> JobResult {
        info!(job = %self.name, reason, "Job skipped");
        let result = JobResult::Skipped(reason.to_string());
        self.registry
            .record_complete(&self.name, result.clone(), 0, Default::default());
        result
    }
}
