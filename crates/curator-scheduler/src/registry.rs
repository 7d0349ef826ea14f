//! Job status registry.
//!
//! Every registered job gets a [`JobStatus`] that the run wrapper updates on
//! start and completion. It lives in the daemon process only; the daemon
//! logs a summary of every job from it on shutdown.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "result", content = "reason", rename_all = "snake_case")]
pub enum JobResult {
    Success,
    Failed(String),
    /// Not run, e.g. the previous run was still active
    Skipped(String),
}

/// Metadata a job reports about its run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobOutput {
    pub metadata: BTreeMap<String, String>,
}

impl JobOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.metadata.insert(key.into(), value.to_string());
        self
    }
}

/// Observed state of one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    pub job_name: String,
    pub cron_expr: String,
    pub timezone: String,
    /// When the last run finished
    pub last_run: Option<DateTime<Utc>>,
    pub last_duration_ms: Option<u64>,
    pub last_result: Option<JobResult>,
    pub run_count: u64,
    pub error_count: u64,
    pub skip_count: u64,
    pub is_running: bool,
    #[serde(default)]
    pub last_run_metadata: BTreeMap<String, String>,
}

impl JobStatus {
    fn new(job_name: &str, cron_expr: &str, timezone: &str) -> Self {
        Self {
            job_name: job_name.to_string(),
            cron_expr: cron_expr.to_string(),
            timezone: timezone.to_string(),
            last_run: None,
            last_duration_ms: None,
            last_result: None,
            run_count: 0,
            error_count: 0,
            skip_count: 0,
            is_running: false,
            last_run_metadata: BTreeMap::new(),
        }
    }
}

/// Thread-safe map of job name to status.
///
/// ```
/// use curator_scheduler::{JobRegistry, JobResult};
///
/// let registry = JobRegistry::new();
/// registry.register("daily_digest", "0 45 9 * * *", "America/Chicago");
/// registry.record_start("daily_digest");
/// assert!(registry.is_running("daily_digest"));
/// registry.record_complete("daily_digest", JobResult::Success, 120, Default::default());
/// assert_eq!(registry.get_status("daily_digest").unwrap().run_count, 1);
/// ```
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, JobStatus>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic inside a status update leaves the map itself consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, JobStatus>> {
        self.jobs.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, JobStatus>> {
        self.jobs.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a job, replacing any previous status under the same name.
    pub fn register(&self, job_name: &str, cron_expr: &str, timezone: &str) {
        self.write().insert(
            job_name.to_string(),
            JobStatus::new(job_name, cron_expr, timezone),
        );
    }

    pub fn record_start(&self, job_name: &str) {
        if let Some(status) = self.write().get_mut(job_name) {
            status.is_running = true;
        }
    }

    /// Record a finished, failed or skipped run.
    pub fn record_complete(
        &self,
        job_name: &str,
        result: JobResult,
        duration_ms: u64,
        metadata: BTreeMap<String, String>,
    ) {
        let mut jobs = self.write();
        let Some(status) = jobs.get_mut(job_name) else {
            return;
        };

        match &result {
            JobResult::Skipped(_) => {
                status.skip_count += 1;
            }
            JobResult::Failed(_) => {
                status.is_running = false;
                status.run_count += 1;
                status.error_count += 1;
            }
            JobResult::Success => {
                status.is_running = false;
                status.run_count += 1;
            }
        }
        status.last_run = Some(Utc::now());
        status.last_duration_ms = Some(duration_ms);
        status.last_result = Some(result);
        status.last_run_metadata = metadata;
    }

    pub fn get_status(&self, job_name: &str) -> Option<JobStatus> {
        self.read().get(job_name).cloned()
    }

    /// All statuses, sorted by job name.
    pub fn get_all_status(&self) -> Vec<JobStatus> {
        let mut all: Vec<JobStatus> = self.read().values().cloned().collect();
        all.sort_by(|a, b| a.job_name.cmp(&b.job_name));
        all
    }

    pub fn is_running(&self, job_name: &str) -> bool {
        self.read()
            .get(job_name)
            .map(|s| s.is_running)
            .unwrap_or(false)
    }

    pub fn is_registered(&self, job_name: &str) -> bool {
        self.read().contains_key(job_name)
    }

    pub fn job_count(&self) -> usize {
        self.read().len()
    }
}
