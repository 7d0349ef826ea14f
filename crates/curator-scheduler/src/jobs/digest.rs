//! Daily digest job.
//!
//! Runs one digest cycle per tick. The cycle reads RocksDB and writes the
//! outbox synchronously, so it runs on the blocking pool.

use std::sync::Arc;

use chrono::Utc;
use curator_core::{CycleOutcome, DigestAssembler};
use curator_types::ScheduleSettings;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{JitterConfig, JobOutput, SchedulerError, SchedulerService, TimeoutConfig};

/// Registry name of the digest job.
pub const DIGEST_JOB_NAME: &str = "daily_digest";

/// Configuration for the digest job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DigestJobConfig {
    /// Cron expression (default: "0 45 9 * * *" = 09:45 daily)
    pub cron: String,

    /// Timezone (default: "America/Chicago")
    pub timezone: String,

    /// Max jitter in seconds (default: 0)
    pub jitter_secs: u64,

    /// Seconds before a run is logged as overrunning (default: 600).
    /// The cycle cannot be cancelled once started, so it is never cut short.
    pub overrun_secs: u64,
}

impl Default for DigestJobConfig {
    fn default() -> Self {
        Self::from(&ScheduleSettings::default())
    }
}

impl From<&ScheduleSettings> for DigestJobConfig {
    fn from(schedule: &ScheduleSettings) -> Self {
        Self {
            cron: schedule.cron.clone(),
            timezone: schedule.timezone.clone(),
            jitter_secs: schedule.jitter_secs,
            overrun_secs: 600,
        }
    }
}

/// Summarize a cycle for the job registry.
pub fn outcome_metadata(outcome: &CycleOutcome) -> JobOutput {
    let output = JobOutput::new()
        .with_metadata("quotes_used", outcome.quotes_used.len())
        .with_metadata(
            "source",
            outcome
                .source
                .map(|s| s.to_string())
                .unwrap_or_else(|| "none".to_string()),
        );
    match outcome.receipt.as_ref() {
        Some(receipt) => output.with_metadata("delivered_to", &receipt.location),
        None => output,
    }
}

/// Run one digest cycle on the blocking pool.
pub async fn run_digest_once(assembler: Arc<DigestAssembler>) -> Result<JobOutput, String> {
    let outcome = tokio::task::spawn_blocking(move || {
        assembler.run_digest_cycle(Utc::now(), &mut rand::rng())
    })
    .await
    .map_err(|e| format!("Digest task panicked: {}", e))?
    .map_err(|e| format!("Digest cycle failed: {}", e))?;

    if outcome.was_sent() {
        info!(
            source = ?outcome.source,
            quotes = outcome.quotes_used.len(),
            "Digest sent"
        );
    } else {
        info!("No digest today");
    }
    Ok(outcome_metadata(&outcome))
}

/// Register the daily digest job with the scheduler.
///
/// A tick that arrives while a cycle is still delivering is skipped, so a
/// slow delivery never doubles a digest.
pub async fn create_digest_job(
    scheduler: &SchedulerService,
    assembler: Arc<DigestAssembler>,
    config: DigestJobConfig,
) -> Result<(), SchedulerError> {
    scheduler
        .register_job(
            DIGEST_JOB_NAME,
            &config.cron,
            Some(&config.timezone),
            JitterConfig::new(config.jitter_secs),
            TimeoutConfig::new(config.overrun_secs),
            move || run_digest_once(Arc::clone(&assembler)),
        )
        .await?;

    info!(cron = %config.cron, timezone = %config.timezone, "Registered digest job");
    Ok(())
}
