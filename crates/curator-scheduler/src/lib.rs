//! Background scheduling for the curator daemon.
//!
//! Wraps `tokio-cron-scheduler` with:
//! - timezone-aware cron jobs via chrono-tz
//! - an overlap guard so a slow run is never doubled
//! - optional start jitter and an overrun warning
//! - a [`JobRegistry`] recording the outcome of every run
//! - graceful shutdown through a `CancellationToken`
//!
//! The only job today is the daily digest in [`jobs::digest`].
//!
//! ```ignore
//! let scheduler = SchedulerService::new(SchedulerConfig::with_timezone("America/Chicago")).await?;
//! create_digest_job(&scheduler, assembler, DigestJobConfig::from(&settings.schedule)).await?;
//! scheduler.start().await?;
//! ```

mod config;
mod error;
mod jitter;
pub mod jobs;
mod overlap;
mod registry;
mod scheduler;

pub use config::{parse_timezone, SchedulerConfig};
pub use error::SchedulerError;
pub use jitter::{JitterConfig, TimeoutConfig};
pub use jobs::{create_digest_job, run_digest_once, DigestJobConfig, DIGEST_JOB_NAME};
pub use overlap::{OverlapGuard, RunGuard};
pub use registry::{JobOutput, JobRegistry, JobResult, JobStatus};
pub use scheduler::{validate_cron_expression, SchedulerService};
