//! Jobs the curator daemon schedules.

pub mod digest;

pub use digest::{create_digest_job, run_digest_once, DigestJobConfig, DIGEST_JOB_NAME};
