//! Start delay and overrun limit for scheduled jobs.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Random delay applied before each run.
///
/// ```
/// use curator_scheduler::JitterConfig;
///
/// let jitter = JitterConfig::new(30);
/// assert!(jitter.generate_jitter() < std::time::Duration::from_secs(30));
/// assert!(JitterConfig::none().generate_jitter().is_zero());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct JitterConfig {
    /// Upper bound in seconds, exclusive; 0 disables jitter
    pub max_jitter_secs: u64,
}

impl JitterConfig {
    pub fn new(max_jitter_secs: u64) -> Self {
        Self { max_jitter_secs }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.max_jitter_secs > 0
    }

    /// A delay in `[0, max_jitter_secs)` at millisecond resolution.
    pub fn generate_jitter(&self) -> Duration {
        if !self.is_enabled() {
            return Duration::ZERO;
        }
        let millis = rand::rng().random_range(0..self.max_jitter_secs * 1000);
        Duration::from_millis(millis)
    }
}

/// Expected upper bound on a single run.
///
/// A run past the limit is reported as overrunning and then awaited to the
/// end. Jobs may sit on the blocking pool where they cannot be cancelled, so
/// the run keeps its overlap slot until the work has really finished.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Seconds before the run is reported as overrunning; 0 means no limit
    pub timeout_secs: u64,
}

impl TimeoutConfig {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn duration(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jitter_disabled() {
        let jitter = JitterConfig::default();
        assert!(!jitter.is_enabled());
        assert_eq!(jitter.generate_jitter(), Duration::ZERO);
    }

    #[test]
    fn test_jitter_within_bounds() {
        let jitter = JitterConfig::new(2);
        for _ in 0..200 {
            assert!(jitter.generate_jitter() < Duration::from_secs(2));
        }
    }

    #[test]
    fn test_timeout_duration() {
        assert_eq!(TimeoutConfig::none().duration(), None);
        assert_eq!(
            TimeoutConfig::new(90).duration(),
            Some(Duration::from_secs(90))
        );
    }
}
