//! Scheduler configuration.

use serde::{Deserialize, Serialize};

use crate::SchedulerError;

/// Configuration for the scheduler service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Timezone for jobs registered without one (IANA name)
    #[serde(default = "default_timezone")]
    pub default_timezone: String,

    /// Seconds running jobs get to finish after shutdown is requested
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_shutdown_timeout() -> u64 {
    10
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_timezone: default_timezone(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl SchedulerConfig {
    /// Scheduler whose default timezone is the digest timezone.
    pub fn with_timezone(timezone: impl Into<String>) -> Self {
        Self {
            default_timezone: timezone.into(),
            ..Default::default()
        }
    }

    /// Parse the configured timezone.
    pub fn parse_timezone(&self) -> Result<chrono_tz::Tz, SchedulerError> {
        parse_timezone(&self.default_timezone)
    }
}

/// Parse an IANA timezone name.
pub fn parse_timezone(tz: &str) -> Result<chrono_tz::Tz, SchedulerError> {
    tz.parse::<chrono_tz::Tz>()
        .map_err(|_| SchedulerError::InvalidTimezone(tz.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.default_timezone, "UTC");
        assert_eq!(config.shutdown_timeout_secs, 10);
    }

    #[test]
    fn test_digest_timezone() {
        let config = SchedulerConfig::with_timezone("America/Chicago");
        assert_eq!(config.parse_timezone().unwrap().name(), "America/Chicago");
    }

    #[test]
    fn test_invalid_timezone() {
        let config = SchedulerConfig::with_timezone("Central Time");
        match config.parse_timezone() {
            Err(SchedulerError::InvalidTimezone(tz)) => assert_eq!(tz, "Central Time"),
            other => panic!("Expected InvalidTimezone, got {:?}", other),
        }
    }
}
