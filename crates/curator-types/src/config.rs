//! Configuration loading for the quote curator.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at `<config_dir>/quote-curator/config.toml`.

use config::{Config, Environment, File};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::CuratorTypesError;

const APP_NAME: &str = "quote-curator";

/// Clustering engine thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringSettings {
    /// Minimum cosine similarity to the seed for cluster membership (inclusive)
    #[serde(default = "default_cluster_similarity")]
    pub similarity_threshold: f32,

    /// Minimum members for a cluster to qualify
    #[serde(default = "default_min_quotes")]
    pub min_quotes: usize,

    /// Minimum distinct articles for a cluster to qualify
    #[serde(default = "default_min_articles")]
    pub min_articles: usize,
}

fn default_cluster_similarity() -> f32 {
    0.60
}

fn default_min_quotes() -> usize {
    5
}

fn default_min_articles() -> usize {
    3
}

impl Default for ClusteringSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: default_cluster_similarity(),
            min_quotes: default_min_quotes(),
            min_articles: default_min_articles(),
        }
    }
}

/// Age windows used to split a cluster into anchor and echoes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalSettings {
    /// Quotes created more than this many days ago are "old"
    #[serde(default = "default_old_after_days")]
    pub old_after_days: u32,

    /// Quotes created within this many days are "recent"
    #[serde(default = "default_recent_within_days")]
    pub recent_within_days: u32,

    /// Maximum echo quotes attached to an anchor
    #[serde(default = "default_max_recent")]
    pub max_recent: usize,

    /// Minimum recent quotes required in strict mode
    #[serde(default = "default_min_recent")]
    pub min_recent: usize,
}

fn default_old_after_days() -> u32 {
    60
}

fn default_recent_within_days() -> u32 {
    30
}

fn default_max_recent() -> usize {
    3
}

fn default_min_recent() -> usize {
    2
}

impl Default for TemporalSettings {
    fn default() -> Self {
        Self {
            old_after_days: default_old_after_days(),
            recent_within_days: default_recent_within_days(),
            max_recent: default_max_recent(),
            min_recent: default_min_recent(),
        }
    }
}

/// How strictly the curator path demands an old anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorMode {
    /// Require an old anchor and recent echoes
    Strict,
    /// Oldest member anchors, next members echo
    Relaxed,
    /// Strict first, relaxed if strict finds nothing
    #[default]
    Auto,
}

/// Weighted draw across the best candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedSelectionSettings {
    /// How many of the richest candidates take part in the draw
    #[serde(default = "default_top_candidates")]
    pub top_candidates: usize,

    /// Draw weights, best candidate first
    #[serde(default = "default_weights")]
    pub weights: Vec<u32>,

    /// Anchor strictness for the curator path
    #[serde(default)]
    pub anchor_mode: AnchorMode,
}

fn default_top_candidates() -> usize {
    3
}

fn default_weights() -> Vec<u32> {
    vec![3, 2, 1]
}

impl Default for WeightedSelectionSettings {
    fn default() -> Self {
        Self {
            top_candidates: default_top_candidates(),
            weights: default_weights(),
            anchor_mode: AnchorMode::default(),
        }
    }
}

/// Category matching thresholds.
///
/// Category matching uses a lower floor than quote-to-quote clustering: a
/// category embeds an abstract label, and similarity to a concept is weaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMatchSettings {
    /// Similarity floor for previews and stats
    #[serde(default = "default_stats_threshold")]
    pub stats_threshold: f32,

    /// Match limit for previews and stats
    #[serde(default = "default_stats_limit")]
    pub stats_limit: usize,

    /// Similarity floor when assembling a category digest
    #[serde(default = "default_digest_threshold")]
    pub digest_threshold: f32,

    /// Match limit when assembling a category digest
    #[serde(default = "default_digest_limit")]
    pub digest_limit: usize,

    /// Quotes carried into the digest body
    #[serde(default = "default_max_digest_quotes")]
    pub max_digest_quotes: usize,

    /// Minimum distinct articles among matches
    #[serde(default = "default_min_articles")]
    pub min_articles: usize,

    /// Sample quotes reported by stats
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

fn default_stats_threshold() -> f32 {
    0.35
}

fn default_stats_limit() -> usize {
    100
}

fn default_digest_threshold() -> f32 {
    0.55
}

fn default_digest_limit() -> usize {
    20
}

fn default_max_digest_quotes() -> usize {
    8
}

fn default_sample_size() -> usize {
    3
}

impl Default for CategoryMatchSettings {
    fn default() -> Self {
        Self {
            stats_threshold: default_stats_threshold(),
            stats_limit: default_stats_limit(),
            digest_threshold: default_digest_threshold(),
            digest_limit: default_digest_limit(),
            max_digest_quotes: default_max_digest_quotes(),
            min_articles: default_min_articles(),
            sample_size: default_sample_size(),
        }
    }
}

/// Lookback windows for repetition avoidance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySettings {
    /// Curator anchors used within this window are excluded
    #[serde(default = "default_curator_lookback")]
    pub curator_lookback_days: u32,

    /// Quotes used for a category within this window are excluded
    #[serde(default = "default_category_lookback")]
    pub category_lookback_days: u32,
}

fn default_curator_lookback() -> u32 {
    7
}

fn default_category_lookback() -> u32 {
    30
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            curator_lookback_days: default_curator_lookback(),
            category_lookback_days: default_category_lookback(),
        }
    }
}

/// Every tunable of the selection engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionSettings {
    #[serde(default)]
    pub clustering: ClusteringSettings,
    #[serde(default)]
    pub temporal: TemporalSettings,
    #[serde(default)]
    pub selection: WeightedSelectionSettings,
    #[serde(default)]
    pub category: CategoryMatchSettings,
    #[serde(default)]
    pub history: HistorySettings,
}

impl SelectionSettings {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        let thresholds = [
            ("clustering.similarity_threshold", self.clustering.similarity_threshold),
            ("category.stats_threshold", self.category.stats_threshold),
            ("category.digest_threshold", self.category.digest_threshold),
        ];
        for (name, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be 0.0-1.0, got {}", name, value));
            }
        }
        if self.clustering.min_quotes == 0 {
            return Err("clustering.min_quotes must be > 0".to_string());
        }
        if self.clustering.min_articles == 0 {
            return Err("clustering.min_articles must be > 0".to_string());
        }
        if self.temporal.old_after_days <= self.temporal.recent_within_days {
            return Err(format!(
                "temporal.old_after_days ({}) must exceed temporal.recent_within_days ({})",
                self.temporal.old_after_days, self.temporal.recent_within_days
            ));
        }
        if self.selection.top_candidates == 0 {
            return Err("selection.top_candidates must be > 0".to_string());
        }
        if self.selection.weights.is_empty() || self.selection.weights.iter().any(|w| *w == 0) {
            return Err("selection.weights must be non-empty and positive".to_string());
        }
        if self.category.max_digest_quotes == 0 {
            return Err("category.max_digest_quotes must be > 0".to_string());
        }
        Ok(())
    }
}

/// When the daily digest runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSettings {
    /// Register the digest job when the daemon starts
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// 6-field cron expression (sec min hour dom month dow)
    #[serde(default = "default_cron")]
    pub cron: String,

    /// IANA timezone for the cron expression
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Maximum random delay before a run, in seconds
    #[serde(default)]
    pub jitter_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_cron() -> String {
    "0 45 9 * * *".to_string() // 9:45 AM daily
}

fn default_timezone() -> String {
    "America/Chicago".to_string()
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            cron: default_cron(),
            timezone: default_timezone(),
            jitter_secs: 0,
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to RocksDB storage directory
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Directory the outbox delivery writes digests into
    #[serde(default = "default_outbox_path")]
    pub outbox_path: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Digest schedule
    #[serde(default)]
    pub schedule: ScheduleSettings,

    /// Selection engine tunables
    #[serde(default)]
    pub selection: SelectionSettings,
}

fn data_dir_path(leaf: &str) -> String {
    ProjectDirs::from("", "", APP_NAME)
        .map(|p| p.data_local_dir().join(leaf))
        .unwrap_or_else(|| PathBuf::from(format!("./{}", leaf)))
        .to_string_lossy()
        .to_string()
}

fn default_db_path() -> String {
    data_dir_path("db")
}

fn default_outbox_path() -> String {
    data_dir_path("outbox")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            outbox_path: default_outbox_path(),
            log_level: default_log_level(),
            schedule: ScheduleSettings::default(),
            selection: SelectionSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (`<config_dir>/quote-curator/config.toml`)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (`CURATOR_*`, nested keys joined by `__`)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, CuratorTypesError> {
        let config_dir = ProjectDirs::from("", "", APP_NAME)
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("db_path", default_db_path())
            .map_err(|e| CuratorTypesError::Config(e.to_string()))?
            .set_default("outbox_path", default_outbox_path())
            .map_err(|e| CuratorTypesError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| CuratorTypesError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // CURATOR_DB_PATH, CURATOR_SCHEDULE__CRON, CURATOR_SELECTION__CLUSTERING__MIN_QUOTES
        builder = builder.add_source(
            Environment::with_prefix("CURATOR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| CuratorTypesError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| CuratorTypesError::Config(e.to_string()))?;

        settings
            .selection
            .validate()
            .map_err(CuratorTypesError::Config)?;

        Ok(settings)
    }

    /// Expand ~ in db_path to the home directory
    pub fn expanded_db_path(&self) -> PathBuf {
        expand_home(&self.db_path)
    }

    /// Expand ~ in outbox_path to the home directory
    pub fn expanded_outbox_path(&self) -> PathBuf {
        expand_home(&self.outbox_path)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(base) = BaseDirs::new() {
            return base.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.schedule.cron, "0 45 9 * * *");
        assert_eq!(settings.schedule.timezone, "America/Chicago");
        assert!(settings.schedule.enabled);
    }

    #[test]
    fn test_selection_defaults() {
        let selection = SelectionSettings::default();
        assert!((selection.clustering.similarity_threshold - 0.60).abs() < f32::EPSILON);
        assert_eq!(selection.clustering.min_quotes, 5);
        assert_eq!(selection.clustering.min_articles, 3);
        assert_eq!(selection.temporal.old_after_days, 60);
        assert_eq!(selection.temporal.recent_within_days, 30);
        assert_eq!(selection.temporal.max_recent, 3);
        assert_eq!(selection.selection.weights, vec![3, 2, 1]);
        assert_eq!(selection.selection.anchor_mode, AnchorMode::Auto);
        assert!((selection.category.stats_threshold - 0.35).abs() < f32::EPSILON);
        assert!((selection.category.digest_threshold - 0.55).abs() < f32::EPSILON);
        assert_eq!(selection.history.curator_lookback_days, 7);
        assert_eq!(selection.history.category_lookback_days, 30);
    }

    #[test]
    fn test_load_with_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.selection.clustering.min_quotes, 5);
    }

    #[test]
    fn test_validation() {
        let mut selection = SelectionSettings::default();
        assert!(selection.validate().is_ok());

        selection.clustering.similarity_threshold = 1.5;
        assert!(selection.validate().is_err());

        selection = SelectionSettings::default();
        selection.temporal.old_after_days = 30;
        assert!(selection.validate().is_err());

        selection = SelectionSettings::default();
        selection.selection.weights = vec![];
        assert!(selection.validate().is_err());

        selection = SelectionSettings::default();
        selection.selection.weights = vec![3, 0, 1];
        assert!(selection.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{"clustering":{"min_quotes":7},"selection":{"anchor_mode":"strict"}}"#;
        let selection: SelectionSettings = serde_json::from_str(json).unwrap();
        assert_eq!(selection.clustering.min_quotes, 7);
        assert_eq!(selection.clustering.min_articles, 3);
        assert_eq!(selection.selection.anchor_mode, AnchorMode::Strict);
        assert_eq!(selection.selection.weights, vec![3, 2, 1]);
    }

    #[test]
    fn test_expand_home_leaves_absolute_paths() {
        assert_eq!(expand_home("/var/lib/curator"), PathBuf::from("/var/lib/curator"));
    }
}
