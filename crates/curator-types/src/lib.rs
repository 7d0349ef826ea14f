//! # curator-types
//!
//! Shared domain types for the quote curator.
//!
//! This crate defines the records every other crate passes around:
//! - Quotes: extracted passages with an optional embedding and article metadata
//! - Categories: user-defined topics with a queued/pool priority state
//! - History: append-only records of delivered digests
//! - Settings: layered configuration, including every selection tunable
//!
//! ## Usage
//!
//! ```rust
//! use curator_types::{Quote, Settings};
//!
//! let settings = Settings::default();
//! assert_eq!(settings.selection.clustering.min_quotes, 5);
//! ```

pub mod category;
pub mod config;
pub mod error;
pub mod history;
pub mod quote;

pub use category::{Category, CategoryId, CategoryStatus, DEFAULT_MIN_QUOTES_FOR_DIGEST};
pub use config::{
    AnchorMode, CategoryMatchSettings, ClusteringSettings, HistorySettings, ScheduleSettings,
    SelectionSettings, Settings, TemporalSettings, WeightedSelectionSettings,
};
pub use error::CuratorTypesError;
pub use history::{DigestRecord, DigestSource, HistoryEntry};
pub use quote::{ArticleId, ArticleMeta, Embedding, Quote, QuoteId, RawEmbedding};
