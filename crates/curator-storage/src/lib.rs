//! Storage layer for the quote curator.
//!
//! Provides RocksDB-backed storage with:
//! - Column family isolation for quotes, categories and digest history
//! - Article-prefixed quote keys so one article's quotes delete atomically
//! - Time-prefixed history keys for lookback range scans
//! - [`StorageRepository`], which plugs the store into the digest engine

pub mod column_families;
pub mod db;
pub mod error;
pub mod keys;
pub mod repos;

pub use db::{Storage, StorageStats};
pub use error::StorageError;
pub use keys::{CategoryKey, HistoryKey, QuoteKey};
pub use repos::StorageRepository;
