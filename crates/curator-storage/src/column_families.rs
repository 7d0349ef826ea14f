//! Column family definitions for RocksDB.
//!
//! - quotes: the quote library, keyed by article then quote
//! - categories: user-defined categories
//! - digest_history: append-only record of delivered digests

use rocksdb::{ColumnFamilyDescriptor, Options};

/// Column family name for quotes
pub const CF_QUOTES: &str = "quotes";

/// Column family name for categories
pub const CF_CATEGORIES: &str = "categories";

/// Column family name for delivered digests
pub const CF_DIGEST_HISTORY: &str = "digest_history";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[CF_QUOTES, CF_CATEGORIES, CF_DIGEST_HISTORY];

/// Quotes carry embeddings, which compress well
fn quotes_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// History is append-only
fn history_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// Build all column family descriptors
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![
        ColumnFamilyDescriptor::new(CF_QUOTES, quotes_options()),
        ColumnFamilyDescriptor::new(CF_CATEGORIES, Options::default()),
        ColumnFamilyDescriptor::new(CF_DIGEST_HISTORY, history_options()),
    ]
}
