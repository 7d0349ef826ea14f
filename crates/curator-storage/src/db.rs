//! RocksDB wrapper for the quote curator.
//!
//! Provides:
//! - Database open with column family setup
//! - Quote, category and history reads and writes
//! - Atomic per-article quote deletion
//! - Time-range history scans

use std::path::Path;

use chrono::{DateTime, Utc};
use curator_types::{Category, HistoryEntry, Quote};
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};
use tracing::{debug, info};

use crate::column_families::{
    build_cf_descriptors, ALL_CF_NAMES, CF_CATEGORIES, CF_DIGEST_HISTORY, CF_QUOTES,
};
use crate::error::StorageError;
use crate::keys::{CategoryKey, HistoryKey, QuoteKey};

/// Main storage interface
pub struct Storage {
    db: DB,
}

impl Storage {
    /// Open storage at the given path, creating if necessary
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        info!("Opening storage at {:?}", path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_background_jobs(2);

        let db = DB::open_cf_descriptors(&db_opts, path, build_cf_descriptors())?;
        Ok(Self { db })
    }

    fn cf(&self, cf_name: &str) -> Result<&rocksdb::ColumnFamily, StorageError> {
        self.db
            .cf_handle(cf_name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(cf_name.to_string()))
    }

    // ===== Quotes =====

    /// Insert or replace a quote.
    pub fn put_quote(&self, quote: &Quote) -> Result<(), StorageError> {
        let key = QuoteKey::new(&quote.article_id, &quote.id)?;
        let value = quote.to_bytes()?;
        self.put(CF_QUOTES, &key.to_bytes(), &value)?;
        debug!(quote_id = %quote.id, article_id = %quote.article_id, "Stored quote");
        Ok(())
    }

    /// Insert or replace many quotes in one atomic write.
    pub fn put_quotes(&self, quotes: &[Quote]) -> Result<usize, StorageError> {
        let cf = self.cf(CF_QUOTES)?;
        let mut batch = WriteBatch::default();
        for quote in quotes {
            let key = QuoteKey::new(&quote.article_id, &quote.id)?;
            batch.put_cf(cf, key.to_bytes(), quote.to_bytes()?);
        }
        self.db.write(batch)?;
        debug!(count = quotes.len(), "Stored quotes");
        Ok(quotes.len())
    }

    /// Every stored quote, ordered by key.
    pub fn list_quotes(&self) -> Result<Vec<Quote>, StorageError> {
        self.prefix_iterator(CF_QUOTES, &QuoteKey::prefix_all())?
            .into_iter()
            .map(|(_, value)| Quote::from_bytes(&value).map_err(StorageError::from))
            .collect()
    }

    /// Delete every quote of an article. Returns the number deleted.
    pub fn delete_quotes_for_article(&self, article_id: &str) -> Result<usize, StorageError> {
        let prefix = QuoteKey::prefix_for_article(article_id)?;
        let keys = self.prefix_iterator(CF_QUOTES, &prefix)?;
        if keys.is_empty() {
            return Ok(0);
        }

        let cf = self.cf(CF_QUOTES)?;
        let mut batch = WriteBatch::default();
        for (key, _) in &keys {
            batch.delete_cf(cf, key);
        }
        self.db.write(batch)?;
        info!(article_id, count = keys.len(), "Deleted quotes for article");
        Ok(keys.len())
    }

    // ===== Categories =====

    /// Insert or replace a category.
    pub fn put_category(&self, category: &Category) -> Result<(), StorageError> {
        let key = CategoryKey::new(category.id.clone());
        self.put(CF_CATEGORIES, &key.to_bytes(), &category.to_bytes()?)?;
        debug!(category_id = %category.id, status = %category.status, "Stored category");
        Ok(())
    }

    pub fn get_category(&self, category_id: &str) -> Result<Option<Category>, StorageError> {
        let key = CategoryKey::new(category_id);
        match self.get(CF_CATEGORIES, &key.to_bytes())? {
            Some(bytes) => Ok(Some(Category::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Every category, oldest first.
    pub fn list_categories(&self) -> Result<Vec<Category>, StorageError> {
        let mut categories = self
            .prefix_iterator(CF_CATEGORIES, &CategoryKey::prefix_all())?
            .into_iter()
            .map(|(_, value)| Category::from_bytes(&value).map_err(StorageError::from))
            .collect::<Result<Vec<_>, _>>()?;
        categories.sort_by_key(|c| c.created_at);
        Ok(categories)
    }

    /// Soft-delete a category so history entries can still resolve it.
    /// Returns false if it does not exist or was already deleted.
    pub fn deactivate_category(&self, category_id: &str) -> Result<bool, StorageError> {
        let Some(mut category) = self.get_category(category_id)? else {
            return Ok(false);
        };
        if !category.is_active {
            return Ok(false);
        }
        category.deactivate();
        self.put_category(&category)?;
        info!(category_id, "Deactivated category");
        Ok(true)
    }

    // ===== History =====

    /// Append a history entry.
    pub fn put_history(&self, entry: &HistoryEntry) -> Result<(), StorageError> {
        let key = HistoryKey::from_entry(entry.sent_at.timestamp_millis(), &entry.entry_id)?;
        self.put(CF_DIGEST_HISTORY, &key.to_bytes(), &entry.to_bytes()?)?;
        debug!(entry_id = %entry.entry_id, source = %entry.record.source(), "Recorded digest");
        Ok(())
    }

    /// History entries sent at or after `since`, oldest first.
    pub fn history_since(&self, since: DateTime<Utc>) -> Result<Vec<HistoryEntry>, StorageError> {
        let cf = self.cf(CF_DIGEST_HISTORY)?;
        let start = HistoryKey::prefix_start(since.timestamp_millis());
        let prefix = HistoryKey::prefix_all();

        let mut results = Vec::new();
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&start, Direction::Forward));
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            let entry = HistoryEntry::from_bytes(&value)?;
            // Millisecond keys can admit an entry a fraction earlier than `since`.
            if entry.sent_at >= since {
                results.push(entry);
            }
        }
        Ok(results)
    }

    // ===== Generic Column Family Operations =====

    /// Put a value into a specific column family.
    pub fn put(&self, cf_name: &str, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let cf = self.cf(cf_name)?;
        self.db.put_cf(cf, key, value)?;
        Ok(())
    }

    /// Get a value from a specific column family.
    pub fn get(&self, cf_name: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let cf = self.cf(cf_name)?;
        Ok(self.db.get_cf(cf, key)?)
    }

    /// Delete a value from a specific column family.
    pub fn delete(&self, cf_name: &str, key: &[u8]) -> Result<(), StorageError> {
        let cf = self.cf(cf_name)?;
        self.db.delete_cf(cf, key)?;
        Ok(())
    }

    /// Collect entries with a given prefix in a column family.
    #[allow(clippy::type_complexity)]
    pub fn prefix_iterator(
        &self,
        cf_name: &str,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        let cf = self.cf(cf_name)?;

        let mut results = Vec::new();
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward));

        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
        }

        Ok(results)
    }

    // ===== Admin Operations =====

    /// Flush memtables to disk.
    pub fn flush(&self) -> Result<(), StorageError> {
        for cf_name in ALL_CF_NAMES {
            let cf = self.cf(cf_name)?;
            self.db.flush_cf(cf)?;
        }
        Ok(())
    }

    /// Trigger manual compaction on all column families.
    pub fn compact(&self) -> Result<(), StorageError> {
        info!("Starting full compaction...");
        self.db.compact_range::<&[u8], &[u8]>(None, None);
        for cf_name in ALL_CF_NAMES {
            if let Some(cf) = self.db.cf_handle(cf_name) {
                self.db.compact_range_cf::<&[u8], &[u8]>(cf, None, None);
            }
        }
        info!("Compaction complete");
        Ok(())
    }

    /// Get database statistics.
    pub fn get_stats(&self) -> Result<StorageStats, StorageError> {
        let categories: Vec<Category> = self
            .list_categories()?
            .into_iter()
            .filter(|c| c.is_active)
            .collect();
        let stats = StorageStats {
            quote_count: self.count_cf_entries(self.cf(CF_QUOTES)?)?,
            category_count: categories.len() as u64,
            queued_category_count: categories.iter().filter(|c| c.is_queued()).count() as u64,
            history_count: self.count_cf_entries(self.cf(CF_DIGEST_HISTORY)?)?,
            disk_usage_bytes: self.get_disk_usage(),
        };
        Ok(stats)
    }

    fn count_cf_entries(&self, cf: &rocksdb::ColumnFamily) -> Result<u64, StorageError> {
        let mut count = 0u64;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }

    fn get_disk_usage(&self) -> u64 {
        std::fs::read_dir(self.db.path())
            .map(|entries| {
                entries
                    .flatten()
                    .filter_map(|entry| entry.metadata().ok())
                    .map(|metadata| metadata.len())
                    .sum()
            })
            .unwrap_or(0)
    }
}

/// Statistics about the storage.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StorageStats {
    pub quote_count: u64,
    pub category_count: u64,
    pub queued_category_count: u64,
    /// Delivered digests on record
    pub history_count: u64,
    /// Total disk usage in bytes
    pub disk_usage_bytes: u64,
}
