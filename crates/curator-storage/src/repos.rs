//! Engine repositories backed by [`Storage`].

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use curator_core::{CategoryRepository, CuratorError, HistoryRepository, QuoteRepository};
use curator_types::{Category, CategoryId, HistoryEntry, Quote, QuoteId};
use tracing::{debug, instrument};

use crate::db::Storage;

/// Exposes [`Storage`] through the engine's repository traits.
#[derive(Clone)]
pub struct StorageRepository {
    storage: Arc<Storage>,
}

impl StorageRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Get underlying storage.
    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }
}

impl QuoteRepository for StorageRepository {
    #[instrument(skip(self))]
    fn all_quotes(&self) -> Result<Vec<Quote>, CuratorError> {
        let quotes = self.storage.list_quotes()?;
        debug!(count = quotes.len(), "Loaded quotes");
        Ok(quotes)
    }
}

impl CategoryRepository for StorageRepository {
    fn queued_categories(&self) -> Result<Vec<Category>, CuratorError> {
        Ok(self
            .storage
            .list_categories()?
            .into_iter()
            .filter(Category::is_queued)
            .collect())
    }

    #[instrument(skip(self, category), fields(category_id = %category.id))]
    fn save_category(&self, category: &Category) -> Result<(), CuratorError> {
        self.storage.put_category(category)?;
        Ok(())
    }
}

impl HistoryRepository for StorageRepository {
    #[instrument(skip(self, entry), fields(entry_id = %entry.entry_id))]
    fn record(&self, entry: &HistoryEntry) -> Result<(), CuratorError> {
        self.storage.put_history(entry)?;
        Ok(())
    }

    fn recent_anchor_ids(&self, since: DateTime<Utc>) -> Result<HashSet<QuoteId>, CuratorError> {
        let anchors: HashSet<QuoteId> = self
            .storage
            .history_since(since)?
            .iter()
            .filter_map(|entry| entry.record.anchor_quote_id())
            .map(str::to_string)
            .collect();
        debug!(count = anchors.len(), "Recent curator anchors");
        Ok(anchors)
    }

    fn category_quote_ids(
        &self,
        category_id: &CategoryId,
        since: DateTime<Utc>,
    ) -> Result<HashSet<QuoteId>, CuratorError> {
        Ok(self
            .storage
            .history_since(since)?
            .iter()
            .filter(|entry| entry.record.category_id() == Some(category_id.as_str()))
            .flat_map(|entry| entry.record.quote_ids().iter().cloned())
            .collect())
    }
}
