//! Collaborator seams.
//!
//! The engine never talks to storage, an embedding model, or a mail server
//! directly. Each collaborator is a trait so the daemon can wire real
//! implementations and tests can wire in-memory ones.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use curator_types::{Category, CategoryId, Embedding, HistoryEntry, Quote, QuoteId};

use crate::compose::ComposedDigest;
use crate::error::CuratorError;

/// Read access to the quote library.
pub trait QuoteRepository: Send + Sync {
    /// Every quote, with embedding and article metadata where known.
    fn all_quotes(&self) -> Result<Vec<Quote>, CuratorError>;
}

/// User-defined categories.
pub trait CategoryRepository: Send + Sync {
    /// Categories waiting for a digest.
    fn queued_categories(&self) -> Result<Vec<Category>, CuratorError>;

    /// Insert or replace a category.
    fn save_category(&self, category: &Category) -> Result<(), CuratorError>;
}

/// Record of delivered digests.
pub trait HistoryRepository: Send + Sync {
    /// Append one delivered digest.
    fn record(&self, entry: &HistoryEntry) -> Result<(), CuratorError>;

    /// Anchor quote ids of curator digests sent at or after `since`.
    fn recent_anchor_ids(&self, since: DateTime<Utc>) -> Result<HashSet<QuoteId>, CuratorError>;

    /// Quote ids used by digests of one category sent at or after `since`.
    fn category_quote_ids(
        &self,
        category_id: &CategoryId,
        since: DateTime<Utc>,
    ) -> Result<HashSet<QuoteId>, CuratorError>;
}

/// Turns text into an embedding in the same space as quote embeddings.
pub trait TextEmbedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Embedding, CuratorError>;
}

/// Where a delivered digest ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Transport specific location, such as a file path or message id
    pub location: String,
}

/// Sends a composed digest to the reader.
pub trait DigestDelivery: Send + Sync {
    fn deliver(&self, digest: &ComposedDigest) -> Result<DeliveryReceipt, CuratorError>;
}
