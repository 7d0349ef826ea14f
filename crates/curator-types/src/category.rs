//! User-defined categories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::quote::Embedding;

/// A unique identifier for a category.
pub type CategoryId = String;

/// Matches a category needs before it can produce a digest.
pub const DEFAULT_MIN_QUOTES_FOR_DIGEST: usize = 5;

fn default_min_quotes_for_digest() -> usize {
    DEFAULT_MIN_QUOTES_FOR_DIGEST
}

fn default_active() -> bool {
    true
}

/// Priority state of a category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryStatus {
    /// Requested by the user; gets first refusal on the next digest cycle
    #[default]
    Queued,
    /// Used at least once; waits until the user re-queues it
    Pool,
}

impl std::fmt::Display for CategoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoryStatus::Queued => write!(f, "queued"),
            CategoryStatus::Pool => write!(f, "pool"),
        }
    }
}

/// A persistent, explicitly named topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier (ULID)
    pub id: CategoryId,
    /// Display name, e.g. "AI Ethics"
    pub name: String,
    /// Optional free-text description
    #[serde(default)]
    pub description: Option<String>,
    /// Embedding of "name: description"
    #[serde(default)]
    pub embedding: Option<Embedding>,
    /// Queued or pool
    #[serde(default)]
    pub status: CategoryStatus,
    /// Minimum matching quotes before a category digest is sent
    #[serde(default = "default_min_quotes_for_digest")]
    pub min_quotes_for_digest: usize,
    /// When the category last produced a delivered digest
    #[serde(default)]
    pub last_digest_at: Option<DateTime<Utc>>,
    /// Creation time; queued categories are served oldest first
    pub created_at: DateTime<Utc>,
    /// False once deleted. The record stays so history can still name it.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl Category {
    /// Create a new queued category.
    pub fn new(name: impl Into<String>, description: Option<String>, embedding: Option<Embedding>) -> Self {
        Self {
            id: Ulid::new().to_string(),
            name: name.into(),
            description,
            embedding,
            status: CategoryStatus::Queued,
            min_quotes_for_digest: DEFAULT_MIN_QUOTES_FOR_DIGEST,
            last_digest_at: None,
            created_at: Utc::now(),
            is_active: true,
        }
    }

    /// Check if the category is waiting for a digest. Deleted categories never are.
    pub fn is_queued(&self) -> bool {
        self.is_active && self.status == CategoryStatus::Queued
    }

    /// Soft-delete: keep the record, drop it from every digest path.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Put the category back in the queue.
    pub fn queue(&mut self) {
        self.status = CategoryStatus::Queued;
    }

    /// Move to the pool after a delivered digest and stamp the delivery time.
    pub fn mark_delivered(&mut self, at: DateTime<Utc>) {
        self.status = CategoryStatus::Pool;
        self.last_digest_at = Some(at);
    }

    /// Serialize to JSON bytes for storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize from JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
