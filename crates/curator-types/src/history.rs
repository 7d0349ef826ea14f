//! Digest history.
//!
//! History is append-only and exists for one reason: computing exclusion
//! sets so the next digest does not repeat a recent anchor or quote.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::category::CategoryId;
use crate::quote::{ArticleId, QuoteId};

/// Which path produced a digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigestSource {
    /// A queued user category
    Category,
    /// Auto-discovered cluster
    Curator,
}

impl std::fmt::Display for DigestSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DigestSource::Category => write!(f, "category"),
            DigestSource::Curator => write!(f, "curator"),
        }
    }
}

/// What a delivered digest contained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DigestRecord {
    /// Curator digest built from a cluster
    Curator {
        theme: String,
        anchor_quote_id: QuoteId,
        anchor_article_id: ArticleId,
        cluster_quote_ids: Vec<QuoteId>,
    },
    /// Category digest built from matched quotes
    Category {
        category_id: CategoryId,
        quote_ids: Vec<QuoteId>,
        article_count: usize,
        subject: String,
    },
}

impl DigestRecord {
    /// Source of the digest.
    pub fn source(&self) -> DigestSource {
        match self {
            DigestRecord::Curator { .. } => DigestSource::Curator,
            DigestRecord::Category { .. } => DigestSource::Category,
        }
    }

    /// Anchor quote of a curator digest.
    pub fn anchor_quote_id(&self) -> Option<&str> {
        match self {
            DigestRecord::Curator { anchor_quote_id, .. } => Some(anchor_quote_id),
            DigestRecord::Category { .. } => None,
        }
    }

    /// Category of a category digest.
    pub fn category_id(&self) -> Option<&str> {
        match self {
            DigestRecord::Category { category_id, .. } => Some(category_id),
            DigestRecord::Curator { .. } => None,
        }
    }

    /// Every quote id the digest used.
    pub fn quote_ids(&self) -> &[QuoteId] {
        match self {
            DigestRecord::Curator {
                cluster_quote_ids, ..
            } => cluster_quote_ids,
            DigestRecord::Category { quote_ids, .. } => quote_ids,
        }
    }
}

/// A history record with its delivery timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique identifier (ULID)
    pub entry_id: String,
    /// When the digest was delivered
    pub sent_at: DateTime<Utc>,
    /// What was delivered
    pub record: DigestRecord,
}

impl HistoryEntry {
    /// Create a history entry for a digest delivered at `sent_at`.
    pub fn new(record: DigestRecord, sent_at: DateTime<Utc>) -> Self {
        Self {
            entry_id: Ulid::new().to_string(),
            sent_at,
            record,
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curator_record_accessors() {
        let record = DigestRecord::Curator {
            theme: "assessment authenticity".to_string(),
            anchor_quote_id: "q1".to_string(),
            anchor_article_id: "a1".to_string(),
            cluster_quote_ids: vec!["q1".to_string(), "q2".to_string()],
        };
        assert_eq!(record.source(), DigestSource::Curator);
        assert_eq!(record.anchor_quote_id(), Some("q1"));
        assert_eq!(record.category_id(), None);
        assert_eq!(record.quote_ids().len(), 2);
    }

    #[test]
    fn test_category_record_serialization_is_tagged() {
        let record = DigestRecord::Category {
            category_id: "c1".to_string(),
            quote_ids: vec!["q9".to_string()],
            article_count: 1,
            subject: "Category Digest: AI Ethics".to_string(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "category");

        let entry = HistoryEntry::new(record, Utc::now());
        let decoded = HistoryEntry::from_bytes(&entry.to_bytes().unwrap()).unwrap();
        assert_eq!(entry, decoded);
        assert_eq!(decoded.record.category_id(), Some("c1"));
    }
}
