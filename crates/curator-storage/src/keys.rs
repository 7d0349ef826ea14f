//! Key encoding and decoding for the storage layer.
//!
//! - quotes: `quote:{article_id}:{quote_id}` so one article's quotes share a prefix
//! - categories: `category:{category_id}`
//! - history: `hist:{timestamp_ms:013}:{ulid}` so a lookback is a range scan

use ulid::Ulid;

use crate::error::StorageError;

fn check_segment(kind: &str, value: &str) -> Result<(), StorageError> {
    if value.is_empty() || value.contains(':') {
        return Err(StorageError::Key(format!(
            "{} must be non-empty and must not contain ':': {:?}",
            kind, value
        )));
    }
    Ok(())
}

/// Key for a quote
/// Format: quote:{article_id}:{quote_id}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteKey {
    pub article_id: String,
    pub quote_id: String,
}

impl QuoteKey {
    pub fn new(article_id: &str, quote_id: &str) -> Result<Self, StorageError> {
        check_segment("article_id", article_id)?;
        check_segment("quote_id", quote_id)?;
        Ok(Self {
            article_id: article_id.to_string(),
            quote_id: quote_id.to_string(),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        format!("quote:{}:{}", self.article_id, self.quote_id).into_bytes()
    }

    /// Decode key from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let s = std::str::from_utf8(bytes)
            .map_err(|e| StorageError::Key(format!("Invalid UTF-8: {}", e)))?;
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 || parts[0] != "quote" {
            return Err(StorageError::Key(format!("Invalid quote key format: {}", s)));
        }
        Self::new(parts[1], parts[2])
    }

    /// Prefix covering every quote
    pub fn prefix_all() -> Vec<u8> {
        b"quote:".to_vec()
    }

    /// Prefix covering one article's quotes
    pub fn prefix_for_article(article_id: &str) -> Result<Vec<u8>, StorageError> {
        check_segment("article_id", article_id)?;
        Ok(format!("quote:{}:", article_id).into_bytes())
    }
}

/// Key for a category
/// Format: category:{category_id}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryKey {
    pub category_id: String,
}

impl CategoryKey {
    pub fn new(category_id: impl Into<String>) -> Self {
        Self {
            category_id: category_id.into(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        format!("category:{}", self.category_id).into_bytes()
    }

    pub fn prefix_all() -> Vec<u8> {
        b"category:".to_vec()
    }
}

/// Key for a history entry
/// Format: hist:{timestamp_ms:013}:{ulid}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryKey {
    /// Delivery time in milliseconds
    pub timestamp_ms: i64,
    /// Entry id
    pub ulid: Ulid,
}

impl HistoryKey {
    pub fn new(timestamp_ms: i64, ulid: Ulid) -> Self {
        Self {
            timestamp_ms: timestamp_ms.max(0),
            ulid,
        }
    }

    /// Build a key from an entry id string and its delivery time.
    pub fn from_entry(timestamp_ms: i64, entry_id: &str) -> Result<Self, StorageError> {
        let ulid: Ulid = entry_id
            .parse()
            .map_err(|e| StorageError::Key(format!("Invalid entry_id ULID: {}", e)))?;
        Ok(Self::new(timestamp_ms, ulid))
    }

    /// Encode key to bytes for storage
    pub fn to_bytes(&self) -> Vec<u8> {
        // Zero-pad timestamp to 13 digits for lexicographic sorting
        format!("hist:{:013}:{}", self.timestamp_ms, self.ulid).into_bytes()
    }

    /// Decode key from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let s = std::str::from_utf8(bytes)
            .map_err(|e| StorageError::Key(format!("Invalid UTF-8: {}", e)))?;
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 || parts[0] != "hist" {
            return Err(StorageError::Key(format!("Invalid history key format: {}", s)));
        }
        let timestamp_ms: i64 = parts[1]
            .parse()
            .map_err(|e| StorageError::Key(format!("Invalid timestamp: {}", e)))?;
        let ulid: Ulid = parts[2]
            .parse()
            .map_err(|e| StorageError::Key(format!("Invalid ULID: {}", e)))?;
        Ok(Self { timestamp_ms, ulid })
    }

    /// Scan start for entries at or after `start_ms`
    pub fn prefix_start(start_ms: i64) -> Vec<u8> {
        format!("hist:{:013}:", start_ms.max(0)).into_bytes()
    }

    pub fn prefix_all() -> Vec<u8> {
        b"hist:".to_vec()
    }
}
