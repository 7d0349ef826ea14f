//! Quote records.
//!
//! A quote is a short passage extracted from an article. Quotes are owned by
//! their article and are immutable once created; re-extraction deletes every
//! quote of the article and inserts fresh ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier of a quote (ULID string for quotes created locally).
pub type QuoteId = String;

/// Identifier of the article a quote was extracted from.
pub type ArticleId = String;

/// An embedding vector.
pub type Embedding = Vec<f32>;

/// Article metadata denormalized into each quote by the quote repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleMeta {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
}

impl ArticleMeta {
    /// Title for display, falling back to "Untitled".
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }

    /// URL for display, falling back to "#".
    pub fn display_url(&self) -> &str {
        self.url.as_deref().unwrap_or("#")
    }
}

/// An extracted passage with its semantic embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Unique identifier
    pub id: QuoteId,
    /// Parent article
    pub article_id: ArticleId,
    /// The passage itself
    pub text: String,
    /// Embedding vector; `None` excludes the quote from all similarity work
    #[serde(default)]
    pub embedding: Option<Embedding>,
    /// When the quote was extracted
    pub created_at: DateTime<Utc>,
    /// Denormalized article metadata
    #[serde(default)]
    pub article: ArticleMeta,
}

impl Quote {
    /// Create a quote without article metadata.
    pub fn new(
        id: impl Into<QuoteId>,
        article_id: impl Into<ArticleId>,
        text: impl Into<String>,
        embedding: Option<Embedding>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            article_id: article_id.into(),
            text: text.into(),
            embedding,
            created_at,
            article: ArticleMeta::default(),
        }
    }

    /// Attach article metadata.
    pub fn with_article(mut self, article: ArticleMeta) -> Self {
        self.article = article;
        self
    }

    /// The embedding, if present and non-empty.
    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref().filter(|e| !e.is_empty())
    }

    /// Whether the quote can take part in similarity operations.
    pub fn has_embedding(&self) -> bool {
        self.embedding().is_some()
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

/// An embedding as it arrives from outside the process.
///
/// Persistence layers and import files are inconsistent: some hand back a
/// numeric array, others a string such as `"[0.1, 0.2]"`. Parsing into a
/// vector is done by the similarity primitive in `curator-core`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawEmbedding {
    /// Native numeric sequence
    Values(Vec<f32>),
    /// Delimited or JSON-encoded numeric string
    Text(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_roundtrip() {
        let quote = Quote::new("q1", "a1", "Attention is all you need", Some(vec![0.1, 0.2]), Utc::now())
            .with_article(ArticleMeta {
                title: Some("Transformers".to_string()),
                url: Some("https://example.com/t".to_string()),
                domain: Some("example.com".to_string()),
            });

        let bytes = quote.to_bytes().unwrap();
        let decoded = Quote::from_bytes(&bytes).unwrap();
        assert_eq!(quote, decoded);
    }

    #[test]
    fn test_empty_embedding_counts_as_missing() {
        let quote = Quote::new("q1", "a1", "text", Some(vec![]), Utc::now());
        assert!(!quote.has_embedding());
        assert!(quote.embedding().is_none());
    }

    #[test]
    fn test_missing_fields_default() {
        let json = r#"{"id":"q1","article_id":"a1","text":"t","created_at":"2024-01-01T00:00:00Z"}"#;
        let quote: Quote = serde_json::from_str(json).unwrap();
        assert!(quote.embedding.is_none());
        assert_eq!(quote.article.display_title(), "Untitled");
        assert_eq!(quote.article.display_url(), "#");
    }

    #[test]
    fn test_raw_embedding_untagged() {
        let values: RawEmbedding = serde_json::from_str("[0.5, 1.0]").unwrap();
        assert_eq!(values, RawEmbedding::Values(vec![0.5, 1.0]));

        let text: RawEmbedding = serde_json::from_str(r#""[0.5, 1.0]""#).unwrap();
        assert_eq!(text, RawEmbedding::Text("[0.5, 1.0]".to_string()));
    }
}
