//! JSON Lines quote import.
//!
//! One quote per line:
//!
//! ```json
//! {"id":"q1","article_id":"a1","text":"...","created_at":"2024-01-02T00:00:00Z",
//!  "embedding":[0.1,0.2],"title":"Deep Work","url":"https://example.com"}
//! ```
//!
//! `embedding` may also be a string such as `"[0.1, 0.2]"` or `"0.1,0.2"`.
//! An unusable embedding is dropped with a warning; the quote is still kept.

use std::io::BufRead;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use curator_core::parse_embedding;
use curator_types::{ArticleMeta, Quote, RawEmbedding};

/// One line of an import file.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRecord {
    pub id: String,
    pub article_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub embedding: Option<RawEmbedding>,
    #[serde(flatten)]
    pub article: ArticleMeta,
}

impl ImportRecord {
    pub fn into_quote(self) -> Quote {
        let embedding = parse_embedding(self.embedding.as_ref()).map(|e| e.into_owned());
        if self.embedding.is_some() && embedding.is_none() {
            warn!(quote_id = %self.id, "Unusable embedding, quote excluded from similarity");
        }
        Quote::new(self.id, self.article_id, self.text, embedding, self.created_at)
            .with_article(self.article)
    }
}

/// What an import produced.
#[derive(Debug, Default)]
pub struct ParsedImport {
    pub quotes: Vec<Quote>,
    /// Quotes stored without a usable embedding
    pub without_embedding: usize,
}

/// Parse a JSON Lines stream. Blank lines are skipped; a malformed line aborts.
pub fn parse_quotes(reader: impl BufRead) -> Result<ParsedImport> {
    let mut parsed = ParsedImport::default();
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read import file")?;
        if line.trim().is_empty() {
            continue;
        }
        let record: ImportRecord = serde_json::from_str(&line)
            .with_context(|| format!("Invalid quote on line {}", index + 1))?;
        let quote = record.into_quote();
        if !quote.has_embedding() {
            parsed.without_embedding += 1;
        }
        parsed.quotes.push(quote);
    }
    Ok(parsed)
}
