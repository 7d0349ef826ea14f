//! Matching quotes against user-defined categories.

use std::collections::{BTreeSet, HashSet};

use curator_types::{Category, CategoryMatchSettings, Quote, QuoteId};
use serde::Serialize;
use tracing::debug;

use crate::error::CuratorError;
use crate::ports::TextEmbedder;
use crate::similarity::{cosine_similarity, parse_embedding, EmbeddingInput};

/// A quote with its similarity to a category.
#[derive(Debug, Clone, Copy)]
pub struct ScoredQuote<'a> {
    pub quote: &'a Quote,
    pub similarity: f32,
}

/// Quotes similar to a category embedding, most similar first.
///
/// Quotes in `excluded_quote_ids` and quotes without an embedding are
/// skipped. An unusable category embedding matches nothing.
pub fn find_quotes_for_category<'a, 'e>(
    quotes: &'a [Quote],
    category_embedding: impl Into<EmbeddingInput<'e>>,
    similarity_threshold: f32,
    limit: usize,
    excluded_quote_ids: &HashSet<QuoteId>,
) -> Vec<ScoredQuote<'a>> {
    let Some(target) = parse_embedding(category_embedding) else {
        debug!("Category has no usable embedding");
        return Vec::new();
    };

    let mut matches: Vec<ScoredQuote<'a>> = quotes
        .iter()
        .filter(|q| !excluded_quote_ids.contains(&q.id))
        .filter_map(|q| {
            let embedding = q.embedding()?;
            let similarity = cosine_similarity(&target, embedding);
            (similarity >= similarity_threshold).then_some(ScoredQuote { quote: q, similarity })
        })
        .collect();

    matches.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    matches.truncate(limit);
    matches
}

/// Distinct articles among matched quotes.
pub fn distinct_articles(matches: &[ScoredQuote<'_>]) -> usize {
    matches
        .iter()
        .map(|m| m.quote.article_id.as_str())
        .collect::<BTreeSet<_>>()
        .len()
}

/// A sample shown when inspecting a category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleQuote {
    pub quote_id: QuoteId,
    pub text: String,
    pub article_title: String,
    pub similarity: f32,
}

/// How much of the library a category matches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    pub matching_quotes_count: usize,
    pub matching_articles_count: usize,
    pub sample_quotes: Vec<SampleQuote>,
}

/// Summarize how a category matches the library.
pub fn get_category_stats<'e>(
    quotes: &[Quote],
    category_embedding: impl Into<EmbeddingInput<'e>>,
    excluded_quote_ids: &HashSet<QuoteId>,
    settings: &CategoryMatchSettings,
) -> CategoryStats {
    let matches = find_quotes_for_category(
        quotes,
        category_embedding,
        settings.stats_threshold,
        settings.stats_limit,
        excluded_quote_ids,
    );

    CategoryStats {
        matching_quotes_count: matches.len(),
        matching_articles_count: distinct_articles(&matches),
        sample_quotes: matches
            .iter()
            .take(settings.sample_size)
            .map(|m| SampleQuote {
                quote_id: m.quote.id.clone(),
                text: m.quote.text.clone(),
                article_title: m.quote.article.display_title().to_string(),
                similarity: m.similarity,
            })
            .collect(),
    }
}

/// Text embedded to represent a category.
pub fn category_embedding_text(name: &str, description: Option<&str>) -> String {
    match description.map(str::trim).filter(|d| !d.is_empty()) {
        Some(description) => format!("{name}: {description}"),
        None => name.to_string(),
    }
}

/// Build a new queued category with a fresh embedding.
pub fn embed_category(
    name: &str,
    description: Option<String>,
    embedder: &dyn TextEmbedder,
) -> Result<Category, CuratorError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CuratorError::InvalidInput(
            "category name must not be empty".to_string(),
        ));
    }
    let text = category_embedding_text(name, description.as_deref());
    let embedding = embedder.embed(&text)?;
    Ok(Category::new(name, description, Some(embedding)))
}

/// Regenerate a category embedding after its name or description changed.
pub fn refresh_category_embedding(
    category: &mut Category,
    embedder: &dyn TextEmbedder,
) -> Result<(), CuratorError> {
    let text = category_embedding_text(&category.name, category.description.as_deref());
    category.embedding = Some(embedder.embed(&text)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::tests::quote_at;
    use chrono::Utc;
    use curator_types::ArticleMeta;

    struct AxisEmbedder;

    impl TextEmbedder for AxisEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, CuratorError> {
            if text.contains("ethics") {
                Ok(vec![1.0, 0.0])
            } else {
                Ok(vec![0.0, 1.0])
            }
        }
    }

    /// Ten quotes from five articles with similarity falling from 0.9.
    fn graded_quotes() -> Vec<Quote> {
        let now = Utc::now();
        (0..10)
            .map(|i| {
                let sim = 0.9 - 0.05 * i as f32;
                let orth = (1.0 - sim * sim).sqrt();
                quote_at(&format!("q{i}"), &format!("a{}", i % 5), vec![sim, orth], now)
                    .with_article(ArticleMeta {
                        title: Some(format!("Article {}", i % 5)),
                        ..Default::default()
                    })
            })
            .collect()
    }

    #[test]
    fn test_matches_sorted_by_similarity() {
        let quotes = graded_quotes();
        let target = vec![1.0f32, 0.0];
        let matches = find_quotes_for_category(&quotes, &target, 0.575, 20, &HashSet::new());

        // 0.90 down to 0.60: q0..q6
        assert_eq!(matches.len(), 7);
        assert_eq!(matches[0].quote.id, "q0");
        assert!(matches
            .windows(2)
            .all(|w| w[0].similarity >= w[1].similarity));
    }

    #[test]
    fn test_default_stats_threshold_drops_weak_matches() {
        let now = Utc::now();
        let sims = [0.9f32, 0.8, 0.6, 0.4, 0.3, 0.2, 0.1, 0.0, -0.1, -0.2];
        let quotes: Vec<Quote> = sims
            .iter()
            .enumerate()
            .map(|(i, &sim)| {
                quote_at(&format!("q{i}"), &format!("a{i}"), vec![sim, (1.0 - sim * sim).sqrt()], now)
            })
            .collect();
        let threshold = CategoryMatchSettings::default().stats_threshold;
        assert_eq!(threshold, 0.35);

        let matches = find_quotes_for_category(&quotes, &[1.0f32, 0.0][..], threshold, 20, &HashSet::new());
        let ids: Vec<&str> = matches.iter().map(|m| m.quote.id.as_str()).collect();
        assert_eq!(ids, vec!["q0", "q1", "q2", "q3"]);
        assert!(matches.windows(2).all(|w| w[0].similarity > w[1].similarity));
    }

    #[test]
    fn test_limit_and_exclusions() {
        let quotes = graded_quotes();
        let target = vec![1.0f32, 0.0];
        let excluded: HashSet<QuoteId> = ["q0".to_string()].into();
        let matches = find_quotes_for_category(&quotes, &target, 0.35, 3, &excluded);

        let ids: Vec<&str> = matches.iter().map(|m| m.quote.id.as_str()).collect();
        assert_eq!(ids, vec!["q1", "q2", "q3"]);
    }

    #[test]
    fn test_category_stats() {
        let quotes = graded_quotes();
        let target = vec![1.0f32, 0.0];
        let stats = get_category_stats(
            &quotes,
            &target,
            &HashSet::new(),
            &CategoryMatchSettings::default(),
        );

        assert_eq!(stats.matching_quotes_count, 10);
        assert_eq!(stats.matching_articles_count, 5);
        assert_eq!(stats.sample_quotes.len(), 3);
        assert_eq!(stats.sample_quotes[0].quote_id, "q0");
        assert_eq!(stats.sample_quotes[0].article_title, "Article 0");
        assert!((stats.sample_quotes[0].similarity - 0.9).abs() < 1e-4);
    }

    #[test]
    fn test_unusable_category_embedding_matches_nothing() {
        let quotes = graded_quotes();
        let matches =
            find_quotes_for_category(&quotes, "not a vector", 0.0, 20, &HashSet::new());
        assert!(matches.is_empty());

        let stats = get_category_stats(
            &quotes,
            EmbeddingInput::Missing,
            &HashSet::new(),
            &CategoryMatchSettings::default(),
        );
        assert_eq!(stats.matching_quotes_count, 0);
        assert!(stats.sample_quotes.is_empty());
    }

    #[test]
    fn test_string_encoded_category_embedding() {
        let quotes = graded_quotes();
        let matches = find_quotes_for_category(&quotes, "[1.0, 0.0]", 0.775, 20, &HashSet::new());
        assert_eq!(matches.len(), 3);
    }

    #[test]
    fn test_embedding_text() {
        assert_eq!(
            category_embedding_text("AI Ethics", Some("moral questions")),
            "AI Ethics: moral questions"
        );
        assert_eq!(category_embedding_text("AI Ethics", None), "AI Ethics");
        assert_eq!(category_embedding_text("AI Ethics", Some("  ")), "AI Ethics");
    }

    #[test]
    fn test_embed_category() {
        let category = embed_category("AI", Some("ethics of models".into()), &AxisEmbedder).unwrap();
        assert!(category.is_queued());
        assert_eq!(category.embedding, Some(vec![1.0, 0.0]));

        let mut category = category;
        category.description = Some("hardware".into());
        refresh_category_embedding(&mut category, &AxisEmbedder).unwrap();
        assert_eq!(category.embedding, Some(vec![0.0, 1.0]));

        assert!(embed_category("  ", None, &AxisEmbedder).is_err());
    }
}
