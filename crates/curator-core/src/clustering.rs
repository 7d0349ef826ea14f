//! Greedy seed clustering of quotes.
//!
//! Quotes are visited oldest first. Each quote not yet assigned seeds a new
//! cluster and absorbs every later unassigned quote whose similarity to the
//! seed meets the threshold. Membership is decided against the seed only,
//! so two members of one cluster may be dissimilar to each other.

use std::collections::BTreeSet;

use curator_types::{ClusteringSettings, Quote, QuoteId};
use tracing::debug;

use crate::similarity::similarity;

/// A group of quotes sharing a theme.
#[derive(Debug, Clone)]
pub struct QuoteCluster<'a> {
    /// Members in chronological order; the first is the seed
    pub members: Vec<&'a Quote>,
    /// Distinct articles among the members
    pub article_ids: BTreeSet<&'a str>,
}

impl<'a> QuoteCluster<'a> {
    fn from_members(members: Vec<&'a Quote>) -> Self {
        let article_ids = members.iter().map(|q| q.article_id.as_str()).collect();
        Self {
            members,
            article_ids,
        }
    }

    /// Number of member quotes.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the cluster has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of distinct articles.
    pub fn article_count(&self) -> usize {
        self.article_ids.len()
    }

    /// Ids of all member quotes.
    pub fn quote_ids(&self) -> Vec<QuoteId> {
        self.members.iter().map(|q| q.id.clone()).collect()
    }
}

/// Group quotes into qualifying clusters, largest first.
///
/// Quotes without an embedding are ignored. A cluster qualifies when it has
/// at least `min_quotes` members drawn from at least `min_articles` distinct
/// articles. Ties in size keep the order in which the clusters were seeded.
pub fn cluster_quotes<'a>(
    quotes: &'a [Quote],
    settings: &ClusteringSettings,
) -> Vec<QuoteCluster<'a>> {
    let mut candidates: Vec<&Quote> = quotes.iter().filter(|q| q.has_embedding()).collect();

    if candidates.len() < settings.min_quotes {
        debug!(
            quotes = candidates.len(),
            min_quotes = settings.min_quotes,
            "Not enough embedded quotes to cluster"
        );
        return Vec::new();
    }

    candidates.sort_by_key(|q| q.created_at);

    let mut assigned = vec![false; candidates.len()];
    let mut clusters = Vec::new();

    for i in 0..candidates.len() {
        if assigned[i] {
            continue;
        }
        assigned[i] = true;

        let seed = candidates[i];
        let mut members = vec![seed];

        // Everything before `i` was assigned on an earlier pass.
        for j in (i + 1)..candidates.len() {
            if assigned[j] {
                continue;
            }
            let candidate = candidates[j];
            if similarity(seed.embedding(), candidate.embedding()) >= settings.similarity_threshold {
                assigned[j] = true;
                members.push(candidate);
            }
        }

        let cluster = QuoteCluster::from_members(members);
        if cluster.len() >= settings.min_quotes && cluster.article_count() >= settings.min_articles
        {
            clusters.push(cluster);
        }
    }

    clusters.sort_by(|a, b| b.len().cmp(&a.len()));

    debug!(
        quotes = candidates.len(),
        clusters = clusters.len(),
        "Clustered quotes"
    );

    clusters
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};

    pub(crate) fn quote_at(
        id: &str,
        article: &str,
        embedding: Vec<f32>,
        created_at: DateTime<Utc>,
    ) -> Quote {
        Quote::new(id, article, format!("text of {id}"), Some(embedding), created_at)
    }

    fn settings() -> ClusteringSettings {
        ClusteringSettings::default()
    }

    #[test]
    fn test_too_few_quotes() {
        let now = Utc::now();
        let quotes: Vec<Quote> = (0..4)
            .map(|i| quote_at(&format!("q{i}"), &format!("a{i}"), vec![1.0, 0.0], now))
            .collect();
        assert!(cluster_quotes(&quotes, &settings()).is_empty());
    }

    #[test]
    fn test_quotes_without_embedding_are_ignored() {
        let now = Utc::now();
        let mut quotes: Vec<Quote> = (0..4)
            .map(|i| quote_at(&format!("q{i}"), &format!("a{i}"), vec![1.0, 0.0], now))
            .collect();
        quotes.push(Quote::new("q9", "a9", "no vector", None, now));
        assert!(cluster_quotes(&quotes, &settings()).is_empty());
    }

    #[test]
    fn test_single_cluster_qualifies() {
        let now = Utc::now();
        let quotes: Vec<Quote> = (0..6)
            .map(|i| {
                quote_at(
                    &format!("q{i}"),
                    &format!("a{}", i % 3),
                    vec![1.0, 0.05 * i as f32],
                    now - Duration::days(10 - i),
                )
            })
            .collect();

        let clusters = cluster_quotes(&quotes, &settings());
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 6);
        assert_eq!(clusters[0].article_count(), 3);
        assert_eq!(clusters[0].members[0].id, "q0");
    }

    #[test]
    fn test_members_are_chronological_regardless_of_input_order() {
        let now = Utc::now();
        let mut quotes: Vec<Quote> = (0..5)
            .map(|i| {
                quote_at(
                    &format!("q{i}"),
                    &format!("a{i}"),
                    vec![1.0, 0.0],
                    now - Duration::days(i),
                )
            })
            .collect();
        quotes.reverse();
        quotes.swap(1, 3);

        let clusters = cluster_quotes(&quotes, &settings());
        let ids: Vec<&str> = clusters[0].members.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["q4", "q3", "q2", "q1", "q0"]);
    }

    #[test]
    fn test_too_few_articles_disqualifies() {
        let now = Utc::now();
        let quotes: Vec<Quote> = (0..8)
            .map(|i| {
                quote_at(
                    &format!("q{i}"),
                    &format!("a{}", i % 2),
                    vec![1.0, 0.0],
                    now - Duration::days(i),
                )
            })
            .collect();
        assert!(cluster_quotes(&quotes, &settings()).is_empty());
    }

    #[test]
    fn test_membership_is_measured_against_seed() {
        // 45 degrees apart from each neighbour: the seed absorbs b (0.71) but
        // not c (0.0), and c seeds its own cluster.
        let now = Utc::now();
        let settings = ClusteringSettings {
            similarity_threshold: 0.6,
            min_quotes: 1,
            min_articles: 1,
        };
        let quotes = vec![
            quote_at("a", "x", vec![1.0, 0.0], now - Duration::days(3)),
            quote_at("b", "x", vec![1.0, 1.0], now - Duration::days(2)),
            quote_at("c", "x", vec![0.0, 1.0], now - Duration::days(1)),
        ];

        let clusters = cluster_quotes(&quotes, &settings);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].quote_ids(), vec!["a", "b"]);
        assert_eq!(clusters[1].quote_ids(), vec!["c"]);
    }

    #[test]
    fn test_clusters_sorted_by_size_descending() {
        let now = Utc::now();
        let mut quotes = Vec::new();
        // Smaller theme seeded first, so size ordering must reorder it.
        for i in 0..5 {
            quotes.push(quote_at(
                &format!("s{i}"),
                &format!("a{}", i % 3),
                vec![0.0, 1.0],
                now - Duration::days(100 - i),
            ));
        }
        for i in 0..7 {
            quotes.push(quote_at(
                &format!("l{i}"),
                &format!("b{}", i % 4),
                vec![1.0, 0.0],
                now - Duration::days(50 - i),
            ));
        }

        let clusters = cluster_quotes(&quotes, &settings());
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].len(), 7);
        assert_eq!(clusters[1].len(), 5);
    }
    #[test]
    fn test_similarity_equal_to_threshold_joins_cluster() {
        // cos([1,0], [3,4]) is 3/5, exactly the default threshold of 0.6.
        let now = Utc::now();
        let settings = ClusteringSettings {
            min_quotes: 1,
            min_articles: 1,
            ..ClusteringSettings::default()
        };
        let quotes = vec![
            quote_at("seed", "x", vec![1.0, 0.0], now - Duration::days(3)),
            quote_at("edge", "y", vec![3.0, 4.0], now - Duration::days(2)),
            quote_at("below", "z", vec![3.0, 4.1], now - Duration::days(1)),
        ];
        assert_eq!(similarity(quotes[0].embedding(), quotes[1].embedding()), 0.6);
        assert_eq!(settings.similarity_threshold, 0.6);

        let clusters = cluster_quotes(&quotes, &settings);
        assert_eq!(clusters[0].quote_ids(), vec!["seed", "edge"]);
        assert_eq!(clusters[1].quote_ids(), vec!["below"]);
    }

    #[test]
    fn test_clustering_is_repeatable() {
        let now = Utc::now();
        let quotes: Vec<Quote> = (0..12)
            .map(|i| {
                let angle = 0.3 * i as f32;
                quote_at(
                    &format!("q{i}"),
                    &format!("a{}", i % 4),
                    vec![angle.cos(), angle.sin()],
                    now - Duration::days(30 - i),
                )
            })
            .collect();
        let settings = ClusteringSettings {
            min_quotes: 2,
            min_articles: 2,
            ..ClusteringSettings::default()
        };

        let first: Vec<Vec<QuoteId>> = cluster_quotes(&quotes, &settings)
            .iter()
            .map(QuoteCluster::quote_ids)
            .collect();
        let second: Vec<Vec<QuoteId>> = cluster_quotes(&quotes, &settings)
            .iter()
            .map(QuoteCluster::quote_ids)
            .collect();
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }
}
