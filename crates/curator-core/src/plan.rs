//! Owned description of the digest about to be composed.

use std::collections::BTreeSet;

use curator_types::{Category, DigestRecord, DigestSource, Quote, QuoteId};

use crate::category::ScoredQuote;
use crate::temporal::DigestCluster;

/// A category-matched quote.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedQuote {
    pub quote: Quote,
    pub similarity: f32,
}

impl From<ScoredQuote<'_>> for MatchedQuote {
    fn from(scored: ScoredQuote<'_>) -> Self {
        Self {
            quote: scored.quote.clone(),
            similarity: scored.similarity,
        }
    }
}

/// Curator digest: an anchor and its echoes.
#[derive(Debug, Clone, PartialEq)]
pub struct CuratorPlan {
    pub anchor: Quote,
    pub recent: Vec<Quote>,
    pub cluster_quote_ids: Vec<QuoteId>,
    pub article_count: usize,
    pub has_old_anchor: bool,
}

impl From<DigestCluster<'_>> for CuratorPlan {
    fn from(cluster: DigestCluster<'_>) -> Self {
        Self {
            anchor: cluster.anchor_quote.clone(),
            recent: cluster.recent_quotes.iter().map(|q| (*q).clone()).collect(),
            cluster_quote_ids: cluster.quote_ids(),
            article_count: cluster.total_articles(),
            has_old_anchor: cluster.has_old_anchor,
        }
    }
}

/// Category digest: the best matches for one queued category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryPlan {
    pub category: Category,
    pub quotes: Vec<MatchedQuote>,
    pub article_count: usize,
}

impl CategoryPlan {
    pub fn new(category: Category, quotes: Vec<MatchedQuote>) -> Self {
        let article_count = quotes
            .iter()
            .map(|m| m.quote.article_id.as_str())
            .collect::<BTreeSet<_>>()
            .len();
        Self {
            category,
            quotes,
            article_count,
        }
    }
}

/// The digest chosen for this invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum DigestPlan {
    Curator(CuratorPlan),
    Category(CategoryPlan),
}

impl DigestPlan {
    pub fn source(&self) -> DigestSource {
        match self {
            DigestPlan::Curator(_) => DigestSource::Curator,
            DigestPlan::Category(_) => DigestSource::Category,
        }
    }

    /// Ids of the quotes the reader will see, in presentation order.
    pub fn quotes_used(&self) -> Vec<QuoteId> {
        match self {
            DigestPlan::Curator(plan) => std::iter::once(&plan.anchor)
                .chain(plan.recent.iter())
                .map(|q| q.id.clone())
                .collect(),
            DigestPlan::Category(plan) => plan.quotes.iter().map(|m| m.quote.id.clone()).collect(),
        }
    }

    /// History record for this plan once delivered.
    pub fn to_record(&self, theme: &str, subject: &str) -> DigestRecord {
        match self {
            DigestPlan::Curator(plan) => DigestRecord::Curator {
                theme: theme.to_string(),
                anchor_quote_id: plan.anchor.id.clone(),
                anchor_article_id: plan.anchor.article_id.clone(),
                cluster_quote_ids: plan.cluster_quote_ids.clone(),
            },
            DigestPlan::Category(plan) => DigestRecord::Category {
                category_id: plan.category.id.clone(),
                quote_ids: self.quotes_used(),
                article_count: plan.article_count,
                subject: subject.to_string(),
            },
        }
    }
}
