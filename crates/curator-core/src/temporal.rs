//! Temporal split of a cluster into an anchor and recent echoes.
//!
//! A quote is "old" when it was created before `old_after_days` ago and
//! "recent" when created within `recent_within_days`. Quotes between the two
//! windows are neither.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use curator_types::{Quote, QuoteId, TemporalSettings};

use crate::clustering::QuoteCluster;

/// How the anchor of a cluster is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    /// Anchor must be old and at least `min_recent` echoes must be recent
    Strict,
    /// Oldest member anchors and the next members echo
    Relaxed,
}

impl SplitMode {
    /// Mode for a `relaxed` flag.
    pub fn from_relaxed(relaxed: bool) -> Self {
        if relaxed {
            SplitMode::Relaxed
        } else {
            SplitMode::Strict
        }
    }
}

/// Old and recent cut-offs resolved against a fixed "now".
#[derive(Debug, Clone, Copy)]
pub struct TemporalWindows {
    old_before: DateTime<Utc>,
    recent_since: DateTime<Utc>,
    max_recent: usize,
    min_recent: usize,
}

impl TemporalWindows {
    pub fn new(now: DateTime<Utc>, settings: &TemporalSettings) -> Self {
        Self {
            old_before: now - Duration::days(i64::from(settings.old_after_days)),
            recent_since: now - Duration::days(i64::from(settings.recent_within_days)),
            max_recent: settings.max_recent,
            min_recent: settings.min_recent,
        }
    }

    pub fn is_old(&self, quote: &Quote) -> bool {
        quote.created_at < self.old_before
    }

    pub fn is_recent(&self, quote: &Quote) -> bool {
        quote.created_at >= self.recent_since
    }
}

/// A cluster ready to become a curator digest.
#[derive(Debug, Clone)]
pub struct DigestCluster<'a> {
    /// All cluster members, chronological
    pub members: Vec<&'a Quote>,
    /// Distinct articles among the members
    pub article_ids: BTreeSet<&'a str>,
    /// The quote the digest is built around
    pub anchor_quote: &'a Quote,
    /// Echo quotes shown after the anchor, at most `max_recent`
    pub recent_quotes: Vec<&'a Quote>,
    /// Whether any member is old
    pub has_old_anchor: bool,
}

impl<'a> DigestCluster<'a> {
    /// Number of member quotes.
    pub fn total_quotes(&self) -> usize {
        self.members.len()
    }

    /// Number of distinct articles.
    pub fn total_articles(&self) -> usize {
        self.article_ids.len()
    }

    /// Ids of all members.
    pub fn quote_ids(&self) -> Vec<QuoteId> {
        self.members.iter().map(|q| q.id.clone()).collect()
    }

    /// Ids of the quotes a reader will see: the anchor, then the echoes.
    pub fn presented_quote_ids(&self) -> Vec<QuoteId> {
        std::iter::once(self.anchor_quote)
            .chain(self.recent_quotes.iter().copied())
            .map(|q| q.id.clone())
            .collect()
    }
}

/// Split a cluster into anchor and echoes.
///
/// Returns `None` in strict mode when the cluster has no old quote or fewer
/// than `min_recent` recent quotes.
pub fn split_cluster<'a>(
    cluster: QuoteCluster<'a>,
    mode: SplitMode,
    windows: &TemporalWindows,
) -> Option<DigestCluster<'a>> {
    let QuoteCluster {
        members,
        article_ids,
    } = cluster;

    let has_old_anchor = members.iter().any(|q| windows.is_old(q));

    let (anchor_quote, recent_quotes) = match mode {
        SplitMode::Strict => {
            let anchor = members.iter().copied().find(|q| windows.is_old(q))?;
            let recent: Vec<&Quote> = members
                .iter()
                .copied()
                .filter(|q| windows.is_recent(q))
                .collect();
            if recent.len() < windows.min_recent {
                return None;
            }
            let recent = recent.into_iter().take(windows.max_recent).collect();
            (anchor, recent)
        }
        SplitMode::Relaxed => {
            let (first, rest) = members.split_first()?;
            let recent = rest.iter().copied().take(windows.max_recent).collect();
            (*first, recent)
        }
    };

    Some(DigestCluster {
        members,
        article_ids,
        anchor_quote,
        recent_quotes,
        has_old_anchor,
    })
}

/// Split every cluster, keeping those that yield a digest, in input order.
pub fn split_clusters<'a>(
    clusters: Vec<QuoteCluster<'a>>,
    mode: SplitMode,
    windows: &TemporalWindows,
) -> Vec<DigestCluster<'a>> {
    clusters
        .into_iter()
        .filter_map(|cluster| split_cluster(cluster, mode, windows))
        .collect()
}
