//! Curator cluster selection.
//!
//! Candidates are the qualifying clusters that survive the temporal split,
//! richest first. Clusters anchored on a recently used quote are skipped
//! unless that leaves nothing. The final pick is a weighted draw over the
//! top few candidates so the same theme does not win every day.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use curator_types::{Quote, QuoteId, SelectionSettings};
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;
use tracing::{debug, info};

use crate::clustering::cluster_quotes;
use crate::temporal::{split_clusters, DigestCluster, SplitMode, TemporalWindows};

/// Picks the cluster for a curator digest.
#[derive(Debug, Clone)]
pub struct DigestSelector {
    settings: SelectionSettings,
}

impl DigestSelector {
    pub fn new(settings: SelectionSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SelectionSettings {
        &self.settings
    }

    /// Every cluster that could become a digest, richest first.
    pub fn candidates<'a>(
        &self,
        quotes: &'a [Quote],
        relaxed: bool,
        now: DateTime<Utc>,
    ) -> Vec<DigestCluster<'a>> {
        let clusters = cluster_quotes(quotes, &self.settings.clustering);
        let windows = TemporalWindows::new(now, &self.settings.temporal);
        split_clusters(clusters, SplitMode::from_relaxed(relaxed), &windows)
    }

    /// Choose one cluster for today's digest.
    ///
    /// Returns `None` when no cluster qualifies.
    pub fn select_for_digest<'a, R: Rng + ?Sized>(
        &self,
        quotes: &'a [Quote],
        relaxed: bool,
        excluded_anchor_ids: &HashSet<QuoteId>,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Option<DigestCluster<'a>> {
        self.select_across_modes(quotes, &[relaxed], excluded_anchor_ids, now, rng)
    }

    /// Choose one cluster, trying each split mode in order.
    ///
    /// Exclusions apply across every mode first: a fresh anchor in a later
    /// mode beats a recently used one in an earlier mode. Only when every
    /// mode's candidates are excluded is the first non-empty list used as is.
    pub fn select_across_modes<'a, R: Rng + ?Sized>(
        &self,
        quotes: &'a [Quote],
        modes: &[bool],
        excluded_anchor_ids: &HashSet<QuoteId>,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Option<DigestCluster<'a>> {
        let mut fallback: Option<(bool, Vec<DigestCluster<'a>>)> = None;

        for &relaxed in modes {
            let candidates = self.candidates(quotes, relaxed, now);
            if candidates.is_empty() {
                debug!(relaxed, "No qualifying clusters");
                continue;
            }

            let total = candidates.len();
            let (fresh, used) = partition_by_anchor(candidates, excluded_anchor_ids);
            if !fresh.is_empty() {
                debug!(relaxed, total, kept = fresh.len(), "Excluded recently used anchors");
                return self.pick(fresh, relaxed, rng);
            }
            if fallback.is_none() {
                fallback = Some((relaxed, used));
            }
        }

        let (relaxed, used) = fallback?;
        debug!(relaxed, total = used.len(), "Every candidate anchor was used recently, ignoring exclusions");
        self.pick(used, relaxed, rng)
    }

    fn pick<'a, R: Rng + ?Sized>(
        &self,
        candidates: Vec<DigestCluster<'a>>,
        relaxed: bool,
        rng: &mut R,
    ) -> Option<DigestCluster<'a>> {
        let selection = &self.settings.selection;
        let chosen = pick_weighted(candidates, &selection.weights, selection.top_candidates, rng)?;

        info!(
            anchor = %chosen.anchor_quote.id,
            quotes = chosen.total_quotes(),
            articles = chosen.total_articles(),
            relaxed,
            "Selected cluster for digest"
        );
        Some(chosen)
    }
}

/// Split candidates into those with a fresh anchor and those whose anchor
/// was used recently, keeping order.
fn partition_by_anchor<'a>(
    candidates: Vec<DigestCluster<'a>>,
    excluded_anchor_ids: &HashSet<QuoteId>,
) -> (Vec<DigestCluster<'a>>, Vec<DigestCluster<'a>>) {
    candidates
        .into_iter()
        .partition(|c| !excluded_anchor_ids.contains(&c.anchor_quote.id))
}

/// Weighted draw over the first `top` candidates.
///
/// The i-th candidate is drawn with probability `weights[i] / sum(weights)`
/// over the weights actually in play.
pub fn pick_weighted<'a, R: Rng + ?Sized>(
    mut candidates: Vec<DigestCluster<'a>>,
    weights: &[u32],
    top: usize,
    rng: &mut R,
) -> Option<DigestCluster<'a>> {
    let in_play = candidates.len().min(top).min(weights.len());
    if in_play == 0 {
        return candidates.into_iter().next();
    }

    let index = WeightedIndex::new(&weights[..in_play])
        .map(|dist| dist.sample(rng))
        .unwrap_or(0);

    candidates.truncate(in_play);
    Some(candidates.swap_remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::tests::quote_at;
    use chrono::Duration;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Four themes on orthogonal axes with 7, 6, 5 and 5 members.
    fn themed_quotes(now: DateTime<Utc>) -> Vec<Quote> {
        let sizes = [7usize, 6, 5, 5];
        let mut quotes = Vec::new();
        for (theme, size) in sizes.iter().enumerate() {
            let mut axis = vec![0.0f32; 4];
            axis[theme] = 1.0;
            for i in 0..*size {
                quotes.push(quote_at(
                    &format!("t{theme}-{i}"),
                    &format!("t{theme}-a{}", i % 3),
                    axis.clone(),
                    now - Duration::days(40) + Duration::hours((theme * 10 + i) as i64),
                ));
            }
        }
        quotes
    }

    #[test]
    fn test_nothing_qualifies() {
        let now = Utc::now();
        let quotes: Vec<Quote> = (0..3)
            .map(|i| quote_at(&format!("q{i}"), "a", vec![1.0, 0.0], now))
            .collect();
        let selector = DigestSelector::new(SelectionSettings::default());
        let mut rng = StdRng::seed_from_u64(7);
        assert!(selector
            .select_for_digest(&quotes, true, &HashSet::new(), now, &mut rng)
            .is_none());
    }

    #[test]
    fn test_strict_selection_from_anchored_cluster() {
        let now = Utc::now();
        let mut quotes = vec![quote_at("q1", "a1", vec![1.0, 0.0], now - Duration::days(90))];
        for i in 2..=6 {
            quotes.push(quote_at(
                &format!("q{i}"),
                &format!("a{}", i % 3 + 1),
                vec![1.0, 0.01],
                now - Duration::days(5) + Duration::minutes(i),
            ));
        }

        let selector = DigestSelector::new(SelectionSettings::default());
        let mut rng = StdRng::seed_from_u64(1);
        let chosen = selector
            .select_for_digest(&quotes, false, &HashSet::new(), now, &mut rng)
            .unwrap();
        assert_eq!(chosen.anchor_quote.id, "q1");
        assert_eq!(chosen.recent_quotes.len(), 3);
    }

    #[test]
    fn test_exclusion_skips_recent_anchor() {
        let now = Utc::now();
        let quotes = themed_quotes(now);
        let selector = DigestSelector::new(SelectionSettings::default());
        let excluded: HashSet<QuoteId> = ["t0-0".to_string(), "t1-0".to_string()].into();

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let chosen = selector
                .select_for_digest(&quotes, true, &excluded, now, &mut rng)
                .unwrap();
            assert!(!excluded.contains(&chosen.anchor_quote.id));
        }
    }

    #[test]
    fn test_exclusion_falls_back_when_everything_excluded() {
        let now = Utc::now();
        let quotes = themed_quotes(now);
        let selector = DigestSelector::new(SelectionSettings::default());
        let excluded: HashSet<QuoteId> = (0..4).map(|t| format!("t{t}-0")).collect();

        let mut rng = StdRng::seed_from_u64(3);
        let chosen = selector.select_for_digest(&quotes, true, &excluded, now, &mut rng);
        assert!(chosen.is_some());
    }

    #[test]
    fn test_fresh_relaxed_anchor_beats_used_strict_anchor() {
        let now = Utc::now();
        // x: old anchor with recent echoes, qualifies in both modes.
        let mut quotes = vec![quote_at("x0", "xa0", vec![1.0, 0.0], now - Duration::days(90))];
        for i in 1..=5 {
            quotes.push(quote_at(
                &format!("x{i}"),
                &format!("xa{}", i % 3),
                vec![1.0, 0.0],
                now - Duration::days(5) + Duration::minutes(i),
            ));
        }
        // y: every member in the 30-60 day band, qualifies only when relaxed.
        for i in 0..5 {
            quotes.push(quote_at(
                &format!("y{i}"),
                &format!("ya{}", i % 3),
                vec![0.0, 1.0],
                now - Duration::days(45) + Duration::hours(i),
            ));
        }

        let selector = DigestSelector::new(SelectionSettings::default());
        let excluded: HashSet<QuoteId> = ["x0".to_string()].into();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let chosen = selector
                .select_across_modes(&quotes, &[false, true], &excluded, now, &mut rng)
                .unwrap();
            assert_eq!(chosen.anchor_quote.id, "y0");
        }

        // With y gone too, the used strict anchor is the only option left.
        let excluded: HashSet<QuoteId> = ["x0".to_string(), "y0".to_string()].into();
        let mut rng = StdRng::seed_from_u64(0);
        let chosen = selector
            .select_across_modes(&quotes, &[false, true], &excluded, now, &mut rng)
            .unwrap();
        assert_eq!(chosen.anchor_quote.id, "x0");
        assert!(chosen.has_old_anchor);
    }

    #[test]
    fn test_weighted_draw_distribution() {
        let now = Utc::now();
        let quotes = themed_quotes(now);
        let selector = DigestSelector::new(SelectionSettings::default());
        let mut rng = StdRng::seed_from_u64(42);

        let draws = 6000;
        let mut counts = [0usize; 4];
        for _ in 0..draws {
            let candidates = selector.candidates(&quotes, true, now);
            let chosen = pick_weighted(candidates, &[3, 2, 1], 3, &mut rng).unwrap();
            let theme = chosen.anchor_quote.id[1..2].parse::<usize>().unwrap();
            counts[theme] += 1;
        }

        // Expected 1/2, 1/3 and 1/6; the fourth theme never plays.
        let share = |n: usize| n as f64 / draws as f64;
        assert!((share(counts[0]) - 0.5).abs() < 0.04);
        assert!((share(counts[1]) - 1.0 / 3.0).abs() < 0.04);
        assert!((share(counts[2]) - 1.0 / 6.0).abs() < 0.04);
        assert_eq!(counts[3], 0);
    }

    #[test]
    fn test_single_candidate_always_chosen() {
        let now = Utc::now();
        let quotes: Vec<Quote> = themed_quotes(now)
            .into_iter()
            .filter(|q| q.id.starts_with("t0"))
            .collect();
        let selector = DigestSelector::new(SelectionSettings::default());
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let chosen = selector
                .select_for_digest(&quotes, true, &HashSet::new(), now, &mut rng)
                .unwrap();
            assert_eq!(chosen.anchor_quote.id, "t0-0");
        }
    }
}
