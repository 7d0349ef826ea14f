//! Digest assembly.
//!
//! One invocation produces at most one digest. The oldest queued category
//! gets first refusal; when it cannot fill a digest the curator path picks
//! a cluster instead. The pipeline is strictly select, compose, deliver,
//! record. Any failure aborts the invocation and nothing is recorded.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use curator_types::{
    AnchorMode, Category, CategoryId, DigestSource, HistoryEntry, Quote, QuoteId,
    SelectionSettings,
};
use rand::Rng;
use tracing::{info, instrument, warn};

use crate::category::{
    distinct_articles, find_quotes_for_category, get_category_stats, CategoryStats,
};
use crate::compose::{ComposedDigest, DigestComposer};
use crate::error::CuratorError;
use crate::plan::{CategoryPlan, CuratorPlan, DigestPlan, MatchedQuote};
use crate::ports::{
    CategoryRepository, DeliveryReceipt, DigestDelivery, HistoryRepository, QuoteRepository,
};
use crate::selector::DigestSelector;

/// Result of one digest invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    /// Quotes presented to the reader, empty when nothing was sent
    pub quotes_used: Vec<QuoteId>,
    /// Which path produced the digest
    pub source: Option<DigestSource>,
    pub subject: Option<String>,
    pub receipt: Option<DeliveryReceipt>,
}

impl CycleOutcome {
    /// Outcome when no digest qualified.
    pub fn nothing_to_send() -> Self {
        Self {
            quotes_used: Vec::new(),
            source: None,
            subject: None,
            receipt: None,
        }
    }

    /// Whether a digest was delivered.
    pub fn was_sent(&self) -> bool {
        self.source.is_some()
    }
}

/// A composed digest that was neither delivered nor recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct DigestPreview {
    pub plan: DigestPlan,
    pub digest: ComposedDigest,
}

/// Wires the engine to its collaborators.
pub struct DigestAssembler {
    quotes: Arc<dyn QuoteRepository>,
    categories: Arc<dyn CategoryRepository>,
    history: Arc<dyn HistoryRepository>,
    composer: Arc<dyn DigestComposer>,
    delivery: Arc<dyn DigestDelivery>,
    selector: DigestSelector,
}

impl DigestAssembler {
    pub fn new(
        quotes: Arc<dyn QuoteRepository>,
        categories: Arc<dyn CategoryRepository>,
        history: Arc<dyn HistoryRepository>,
        composer: Arc<dyn DigestComposer>,
        delivery: Arc<dyn DigestDelivery>,
        settings: SelectionSettings,
    ) -> Self {
        Self {
            quotes,
            categories,
            history,
            composer,
            delivery,
            selector: DigestSelector::new(settings),
        }
    }

    fn settings(&self) -> &SelectionSettings {
        self.selector.settings()
    }

    /// Select, compose, deliver and record one digest.
    #[instrument(skip(self, rng))]
    pub fn run_digest_cycle<R: Rng + ?Sized>(
        &self,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<CycleOutcome, CuratorError> {
        let Some(plan) = self.plan_digest(now, rng)? else {
            info!("No suitable quotes for a digest, nothing to send");
            return Ok(CycleOutcome::nothing_to_send());
        };

        let digest = self.composer.compose(&plan)?;
        let receipt = self.delivery.deliver(&digest)?;

        let entry = HistoryEntry::new(plan.to_record(&digest.theme, &digest.subject), now);
        self.history.record(&entry)?;

        if let DigestPlan::Category(category_plan) = &plan {
            let mut category = category_plan.category.clone();
            category.mark_delivered(now);
            self.categories.save_category(&category)?;
            info!(category = %category.name, "Category moved to pool");
        }

        let outcome = CycleOutcome {
            quotes_used: plan.quotes_used(),
            source: Some(plan.source()),
            subject: Some(digest.subject),
            receipt: Some(receipt),
        };
        info!(
            source = ?outcome.source,
            quotes = outcome.quotes_used.len(),
            "Digest delivered"
        );
        Ok(outcome)
    }

    /// Compose the digest a cycle would send, without delivering or recording.
    pub fn preview_digest<R: Rng + ?Sized>(
        &self,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Option<DigestPreview>, CuratorError> {
        let Some(plan) = self.plan_digest(now, rng)? else {
            return Ok(None);
        };
        let digest = self.composer.compose(&plan)?;
        Ok(Some(DigestPreview { plan, digest }))
    }

    /// Choose what the next digest would contain.
    pub fn plan_digest<R: Rng + ?Sized>(
        &self,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Option<DigestPlan>, CuratorError> {
        let quotes = self.quotes.all_quotes()?;

        if let Some(plan) = self.plan_category_digest(&quotes, now)? {
            return Ok(Some(plan));
        }

        self.plan_curator_digest(&quotes, now, rng)
    }

    /// Category path: the oldest queued category, if it has enough fresh matches.
    pub fn plan_category_digest(
        &self,
        quotes: &[Quote],
        now: DateTime<Utc>,
    ) -> Result<Option<DigestPlan>, CuratorError> {
        let Some(category) = self
            .categories
            .queued_categories()?
            .into_iter()
            .min_by_key(|c| c.created_at)
        else {
            return Ok(None);
        };

        let Some(embedding) = category.embedding.as_ref() else {
            warn!(category = %category.name, "Queued category has no embedding, skipping");
            return Ok(None);
        };

        let settings = &self.settings().category;
        let excluded = self.category_exclusions(&category.id, now)?;
        let matches = find_quotes_for_category(
            quotes,
            embedding,
            settings.digest_threshold,
            settings.digest_limit,
            &excluded,
        );

        if matches.len() < category.min_quotes_for_digest {
            info!(
                category = %category.name,
                matches = matches.len(),
                needed = category.min_quotes_for_digest,
                "Not enough quotes for category digest"
            );
            return Ok(None);
        }

        let articles = distinct_articles(&matches);
        if articles < settings.min_articles {
            info!(
                category = %category.name,
                articles,
                needed = settings.min_articles,
                "Not enough articles for category digest"
            );
            return Ok(None);
        }

        let selected: Vec<MatchedQuote> = matches
            .into_iter()
            .take(settings.max_digest_quotes)
            .map(MatchedQuote::from)
            .collect();

        info!(category = %category.name, quotes = selected.len(), "Planned category digest");
        Ok(Some(DigestPlan::Category(CategoryPlan::new(category, selected))))
    }

    /// Curator path: a weighted pick among qualifying clusters.
    pub fn plan_curator_digest<R: Rng + ?Sized>(
        &self,
        quotes: &[Quote],
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Option<DigestPlan>, CuratorError> {
        let lookback = Duration::days(i64::from(self.settings().history.curator_lookback_days));
        let excluded = self.history.recent_anchor_ids(now - lookback)?;

        let modes: &[bool] = match self.settings().selection.anchor_mode {
            AnchorMode::Strict => &[false],
            AnchorMode::Relaxed => &[true],
            AnchorMode::Auto => &[false, true],
        };

        Ok(self
            .selector
            .select_across_modes(quotes, modes, &excluded, now, rng)
            .map(|cluster| DigestPlan::Curator(CuratorPlan::from(cluster))))
    }

    /// How a category currently matches the library.
    ///
    /// Quotes already used by this category within the lookback are excluded.
    pub fn category_stats(
        &self,
        category: &Category,
        now: DateTime<Utc>,
    ) -> Result<CategoryStats, CuratorError> {
        let quotes = self.quotes.all_quotes()?;
        let excluded = self.category_exclusions(&category.id, now)?;
        Ok(get_category_stats(
            &quotes,
            category.embedding.as_ref(),
            &excluded,
            &self.settings().category,
        ))
    }

    fn category_exclusions(
        &self,
        category_id: &CategoryId,
        now: DateTime<Utc>,
    ) -> Result<HashSet<QuoteId>, CuratorError> {
        let lookback = Duration::days(i64::from(self.settings().history.category_lookback_days));
        self.history.category_quote_ids(category_id, now - lookback)
    }
}
