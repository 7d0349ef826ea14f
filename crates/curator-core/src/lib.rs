//! # curator-core
//!
//! The digest engine: embedding similarity, greedy seed clustering, the
//! old/recent temporal split, weighted cluster selection, category matching,
//! and the assembly pipeline that turns one of those into a delivered digest.
//!
//! Selection functions are pure. They take the current time and a random
//! number generator as arguments so callers (and tests) control both.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use curator_core::{DigestAssembler, TemplateComposer};
//!
//! let assembler = DigestAssembler::new(quotes, categories, history,
//!     Arc::new(TemplateComposer::new()), delivery, settings.selection.clone());
//! let outcome = assembler.run_digest_cycle(Utc::now(), &mut rand::rng())?;
//! ```

pub mod assembly;
pub mod category;
pub mod clustering;
pub mod compose;
pub mod error;
pub mod plan;
pub mod ports;
pub mod selector;
pub mod similarity;
pub mod temporal;

pub use assembly::{CycleOutcome, DigestAssembler, DigestPreview};
pub use category::{
    category_embedding_text, embed_category, find_quotes_for_category, get_category_stats,
    refresh_category_embedding, CategoryStats, SampleQuote, ScoredQuote,
};
pub use clustering::{cluster_quotes, QuoteCluster};
pub use compose::{ComposedDigest, DigestComposer, TemplateComposer, DEFAULT_THEME};
pub use error::CuratorError;
pub use plan::{CategoryPlan, CuratorPlan, DigestPlan, MatchedQuote};
pub use ports::{
    CategoryRepository, DeliveryReceipt, DigestDelivery, HistoryRepository, QuoteRepository,
    TextEmbedder,
};
pub use selector::{pick_weighted, DigestSelector};
pub use similarity::{cosine_similarity, parse_embedding, similarity, EmbeddingInput};
pub use temporal::{split_cluster, split_clusters, DigestCluster, SplitMode, TemporalWindows};
