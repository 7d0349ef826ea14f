//! Command implementations for the curator.
//!
//! Handles:
//! - start: open storage, register the daily digest job, run until signalled
//! - send / preview: one digest cycle now, delivered or printed
//! - import: JSON Lines quotes into the store
//! - category / admin: store maintenance

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tokio::signal;
use tracing::{info, warn};

use curator_core::{
    embed_category, parse_embedding, refresh_category_embedding, CuratorError, CycleOutcome, DigestAssembler, DigestPreview,
    TemplateComposer, TextEmbedder,
};
use curator_scheduler::{create_digest_job, DigestJobConfig, SchedulerConfig, SchedulerService};
use curator_storage::{Storage, StorageRepository};
use curator_types::{Category, Embedding, Settings};

use crate::cli::{AdminCommands, CategoryCommands};
use crate::delivery::OutboxDelivery;
use crate::import::parse_quotes;

/// Load settings and apply CLI overrides (highest precedence).
pub fn load_settings(
    config_path: Option<&str>,
    db_path_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;
    if let Some(db_path) = db_path_override {
        settings.db_path = db_path.to_string();
    }
    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    Ok(settings)
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the configured level.
pub fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Open the RocksDB store, creating parent directories if needed.
pub fn open_storage(settings: &Settings) -> Result<Arc<Storage>> {
    let db_path = settings.expanded_db_path();
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent).context("Failed to create database directory")?;
    }
    info!("Opening storage at {:?}", db_path);
    let storage = Storage::open(&db_path).context("Failed to open storage")?;
    Ok(Arc::new(storage))
}

/// Wire the digest engine to RocksDB, the template composer and the outbox.
pub fn build_assembler(settings: &Settings, storage: Arc<Storage>) -> DigestAssembler {
    let repo = Arc::new(StorageRepository::new(storage));
    DigestAssembler::new(
        repo.clone(),
        repo.clone(),
        repo,
        Arc::new(TemplateComposer::new()),
        Arc::new(OutboxDelivery::new(settings.expanded_outbox_path())),
        settings.selection.clone(),
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

/// Run the digest scheduler until Ctrl+C or SIGTERM.
pub async fn start_daemon(settings: Settings, foreground: bool) -> Result<()> {
    info!("Quote curator starting...");
    info!("Configuration:");
    info!("  Database path: {}", settings.db_path);
    info!("  Outbox path: {}", settings.outbox_path);
    info!("  Schedule: {} ({})", settings.schedule.cron, settings.schedule.timezone);

    if !foreground {
        warn!("Background mode not supported, running in foreground");
        warn!("Use a process manager (systemd, launchd) for background operation");
    }

    let storage = open_storage(&settings)?;
    let assembler = Arc::new(build_assembler(&settings, storage.clone()));

    let mut scheduler =
        SchedulerService::new(SchedulerConfig::with_timezone(&settings.schedule.timezone))
            .await
            .context("Failed to create scheduler")?;

    if settings.schedule.enabled {
        create_digest_job(&scheduler, assembler, DigestJobConfig::from(&settings.schedule))
            .await
            .context("Failed to register digest job")?;
    } else {
        warn!("Digest schedule disabled, scheduler will idle");
    }

    scheduler.start().await.context("Failed to start scheduler")?;

    shutdown_signal().await;

    scheduler.shutdown().await.context("Scheduler shutdown failed")?;
    for status in scheduler.registry().get_all_status() {
        info!(
            job = %status.job_name,
            runs = status.run_count,
            errors = status.error_count,
            skips = status.skip_count,
            "Job summary"
        );
    }

    storage.flush().context("Failed to flush storage")?;
    info!("Quote curator stopped");
    Ok(())
}

/// Run one digest cycle now.
pub fn send_digest(settings: &Settings) -> Result<CycleOutcome> {
    let assembler = build_assembler(settings, open_storage(settings)?);
    let outcome = assembler
        .run_digest_cycle(Utc::now(), &mut rand::rng())
        .context("Digest cycle failed")?;

    match (&outcome.source, &outcome.receipt) {
        (Some(source), Some(receipt)) => {
            println!("Sent {} digest ({} quotes)", source, outcome.quotes_used.len());
            if let Some(subject) = &outcome.subject {
                println!("Subject: {}", subject);
            }
            println!("Written to: {}", receipt.location);
        }
        _ => println!("Nothing to send: no category or cluster qualifies yet"),
    }
    Ok(outcome)
}

/// Print the digest a cycle would send.
pub fn preview_digest(settings: &Settings) -> Result<Option<DigestPreview>> {
    let assembler = build_assembler(settings, open_storage(settings)?);
    let preview = assembler
        .preview_digest(Utc::now(), &mut rand::rng())
        .context("Digest preview failed")?;

    match &preview {
        Some(preview) => {
            println!("Source: {}", preview.plan.source());
            println!("Subject: {}", preview.digest.subject);
            println!();
            println!("{}", preview.digest.body);
        }
        None => println!("Nothing to send: no category or cluster qualifies yet"),
    }
    Ok(preview)
}

/// Import quotes from a JSON Lines file. Returns the number stored.
pub fn import_quotes(settings: &Settings, path: &Path) -> Result<usize> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let parsed = parse_quotes(BufReader::new(file))?;

    let storage = open_storage(settings)?;
    let stored = storage
        .put_quotes(&parsed.quotes)
        .context("Failed to store quotes")?;

    info!(stored, without_embedding = parsed.without_embedding, "Import complete");
    println!("Imported {} quotes", stored);
    if parsed.without_embedding > 0 {
        println!(
            "  {} without a usable embedding (excluded from digests)",
            parsed.without_embedding
        );
    }
    Ok(stored)
}

/// An embedding computed outside the process for the category text.
struct SuppliedEmbedding(Embedding);

impl TextEmbedder for SuppliedEmbedding {
    fn embed(&self, _text: &str) -> Result<Embedding, CuratorError> {
        Ok(self.0.clone())
    }
}

/// Parse `--embedding`: inline JSON/delimited numbers, or `@path` to a file holding them.
pub fn read_embedding_arg(arg: &str) -> Result<Embedding> {
    let text = match arg.strip_prefix('@') {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read embedding file {}", path))?,
        None => arg.to_string(),
    };
    match parse_embedding(text.as_str()) {
        Some(embedding) => Ok(embedding.into_owned()),
        None => bail!("Embedding must be a non-empty list of finite numbers"),
    }
}

/// Handle category subcommands.
pub fn handle_category(settings: &Settings, cmd: CategoryCommands) -> Result<()> {
    let storage = open_storage(settings)?;

    match cmd {
        CategoryCommands::Add {
            name,
            description,
            embedding,
            min_quotes,
        } => {
            let embedder = SuppliedEmbedding(read_embedding_arg(&embedding)?);
            let mut category = embed_category(&name, description, &embedder)?;
            if let Some(min_quotes) = min_quotes {
                if min_quotes == 0 {
                    bail!("--min-quotes must be at least 1");
                }
                category.min_quotes_for_digest = min_quotes;
            }
            storage.put_category(&category)?;
            println!("Created category {} ({})", category.name, category.id);
        }
        CategoryCommands::Update {
            id,
            name,
            description,
            embedding,
        } => {
            let mut category = active_category(&storage, &id)?;
            if let Some(name) = name {
                let name = name.trim();
                if name.is_empty() {
                    bail!("--name must not be empty");
                }
                category.name = name.to_string();
            }
            if let Some(description) = description {
                category.description = Some(description).filter(|d| !d.trim().is_empty());
            }
            let embedder = SuppliedEmbedding(read_embedding_arg(&embedding)?);
            refresh_category_embedding(&mut category, &embedder)?;
            storage.put_category(&category)?;
            println!("Updated category {} ({})", category.name, category.id);
        }
        CategoryCommands::List => {
            let mut categories: Vec<_> = storage
                .list_categories()?
                .into_iter()
                .filter(|c| c.is_active)
                .collect();
            if categories.is_empty() {
                println!("No categories");
                return Ok(());
            }
            // Queued first, each group oldest first.
            categories.sort_by_key(|c| (!c.is_queued(), c.created_at));
            println!("{:<28} {:<7} {:<20} NAME", "ID", "STATUS", "LAST DIGEST");
            for category in categories {
                let last = category
                    .last_digest_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "never".to_string());
                println!(
                    "{:<28} {:<7} {:<20} {}",
                    category.id,
                    category.status.to_string(),
                    last,
                    category.name
                );
            }
        }
        CategoryCommands::Queue { id } => {
            let mut category = active_category(&storage, &id)?;
            category.queue();
            storage.put_category(&category)?;
            println!("Queued category {}", category.name);
        }
        CategoryCommands::Stats { id } => {
            let category = active_category(&storage, &id)?;
            let assembler = build_assembler(settings, storage);
            let stats = assembler.category_stats(&category, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        CategoryCommands::Delete { id } => {
            if storage.deactivate_category(&id)? {
                println!("Deleted category {}", id);
            } else {
                bail!("Category not found: {}", id);
            }
        }
    }

    Ok(())
}

/// Load a category that has not been deleted.
fn active_category(storage: &Storage, id: &str) -> Result<Category> {
    match storage.get_category(id)? {
        Some(category) if category.is_active => Ok(category),
        _ => bail!("Category not found: {}", id),
    }
}

/// Handle admin subcommands.
pub fn handle_admin(settings: &Settings, cmd: AdminCommands) -> Result<()> {
    let storage = open_storage(settings)?;

    match cmd {
        AdminCommands::Stats => {
            let stats = storage.get_stats()?;
            println!("Database Statistics");
            println!("===================");
            println!("Path: {}", settings.db_path);
            println!();
            println!("Quotes:      {}", stats.quote_count);
            println!(
                "Categories:  {} ({} queued)",
                stats.category_count, stats.queued_category_count
            );
            println!("Digests:     {}", stats.history_count);
            println!();
            println!("Disk Usage:  {}", format_bytes(stats.disk_usage_bytes));
        }
        AdminCommands::Compact => {
            println!("Compacting database...");
            storage.compact()?;
            println!("Compaction complete.");
        }
        AdminCommands::DeleteArticle { article_id } => {
            let removed = storage.delete_quotes_for_article(&article_id)?;
            println!("Removed {} quotes of article {}", removed, article_id);
        }
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
