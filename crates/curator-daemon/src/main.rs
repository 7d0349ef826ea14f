//! Quote Curator
//!
//! Sends one digest a day: a queued category if one has enough fresh
//! matches, otherwise a cluster of related quotes anchored on something
//! read long ago.
//!
//! # Usage
//!
//! ```bash
//! curator start [--foreground]
//! curator send
//! curator preview
//! curator import quotes.jsonl
//! curator category add --name "AI Ethics" --embedding @ai-ethics.json
//! curator admin stats
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/quote-curator/config.toml)
//! 3. Environment variables (CURATOR_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use curator_daemon::{
    handle_admin, handle_category, import_quotes, init_logging, load_settings, preview_digest,
    send_digest, start_daemon, Cli, Commands,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(
        cli.config.as_deref(),
        cli.db_path.as_deref(),
        cli.log_level.as_deref(),
    )?;
    init_logging(&settings.log_level)?;

    match cli.command {
        Commands::Start { foreground } => {
            start_daemon(settings, foreground).await?;
        }
        Commands::Send => {
            send_digest(&settings)?;
        }
        Commands::Preview => {
            preview_digest(&settings)?;
        }
        Commands::Import { file } => {
            import_quotes(&settings, &file)?;
        }
        Commands::Category(cmd) => {
            handle_category(&settings, cmd)?;
        }
        Commands::Admin(cmd) => {
            handle_admin(&settings, cmd)?;
        }
    }

    Ok(())
}
