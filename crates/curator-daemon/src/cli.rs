//! CLI argument parsing for the curator.
//!
//! CLI flags override every other configuration source.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Quote Curator
///
/// Surfaces forgotten highlights from your reading library as a daily digest.
#[derive(Parser, Debug)]
#[command(name = "curator")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/quote-curator/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Override database path
    #[arg(long, global = true)]
    pub db_path: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Curator commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the digest scheduler until interrupted
    Start {
        /// Run in foreground (don't daemonize)
        #[arg(short, long)]
        foreground: bool,
    },

    /// Run one digest cycle now
    Send,

    /// Print the digest that would be sent, without sending it
    Preview,

    /// Import quotes from a JSON Lines file (one quote per line)
    Import {
        /// Path to the .jsonl file
        file: PathBuf,
    },

    /// Manage categories
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Administrative commands
    #[command(subcommand)]
    Admin(AdminCommands),
}

/// Category subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum CategoryCommands {
    /// Create a queued category
    Add {
        /// Display name
        #[arg(long)]
        name: String,

        /// Optional description
        #[arg(long)]
        description: Option<String>,

        /// Embedding of "name: description", as JSON or @path/to/file
        #[arg(long)]
        embedding: String,

        /// Matches needed before the category can produce a digest
        #[arg(long)]
        min_quotes: Option<usize>,
    },

    /// Rename or redescribe a category and replace its embedding
    Update {
        /// Category ID
        id: String,

        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// New description; an empty string clears it
        #[arg(long)]
        description: Option<String>,

        /// Embedding of the updated "name: description", as JSON or @path/to/file
        #[arg(long)]
        embedding: String,
    },

    /// List categories, queued first
    List,

    /// Put a category back in the queue
    Queue {
        /// Category ID
        id: String,
    },

    /// Show how a category matches the library
    Stats {
        /// Category ID
        id: String,
    },

    /// Delete a category; past digests keep their reference to it
    Delete {
        /// Category ID
        id: String,
    },
}

/// Admin subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum AdminCommands {
    /// Show database statistics
    Stats,

    /// Trigger RocksDB compaction
    Compact,

    /// Remove every quote of one article before re-extraction
    DeleteArticle {
        /// Article ID
        article_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_start() {
        let cli = Cli::parse_from(["curator", "start", "--foreground"]);
        assert!(matches!(cli.command, Commands::Start { foreground: true }));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["curator", "send", "--db-path", "/tmp/db", "-l", "debug"]);
        assert!(matches!(cli.command, Commands::Send));
        assert_eq!(cli.db_path.as_deref(), Some("/tmp/db"));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_cli_import() {
        let cli = Cli::parse_from(["curator", "import", "quotes.jsonl"]);
        match cli.command {
            Commands::Import { file } => assert_eq!(file, PathBuf::from("quotes.jsonl")),
            _ => panic!("Expected Import command"),
        }
    }

    #[test]
    fn test_cli_category_add() {
        let cli = Cli::parse_from([
            "curator",
            "category",
            "add",
            "--name",
            "AI Ethics",
            "--description",
            "alignment and harms",
            "--embedding",
            "[0.1, 0.2]",
        ]);
        match cli.command {
            Commands::Category(CategoryCommands::Add {
                name,
                description,
                embedding,
                min_quotes,
            }) => {
                assert_eq!(name, "AI Ethics");
                assert_eq!(description.as_deref(), Some("alignment and harms"));
                assert_eq!(embedding, "[0.1, 0.2]");
                assert_eq!(min_quotes, None);
            }
            _ => panic!("Expected Category Add command"),
        }
    }

    #[test]
    fn test_cli_category_stats() {
        let cli = Cli::parse_from(["curator", "category", "stats", "01HX"]);
        assert!(matches!(
            cli.command,
            Commands::Category(CategoryCommands::Stats { ref id }) if id == "01HX"
        ));
    }

    #[test]
    fn test_cli_category_update() {
        let cli = Cli::parse_from([
            "curator",
            "category",
            "update",
            "01HX",
            "--description",
            "fairness",
            "--embedding",
            "@emb.json",
        ]);
        match cli.command {
            Commands::Category(CategoryCommands::Update {
                id,
                name,
                description,
                embedding,
            }) => {
                assert_eq!(id, "01HX");
                assert_eq!(name, None);
                assert_eq!(description.as_deref(), Some("fairness"));
                assert_eq!(embedding, "@emb.json");
            }
            _ => panic!("Expected Category Update command"),
        }

        // The embedding must be resupplied whenever the text changes.
        assert!(Cli::try_parse_from(["curator", "category", "update", "01HX", "--name", "AI"]).is_err());
    }

    #[test]
    fn test_cli_admin_delete_article() {
        let cli = Cli::parse_from(["curator", "admin", "delete-article", "a-42"]);
        assert!(matches!(
            cli.command,
            Commands::Admin(AdminCommands::DeleteArticle { ref article_id }) if article_id == "a-42"
        ));
    }
}
