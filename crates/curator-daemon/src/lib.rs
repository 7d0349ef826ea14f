//! Quote curator daemon library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (start, send, preview, import, category, admin)
//! - `delivery`: File outbox delivery
//! - `import`: JSON Lines quote parsing

pub mod cli;
pub mod commands;
pub mod delivery;
pub mod import;

pub use cli::{AdminCommands, CategoryCommands, Cli, Commands};
pub use commands::{
    build_assembler, handle_admin, handle_category, import_quotes, init_logging, load_settings,
    open_storage, preview_digest, read_embedding_arg, send_digest, start_daemon,
};
pub use delivery::OutboxDelivery;
pub use import::{parse_quotes, ImportRecord, ParsedImport};
