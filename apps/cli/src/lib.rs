//! # spares-cli: Command Line Front End
//!
//! Every screen of the shop as a subcommand of the `spares` binary.
//!
//! ## Module Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        spares-cli                                       │
//! │                                                                         │
//! │  main.rs ──► Cli::parse() ──► lib.rs::run(cli)                         │
//! │                                    │                                    │
//! │                                    ▼                                    │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  state/    ConfigState (TOML + env), DbState (Database)          │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                    │                                    │
//! │                                    ▼                                    │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  commands/  dispatch ──► category, product, restock, sale,       │  │
//! │  │                          credit, report, backup, session         │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                    │                                    │
//! │                                    ▼                                    │
//! │  stdout: JSON result, CSV or HTML      stderr: logs, JSON error        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod state;

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cli::Cli;
use commands::Output;
use error::ApiError;
use state::{ConfigState, DbState};

/// Runs one command.
///
/// ## Startup Sequence
/// ```text
/// 1. Load configuration ───► --config / SPARES_CONFIG / platform spares.toml
///                            then SPARES_* environment overrides
/// 2. Database path ────────► --db, else config, else platform data dir
/// 3. Open database ────────► WAL mode, pending migrations applied
/// 4. Dispatch command ─────► Output or ApiError
/// ```
pub async fn run(cli: Cli) -> Result<Output, ApiError> {
    let mut config = ConfigState::load(cli.config.as_deref())?;
    if let Some(path) = cli.db {
        config.database_path = Some(path);
    }

    let db_path = config.database_path()?;
    debug!(db_path = %db_path.display(), "Database path determined");

    let db = DbState::open(&db_path).await?;
    info!(store = %config.store_name, "Database ready");

    let output = commands::dispatch(&db, &config, cli.command).await;
    db.inner().close().await;
    output
}

/// Initializes the tracing subscriber. Logs go to stderr so stdout stays
/// machine-readable.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=spares_db=trace` - Trace the database layer only
/// - Default: warnings, plus info from the spares crates
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("warn,spares_cli=info,spares_db=info,spares_core=info,sqlx=warn")
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
