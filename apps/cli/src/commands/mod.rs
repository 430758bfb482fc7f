//! # Commands Module
//!
//! One file per subcommand group.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (dispatch + output)
//! ├── session.rs   ◄─── login, logout, whoami
//! ├── category.rs  ◄─── Category CRUD
//! ├── product.rs   ◄─── Product CRUD, low stock, stock summary
//! ├── restock.rs   ◄─── Restock and history
//! ├── sale.rs      ◄─── Checkout and sale history
//! ├── credit.rs    ◄─── Credit ledger and payments
//! ├── report.rs    ◄─── Sales report, CSV, print HTML
//! └── backup.rs    ◄─── Snapshot export/import
//! ```
//!
//! ## How Commands Work
//! ```text
//! spares product low-stock
//!      │
//!      ▼
//! dispatch(&db, &config, Command::Product(LowStock))
//!      │
//!      ▼
//! product::run(&db, &config, cmd) -> Result<Output, ApiError>
//!      │
//!      ├── Ok(Output::Json(value)) ──► pretty JSON on stdout
//!      ├── Ok(Output::Raw(text))   ──► text as-is on stdout (CSV, HTML)
//!      └── Err(ApiError)           ──► JSON on stderr, exit 1
//! ```

pub mod backup;
pub mod category;
pub mod credit;
pub mod product;
pub mod report;
pub mod restock;
pub mod sale;
pub mod session;

use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::cli::Command;
use crate::error::ApiError;
use crate::state::{ConfigState, DbState};

/// What a command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Json(Value),
    Raw(String),
}

impl Output {
    pub fn json<T: Serialize>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_value(value)
            .map(Output::Json)
            .map_err(|e| ApiError::internal(format!("Could not serialize output: {}", e)))
    }

    /// Text written to stdout.
    pub fn render(&self) -> String {
        match self {
            Output::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            Output::Raw(text) => text.clone(),
        }
    }
}

/// Routes a parsed command to its handler.
pub async fn dispatch(
    db: &DbState,
    config: &ConfigState,
    command: Command,
) -> Result<Output, ApiError> {
    match command {
        Command::Login { name, role } => session::login(db, &name, &role).await,
        Command::Logout => session::logout(db).await,
        Command::Whoami => session::whoami(db).await,
        Command::Category(cmd) => category::run(db, cmd).await,
        Command::Product(cmd) => product::run(db, config, cmd).await,
        Command::Restock(cmd) => restock::run(db, config, cmd).await,
        Command::Sale(cmd) => sale::run(db, config, cmd).await,
        Command::Credit(cmd) => credit::run(db, config, cmd).await,
        Command::Report(cmd) => report::run(db, config, cmd).await,
        Command::Backup(cmd) => backup::run(db, cmd).await,
    }
}

/// Writes an export file and reports where it went.
pub(crate) fn write_file(path: &Path, contents: &str) -> Result<Output, ApiError> {
    std::fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), bytes = contents.len(), "File written");

    Ok(Output::Json(json!({
        "path": path.display().to_string(),
        "bytes": contents.len(),
    })))
}

#[cfg(test)]
pub(crate) mod test_support {
    use spares_db::{Database, DbConfig};

    use crate::state::{ConfigState, DbState};

    pub async fn test_state() -> (DbState, ConfigState) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        (DbState::new(db), ConfigState::default())
    }

    /// Unwraps a JSON output.
    pub fn json(output: crate::commands::Output) -> serde_json::Value {
        match output {
            crate::commands::Output::Json(value) => value,
            crate::commands::Output::Raw(text) => panic!("expected JSON, got raw output: {text}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let out = Output::json(&json!({"a": 1})).unwrap();
        assert_eq!(out.render(), "{\n  \"a\": 1\n}");
        assert_eq!(Output::Raw("x,y\n".to_string()).render(), "x,y\n");
    }

    #[test]
    fn test_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");

        let out = write_file(&path, "Summary\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Summary\n");
        let Output::Json(value) = out else {
            panic!("expected JSON");
        };
        assert_eq!(value["bytes"], 8);

        let missing = dir.path().join("nope").join("report.csv");
        assert!(write_file(&missing, "x").is_err());
    }
}
