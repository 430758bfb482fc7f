//! # Backup Commands
//!
//! Whole-store export to one JSON file, and merging such a file back in.
//!
//! Import is lenient: a key that fails to parse is reported and skipped, the
//! rest is still imported. Records whose id already exists are left alone.

use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use tracing::{debug, info, warn};

use spares_core::snapshot::{Snapshot, SnapshotCounts};
use spares_db::ImportReport;

use crate::cli::BackupCommand;
use crate::commands::{write_file, Output};
use crate::error::ApiError;
use crate::state::DbState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    pub path: String,
    pub counts: SnapshotCounts,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    #[serde(flatten)]
    pub report: ImportReport,
    /// Keys dropped because they could not be read, with the reason.
    pub unreadable_keys: Vec<UnreadableKey>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnreadableKey {
    pub key: String,
    pub reason: String,
}

pub async fn run(db: &DbState, cmd: BackupCommand) -> Result<Output, ApiError> {
    match cmd {
        BackupCommand::Export { out } => export(db, &out).await,
        BackupCommand::Import { path } => import(db, &path).await,
    }
}

async fn export(db: &DbState, out: &Path) -> Result<Output, ApiError> {
    debug!(path = %out.display(), "backup export command");

    let snapshot = db.inner().export_snapshot().await?;
    let json = snapshot.to_json_pretty()?;
    write_file(out, &json)?;

    Output::json(&ExportResponse {
        path: out.display().to_string(),
        counts: snapshot.counts(),
    })
}

async fn import(db: &DbState, path: &Path) -> Result<Output, ApiError> {
    debug!(path = %path.display(), "backup import command");

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading backup {}", path.display()))?;
    let loaded = Snapshot::from_json_lenient(&text)?;

    for skipped in &loaded.skipped {
        warn!(key = skipped.key, reason = %skipped.reason, "Backup key skipped");
    }

    let report = db.inner().import_snapshot(&loaded.snapshot).await?;
    info!(inserted = ?report.inserted, skipped = ?report.skipped, "Backup imported");

    Output::json(&ImportResponse {
        report,
        unreadable_keys: loaded
            .skipped
            .into_iter()
            .map(|s| UnreadableKey {
                key: s.key.to_string(),
                reason: s.reason,
            })
            .collect(),
    })
}
