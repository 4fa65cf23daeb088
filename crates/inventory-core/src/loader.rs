use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use glob::{glob_with, MatchOptions, Pattern};
use inventory_parser::parse_csv_file;
use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::db::DbPool;
use crate::error::{PipelineError, Result};
use crate::tables;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileStatus {
    Loaded { rows: u64, columns: usize },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: String,
    pub table: String,
    pub status: FileStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub files: Vec<FileReport>,
    pub elapsed_secs: f64,
}

impl LoadReport {
    pub fn loaded(&self) -> usize {
        self.files
            .iter()
            .filter(|file| matches!(file.status, FileStatus::Loaded { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.files
            .iter()
            .filter(|file| matches!(file.status, FileStatus::Failed { .. }))
            .count()
    }
}

/// Lists the `.csv` files (any letter case) directly inside `dir`, sorted by
/// path. Sub-directories and other extensions are ignored.
pub fn discover_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let metadata = fs::metadata(dir)?;
    if !metadata.is_dir() {
        return Err(PipelineError::Validation(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let pattern = format!("{}/*.csv", Pattern::escape(&dir.to_string_lossy()));
    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let mut files = Vec::new();
    for entry in glob_with(&pattern, options)? {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(err) => warn!(error = %err, "Could not read directory entry"),
        }
    }
    files.sort();
    Ok(files)
}

/// Table name for a source file: its base name without the extension.
pub fn table_name_for(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
}

/// Writes a frame under `table`, dropping whatever was there before.
pub async fn ingest_frame(pool: &DbPool, table: &str, df: &DataFrame) -> Result<u64> {
    tables::write_frame(pool, table, df).await
}

async fn load_file(pool: &DbPool, path: &Path, table: &str) -> Result<(u64, usize)> {
    let df = parse_csv_file(path)?;
    let rows = ingest_frame(pool, table, &df).await?;
    Ok((rows, df.width()))
}

/// Loads every CSV file in `dir` into its own table.
///
/// A file that fails to parse or write is logged and reported as failed; the
/// remaining files are still loaded. Only a missing or unreadable directory
/// fails the whole call.
pub async fn load_directory(pool: &DbPool, dir: &Path) -> Result<LoadReport> {
    let started = Instant::now();
    let files = discover_csv_files(dir)?;
    info!(dir = %dir.display(), files = files.len(), "Starting ingestion");

    let mut reports = Vec::with_capacity(files.len());
    for path in files {
        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let Some(table) = table_name_for(&path) else {
            warn!(file = %label, "Skipping file without a usable base name");
            continue;
        };

        info!("Ingesting {label} into database");
        let status = match load_file(pool, &path, &table).await {
            Ok((rows, columns)) => {
                info!(table = %table, rows, columns, "Table replaced");
                FileStatus::Loaded { rows, columns }
            }
            Err(err) => {
                error!(file = %path.display(), error = ?err, "Error ingesting {label}");
                FileStatus::Failed {
                    error: err.to_string(),
                }
            }
        };

        reports.push(FileReport {
            path: path.display().to_string(),
            table,
            status,
        });
    }

    let elapsed = started.elapsed();
    info!("Ingestion complete");
    info!("Total time taken: {:.2} minutes", elapsed.as_secs_f64() / 60.0);

    Ok(LoadReport {
        files: reports,
        elapsed_secs: elapsed.as_secs_f64(),
    })
}
