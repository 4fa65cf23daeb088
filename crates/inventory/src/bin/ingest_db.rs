use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use inventory_core::config::InventoryConfig;
use inventory_core::db;
use inventory_core::loader::{self, FileStatus};
use inventory_core::logging::JobLog;
use tracing::error;

/// Loads every CSV file in the data directory into the inventory database,
/// one table per file.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// SQLite database URL or file path (env: INVENTORY_DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,
    /// Directory holding the source CSV files (env: INVENTORY_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Directory for the job log (env: INVENTORY_LOG_DIR)
    #[arg(long)]
    log_dir: Option<PathBuf>,
    /// Print the load report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config =
        InventoryConfig::from_env().with_overrides(cli.database_url, cli.data_dir, cli.log_dir);

    let log = JobLog::open(&config.log_dir, "ingestion_db")
        .with_context(|| format!("failed to open log directory {}", config.log_dir.display()))?;

    let pool = match db::connect(&config.database_url).await {
        Ok(pool) => pool,
        Err(err) => {
            error!(error = ?err, "Could not open database");
            return Err(err).context("failed to open inventory database");
        }
    };

    let report = match loader::load_directory(&pool, &config.data_dir).await {
        Ok(report) => report,
        Err(err) => {
            error!(error = ?err, dir = %config.data_dir.display(), "Ingestion failed");
            pool.close().await;
            return Err(err)
                .with_context(|| format!("failed to ingest {}", config.data_dir.display()));
        }
    };
    pool.close().await;
    log.finish();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for file in &report.files {
            match &file.status {
                FileStatus::Loaded { rows, columns } => {
                    println!("  loaded  {} ({rows} rows, {columns} columns)", file.table)
                }
                FileStatus::Failed { error } => println!("  skipped {}: {error}", file.path),
            }
        }
        println!(
            "Ingestion complete: {} loaded, {} skipped in {:.2} minutes",
            report.loaded(),
            report.failed(),
            report.elapsed_secs / 60.0
        );
    }

    Ok(())
}
