use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use inventory_core::config::InventoryConfig;
use inventory_core::logging::JobLog;
use inventory_core::{db, summary};
use tracing::error;

/// Rebuilds the vendor_sales_summary table from the loaded inventory tables.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// SQLite database URL or file path (env: INVENTORY_DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,
    /// Directory for the job log (env: INVENTORY_LOG_DIR)
    #[arg(long)]
    log_dir: Option<PathBuf>,
    /// Print the run report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = InventoryConfig::from_env().with_overrides(cli.database_url, None, cli.log_dir);

    let log = JobLog::open(&config.log_dir, "get_vendor_summary")
        .with_context(|| format!("failed to open log directory {}", config.log_dir.display()))?;

    let pool = match db::connect(&config.database_url).await {
        Ok(pool) => pool,
        Err(err) => {
            error!(error = ?err, "Could not open database");
            return Err(err).context("failed to open inventory database");
        }
    };

    let report = summary::run(&pool)
        .await
        .context("vendor summary pipeline failed")?;
    pool.close().await;
    log.finish();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Wrote {} rows to {} in {:.2} seconds",
            report.rows, report.table, report.elapsed_secs
        );
    }

    Ok(())
}
