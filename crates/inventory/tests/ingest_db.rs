use std::fs;
use std::path::PathBuf;
use std::process::Command;

use anyhow::Result;
use uuid::Uuid;

fn scratch_dir() -> Result<PathBuf> {
    let path = std::env::temp_dir().join(format!("ingest-db-{}", Uuid::new_v4()));
    fs::create_dir_all(&path)?;
    Ok(path)
}

#[test]
fn missing_data_dir_is_logged_before_exit() -> Result<()> {
    let root = scratch_dir()?;
    let log_dir = root.join("logs");

    let output = Command::new(env!("CARGO_BIN_EXE_ingest-db"))
        .arg("--database-url")
        .arg(root.join("inventory.db"))
        .arg("--data-dir")
        .arg(root.join("no-such-dir"))
        .arg("--log-dir")
        .arg(&log_dir)
        .env_remove("RUST_LOG")
        .output()?;

    assert!(!output.status.success());
    let log = fs::read_to_string(log_dir.join("ingestion_db.log"))?;
    assert!(log.contains("Ingestion failed"), "log was:\n{log}");
    assert!(log.contains("ERROR"));

    fs::remove_dir_all(&root).ok();
    Ok(())
}
