use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::info;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;

use crate::error::Result;

/// Per-job log sink.
///
/// Events emitted on the current thread while the `JobLog` is alive are
/// appended to `<log_dir>/<job>.log`. Filtering honours `RUST_LOG` and
/// defaults to `info`.
pub struct JobLog {
    job: String,
    path: PathBuf,
    started: Instant,
    _guard: DefaultGuard,
}

impl JobLog {
    pub fn open(log_dir: &Path, job: &str) -> Result<Self> {
        fs::create_dir_all(log_dir)?;
        let path = log_dir.join(format!("{job}.log"));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(false)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);

        info!(job, "Logging initialized");

        Ok(Self {
            job: job.to_string(),
            path,
            started: Instant::now(),
            _guard: guard,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Writes the closing line and detaches the log file.
    pub fn finish(self) {
        info!(
            job = %self.job,
            elapsed_secs = self.elapsed().as_secs_f64(),
            "Job finished"
        );
    }
}
