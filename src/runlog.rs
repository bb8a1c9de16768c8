use crate::constants::{APP_DIR, LOGS_DIR};
use crate::model::RunResult;
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn default_log_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join(APP_DIR).join(LOGS_DIR))
}

/// Appends one `[YYYY-MM-DD HH:MM:SS] summary` line to the file named after
/// the run's date. Returns the file written.
pub fn append(log_dir: &Path, result: &RunResult) -> Result<PathBuf> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create {}", log_dir.display()))?;

    let path = log_dir.join(format!("{}.log", result.timestamp.format("%Y-%m-%d")));
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    writeln!(file, "{}", format_line(result))?;
    Ok(path)
}

fn format_line(result: &RunResult) -> String {
    format!(
        "[{}] {}",
        result.timestamp.format("%Y-%m-%d %H:%M:%S"),
        result.summary()
    )
}
