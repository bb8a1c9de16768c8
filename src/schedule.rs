use crate::constants::{CRONTAB_TAG, SCHEDULE_TASK_NAME};
use anyhow::{Context, Result, bail};
use std::path::Path;
use std::process::Command;
use tracing::info;

/// Registers a weekly run (Sunday 12:00) of `exe` with the OS scheduler.
/// Unlike the reclaim pipeline, failures here are returned to the caller.
pub fn register_weekly(exe: &Path) -> Result<()> {
    register(exe)?;
    info!(exe = %exe.display(), "weekly run registered");
    Ok(())
}

#[cfg(target_os = "windows")]
fn register(exe: &Path) -> Result<()> {
    let output = schtasks_command(exe)
        .output()
        .context("Failed to execute schtasks")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("schtasks failed: {}", stderr.trim());
    }
    Ok(())
}

#[cfg(not(target_os = "windows"))]
fn register(exe: &Path) -> Result<()> {
    use std::io::Write;
    use std::process::Stdio;

    // `crontab -l` fails when the user has no crontab yet.
    let existing = Command::new("crontab")
        .arg("-l")
        .output()
        .context("Failed to execute crontab")?;
    let existing = if existing.status.success() {
        String::from_utf8_lossy(&existing.stdout).into_owned()
    } else {
        String::new()
    };

    let mut child = Command::new("crontab")
        .arg("-")
        .stdin(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("Failed to execute crontab")?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(merge_crontab(&existing, exe).as_bytes())?;
    }
    let output = child.wait_with_output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("crontab failed: {}", stderr.trim());
    }
    Ok(())
}

#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
fn schtasks_command(exe: &Path) -> Command {
    let mut cmd = Command::new("schtasks");
    cmd.args([
        "/Create",
        "/TN",
        SCHEDULE_TASK_NAME,
        "/SC",
        "WEEKLY",
        "/D",
        "SUN",
        "/ST",
        "12:00",
        "/RL",
        "HIGHEST",
        "/TR",
    ])
    .arg(format!("\"{}\"", exe.display()))
    .arg("/F");
    cmd
}

/// Replaces any previously registered entry so repeated registration is
/// idempotent.
#[cfg_attr(target_os = "windows", allow(dead_code))]
fn merge_crontab(existing: &str, exe: &Path) -> String {
    let mut out: String = existing
        .lines()
        .filter(|line| !line.ends_with(CRONTAB_TAG))
        .map(|line| format!("{line}\n"))
        .collect();
    out.push_str(&format!(
        "0 12 * * 0 \"{}\" {CRONTAB_TAG}\n",
        exe.display()
    ));
    out
}
