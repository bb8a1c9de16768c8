use anyhow::Result;
use std::panic::{self, AssertUnwindSafe};
use tracing::{info, warn};

/// Platform capability that empties the user's trash.
pub trait TrashBackend: Send + Sync {
    fn purge(&self) -> Result<()>;
}

/// Wraps a backend so that nothing it does can fail a run.
pub struct TrashEmptier {
    backend: Box<dyn TrashBackend>,
}

impl TrashEmptier {
    pub fn new(backend: Box<dyn TrashBackend>) -> Self {
        Self { backend }
    }

    pub fn system() -> Self {
        Self::new(Box::new(SystemTrash))
    }

    /// True if the platform call completed without error.
    pub fn empty(&self) -> bool {
        match panic::catch_unwind(AssertUnwindSafe(|| self.backend.purge())) {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!("emptying trash failed: {e:#}");
                false
            }
            Err(_) => {
                warn!("emptying trash panicked");
                false
            }
        }
    }
}

pub struct SystemTrash;

#[cfg(any(
    target_os = "windows",
    all(unix, not(target_os = "macos"), not(target_os = "ios"), not(target_os = "android"))
))]
impl TrashBackend for SystemTrash {
    fn purge(&self) -> Result<()> {
        let items = trash::os_limited::list()?;
        if items.is_empty() {
            return Ok(());
        }
        let count = items.len();
        trash::os_limited::purge_all(items)?;
        info!(count, "trash emptied");
        Ok(())
    }
}

#[cfg(target_os = "macos")]
impl TrashBackend for SystemTrash {
    fn purge(&self) -> Result<()> {
        let output = std::process::Command::new("osascript")
            .args(["-e", "tell application \"Finder\" to empty trash"])
            .output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("osascript failed: {}", stderr.trim());
        }
        info!("trash emptied");
        Ok(())
    }
}

#[cfg(any(target_os = "ios", target_os = "android", not(any(unix, windows))))]
impl TrashBackend for SystemTrash {
    fn purge(&self) -> Result<()> {
        anyhow::bail!("emptying the trash is not supported on this platform")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;
    impl TrashBackend for Failing {
        fn purge(&self) -> Result<()> {
            anyhow::bail!("no recycle bin")
        }
    }

    struct Panicking;
    impl TrashBackend for Panicking {
        fn purge(&self) -> Result<()> {
            panic!("platform call blew up")
        }
    }

    struct Working;
    impl TrashBackend for Working {
        fn purge(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn empty_reports_success() {
        assert!(TrashEmptier::new(Box::new(Working)).empty());
    }

    #[test]
    fn empty_swallows_errors_and_panics() {
        assert!(!TrashEmptier::new(Box::new(Failing)).empty());
        assert!(!TrashEmptier::new(Box::new(Panicking)).empty());
    }
}
