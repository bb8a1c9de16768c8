use crate::model::{Candidate, DeleteOutcome};
use std::fs::{self, Metadata, OpenOptions};
use std::path::Path;
use tracing::debug;

/// Re-checks a candidate against the live filesystem and deletes it unless
/// `dry_run` is set. Every failure is folded into the returned outcome.
pub fn process(candidate: &Candidate, dry_run: bool) -> DeleteOutcome {
    let path = candidate.path.as_path();

    // The file may have changed or vanished since it was enumerated, so
    // the fresh size is what gets reported.
    let metadata = match fs::symlink_metadata(path) {
        Ok(m) if m.is_file() => m,
        Ok(_) => {
            debug!(path = %path.display(), "no longer a regular file");
            return DeleteOutcome::missing();
        }
        Err(e) => {
            debug!(path = %path.display(), "candidate vanished: {e}");
            return DeleteOutcome::missing();
        }
    };
    let size = metadata.len();
    let writable = is_writable(path, &metadata);

    if dry_run {
        return DeleteOutcome::kept(size, true);
    }

    if !writable {
        debug!(path = %path.display(), "write permission denied");
        return DeleteOutcome::kept(size, false);
    }

    match fs::remove_file(path) {
        Ok(()) => DeleteOutcome::deleted(size),
        Err(e) => {
            debug!(path = %path.display(), "delete failed: {e}");
            DeleteOutcome::kept(size, false)
        }
    }
}

/// Read-only files are refused outright, even for privileged users; other
/// files must be openable for writing by this process.
fn is_writable(path: &Path, metadata: &Metadata) -> bool {
    if metadata.permissions().readonly() {
        return false;
    }
    OpenOptions::new().write(true).open(path).is_ok()
}
