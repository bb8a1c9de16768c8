use crate::exclude::Exclusions;
use crate::model::Candidate;
use jwalk::WalkDir;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Walks a root lazily, yielding regular files no larger than `max_size`.
pub struct FileScanner {
    max_size: u64,
    exclusions: Exclusions,
}

impl FileScanner {
    pub fn new(max_size: u64, exclusions: Exclusions) -> Self {
        Self {
            max_size,
            exclusions,
        }
    }

    /// Entries that cannot be listed or stat'ed are skipped, so this never
    /// fails; a missing root simply yields nothing.
    pub fn scan(&self, root: &Path) -> impl Iterator<Item = Candidate> + use<> {
        let max_size = self.max_size;
        let exclusions = self.exclusions.clone();

        walker(root, &self.exclusions)
            .into_iter()
            .filter_map(move |entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        debug!("skipping unreadable entry: {e}");
                        return None;
                    }
                };
                if !entry.file_type().is_file() {
                    return None;
                }
                let path = entry.path();
                if exclusions.is_excluded(&path) {
                    return None;
                }
                let size = entry.metadata().ok()?.len();
                (size <= max_size).then_some(Candidate {
                    path,
                    size_bytes: size,
                })
            })
    }

    /// Removes directories below `root` that are empty, deepest first.
    /// `root` itself is kept. Failures (non-empty, permission) are ignored.
    pub fn remove_empty_dirs(&self, root: &Path) -> usize {
        let dirs: Vec<PathBuf> = walker(root, &self.exclusions)
            .into_iter()
            .flatten()
            .filter(|e| e.depth > 0 && e.file_type().is_dir())
            .map(|e| e.path())
            .collect();

        dirs.iter()
            .rev()
            .filter(|dir| fs::remove_dir(dir).is_ok())
            .count()
    }
}

fn walker(root: &Path, exclusions: &Exclusions) -> WalkDir {
    let exclusions = exclusions.clone();
    WalkDir::new(root)
        .skip_hidden(false)
        .follow_links(false)
        .sort(true)
        .parallelism(jwalk::Parallelism::Serial)
        .process_read_dir(move |_depth, _path, _state, children| {
            // Prune excluded subtrees before they are read.
            if !exclusions.is_empty() {
                children.retain(|child| {
                    !child
                        .as_ref()
                        .is_ok_and(|c| exclusions.is_excluded(&c.path()))
                });
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::collections::BTreeSet;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(path: &Path, len: usize) -> Result<()> {
        let mut f = File::create(path)?;
        f.write_all(&vec![0u8; len])?;
        Ok(())
    }

    fn collect(scanner: &FileScanner, root: &Path) -> BTreeSet<(PathBuf, u64)> {
        scanner
            .scan(root)
            .map(|c| (c.path, c.size_bytes))
            .collect()
    }

    #[test]
    fn scan_yields_nested_files() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path();

        let folder_a = root.join("FolderA");
        fs::create_dir(&folder_a)?;
        write_file(&folder_a.join("file1.txt"), 100)?;

        let folder_b = root.join("FolderB/inner");
        fs::create_dir_all(&folder_b)?;
        write_file(&folder_b.join("file2.txt"), 200)?;

        let scanner = FileScanner::new(u64::MAX, Exclusions::default());
        let found = collect(&scanner, root);

        assert_eq!(found.len(), 2);
        assert_eq!(found.iter().map(|(_, s)| s).sum::<u64>(), 300);
        assert!(found.iter().all(|(p, _)| p.is_file()));
        Ok(())
    }

    #[test]
    fn scan_is_idempotent() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path();
        fs::create_dir_all(root.join("a/b"))?;
        write_file(&root.join("top.log"), 10)?;
        write_file(&root.join("a/mid.tmp"), 20)?;
        write_file(&root.join("a/b/leaf.bin"), 30)?;

        let scanner = FileScanner::new(1024, Exclusions::default());
        assert_eq!(collect(&scanner, root), collect(&scanner, root));
        Ok(())
    }

    #[test]
    fn size_ceiling_is_inclusive() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path();
        write_file(&root.join("exact.bin"), 64)?;
        write_file(&root.join("over.bin"), 65)?;

        let scanner = FileScanner::new(64, Exclusions::default());
        let names: Vec<String> = scanner
            .scan(root)
            .map(|c| c.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["exact.bin".to_string()]);
        Ok(())
    }

    #[test]
    fn excluded_subtree_is_never_yielded() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path();
        let keep = root.join("keep");
        fs::create_dir_all(keep.join("x/y/z"))?;
        write_file(&keep.join("shallow.txt"), 1)?;
        write_file(&keep.join("x/y/z/deep.txt"), 1)?;
        write_file(&root.join("gone.txt"), 1)?;

        let scanner = FileScanner::new(u64::MAX, Exclusions::new([&keep]));
        let found = collect(&scanner, root);

        assert_eq!(found.len(), 1);
        assert!(found.iter().all(|(p, _)| !p.starts_with(&keep)));
        Ok(())
    }

    #[test]
    fn scan_non_existent_root() {
        let path = PathBuf::from("/path/to/non/existent/directory/tuxyclean_test_random_12345");
        let scanner = FileScanner::new(u64::MAX, Exclusions::default());
        assert_eq!(scanner.scan(&path).count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn scan_skips_symlinks() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path();
        write_file(&root.join("real.txt"), 5)?;
        std::os::unix::fs::symlink(root.join("real.txt"), root.join("link.txt"))?;
        std::os::unix::fs::symlink(root.join("nowhere"), root.join("dangling"))?;

        let scanner = FileScanner::new(u64::MAX, Exclusions::default());
        let found = collect(&scanner, root);

        assert_eq!(found.len(), 1);
        assert!(found.contains(&(root.join("real.txt"), 5)));
        Ok(())
    }

    #[test]
    fn remove_empty_dirs_keeps_root_and_populated_dirs() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path();
        fs::create_dir_all(root.join("empty/nested/deeper"))?;
        fs::create_dir_all(root.join("full"))?;
        write_file(&root.join("full/keep.txt"), 1)?;

        let scanner = FileScanner::new(u64::MAX, Exclusions::default());
        let removed = scanner.remove_empty_dirs(root);

        assert_eq!(removed, 3);
        assert!(root.exists());
        assert!(!root.join("empty").exists());
        assert!(root.join("full/keep.txt").exists());
        Ok(())
    }
}
