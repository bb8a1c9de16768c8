use std::ffi::{OsStr, OsString};
use std::path::{Component, Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct Exclusions {
    rules: Vec<PathBuf>,
}

impl Exclusions {
    /// Builds the rule set from user-supplied paths.
    /// Relative paths are dropped since they cannot be matched reliably.
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut rules = Vec::new();
        for path in paths {
            let path = path.as_ref();
            if path.is_absolute() {
                rules.push(normalize(path));
            } else {
                warn!(path = %path.display(), "ignoring relative exclusion");
            }
        }
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// True if `path` is equal to or nested under any rule.
    /// Matching is component-wise, so `/tmp/a` does not exclude `/tmp/ab`.
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.rules.is_empty() {
            return false;
        }
        let path = normalize(path);
        self.rules.iter().any(|rule| path.starts_with(rule))
    }
}

/// Lexical normalization: drops `.` and folds `..` without touching the
/// filesystem. On Windows components are also lowercased, since its paths
/// compare case-insensitively.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(fold_case(other.as_os_str())),
        }
    }
    out
}

#[cfg(windows)]
fn fold_case(part: &OsStr) -> OsString {
    OsString::from(part.to_string_lossy().to_lowercase())
}

#[cfg(not(windows))]
fn fold_case(part: &OsStr) -> OsString {
    part.to_os_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_excluded() {
        let exclusions = Exclusions::new(["/home/test/Secret", "/tmp/keep"]);

        assert!(exclusions.is_excluded(Path::new("/home/test/Secret")));
        assert!(exclusions.is_excluded(Path::new("/home/test/Secret/file.txt")));
        assert!(exclusions.is_excluded(Path::new("/tmp/keep/a/b/c/deep.bin")));

        assert!(!exclusions.is_excluded(Path::new("/home/test/SecretSauce")));
        assert!(!exclusions.is_excluded(Path::new("/tmp/keeper/file")));
        assert!(!exclusions.is_excluded(Path::new("/home/test")));
    }

    #[test]
    fn normalizes_before_matching() {
        let exclusions = Exclusions::new(["/tmp/./keep/sub/.."]);

        assert!(exclusions.is_excluded(Path::new("/tmp/keep/file")));
        assert!(exclusions.is_excluded(Path::new("/tmp/other/../keep/file")));
        assert!(!exclusions.is_excluded(Path::new("/tmp/keep/../file")));
    }

    #[cfg(windows)]
    #[test]
    fn windows_matching_ignores_case() {
        let exclusions = Exclusions::new([r"c:\users\me\appdata\local\temp\keep"]);

        assert!(exclusions.is_excluded(Path::new(
            r"C:\Users\Me\AppData\Local\Temp\Keep\x"
        )));
        assert!(!exclusions.is_excluded(Path::new(
            r"C:\Users\Me\AppData\Local\Temp\Keeper\x"
        )));
    }

    #[cfg(not(windows))]
    #[test]
    fn unix_matching_is_case_sensitive() {
        let exclusions = Exclusions::new(["/tmp/Keep"]);

        assert!(exclusions.is_excluded(Path::new("/tmp/Keep/x")));
        assert!(!exclusions.is_excluded(Path::new("/tmp/keep/x")));
    }

    #[test]
    fn relative_rules_are_dropped() {
        let exclusions = Exclusions::new(["relative/dir"]);
        assert!(exclusions.is_empty());
        assert!(!exclusions.is_excluded(Path::new("relative/dir/file")));
    }
}
