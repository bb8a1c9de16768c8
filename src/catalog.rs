use crate::constants::{
    BRAVE_CACHE, CHROME_CACHE, EDGE_CACHE, FIREFOX_PROFILE_CACHE, FIREFOX_PROFILES,
};
use crate::exclude::Exclusions;
use crate::model::Pass;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Where browser caches live on this machine.
#[derive(Debug, Clone)]
pub struct BrowserLocations {
    /// Cache directories scanned as-is.
    pub fixed: Vec<PathBuf>,
    /// Parent whose immediate subdirectories are browser profiles.
    pub profiles_parent: Option<PathBuf>,
    /// Appended to every discovered profile directory.
    pub profile_cache: PathBuf,
}

impl BrowserLocations {
    pub fn system() -> Result<Self> {
        let cache = dirs::cache_dir().context("Cache directory not found")?;

        // Firefox keeps its profiles under the roaming data dir on Windows.
        #[cfg(target_os = "windows")]
        let profiles_base = dirs::data_dir().context("Roaming data directory not found")?;
        #[cfg(not(target_os = "windows"))]
        let profiles_base = cache.clone();

        Ok(Self {
            fixed: vec![
                cache.join(CHROME_CACHE),
                cache.join(EDGE_CACHE),
                cache.join(BRAVE_CACHE),
            ],
            profiles_parent: Some(profiles_base.join(FIREFOX_PROFILES)),
            profile_cache: PathBuf::from(FIREFOX_PROFILE_CACHE),
        })
    }
}

/// Resolves the root directories of each pass.
#[derive(Debug, Clone)]
pub struct PathCatalog {
    temp_dir: PathBuf,
    browsers: BrowserLocations,
}

impl PathCatalog {
    pub fn new(temp_dir: PathBuf, browsers: BrowserLocations) -> Self {
        Self { temp_dir, browsers }
    }

    pub fn system() -> Result<Self> {
        Ok(Self::new(std::env::temp_dir(), BrowserLocations::system()?))
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Ordered roots for `pass`, minus anything excluded. Roots that do not
    /// exist are kept; the scanner copes with them.
    pub fn roots_for_pass(&self, pass: Pass, exclusions: &Exclusions) -> Vec<PathBuf> {
        let mut roots = match pass {
            Pass::Temp => vec![self.temp_dir.clone()],
            Pass::Browsers => {
                let mut roots = self.browsers.fixed.clone();
                if let Some(parent) = &self.browsers.profiles_parent {
                    roots.extend(
                        profile_dirs(parent)
                            .into_iter()
                            .map(|p| p.join(&self.browsers.profile_cache)),
                    );
                }
                roots
            }
        };
        roots.retain(|root| !exclusions.is_excluded(root));
        roots
    }
}

/// Number of roots that exist, used as the progress denominator. Never zero.
pub fn existing_root_count(roots: &[PathBuf]) -> usize {
    roots.iter().filter(|r| r.is_dir()).count().max(1)
}

/// Lists profile directories one level below `parent`, sorted.
fn profile_dirs(parent: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(parent) else {
        return vec![];
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
        .map(|e| e.path())
        .collect();
    dirs.sort();
    dirs
}
