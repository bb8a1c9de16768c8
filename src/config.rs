use crate::constants::{APP_DIR, DEFAULT_MAX_SIZE_MB, SETTINGS_FILE};
use crate::model::RunConfig;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Persisted user preferences.
///
/// Keys are read independently: a value of the wrong type resets only its
/// own key, so a typo in `maxSizeMb` never discards the exclusions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(deserialize_with = "lenient_excludes")]
    pub excludes: Vec<PathBuf>,
    #[serde(
        rename = "maxSizeMb",
        alias = "max_size_mb",
        deserialize_with = "lenient_max_size"
    )]
    pub max_size_mb: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            excludes: Vec::new(),
            max_size_mb: DEFAULT_MAX_SIZE_MB,
        }
    }
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|d| d.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// Loads from the default location, falling back to defaults.
    pub fn load() -> Self {
        Self::default_path().map_or_else(Self::default, |p| Self::load_from(&p))
    }

    /// Missing or unparsable files fall back to defaults; unknown keys are
    /// ignored.
    pub fn load_from(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                debug!(path = %path.display(), "no settings file: {e}");
                return Self::default();
            }
        };
        serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!(path = %path.display(), "invalid settings, using defaults: {e}");
            Self::default()
        })
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(1024 * 1024)
    }
}

fn lenient_excludes<'de, D>(deserializer: D) -> Result<Vec<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::String(path) => return Ok(vec![PathBuf::from(path)]),
        other => {
            warn!("ignoring `excludes`, expected a list of paths: {other}");
            return Ok(Vec::new());
        }
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(path) => Some(PathBuf::from(path)),
            other => {
                warn!("ignoring exclusion entry {other}");
                None
            }
        })
        .collect())
}

fn lenient_max_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_u64().unwrap_or_else(|| {
        warn!("invalid `maxSizeMb` {value}, using {DEFAULT_MAX_SIZE_MB}");
        DEFAULT_MAX_SIZE_MB
    }))
}

impl RunConfig {
    pub fn from_settings(settings: &Settings, include_browser_caches: bool, dry_run: bool) -> Self {
        Self {
            include_browser_caches,
            max_file_size_bytes: settings.max_size_bytes(),
            excluded_paths: settings.excludes.iter().cloned().collect(),
            dry_run,
        }
    }
}
