//! Config module.
//! Manages I/O for sbb_dashboard_config.json (stations, language).
//! Uses serde for JSON serialization; writes go through a temp file and rename.
//! A missing file means first run. A file that does not parse is reported, not replaced.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "sbb_dashboard_config.json";
const APP_DIR_NAME: &str = "sbb-dashboard";

/// Stations used to pre-fill the settings form on first run.
pub const DEFAULT_STATIONS: [&str; 4] = ["Zürich HB", "Bern", "Basel SBB", "Geneva"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Please enter at least one station")]
    NoStations,

    #[error("Unknown language '{0}'. Supported languages: en, de")]
    UnknownLanguage(String),

    #[error("Could not determine the user config directory")]
    NoConfigDir,

    #[error("Config file '{path}' is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error on config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    De,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::De];

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::De => "de",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::En => write!(f, "English"),
            Language::De => write!(f, "Deutsch"),
        }
    }
}

impl FromStr for Language {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "de" => Ok(Language::De),
            other => Err(ConfigError::UnknownLanguage(other.to_string())),
        }
    }
}

/// Stored configs go through [`AppConfig::new`] on load, so a file with no usable station is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredConfig")]
pub struct AppConfig {
    pub stations: Vec<String>,
    pub language: Language,
}

#[derive(Deserialize)]
struct StoredConfig {
    stations: Vec<String>,
    language: Language,
}

impl TryFrom<StoredConfig> for AppConfig {
    type Error = ConfigError;

    fn try_from(stored: StoredConfig) -> Result<Self, Self::Error> {
        AppConfig::new(stored.stations, stored.language)
    }
}

impl AppConfig {
    /// Trims every name, drops blanks, and rejects a list with nothing left.
    pub fn new<I, S>(stations: I, language: Language) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let stations: Vec<String> = stations
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if stations.is_empty() {
            return Err(ConfigError::NoStations);
        }

        Ok(Self { stations, language })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            stations: DEFAULT_STATIONS.iter().map(|s| s.to_string()).collect(),
            language: Language::En,
        }
    }
}

/// File-backed store for the single persisted [`AppConfig`].
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/sbb-dashboard/sbb_dashboard_config.json`
    pub fn default_location() -> Result<Self, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::new(dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when nothing has been saved yet.
    pub fn load(&self) -> Result<Option<AppConfig>, ConfigError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no stored config");
                return Ok(None);
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let config = serde_json::from_str(&content).map_err(|source| ConfigError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(config))
    }

    /// Overwrites the stored config. Does not validate; see [`AppConfig::new`].
    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io_err)?;

        let json = serde_json::to_string_pretty(config)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;

        tracing::info!(
            path = %self.path.display(),
            stations = config.stations.len(),
            language = config.language.code(),
            "config saved"
        );
        Ok(())
    }
}
