//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\musik\config.toml
//! - macOS: ~/Library/Application Support/musik/config.toml
//! - Linux: ~/.config/musik/config.toml
//!
//! Every section is optional; command-line flags and environment
//! variables override what the file says.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::model::LibraryScope;
use crate::spotify::{DEFAULT_BASE_URL, DEFAULT_UNFINISHED_PREFIXES};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where collections come from and where the library lives
    pub library: LibraryConfig,

    /// Streaming-service access
    pub spotify: SpotifyConfig,

    /// Ingestion behaviour
    pub ingest: IngestConfig,
}

impl Config {
    /// Reject settings no command can run with.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.library.library_id <= 0 {
            return Err(Error::config(format!(
                "library.library_id must be positive, got {}",
                self.library.library_id
            )));
        }
        if !(1..=50).contains(&self.spotify.page_limit) {
            return Err(Error::config(format!(
                "spotify.page_limit must be between 1 and 50, got {}",
                self.spotify.page_limit
            )));
        }
        if self.spotify.base_url.trim().is_empty() {
            return Err(Error::config("spotify.base_url is empty"));
        }
        Ok(())
    }
}

/// Library locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// SQLite database file (default: `musik.db` in the working directory)
    pub database: Option<PathBuf>,

    /// Directory of `collection_<key>.json` files
    pub manual_dir: PathBuf,

    /// Directory of remote collection snapshots
    pub snapshot_dir: PathBuf,

    /// Library the statistics are computed for
    pub library_id: i64,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            database: None,
            manual_dir: PathBuf::from("collections"),
            snapshot_dir: PathBuf::from("snapshots"),
            library_id: LibraryScope::DEFAULT.0,
        }
    }
}

impl LibraryConfig {
    pub fn scope(&self) -> LibraryScope {
        LibraryScope(self.library_id)
    }
}

/// Streaming-service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyConfig {
    /// Bearer token (prefer the SPOTIFY_ACCESS_TOKEN env var)
    pub access_token: Option<String>,

    /// Web API root
    pub base_url: String,

    /// Items requested per page (1-50)
    pub page_limit: u32,

    /// Playlist name prefixes marking work in progress
    pub unfinished_prefixes: Vec<String>,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            page_limit: 50,
            unfinished_prefixes: DEFAULT_UNFINISHED_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Skip malformed collections instead of stopping the run
    pub keep_going: bool,
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("musik"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the standard location.
///
/// Returns default config if the file doesn't exist or can't be parsed.
pub fn load() -> Config {
    match config_path() {
        Some(path) => load_from(&path),
        None => {
            tracing::warn!("Could not determine config directory, using defaults");
            Config::default()
        }
    }
}

/// Load configuration from `path`, falling back to defaults.
pub fn load_from(path: &Path) -> Config {
    if !path.exists() {
        tracing::debug!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::warn!("Failed to parse config file {:?}: {}; using defaults", path, e);
                Config::default()
            }
        },
        Err(e) => {
            tracing::warn!("Failed to read config file {:?}: {}; using defaults", path, e);
            Config::default()
        }
    }
}

/// Save configuration to the standard location.
///
/// Creates the config directory if it doesn't exist.
pub fn save(config: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    save_to(config, &path)?;
    Ok(path)
}

/// Save configuration to `path` atomically.
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write to temp, then rename
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[library]"));
        assert!(toml.contains("[spotify]"));
        assert!(toml.contains("[ingest]"));
        assert!(toml.contains("ZZZ"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
[spotify]
page_limit = 20

[ingest]
keep_going = true
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.spotify.page_limit, 20);
        assert!(config.ingest.keep_going);

        assert_eq!(config.spotify.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.spotify.unfinished_prefixes.len(), 4);
        assert_eq!(config.library.scope(), LibraryScope::DEFAULT);
        assert!(config.library.database.is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.library.database = Some(PathBuf::from("/data/library.db"));
        config.library.library_id = 3;
        config.spotify.unfinished_prefixes = vec!["WIP".to_string()];

        save_to(&config, &path).unwrap();
        assert!(!path.with_extension("toml.tmp").exists());
        assert_eq!(load_from(&path), config);
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());

        let mut config = Config::default();
        config.spotify.page_limit = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.library.library_id = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("library_id"));
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "library = [not valid").unwrap();

        assert_eq!(load_from(&path), Config::default());
        assert_eq!(load_from(&dir.path().join("missing.toml")), Config::default());
    }
}
