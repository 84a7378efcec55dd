//! Configuration system using TOML files and environment overrides.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\tracklist\config.toml
//! - macOS: ~/Library/Application Support/tracklist/config.toml
//! - Linux: ~/.config/tracklist/config.toml
//!
//! Vendor credentials are normally supplied through the environment and
//! read once at process start; they override whatever the file says:
//!
//! | Variable                  | Field                    |
//! |---------------------------|--------------------------|
//! | `TRACKLIST_CLIENT_ID`     | `catalog.client_id`      |
//! | `TRACKLIST_CLIENT_SECRET` | `catalog.client_secret`  |
//! | `TRACKLIST_TOKEN_URL`     | `catalog.token_url`      |
//! | `TRACKLIST_API_URL`       | `catalog.api_url`        |
//! | `TRACKLIST_DATABASE`      | `directory.database`     |

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote music catalog
    pub catalog: CatalogConfig,

    /// Directory (accounts + documents) storage
    pub directory: DirectoryConfig,

    /// Interactive search behaviour
    pub search: SearchConfig,
}

/// Music catalog credentials and endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Client id for the client-credentials grant
    pub client_id: Option<String>,

    /// Client secret for the client-credentials grant.
    ///
    /// Read from the file but never written back to it.
    #[serde(skip_serializing)]
    pub client_secret: Option<String>,

    /// Token endpoint
    pub token_url: String,

    /// Base URL of the catalog web API
    pub api_url: String,

    /// Results requested per search
    pub page_size: u32,

    /// Upper bound for every outbound call, in seconds
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            token_url: "https://accounts.spotify.com/api/token".to_string(),
            api_url: "https://api.spotify.com/v1".to_string(),
            page_size: 10,
            timeout_secs: 10,
        }
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Directory storage settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// SQLite database file (default: `<data dir>/tracklist/tracklist.db`)
    pub database: Option<PathBuf>,
}

impl DirectoryConfig {
    /// Resolved database path.
    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("tracklist"))
                .unwrap_or_default()
                .join(crate::directory::DEFAULT_DB_NAME)
        })
    }
}

/// Search-as-you-type settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period before a typed query is sent
    pub debounce_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { debounce_ms: 250 }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Config {
    /// Apply environment overrides using the given variable lookup.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(id) = var("TRACKLIST_CLIENT_ID") {
            self.catalog.client_id = Some(id);
        }
        if let Some(secret) = var("TRACKLIST_CLIENT_SECRET") {
            self.catalog.client_secret = Some(secret);
        }
        if let Some(url) = var("TRACKLIST_TOKEN_URL") {
            self.catalog.token_url = url;
        }
        if let Some(url) = var("TRACKLIST_API_URL") {
            self.catalog.api_url = url;
        }
        if let Some(db) = var("TRACKLIST_DATABASE") {
            self.directory.database = Some(PathBuf::from(db));
        }
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tracklist"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from disk, then apply environment overrides.
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let mut config = load_file();
    config.apply_env(|name| std::env::var(name).ok().filter(|v| !v.is_empty()));
    config
}

fn load_file() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };

    if !path.exists() {
        tracing::debug!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to disk
///
/// Creates the config directory if it doesn't exist.
pub fn save(config: &Config) -> Result<PathBuf, ConfigError> {
    let dir = config_dir().ok_or(ConfigError::NoConfigDir)?;
    let path = dir.join("config.toml");

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::CreateDir(dir.clone(), e))?;

    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, &path)
        .map_err(|e| ConfigError::Rename(temp_path, path.clone(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(path)
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

    #[error("Missing catalog credential: {0}")]
    MissingCredential(&'static str),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[catalog]"));
        assert!(toml.contains("[directory]"));
        assert!(toml.contains("[search]"));
    }

    #[test]
    fn test_client_secret_is_never_saved() {
        let mut config = Config::default();
        config.apply_env(|name| match name {
            "TRACKLIST_CLIENT_ID" => Some("id-from-env".to_string()),
            "TRACKLIST_CLIENT_SECRET" => Some("hunter2".to_string()),
            _ => None,
        });

        let toml = toml::to_string_pretty(&config).unwrap();

        assert!(!toml.contains("hunter2"));
        assert!(!toml.contains("client_secret"));
        assert!(toml.contains("id-from-env"));
    }

    #[test]
    fn test_client_secret_still_read_from_file() {
        let config: Config = toml::from_str("[catalog]\nclient_secret = \"from-file\"\n").unwrap();

        assert_eq!(config.catalog.client_secret.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
[catalog]
client_id = "my-id"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.catalog.client_id, Some("my-id".to_string()));
        assert_eq!(config.catalog.page_size, 10);
        assert_eq!(config.catalog.timeout(), Duration::from_secs(10));
        assert_eq!(config.search.debounce(), Duration::from_millis(250));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config: Config = toml::from_str(
            r#"
[catalog]
client_id = "from-file"
api_url = "https://file.example"
"#,
        )
        .unwrap();
        let env: HashMap<&str, &str> = [
            ("TRACKLIST_CLIENT_ID", "from-env"),
            ("TRACKLIST_CLIENT_SECRET", "secret"),
            ("TRACKLIST_DATABASE", "/tmp/t.db"),
        ]
        .into_iter()
        .collect();

        config.apply_env(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.catalog.client_id.as_deref(), Some("from-env"));
        assert_eq!(config.catalog.client_secret.as_deref(), Some("secret"));
        assert_eq!(config.catalog.api_url, "https://file.example");
        assert_eq!(
            config.directory.database_path(),
            PathBuf::from("/tmp/t.db")
        );
    }
}
