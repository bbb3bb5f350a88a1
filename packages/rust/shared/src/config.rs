//! Application configuration for spacetraveling.
//!
//! User config lives at `~/.spacetraveling/spacetraveling.toml`.
//! CLI flags override config file values, which override defaults.

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, SpacetravelingError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "spacetraveling.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".spacetraveling";

/// Reading speed used when none is configured.
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 200;

// ---------------------------------------------------------------------------
// Config structs (matching spacetraveling.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Content store connection settings.
    #[serde(default)]
    pub repository: RepositorySection,

    /// Reading-time estimation.
    #[serde(default)]
    pub reading: ReadingConfig,

    /// HTTP surface.
    #[serde(default)]
    pub server: ServerConfig,
}

/// `[repository]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySection {
    /// Base URL of the content store API (the API root returning refs).
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// The single document type listed and looked up.
    #[serde(default = "default_document_type")]
    pub document_type: String,

    /// Name of the env var holding the access token (never store the token itself).
    #[serde(default = "default_access_token_env")]
    pub access_token_env: String,

    /// Number of summaries per listing page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RepositorySection {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            document_type: default_document_type(),
            access_token_env: default_access_token_env(),
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "https://spacetraveling.cdn.prismic.io/api/v2".into()
}
fn default_document_type() -> String {
    "posts".into()
}
fn default_access_token_env() -> String {
    "PRISMIC_ACCESS_TOKEN".into()
}
fn default_page_size() -> u32 {
    2
}
fn default_timeout_secs() -> u64 {
    10
}

/// `[reading]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingConfig {
    /// Reading speed in words per minute.
    #[serde(default = "default_words_per_minute")]
    pub words_per_minute: u32,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            words_per_minute: default_words_per_minute(),
        }
    }
}

impl ReadingConfig {
    /// Validated reading speed.
    pub fn words_per_minute(&self) -> Result<NonZeroU32> {
        NonZeroU32::new(self.words_per_minute).ok_or_else(|| {
            SpacetravelingError::config("reading.words_per_minute must be greater than zero")
        })
    }
}

fn default_words_per_minute() -> u32 {
    DEFAULT_WORDS_PER_MINUTE
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the HTTP surface binds to.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Seconds a generated page may be served before it is regenerated.
    #[serde(default = "default_revalidate_secs")]
    pub revalidate_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            revalidate_secs: default_revalidate_secs(),
        }
    }
}

impl ServerConfig {
    /// The revalidation interval as a [`Duration`].
    pub fn revalidate_interval(&self) -> Duration {
        Duration::from_secs(self.revalidate_secs)
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".into()
}
fn default_revalidate_secs() -> u64 {
    60 * 60
}

// ---------------------------------------------------------------------------
// Repository config (runtime, merged from config + environment + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime repository configuration with validated values.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// Parsed API root URL.
    pub endpoint: Url,
    /// Document type queried.
    pub document_type: String,
    /// Access token resolved from the environment, if any.
    pub access_token: Option<String>,
    /// Page size for listing queries.
    pub page_size: NonZeroU32,
    /// HTTP timeout.
    pub timeout: Duration,
}

impl TryFrom<&AppConfig> for RepositoryConfig {
    type Error = SpacetravelingError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        let section = &config.repository;

        let endpoint = Url::parse(&section.endpoint).map_err(|e| {
            SpacetravelingError::config(format!(
                "invalid repository endpoint '{}': {e}",
                section.endpoint
            ))
        })?;

        if section.document_type.trim().is_empty() {
            return Err(SpacetravelingError::config(
                "repository.document_type must not be empty",
            ));
        }

        let page_size = NonZeroU32::new(section.page_size).ok_or_else(|| {
            SpacetravelingError::config("repository.page_size must be greater than zero")
        })?;

        let access_token = std::env::var(&section.access_token_env)
            .ok()
            .filter(|v| !v.is_empty());

        Ok(Self {
            endpoint,
            document_type: section.document_type.clone(),
            access_token,
            page_size,
            timeout: Duration::from_secs(section.timeout_secs),
        })
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.spacetraveling/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SpacetravelingError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.spacetraveling/spacetraveling.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SpacetravelingError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        SpacetravelingError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SpacetravelingError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content = toml::to_string_pretty(&config)
        .map_err(|e| SpacetravelingError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SpacetravelingError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("document_type"));
        assert!(toml_str.contains("PRISMIC_ACCESS_TOKEN"));
        assert!(toml_str.contains("revalidate_secs = 3600"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[repository]
endpoint = "https://blog.example.io/api/v2"
page_size = 5
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.repository.page_size, 5);
        assert_eq!(config.repository.document_type, "posts");
        assert_eq!(config.reading.words_per_minute, 200);
        assert_eq!(config.server.revalidate_interval(), Duration::from_secs(3600));
    }

    #[test]
    fn repository_config_from_app_config() {
        let app = AppConfig::default();
        let repo = RepositoryConfig::try_from(&app).expect("valid defaults");
        assert_eq!(repo.document_type, "posts");
        assert_eq!(repo.page_size.get(), 2);
        assert_eq!(repo.timeout, Duration::from_secs(10));
    }

    #[test]
    fn zero_page_size_rejected() {
        let mut app = AppConfig::default();
        app.repository.page_size = 0;
        let err = RepositoryConfig::try_from(&app).unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn bad_endpoint_rejected() {
        let mut app = AppConfig::default();
        app.repository.endpoint = "not a url".into();
        assert!(RepositoryConfig::try_from(&app).is_err());
    }

    #[test]
    fn access_token_read_from_named_env_var() {
        let mut app = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        app.repository.access_token_env = "ST_TEST_NONEXISTENT_TOKEN_12345".into();
        let repo = RepositoryConfig::try_from(&app).expect("valid");
        assert!(repo.access_token.is_none());
    }

    #[test]
    fn zero_reading_speed_rejected() {
        let reading = ReadingConfig { words_per_minute: 0 };
        assert!(reading.words_per_minute().is_err());
        assert_eq!(ReadingConfig::default().words_per_minute().unwrap().get(), 200);
    }
}
