//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Media storage configuration.
    #[serde(default)]
    pub media: MediaConfig,
    /// Geocoding configuration.
    #[serde(default)]
    pub geocoding: GeocodingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Media storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Root directory for uploaded attachments.
    #[serde(default = "default_media_root")]
    pub root: PathBuf,
    /// Public URL prefix under which attachments are served.
    #[serde(default = "default_media_base_url")]
    pub base_url: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: default_media_root(),
            base_url: default_media_base_url(),
        }
    }
}

/// Reverse geocoding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingConfig {
    /// Reverse geocoding endpoint.
    #[serde(default = "default_geocoding_endpoint")]
    pub endpoint: String,
    /// Identifying User-Agent sent with lookups.
    #[serde(default = "default_geocoding_user_agent")]
    pub user_agent: String,
    /// Request timeout in seconds.
    #[serde(default = "default_geocoding_timeout")]
    pub timeout_secs: u64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            endpoint: default_geocoding_endpoint(),
            user_agent: default_geocoding_user_agent(),
            timeout_secs: default_geocoding_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

fn default_media_root() -> PathBuf {
    PathBuf::from("upload-dir")
}

fn default_media_base_url() -> String {
    "/uploads".to_string()
}

fn default_geocoding_endpoint() -> String {
    "https://nominatim.openstreetmap.org/reverse".to_string()
}

fn default_geocoding_user_agent() -> String {
    "gridwatch/0.1".to_string()
}

const fn default_geocoding_timeout() -> u64 {
    10
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `GRIDWATCH_ENV`)
    /// 3. Environment variables with `GRIDWATCH_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("GRIDWATCH_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("GRIDWATCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("GRIDWATCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
