//! Configuration layer: typed settings with layered precedence (file → env →
//! CLI).

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::application::search::MirrorPolicy;

const ENV_PREFIX: &str = "VETRINA";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_PRODUCT_TTL_SECS: u64 = 60 * 60;
const DEFAULT_LISTING_TTL_SECS: u64 = 60 * 60;
const DEFAULT_SEARCH_TTL_SECS: u64 = 120;
const DEFAULT_VISIT_LOCK_SECS: u64 = 1;
const DEFAULT_FAVORITE_RATE_LIMIT_SECS: u64 = 3;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Command-line arguments for the vetrina binary.
#[derive(Debug, Parser)]
#[command(name = "vetrina", version, about = "Vetrina catalog server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "VETRINA_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Override the primary database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the read replica connection URL.
    #[arg(long = "replica-url", value_name = "URL")]
    pub replica_url: Option<String>,

    /// Override the Redis URL; when unset entirely, an in-process cache is
    /// used.
    #[arg(long = "redis-url", value_name = "URL")]
    pub redis_url: Option<String>,

    /// Override the Meilisearch URL.
    #[arg(long = "search-url", value_name = "URL")]
    pub search_url: Option<String>,

    /// Override the object store base URL.
    #[arg(long = "object-store-url", value_name = "URL")]
    pub object_store_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub search: SearchSettings,
    pub object_store: ObjectStoreSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            logging: LoggingSettings::default(),
            database: DatabaseSettings::default(),
            cache: CacheSettings::default(),
            search: SearchSettings::default(),
            object_store: ObjectStoreSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            graceful_shutdown_secs: DEFAULT_GRACEFUL_SHUTDOWN_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl LoggingSettings {
    pub fn level_filter(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::INFO)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub primary_url: String,
    /// Read replica; falls back to the primary when unset.
    pub replica_url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            primary_url: "postgres://localhost/vetrina".to_string(),
            replica_url: None,
            max_connections: DEFAULT_DB_MAX_CONNECTIONS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// When unset, the in-process cache backend is used.
    pub redis_url: Option<String>,
    pub product_ttl_secs: u64,
    pub listing_ttl_secs: u64,
    pub search_ttl_secs: u64,
    pub visit_lock_secs: u64,
    pub favorite_rate_limit_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            redis_url: None,
            product_ttl_secs: DEFAULT_PRODUCT_TTL_SECS,
            listing_ttl_secs: DEFAULT_LISTING_TTL_SECS,
            search_ttl_secs: DEFAULT_SEARCH_TTL_SECS,
            visit_lock_secs: DEFAULT_VISIT_LOCK_SECS,
            favorite_rate_limit_secs: DEFAULT_FAVORITE_RATE_LIMIT_SECS,
        }
    }
}

impl CacheSettings {
    pub fn product_ttl(&self) -> Duration {
        Duration::from_secs(self.product_ttl_secs)
    }

    pub fn listing_ttl(&self) -> Duration {
        Duration::from_secs(self.listing_ttl_secs)
    }

    pub fn search_ttl(&self) -> Duration {
        Duration::from_secs(self.search_ttl_secs)
    }

    pub fn visit_lock_ttl(&self) -> Duration {
        Duration::from_secs(self.visit_lock_secs)
    }

    pub fn favorite_rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.favorite_rate_limit_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub url: String,
    pub api_key: Option<String>,
    pub mirror_policy: MirrorPolicy,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:7700".to_string(),
            api_key: None,
            mirror_policy: MirrorPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObjectStoreSettings {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for ObjectStoreSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000/".to_string(),
            api_key: None,
        }
    }
}

impl Settings {
    pub fn load(args: &CliArgs) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();
        if let Some(path) = &args.config_file {
            builder = builder.add_source(File::from(path.as_path()));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let mut settings: Settings = builder.build()?.try_deserialize()?;
        settings.apply_overrides(&args.overrides);
        Ok(settings)
    }

    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(host) = &overrides.server_host {
            self.server.host = host.clone();
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(level) = &overrides.log_level {
            self.logging.level = level.clone();
        }
        if let Some(url) = &overrides.database_url {
            self.database.primary_url = url.clone();
        }
        if let Some(url) = &overrides.replica_url {
            self.database.replica_url = Some(url.clone());
        }
        if let Some(url) = &overrides.redis_url {
            self.cache.redis_url = Some(url.clone());
        }
        if let Some(url) = &overrides.search_url {
            self.search.url = url.clone();
        }
        if let Some(url) = &overrides.object_store_url {
            self.object_store.base_url = url.clone();
        }
    }
}
