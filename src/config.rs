use chrono::Duration;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::models::{AgeRange, MatchingPolicy};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub appwrite: AppwriteSettings,
    pub collection: CollectionSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    #[serde(default)]
    pub matchmaking: MatchmakingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppwriteSettings {
    pub endpoint: String,
    pub api_key: String,
    pub project_id: String,
    pub database_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionSettings {
    pub attendees: String,
    pub exclusions: String,
    pub events: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub redis_url: String,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchmakingSettings {
    #[serde(default = "default_reshow_cooldown_hours")]
    pub reshow_cooldown_hours: i64,
    #[serde(default = "default_max_decisions_per_pair")]
    pub max_decisions_per_pair: usize,
    #[serde(default = "default_undo_grace_secs")]
    pub undo_grace_secs: i64,
    #[serde(default = "default_min_age")]
    pub default_min_age: u8,
    #[serde(default = "default_max_age")]
    pub default_max_age: u8,
}

impl Default for MatchmakingSettings {
    fn default() -> Self {
        Self {
            reshow_cooldown_hours: default_reshow_cooldown_hours(),
            max_decisions_per_pair: default_max_decisions_per_pair(),
            undo_grace_secs: default_undo_grace_secs(),
            default_min_age: default_min_age(),
            default_max_age: default_max_age(),
        }
    }
}

impl MatchmakingSettings {
    /// Policy the engine runs with
    pub fn policy(&self) -> MatchingPolicy {
        MatchingPolicy {
            reshow_cooldown: Duration::hours(self.reshow_cooldown_hours),
            max_decisions_per_pair: self.max_decisions_per_pair,
            default_age_range: AgeRange::new(self.default_min_age, self.default_max_age),
            undo_grace: Duration::seconds(self.undo_grace_secs),
        }
    }
}

fn default_true() -> bool { true }

fn default_reshow_cooldown_hours() -> i64 { 24 }
fn default_max_decisions_per_pair() -> usize { 3 }
fn default_undo_grace_secs() -> i64 { 5 }
fn default_min_age() -> u8 { 18 }
fn default_max_age() -> u8 { 99 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load `config/default`, then `config/local`, then `MINGLE__*` variables
    ///
    /// `DATABASE_URL` and the `MINGLE_APPWRITE__*` credentials are applied last.
    pub fn load() -> Result<Self, ConfigError> {
        let layered = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(env_source())
            .build()?;

        apply_env_overrides(layered)?.try_deserialize()
    }

    /// Load from an explicit file plus `MINGLE__*` variables
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env_source())
            .build()?
            .try_deserialize()
    }
}

/// `MINGLE__SERVER__PORT` -> `server.port`
fn env_source() -> Environment {
    Environment::with_prefix("MINGLE")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Single-underscore variables the `MINGLE__` source does not pick up
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("MINGLE_APPWRITE__ENDPOINT", "appwrite.endpoint"),
    ("MINGLE_APPWRITE__API_KEY", "appwrite.api_key"),
    ("MINGLE_APPWRITE__PROJECT_ID", "appwrite.project_id"),
    ("MINGLE_APPWRITE__DATABASE_ID", "appwrite.database_id"),
];

fn apply_env_overrides(layered: Config) -> Result<Config, ConfigError> {
    let mut builder = Config::builder().add_source(layered);

    if let Ok(url) = std::env::var("DATABASE_URL").or_else(|_| std::env::var("MINGLE_DATABASE__URL")) {
        builder = builder.set_override("database.url", url)?;
    }

    for (var, key) in ENV_OVERRIDES {
        if let Ok(value) = std::env::var(var) {
            builder = builder.set_override(*key, value)?;
        }
    }

    builder.build()
}
