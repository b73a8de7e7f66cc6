use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use validator::Validate;

use crate::error::MatchingError;
use crate::models::ScoringWeights;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub tables: TableSettings,
    #[validate(nested)]
    pub matching: MatchingSettings,
    #[serde(default)]
    #[validate(nested)]
    pub scoring: ScoringSettings,
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
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
    #[serde(default)]
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableSettings {
    pub hosts: String,
    pub guests: String,
    pub matches: String,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            hosts: "hosts".to_string(),
            guests: "guests".to_string(),
            matches: "matches".to_string(),
        }
    }
}

/// Limits and windows read by every matching invocation
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MatchingSettings {
    #[validate(range(min = 1))]
    pub hosts_batch_size: usize,
    #[validate(range(min = 1))]
    pub guests_batch_size: usize,
    #[validate(range(min = 1))]
    pub match_timeout_hours: u32,
    #[serde(default = "default_activity_boost")]
    pub activity_boost: bool,
}

fn default_activity_boost() -> bool { true }

impl MatchingSettings {
    /// Validate before a run touches the store
    pub fn check(&self) -> Result<(), MatchingError> {
        self.validate()
            .map_err(|e| MatchingError::Config(format!("invalid matching settings: {e}")))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ScoringSettings {
    #[serde(default)]
    #[validate(nested)]
    pub weights: WeightsConfig,
}

/// Score weights; a positive baseline keeps every eligible score above 0.0
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WeightsConfig {
    #[serde(default = "default_baseline_weight")]
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub baseline: f64,
    #[serde(default = "default_transport_weight")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub transport: f64,
    #[serde(default = "default_boost_weight")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub host_activity: f64,
    #[serde(default = "default_boost_weight")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub guest_activity: f64,
    #[serde(default = "default_boost_weight")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub host_recency: f64,
    #[serde(default = "default_boost_weight")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub guest_recency: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            baseline: default_baseline_weight(),
            transport: default_transport_weight(),
            host_activity: default_boost_weight(),
            guest_activity: default_boost_weight(),
            host_recency: default_boost_weight(),
            guest_recency: default_boost_weight(),
        }
    }
}

impl From<&WeightsConfig> for ScoringWeights {
    fn from(config: &WeightsConfig) -> Self {
        Self {
            baseline: config.baseline,
            transport: config.transport,
            host_activity: config.host_activity,
            guest_activity: config.guest_activity,
            host_recency: config.host_recency,
            guest_recency: config.guest_recency,
        }
    }
}

fn default_baseline_weight() -> f64 { 0.79 }
fn default_transport_weight() -> f64 { 0.01 }
fn default_boost_weight() -> f64 { 0.05 }

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

/// Plain environment variables the deployment sets, mapped to config keys
const LEGACY_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("DATABASE_URL", "database.url"),
    ("HOSTS_MATCHING_BATCH_SIZE", "matching.hosts_batch_size"),
    ("GUESTS_MATCHING_BATCH_SIZE", "matching.guests_batch_size"),
    ("MATCH_TIMEOUT_HOURS", "matching.match_timeout_hours"),
    ("HOSTS_TABLE_NAME", "tables.hosts"),
    ("GUESTS_TABLE_NAME", "tables.guests"),
    ("MATCHES_TABLE_NAME", "tables.matches"),
];

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Configuration file (config/default.toml)
    /// 2. Local overrides (config/local.toml)
    /// 3. Environment variables prefixed with MATCHER, e.g. MATCHER__SERVER__PORT
    /// 4. The plain variables in `LEGACY_ENV_OVERRIDES`, e.g. MATCH_TIMEOUT_HOURS
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("MATCHER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_legacy_env(settings, |name| std::env::var(name).ok())?;

        Self::finish(settings)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("MATCHER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::finish(settings)
    }

    fn finish(config: Config) -> Result<Self, ConfigError> {
        let settings: Settings = config.try_deserialize()?;
        settings
            .validate()
            .map_err(|e| ConfigError::Message(format!("invalid configuration: {e}")))?;
        Ok(settings)
    }
}

fn apply_legacy_env<F>(settings: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = Config::builder().add_source(settings);

    for (var, key) in LEGACY_ENV_OVERRIDES {
        if let Some(value) = lookup(var) {
            builder = builder.set_override(*key, value)?;
        }
    }

    builder.build()
}
