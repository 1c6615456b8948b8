use std::time::Duration;

use serde::Deserialize;

use crate::domain::BatchMode;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub loader: LoaderConfig,
    pub batch: BatchConfig,
    pub identify: IdentifyConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Team loader cache settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Maximum number of cached team snapshots
    pub cache_capacity: u64,
    /// Age after which a cached snapshot is considered stale
    pub cache_ttl_secs: u64,
    /// Maximum number of cached name to ID mappings
    pub name_cache_capacity: u64,
    /// Maximum number of teams whose highest seen key generation is tracked
    pub high_water_capacity: u64,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct BatchConfig {
    pub mode: BatchMode,
}

/// Settings for identify calls made while verifying SBS invites
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentifyConfig {
    pub reason: String,
    pub can_suppress_ui: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 1_000,
            cache_ttl_secs: 3600,
            name_cache_capacity: 10_000,
            high_water_capacity: 100_000,
        }
    }
}

impl LoaderConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for IdentifyConfig {
    fn default() -> Self {
        Self {
            reason: "process team invite".to_string(),
            can_suppress_ui: true,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("TEAMSYNC")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
