//! Configuration loading and validation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculate::profile::ProfileSettings;
use crate::calculate::{DEFAULT_CONFIDENCE, POLARITY_MIN_GAMES};
use crate::models::{default_periods, AliasTable, PeriodDefinition, SampleThresholds};
use crate::storage::{PeriodDataLoader, StorageConfig};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Thresholds and levels used by the statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Matchups with fewer games are left out of polarity
    #[serde(default = "default_polarity_min_games")]
    pub polarity_min_games: u32,

    /// Games for an "Avg" sample
    #[serde(default = "default_sample_avg_games")]
    pub sample_avg_games: u32,

    /// Games for a "High" sample
    #[serde(default = "default_sample_high_games")]
    pub sample_high_games: u32,

    /// Wilson interval confidence level
    #[serde(default = "default_confidence")]
    pub confidence: f64,

    /// Archetypes below this many games across periods are left out of trends
    #[serde(default = "default_trend_min_games")]
    pub trend_min_games: u32,

    /// Snapshot cache expiry (e.g., "1h", "30m")
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: String,
}

fn default_polarity_min_games() -> u32 {
    POLARITY_MIN_GAMES
}

fn default_sample_avg_games() -> u32 {
    SampleThresholds::default().avg_games
}

fn default_sample_high_games() -> u32 {
    SampleThresholds::default().high_games
}

fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}

fn default_trend_min_games() -> u32 {
    100
}

fn default_cache_ttl() -> String {
    "1h".to_string()
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            polarity_min_games: default_polarity_min_games(),
            sample_avg_games: default_sample_avg_games(),
            sample_high_games: default_sample_high_games(),
            confidence: default_confidence(),
            trend_min_games: default_trend_min_games(),
            cache_ttl: default_cache_ttl(),
        }
    }
}

impl AnalyticsConfig {
    pub fn sample_thresholds(&self) -> SampleThresholds {
        SampleThresholds {
            avg_games: self.sample_avg_games,
            high_games: self.sample_high_games,
        }
    }

    pub fn profile_settings(&self) -> ProfileSettings {
        ProfileSettings {
            polarity_min_games: self.polarity_min_games,
            thresholds: self.sample_thresholds(),
            confidence: self.confidence,
        }
    }

    /// Parsed cache expiry.
    pub fn cache_ttl(&self) -> Result<Duration, ConfigError> {
        crate::parse_duration(&self.cache_ttl).ok_or_else(|| {
            ConfigError::ValidationError(format!("Invalid cache_ttl: {:?}", self.cache_ttl))
        })
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,

    #[serde(default = "default_periods")]
    pub periods: Vec<PeriodDefinition>,

    #[serde(default = "AliasTable::builtin")]
    pub aliases: AliasTable,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            server: ServerConfig::default(),
            analytics: AnalyticsConfig::default(),
            periods: default_periods(),
            aliases: AliasTable::builtin(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        let confidence = self.analytics.confidence;
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "Confidence must be between 0 and 1, got {confidence}"
            )));
        }

        if self.analytics.sample_avg_games > self.analytics.sample_high_games {
            return Err(ConfigError::ValidationError(format!(
                "sample_avg_games ({}) exceeds sample_high_games ({})",
                self.analytics.sample_avg_games, self.analytics.sample_high_games
            )));
        }

        self.analytics.cache_ttl()?;

        let mut keys = HashSet::new();
        let mut labels = HashSet::new();
        for period in &self.periods {
            if !keys.insert(period.key.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "Duplicate period key: {}",
                    period.key
                )));
            }
            // Comparison tables are keyed by label
            if !labels.insert(period.label.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "Duplicate period label: {}",
                    period.label
                )));
            }
        }

        if let Some((alias, target)) = self.aliases.chained().first() {
            return Err(ConfigError::ValidationError(format!(
                "Alias {alias:?} points to {target:?}, which is itself an alias"
            )));
        }

        Ok(())
    }

    pub fn storage(&self) -> StorageConfig {
        StorageConfig::new(self.data_dir.clone())
    }

    /// A loader over the configured periods and aliases.
    pub fn loader(&self) -> PeriodDataLoader {
        PeriodDataLoader::new(self.storage(), self.periods.clone(), self.aliases.clone())
    }
}
