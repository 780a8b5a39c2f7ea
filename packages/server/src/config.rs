//! Server configuration.
//!
//! Settings come from an optional TOML file, then environment overrides.
//! Every field has a default, so an empty or missing file is valid.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use crash_map_analytics_models::DEFAULT_RANKING_LIMIT;
use crash_map_dataset::paths::default_csv_path;
use crash_map_heatmap::HeatmapOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Env var naming the config file when `--config` is not given.
pub const CONFIG_PATH_ENV: &str = "CRASH_MAP_CONFIG";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        /// Path that was tried.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`CrashMapConfig`].
    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    /// An environment override could not be parsed.
    #[error("Invalid value for {name}: '{value}'")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Rejected value.
        value: String,
    },

    /// The default ranking period ends before it starts.
    #[error("ranking.default_start ({start}) is after ranking.default_end ({end})")]
    InvalidPeriod {
        /// Configured start.
        start: NaiveDate,
        /// Configured end.
        end: NaiveDate,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrashMapConfig {
    /// HTTP listener.
    pub server: ServerConfig,
    /// Dataset location.
    pub data: DataConfig,
    /// Ranking defaults.
    pub ranking: RankingConfig,
    /// Heatmap point selection.
    pub heatmap: HeatmapOptions,
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub bind_addr: String,
    /// Port to bind.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// `[data]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Crash CSV, relative to the working directory unless absolute.
    pub csv_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
        }
    }
}

/// `[ranking]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Start of the period used for crashes-per-month when a request has
    /// no closed date range.
    pub default_start: NaiveDate,
    /// End of that period.
    pub default_end: NaiveDate,
    /// Rows returned when the request gives no limit.
    pub default_limit: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            default_start: NaiveDate::from_ymd_opt(2017, 10, 24).unwrap_or_default(),
            default_end: NaiveDate::from_ymd_opt(2025, 10, 24).unwrap_or_default(),
            default_limit: DEFAULT_RANKING_LIMIT,
        }
    }
}

impl RankingConfig {
    /// The default period as a `(start, end)` pair.
    #[must_use]
    pub const fn default_period(&self) -> (NaiveDate, NaiveDate) {
        (self.default_start, self.default_end)
    }
}

impl CrashMapConfig {
    /// Loads configuration from `path` (if any) and applies environment
    /// overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or an
    /// override is malformed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                log::info!("Reading config from {}", path.display());
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml(&text)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the text does not match the schema.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::de::from_str(text)?)
    }

    /// Applies `BIND_ADDR`, `PORT` and `CRASH_DATA_PATH` overrides looked up
    /// through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if `PORT` is not a port number.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(addr) = lookup("BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv {
                    name: "PORT",
                    value: port.clone(),
                })?;
        }
        if let Some(path) = lookup("CRASH_DATA_PATH") {
            self.data.csv_path = PathBuf::from(path);
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.ranking.default_start > self.ranking.default_end {
            return Err(ConfigError::InvalidPeriod {
                start: self.ranking.default_start,
                end: self.ranking.default_end,
            });
        }
        Ok(())
    }
}

/// Picks the config file: the explicit path if given, else
/// `CRASH_MAP_CONFIG`, else none.
#[must_use]
pub fn resolve_config_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = CrashMapConfig::from_toml("").unwrap();
        assert_eq!(config, CrashMapConfig::default());
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.heatmap.max_points, 10_000);
        assert_eq!(config.heatmap.sample_seed, 42);
        assert_eq!(config.ranking.default_limit, 10);
        assert_eq!(
            config.ranking.default_period(),
            (
                NaiveDate::from_ymd_opt(2017, 10, 24).unwrap(),
                NaiveDate::from_ymd_opt(2025, 10, 24).unwrap()
            )
        );
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = CrashMapConfig::from_toml(
            r#"
[server]
port = 9000

[ranking]
default_start = "2020-01-01"

[heatmap]
max_points = 500
"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_addr, "127.0.0.1");
        assert_eq!(
            config.ranking.default_start,
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
        );
        assert_eq!(config.heatmap.max_points, 500);
        assert_eq!(config.heatmap.sample_seed, 42);
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(matches!(
            CrashMapConfig::from_toml("[server]\nport = \"eighty\"\n"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = CrashMapConfig::default();
        config
            .apply_overrides(env(&[
                ("BIND_ADDR", "0.0.0.0"),
                ("PORT", "8080"),
                ("CRASH_DATA_PATH", "/data/crashes.csv"),
            ]))
            .unwrap();
        assert_eq!(config.server.bind_addr, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.data.csv_path, PathBuf::from("/data/crashes.csv"));
    }

    #[test]
    fn bad_port_is_an_error() {
        let mut config = CrashMapConfig::default();
        let err = config.apply_overrides(env(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name: "PORT", .. }));
    }

    #[test]
    fn reversed_period_is_rejected() {
        let config = CrashMapConfig::from_toml(
            "[ranking]\ndefault_start = \"2025-01-01\"\ndefault_end = \"2024-01-01\"\n",
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPeriod { .. })
        ));
    }
}
