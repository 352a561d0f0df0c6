//! Configuration management with file persistence

use crate::matrix::GeneratorKind;
use crate::storage::database::{DEFAULT_MAX_CONNECTIONS, default_database_path};
use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Environment variable overriding `database.path`
pub const DATABASE_ENV: &str = "GENESIM_DATABASE";

/// Genesim configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseSettings,
    pub loader: LoaderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Database file; the platform data directory when unset
    pub path: Option<PathBuf>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Metric name stored on every similarity, and the scores table to read
    pub metric: String,
    /// Rows per insert statement for bulk writes
    pub batch_size: usize,
    /// Log a progress line every this many genes
    pub progress_interval: usize,
    pub generator: GeneratorKind,
    pub seed: Option<u64>,
    /// In-memory size of the spooled similarity file before it moves to disk
    pub spool_threshold_bytes: usize,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            metric: "cosine".to_string(),
            batch_size: 500,
            progress_interval: 100,
            generator: GeneratorKind::Symmetric,
            seed: None,
            spool_threshold_bytes: 64 * 1024 * 1024,
        }
    }
}

impl DatabaseSettings {
    /// Database path after applying `GENESIM_DATABASE`
    pub fn resolved_path(&self) -> PathBuf {
        env::var(DATABASE_ENV)
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .or_else(|| self.path.clone())
            .unwrap_or_else(default_database_path)
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("GENESIM_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("genesim")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.max_connections == 0 {
            return Err(anyhow!("database.max_connections must be at least 1"));
        }
        if self.loader.metric.is_empty() || self.loader.metric.chars().count() > 50 {
            return Err(anyhow!("loader.metric must be 1 to 50 characters"));
        }
        if self.loader.batch_size == 0 {
            return Err(anyhow!("loader.batch_size must be at least 1"));
        }
        if self.loader.progress_interval == 0 {
            return Err(anyhow!("loader.progress_interval must be at least 1"));
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "database.path" => Ok(self.database.resolved_path().display().to_string()),
            "database.max_connections" => Ok(self.database.max_connections.to_string()),

            "loader.metric" => Ok(self.loader.metric.clone()),
            "loader.batch_size" => Ok(self.loader.batch_size.to_string()),
            "loader.progress_interval" => Ok(self.loader.progress_interval.to_string()),
            "loader.generator" => Ok(self.loader.generator.as_str().to_string()),
            "loader.seed" => Ok(self
                .loader
                .seed
                .map(|s| s.to_string())
                .unwrap_or_else(|| "(random)".to_string())),
            "loader.spool_threshold_bytes" => Ok(self.loader.spool_threshold_bytes.to_string()),

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `genesim config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut next = self.clone();
        match key {
            "database.path" => {
                next.database.path = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            "database.max_connections" => {
                next.database.max_connections = value
                    .parse()
                    .with_context(|| format!("Invalid max_connections value: {}", value))?;
            }

            "loader.metric" => {
                next.loader.metric = value.to_string();
            }
            "loader.batch_size" => {
                next.loader.batch_size = value
                    .parse()
                    .with_context(|| format!("Invalid batch_size value: {}", value))?;
            }
            "loader.progress_interval" => {
                next.loader.progress_interval = value
                    .parse()
                    .with_context(|| format!("Invalid progress_interval value: {}", value))?;
            }
            "loader.generator" => {
                next.loader.generator = GeneratorKind::parse(value).ok_or_else(|| {
                    anyhow!("Invalid generator: {}. Valid options: symmetric, normal", value)
                })?;
            }
            "loader.seed" => {
                next.loader.seed = if value.is_empty() || value == "random" {
                    None
                } else {
                    Some(
                        value
                            .parse()
                            .with_context(|| format!("Invalid seed value: {}", value))?,
                    )
                };
            }
            "loader.spool_threshold_bytes" => {
                next.loader.spool_threshold_bytes = value
                    .parse()
                    .with_context(|| format!("Invalid spool_threshold_bytes value: {}", value))?;
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `genesim config list` to see available keys.",
                    key
                ));
            }
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = [
            "database.path",
            "database.max_connections",
            "loader.metric",
            "loader.batch_size",
            "loader.progress_interval",
            "loader.generator",
            "loader.seed",
            "loader.spool_threshold_bytes",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.loader.metric, "cosine");
        assert_eq!(config.loader.generator, GeneratorKind::Symmetric);
        assert!(config.loader.seed.is_none());
    }

    #[test]
    fn test_set_and_get() {
        let mut config = Config::default();

        config.set("loader.batch_size", "250").unwrap();
        config.set("loader.generator", "normal").unwrap();
        config.set("loader.seed", "17").unwrap();

        assert_eq!(config.get("loader.batch_size").unwrap(), "250");
        assert_eq!(config.get("loader.generator").unwrap(), "normal");
        assert_eq!(config.loader.seed, Some(17));

        config.set("loader.seed", "random").unwrap();
        assert_eq!(config.get("loader.seed").unwrap(), "(random)");
    }

    #[test]
    fn test_set_rejects_invalid_values() {
        let mut config = Config::default();
        assert!(config.set("loader.batch_size", "0").is_err());
        assert!(config.set("loader.batch_size", "many").is_err());
        assert!(config.set("loader.generator", "uniform").is_err());
        assert!(config.set("no.such.key", "1").is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[loader]\nmetric = \"pearson\"\n").unwrap();
        assert_eq!(config.loader.metric, "pearson");
        assert_eq!(config.loader.batch_size, 500);
        assert_eq!(config.database.max_connections, DEFAULT_MAX_CONNECTIONS);
    }

    #[test]
    fn test_toml_round_trip_with_seed() {
        let mut config = Config::default();
        config.loader.seed = Some(3);
        config.database.path = Some(PathBuf::from("/tmp/genes.db"));

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.loader.seed, Some(3));
        assert_eq!(parsed.database.path, Some(PathBuf::from("/tmp/genes.db")));
    }

    #[test]
    fn test_list_covers_every_key() {
        let items = Config::default().list().unwrap();
        assert_eq!(items.len(), 8);
        assert!(items.iter().any(|(k, _)| k == "loader.spool_threshold_bytes"));
    }
}
