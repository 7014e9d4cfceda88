use crate::applog::DEFAULT_CAPACITY;
use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.json";
const DATA_DIRNAME: &str = "data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Configuration for supermall, stored in `<home>/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MallConfig {
    /// Seed the demo catalog the first time the store is opened
    #[serde(default = "default_seed_demo_data")]
    pub seed_demo_data: bool,

    /// Default tracing filter when RUST_LOG is not set (e.g. "info", "supermall=debug")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,

    /// Maximum number of entries kept in the persisted application log
    #[serde(default = "default_app_log_capacity")]
    pub app_log_capacity: usize,
}

fn default_seed_demo_data() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Text
}

fn default_app_log_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for MallConfig {
    fn default() -> Self {
        Self {
            seed_demo_data: default_seed_demo_data(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            app_log_capacity: default_app_log_capacity(),
        }
    }
}

impl MallConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(StoreError::Io)?;
        let config: MallConfig =
            serde_json::from_str(&content).map_err(StoreError::Serialization)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(StoreError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(StoreError::Serialization)?;
        fs::write(config_path, content).map_err(StoreError::Io)?;
        Ok(())
    }

    /// Where the record files live, relative to the config directory.
    pub fn data_dir<P: AsRef<Path>>(config_dir: P) -> PathBuf {
        config_dir.as_ref().join(DATA_DIRNAME)
    }

    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            "seed-demo-data" => self.seed_demo_data.to_string(),
            "log-level" => self.log_level.clone(),
            "log-format" => match self.log_format {
                LogFormat::Text => "text".to_string(),
                LogFormat::Json => "json".to_string(),
            },
            "app-log-capacity" => self.app_log_capacity.to_string(),
            other => return Err(unknown_key(other)),
        };
        Ok(value)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "seed-demo-data" => self.seed_demo_data = parse_value(key, value)?,
            "log-level" => self.log_level = value.to_string(),
            "log-format" => {
                self.log_format = match value {
                    "text" => LogFormat::Text,
                    "json" => LogFormat::Json,
                    _ => return Err(invalid_value(key, value)),
                }
            }
            "app-log-capacity" => {
                let capacity: usize = parse_value(key, value)?;
                if capacity == 0 {
                    return Err(invalid_value(key, value));
                }
                self.app_log_capacity = capacity;
            }
            other => return Err(unknown_key(other)),
        }
        Ok(())
    }

    pub fn keys() -> &'static [&'static str] {
        &["seed-demo-data", "log-level", "log-format", "app-log-capacity"]
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| invalid_value(key, value))
}

fn unknown_key(key: &str) -> StoreError {
    StoreError::InvalidPayload(format!("unknown config key '{}'", key))
}

fn invalid_value(key: &str, value: &str) -> StoreError {
    StoreError::InvalidPayload(format!("invalid value '{}' for {}", value, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MallConfig::default();
        assert!(config.seed_demo_data);
        assert_eq!(config.app_log_capacity, 500);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_load_missing_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = MallConfig::load(temp_dir.path()).unwrap();
        assert_eq!(config, MallConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();

        let mut config = MallConfig::default();
        config.set("seed-demo-data", "false").unwrap();
        config.set("log-format", "json").unwrap();
        config.save(temp_dir.path()).unwrap();

        let loaded = MallConfig::load(temp_dir.path()).unwrap();
        assert!(!loaded.seed_demo_data);
        assert_eq!(loaded.log_format, LogFormat::Json);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILENAME), r#"{"log_level": "debug"}"#).unwrap();

        let loaded = MallConfig::load(temp_dir.path()).unwrap();
        assert_eq!(loaded.log_level, "debug");
        assert!(loaded.seed_demo_data);
    }

    #[test]
    fn test_get_and_set_validation() {
        let mut config = MallConfig::default();
        assert_eq!(config.get("app-log-capacity").unwrap(), "500");
        assert!(config.set("app-log-capacity", "0").is_err());
        assert!(config.set("app-log-capacity", "lots").is_err());
        assert!(config.set("log-format", "xml").is_err());
        assert!(config.get("colour").is_err());

        config.set("app-log-capacity", "50").unwrap();
        assert_eq!(config.get("app-log-capacity").unwrap(), "50");
    }
}
