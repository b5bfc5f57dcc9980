//! Store configuration
//!
//! Every field has a default, so `{}` (or no config at all) is valid.

use std::path::Path;

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::storage::DEFAULT_KEY_PREFIX;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Prefix prepended to board ids to form storage keys
    pub storage_key_prefix: String,
    /// One of off/error/warn/info/debug/trace
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.level_filter()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.storage_key_prefix, "board_");
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Info);
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_json(r#"{"storageKeyPrefix":"dia_board_","logLevel":"DEBUG"}"#)
            .unwrap();
        assert_eq!(config.storage_key_prefix, "dia_board_");
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Debug);
    }

    #[test]
    fn test_bad_level_rejected() {
        let err = Config::from_json(r#"{"logLevel":"loud"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::LogLevel(level) if level == "loud"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"logLevel":"warn"}"#).unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Warn);

        let missing = Config::from_file(&dir.path().join("nope.json"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
