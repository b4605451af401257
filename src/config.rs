// YAML configuration for the todo CLI

use crate::filter::Filter;
use crate::storage;
use crate::store::DEFAULT_STORAGE_KEY;
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const APP_DIR: &str = "todostore";

/// Settings read from `config.yaml`; every field is optional in the file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the stored task list
    pub data_dir: PathBuf,
    /// Key the task list is stored under
    pub storage_key: String,
    /// Filter `list` uses when none is given
    pub default_filter: Filter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            default_filter: Filter::All,
        }
    }
}

impl Config {
    /// Load from an explicit path; the file must exist
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).context(format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_yaml(&content).context(format!("Failed to parse config file {}", path.display()))?;
        info!(path = ?path, "Loaded config");
        Ok(config)
    }

    /// Load from the default location, falling back to defaults if absent
    pub fn load_default() -> Result<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty file deserializes to null rather than an empty mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that would otherwise only fail once storage is touched
    pub fn validate(&self) -> Result<()> {
        storage::validate_key(&self.storage_key).context("Invalid storage_key")?;
        if self.data_dir.as_os_str().is_empty() {
            return Err(eyre!("data_dir cannot be empty"));
        }
        Ok(())
    }
}

/// `<config dir>/todostore/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.yaml"))
}

/// `<data dir>/todostore`, or `./.todostore` where the platform has none
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".todostore"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.storage_key, "todos");
        assert_eq!(config.default_filter, Filter::All);
        assert!(config.data_dir.ends_with("todostore"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("default_filter: active\n").unwrap();
        assert_eq!(config.default_filter, Filter::Active);
        assert_eq!(config.storage_key, "todos");
    }

    #[test]
    fn test_full_yaml() {
        let config = Config::from_yaml("data_dir: /tmp/todos\nstorage_key: work\ndefault_filter: completed\n").unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/todos"));
        assert_eq!(config.storage_key, "work");
        assert_eq!(config.default_filter, Filter::Completed);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(Config::from_yaml("default_filter: someday\n").is_err());
        assert!(Config::from_yaml("storage_key: ''\n").is_err());
    }

    #[test]
    fn test_storage_key_must_be_a_plain_name() {
        let err = Config::from_yaml("storage_key: ../x\n").unwrap_err();
        assert!(format!("{:?}", err).contains("invalid storage key '../x'"));

        let mut config = Config::default();
        config.storage_key = "a/b".to_string();
        assert!(config.validate().is_err());
        config.storage_key = "work-2".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "storage_key: home\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.storage_key, "home");

        assert!(Config::load(&temp.path().join("missing.yaml")).is_err());
    }
}
