// Tue Jan 13 2026 - Alex

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Disassembly suffix marking slots that hold the pure-virtual stub.
    /// Differs per binary, so there is no default.
    pub pure_virtual_marker: Option<String>,
    pub ignore_functions: Vec<u64>,
    pub add_func_this: bool,
    pub add_dummy_members: bool,
    pub force_rename_vtable_head: bool,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pure_virtual_marker: None,
            ignore_functions: Vec::new(),
            add_func_this: true,
            add_dummy_members: false,
            force_rename_vtable_head: false,
            log_level: "info".to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0:?}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load(path).unwrap_or_default()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn with_pure_virtual_marker(mut self, marker: &str) -> Self {
        self.pure_virtual_marker = Some(marker.to_string());
        self
    }

    pub fn with_ignore_functions(mut self, functions: Vec<u64>) -> Self {
        self.ignore_functions = functions;
        self
    }

    pub fn with_log_level(mut self, level: &str) -> Self {
        self.log_level = level.to_string();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ignore_functions.contains(&0) {
            return Err(ConfigError::Validation("ignore_functions must not contain address 0".to_string()));
        }
        if matches!(&self.pure_virtual_marker, Some(marker) if marker.trim().is_empty()) {
            return Err(ConfigError::Validation("pure_virtual_marker must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.pure_virtual_marker.is_none());
        assert!(config.add_func_this);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"add_func_this": false, "pure_virtual_marker": "_purecall"}"#).unwrap();
        assert!(!config.add_func_this);
        assert_eq!(config.pure_virtual_marker.as_deref(), Some("_purecall"));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_validate() {
        assert!(Config::new().with_ignore_functions(vec![0]).validate().is_err());
        assert!(Config::new().with_pure_virtual_marker(" ").validate().is_err());
        assert!(Config::new().with_ignore_functions(vec![0x1000]).validate().is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/vtable-recon.json").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
        assert!(Config::load_or_default("/nonexistent/vtable-recon.json").add_func_this);
    }
}
