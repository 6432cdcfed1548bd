//! Engine Configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default location of the config file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/glucogard/engine.json";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Listen address
    pub bind_addr: String,
    /// Model artifact path
    pub model_path: PathBuf,
    /// Allow any origin, method and header
    pub cors_permissive: bool,
    /// Log filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".into(),
            model_path: PathBuf::from("models/diabetes_model.json"),
            cors_permissive: true,
            log_filter: "info".into(),
        }
    }
}

impl EngineConfig {
    /// Load from file
    pub fn load(path: &str) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse from a JSON document; missing keys take defaults
    pub fn from_json(content: &str) -> Result<Self, std::io::Error> {
        serde_json::from_str(content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Apply `GLUCOGARD_BIND_ADDR` and `GLUCOGARD_MODEL_PATH`
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var("GLUCOGARD_BIND_ADDR").ok(),
            std::env::var("GLUCOGARD_MODEL_PATH").ok(),
        )
    }

    fn with_overrides(mut self, bind_addr: Option<String>, model_path: Option<String>) -> Self {
        if let Some(addr) = bind_addr.filter(|s| !s.is_empty()) {
            self.bind_addr = addr;
        }
        if let Some(path) = model_path.filter(|s| !s.is_empty()) {
            self.model_path = PathBuf::from(path);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"bind_addr": "127.0.0.1:9000"}"#).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.model_path, EngineConfig::default().model_path);
        assert!(config.cors_permissive);
    }

    #[test]
    fn test_invalid_file() {
        let err = EngineConfig::from_json("{bind_addr").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
        assert!(EngineConfig::load("/nonexistent/engine.json").is_err());
    }

    #[test]
    fn test_overrides() {
        let config = EngineConfig::default()
            .with_overrides(Some("0.0.0.0:9100".into()), Some("/srv/model.json".into()));
        assert_eq!(config.bind_addr, "0.0.0.0:9100");
        assert_eq!(config.model_path, PathBuf::from("/srv/model.json"));

        let unchanged = EngineConfig::default().with_overrides(Some(String::new()), None);
        assert_eq!(unchanged, EngineConfig::default());
    }
}
