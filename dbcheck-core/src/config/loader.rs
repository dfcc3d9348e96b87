//! Configuration loader

use crate::config::CheckConfig;
use crate::error::{Error, Result};
use std::path::Path;

/// Configuration loader for the supported file formats
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<CheckConfig> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        tracing::debug!("Loading {} configuration from {}", ext, path.display());

        match ext {
            "json" => Self::from_json(&content),
            "toml" => Self::from_toml(&content),
            _ => Err(Error::Config(format!("Unknown config format: {}", ext))),
        }
    }

    /// Parse JSON configuration
    pub fn from_json(content: &str) -> Result<CheckConfig> {
        serde_json::from_str(content).map_err(|e| Error::Config(format!("Invalid JSON: {}", e)))
    }

    /// Parse TOML configuration
    pub fn from_toml(content: &str) -> Result<CheckConfig> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_json_loading() {
        let config = ConfigLoader::from_json(r#"{"strict": true}"#).unwrap();
        assert!(config.strict);
    }

    #[test]
    fn test_invalid_toml() {
        let err = ConfigLoader::from_toml("strict = maybe").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(b"strict = true\npv = false\n").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert!(config.strict);
        assert!(!config.pv);
        assert!(config.syntax);
    }

    #[test]
    fn test_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let err = ConfigLoader::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unknown config format"));
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
