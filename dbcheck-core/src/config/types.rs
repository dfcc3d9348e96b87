//! Configuration type definitions
//!
//! These types control which rule passes run and how their findings are
//! classified.

use serde::{Deserialize, Serialize};

/// Root configuration for a check run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Report every syntax finding as an error instead of a warning
    #[serde(default)]
    pub strict: bool,

    /// Run the naming/format rules
    #[serde(default = "default_enabled")]
    pub syntax: bool,

    /// Run the semantic PV rules
    #[serde(default = "default_enabled")]
    pub pv: bool,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            strict: false,
            syntax: true,
            pv: true,
            logging: LoggingConfig::default(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level directive used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CheckConfig::default();
        assert!(!config.strict);
        assert!(config.syntax);
        assert!(config.pv);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_json_deserialize() {
        let json = r#"{
            "strict": true,
            "pv": false
        }"#;
        let config: CheckConfig = serde_json::from_str(json).unwrap();
        assert!(config.strict);
        assert!(config.syntax);
        assert!(!config.pv);
    }

    #[test]
    fn test_toml_deserialize() {
        let config: CheckConfig = toml::from_str(
            r#"
            syntax = false

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert!(!config.strict);
        assert!(!config.syntax);
        assert_eq!(config.logging.level, "debug");
    }
}
