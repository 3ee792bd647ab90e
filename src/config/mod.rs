// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod audit;

pub use audit::{AuditLogConfig, FileMode};

use crate::error::AuditError;

/// Top-level configuration document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub audit_log: AuditLogConfig,
}

impl Config {
    /// Parse YAML after replacing `${VAR_NAME}` with environment variable values
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, AuditError> {
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| AuditError::Config(e.to_string()))?;

        // Every referenced variable must be set
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                AuditError::Config(format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                ))
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        let config: Config = serde_yaml::from_str(&substituted)
            .map_err(|e| AuditError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AuditError> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| AuditError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), AuditError> {
        self.audit_log.validate().map_err(AuditError::Config)
    }
}
