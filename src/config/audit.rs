//! Audit logging configuration types.
//!
//! Permission modes are written as octal strings (`"0750"`, `"0o640"`) so they
//! read the same way they would in `chmod`. Bare YAML integers are rejected. Defaults are sourced from
//! `crate::constants`.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::audit::{AuditFormat, WriterConfig};
use crate::constants::{DEFAULT_DIR_MODE, DEFAULT_FILE_MODE, MAX_PERMISSION_MODE};

/// Unix permission bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMode(pub u32);

impl FileMode {
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Parse `"0750"`, `"750"` or `"0o750"`
    pub fn parse(text: &str) -> Result<Self, String> {
        let digits = text.trim();
        let digits = digits.strip_prefix("0o").unwrap_or(digits);
        let bits = u32::from_str_radix(digits, 8)
            .map_err(|e| format!("invalid octal permission mode '{}': {}", text, e))?;
        Ok(FileMode(bits))
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}

impl Serialize for FileMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FileMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Bits(u32),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => FileMode::parse(&text).map_err(de::Error::custom),
            // `640` arrives as decimal and `0o640` as octal, so the digits can't be recovered
            Raw::Bits(bits) => Err(de::Error::custom(format!(
                "permission mode {} must be a quoted octal string, e.g. \"0640\"",
                bits
            ))),
        }
    }
}

/// Default permission mode for bucket directories
fn default_dir_mode() -> FileMode {
    FileMode(DEFAULT_DIR_MODE)
}

/// Default permission mode for record files
fn default_file_mode() -> FileMode {
    FileMode(DEFAULT_FILE_MODE)
}

/// Concurrent audit writer configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditLogConfig {
    /// Root of the sharded record tree
    pub dir: String,

    /// Audit file; its parent directory must already exist
    pub file: String,

    /// Mode for created directories (default: 0755)
    #[serde(default = "default_dir_mode")]
    pub dir_mode: FileMode,

    /// Mode for created files (default: 0644)
    #[serde(default = "default_file_mode")]
    pub file_mode: FileMode,

    /// Record encoding (default: json)
    #[serde(default)]
    pub format: AuditFormat,

    /// fsync each record before reporting success (default: false)
    #[serde(default)]
    pub sync_on_write: bool,
}

impl AuditLogConfig {
    /// Static checks; filesystem checks happen when the writer is initialized
    pub fn validate(&self) -> Result<(), String> {
        if self.dir.trim().is_empty() {
            return Err("audit_log.dir cannot be empty".to_string());
        }
        if self.file.trim().is_empty() {
            return Err("audit_log.file cannot be empty".to_string());
        }
        for (name, mode) in [("dir_mode", self.dir_mode), ("file_mode", self.file_mode)] {
            if mode.bits() > MAX_PERMISSION_MODE {
                return Err(format!(
                    "audit_log.{} {:o} exceeds {:o}",
                    name,
                    mode.bits(),
                    MAX_PERMISSION_MODE
                ));
            }
        }
        Ok(())
    }

    /// Runtime writer configuration
    pub fn writer_config(&self) -> WriterConfig {
        WriterConfig::new(&self.dir, &self.file)
            .with_modes(self.dir_mode.bits(), self.file_mode.bits())
            .with_formatter(self.format.formatter())
            .with_sync_on_write(self.sync_on_write)
    }
}
