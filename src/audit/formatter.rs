//! Formatter capability: audit record to bytes

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::AuditLog;
use crate::error::Result;

/// Serializes an audit record for storage
///
/// Writers only ever call [`Formatter::format`], so any encoding can be
/// substituted without touching the writer.
pub trait Formatter: Send + Sync {
    /// Encode one record
    fn format(&self, log: &AuditLog) -> Result<Vec<u8>>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// JSON encoding of [`AuditLog`]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Compact, single-line JSON
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Indented JSON for human review
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    /// Decode bytes produced by either JSON variant back into a record
    pub fn parse(data: &[u8]) -> Result<AuditLog> {
        Ok(serde_json::from_slice(data)?)
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, log: &AuditLog) -> Result<Vec<u8>> {
        let data = if self.pretty {
            serde_json::to_vec_pretty(log)?
        } else {
            serde_json::to_vec(log)?
        };
        Ok(data)
    }

    fn name(&self) -> &'static str {
        if self.pretty {
            "json_pretty"
        } else {
            "json"
        }
    }
}

/// Record encodings selectable from configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditFormat {
    #[default]
    Json,
    JsonPretty,
}

impl AuditFormat {
    /// Formatter implementing this encoding
    pub fn formatter(self) -> Arc<dyn Formatter> {
        match self {
            AuditFormat::Json => Arc::new(JsonFormatter::new()),
            AuditFormat::JsonPretty => Arc::new(JsonFormatter::pretty()),
        }
    }
}
