// Error types module

use std::path::PathBuf;
use thiserror::Error;

/// Centralized error type for the audit subsystem
///
/// Categorizes failures by the phase that produced them so callers can
/// decide whether to retry, alert, or drop the record.
#[derive(Error, Debug)]
pub enum AuditError {
    /// Init-time validation failures and configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Directory creation, file creation or write failure
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The record file already exists; it is never overwritten
    #[error("Audit record already exists: {}", path.display())]
    Collision { path: PathBuf },

    /// The formatter could not serialize (or parse) a record
    #[error("Format error: {0}")]
    Format(String),

    /// Identifier cannot be used as a file name component
    #[error("Invalid transaction identifier: {0:?}")]
    InvalidIdentifier(String),

    /// Write called before a successful init, or after close
    #[error("Audit writer is not configured")]
    NotConfigured,

    /// Releasing a held resource failed; the concurrent writer holds none and never returns this
    #[error("Close error: {0}")]
    Close(String),
}

impl AuditError {
    /// Wrap an I/O error together with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AuditError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        AuditError::Format(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;
