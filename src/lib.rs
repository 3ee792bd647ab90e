// WAF audit log library
//
// Persists one file per inspected transaction under time-bucketed directories,
// with lock-free concurrent writes and thread-safe identifier generation.

pub mod audit;
pub mod config;
pub mod constants;
pub mod error;
pub mod id;
pub mod logging;

pub use audit::{AuditLog, ConcurrentWriter, Formatter, JsonFormatter, Writer, WriterConfig};
pub use error::{AuditError, Result};
