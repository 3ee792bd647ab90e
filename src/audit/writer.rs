//! Writer capability shared by every audit backend

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinHandle;

use super::formatter::{Formatter, JsonFormatter};
use super::AuditLog;
use crate::constants::{DEFAULT_DIR_MODE, DEFAULT_FILE_MODE};
use crate::error::Result;

/// Runtime configuration handed to [`Writer::init`]
#[derive(Clone)]
pub struct WriterConfig {
    /// Root of the sharded record tree
    pub dir: PathBuf,

    /// Audit file whose parent directory must already exist; checked at init
    pub file: PathBuf,

    /// Permission mode for created directories
    pub dir_mode: u32,

    /// Permission mode for created files
    pub file_mode: u32,

    pub formatter: Arc<dyn Formatter>,

    /// fsync every record file before reporting success
    pub sync_on_write: bool,
}

impl WriterConfig {
    /// Configuration with default modes and the compact JSON formatter
    pub fn new(dir: impl Into<PathBuf>, file: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            file: file.into(),
            dir_mode: DEFAULT_DIR_MODE,
            file_mode: DEFAULT_FILE_MODE,
            formatter: Arc::new(JsonFormatter::new()),
            sync_on_write: false,
        }
    }

    pub fn with_modes(mut self, dir_mode: u32, file_mode: u32) -> Self {
        self.dir_mode = dir_mode;
        self.file_mode = file_mode;
        self
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_sync_on_write(mut self, sync_on_write: bool) -> Self {
        self.sync_on_write = sync_on_write;
        self
    }
}

impl fmt::Debug for WriterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterConfig")
            .field("dir", &self.dir)
            .field("file", &self.file)
            .field("dir_mode", &format_args!("{:o}", self.dir_mode))
            .field("file_mode", &format_args!("{:o}", self.file_mode))
            .field("formatter", &self.formatter.name())
            .field("sync_on_write", &self.sync_on_write)
            .finish()
    }
}

/// Audit backend lifecycle: `init` once, `write` from any number of threads, `close` once
///
/// `write` borrows shared so one configured writer can sit behind an `Arc`.
/// `init` and `close` borrow exclusively, so neither can run while writes
/// through the same owner are in flight.
pub trait Writer: Send + Sync {
    /// Validate `config` and make the writer ready for `write`
    fn init(&mut self, config: WriterConfig) -> Result<()>;

    /// Persist one record
    fn write(&self, log: &AuditLog) -> Result<()>;

    /// Release held resources; succeeds on a writer that was never initialized
    fn close(&mut self) -> Result<()>;
}

/// Run one blocking `write` on tokio's blocking pool
///
/// Must be called from within a tokio runtime.
pub fn spawn_write<W>(writer: Arc<W>, log: AuditLog) -> JoinHandle<Result<()>>
where
    W: Writer + ?Sized + 'static,
{
    tokio::task::spawn_blocking(move || writer.write(&log))
}
