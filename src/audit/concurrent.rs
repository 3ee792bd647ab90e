//! Concurrent audit writer
//!
//! Every record goes to its own file, at a path derived from the record's
//! creation time and identifier (see [`super::path`]). Concurrent writes never
//! target the same file, so the writer holds no lock: bucket directories are
//! created with race-tolerant create-if-missing and record files with
//! create-new, which makes the filesystem reject a genuine collision instead
//! of letting two records share a file.

use std::fs::{self, DirBuilder, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::formatter::Formatter;
use super::path;
use super::writer::{Writer, WriterConfig};
use super::AuditLog;
use crate::constants::{MAX_PERMISSION_MODE, WRITABILITY_CHECK_PREFIX};
use crate::error::{AuditError, Result};
use crate::id::random_string;

/// Settings kept after a successful init
struct Settings {
    dir: PathBuf,
    dir_mode: u32,
    file_mode: u32,
    formatter: Arc<dyn Formatter>,
    sync_on_write: bool,
}

#[derive(Default)]
enum State {
    #[default]
    Unconfigured,
    Configured(Settings),
    Closed,
}

/// Writer storing one file per transaction under time-bucketed directories
///
/// `ConcurrentWriter::default()` is unconfigured: it can be closed or dropped
/// without side effects, and `write` returns [`AuditError::NotConfigured`]
/// until `init` succeeds.
#[derive(Default)]
pub struct ConcurrentWriter {
    state: State,
}

impl ConcurrentWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_configured(&self) -> bool {
        matches!(self.state, State::Configured(_))
    }

    /// Path the given record is (or would be) stored at
    pub fn record_path(&self, log: &AuditLog) -> Result<PathBuf> {
        match &self.state {
            State::Configured(settings) => {
                path::record_path(&settings.dir, log.unix_timestamp(), log.id())
            }
            _ => Err(AuditError::NotConfigured),
        }
    }
}

impl Writer for ConcurrentWriter {
    fn init(&mut self, config: WriterConfig) -> Result<()> {
        match self.state {
            State::Unconfigured => {}
            State::Configured(_) => {
                return Err(AuditError::Config(
                    "audit writer is already initialized".to_string(),
                ))
            }
            State::Closed => {
                return Err(AuditError::Config("audit writer is closed".to_string()))
            }
        }

        validate_mode("dir_mode", config.dir_mode)?;
        validate_mode("file_mode", config.file_mode)?;
        prepare_base_dir(&config.dir, config.dir_mode)?;
        check_audit_file(&config.file, config.file_mode)?;

        tracing::info!(
            dir = %config.dir.display(),
            file = %config.file.display(),
            dir_mode = %format!("{:o}", config.dir_mode),
            file_mode = %format!("{:o}", config.file_mode),
            formatter = config.formatter.name(),
            "Concurrent audit writer initialized"
        );

        self.state = State::Configured(Settings {
            dir: config.dir,
            dir_mode: config.dir_mode,
            file_mode: config.file_mode,
            formatter: config.formatter,
            sync_on_write: config.sync_on_write,
        });
        Ok(())
    }

    fn write(&self, log: &AuditLog) -> Result<()> {
        let settings = match &self.state {
            State::Configured(settings) => settings,
            _ => return Err(AuditError::NotConfigured),
        };

        let record_path = path::record_path(&settings.dir, log.unix_timestamp(), log.id())?;

        // Format first so a formatter failure leaves nothing on disk
        let data = settings.formatter.format(log)?;

        if let Some(bucket) = record_path.parent() {
            create_dir_all(bucket, settings.dir_mode)?;
        }

        let file = create_new_file(&record_path, settings.file_mode).map_err(|e| {
            if e.kind() == ErrorKind::AlreadyExists {
                AuditError::Collision {
                    path: record_path.clone(),
                }
            } else {
                AuditError::io(&record_path, e)
            }
        })?;

        fill_record(&record_path, file, &data, settings.sync_on_write)?;

        tracing::debug!(
            transaction_id = log.id(),
            path = %record_path.display(),
            bytes = data.len(),
            "Audit record written"
        );
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let State::Configured(settings) = &self.state {
            tracing::debug!(dir = %settings.dir.display(), "Concurrent audit writer closed");
        }
        self.state = State::Closed;
        Ok(())
    }
}

/// Destination of a freshly created record file
trait RecordSink: io::Write {
    fn sync(&self) -> io::Result<()>;
}

impl RecordSink for File {
    fn sync(&self) -> io::Result<()> {
        self.sync_all()
    }
}

/// Write the whole payload to a new record, removing the file if that fails
///
/// A truncated record must not stay behind: it would read as a real one and
/// turn a retry of the same transaction into a collision.
fn fill_record<S: RecordSink>(path: &Path, mut sink: S, data: &[u8], sync: bool) -> Result<()> {
    let outcome = sink
        .write_all(data)
        .and_then(|()| if sync { sink.sync() } else { Ok(()) });
    drop(sink);

    if let Err(source) = outcome {
        if let Err(cleanup) = fs::remove_file(path) {
            tracing::warn!(
                path = %path.display(),
                error = %cleanup,
                "Failed to remove partial audit record"
            );
        }
        return Err(AuditError::io(path, source));
    }
    Ok(())
}

fn validate_mode(name: &str, mode: u32) -> Result<()> {
    if mode > MAX_PERMISSION_MODE {
        return Err(AuditError::Config(format!(
            "{} {:o} is not a valid permission mode",
            name, mode
        )));
    }
    Ok(())
}

/// Create the base directory if needed and check a file can be created in it
fn prepare_base_dir(dir: &Path, mode: u32) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Err(AuditError::Config("audit directory is not set".to_string()));
    }

    create_dir_all(dir, mode).map_err(|e| {
        AuditError::Config(format!("cannot create audit directory: {}", e))
    })?;

    let scratch = dir.join(format!(
        "{}{}",
        WRITABILITY_CHECK_PREFIX,
        random_string(12)
    ));
    create_new_file(&scratch, 0o600).map_err(|e| {
        AuditError::Config(format!(
            "audit directory {} is not writable: {}",
            dir.display(),
            e
        ))
    })?;
    fs::remove_file(&scratch).map_err(|e| {
        AuditError::Config(format!(
            "cannot remove writability check file {}: {}",
            scratch.display(),
            e
        ))
    })
}

/// The audit file's parent must already exist; the file itself is created if missing
fn check_audit_file(file: &Path, mode: u32) -> Result<()> {
    if file.as_os_str().is_empty() {
        return Err(AuditError::Config("audit file is not set".to_string()));
    }

    let parent = match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !parent.is_dir() {
        return Err(AuditError::Config(format!(
            "parent directory of audit file {} does not exist",
            file.display()
        )));
    }

    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    options.open(file).map(drop).map_err(|e| {
        AuditError::Config(format!(
            "cannot open audit file {}: {}",
            file.display(),
            e
        ))
    })
}

/// Create `dir` and missing ancestors; an existing directory is success
fn create_dir_all(dir: &Path, mode: u32) -> Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    builder.create(dir).map_err(|e| AuditError::io(dir, e))
}

fn create_new_file(path: &Path, mode: u32) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    options.open(path)
}
