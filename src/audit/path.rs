//! Record path derivation
//!
//! A record's location is a pure function of its creation instant and its
//! identifier:
//!
//! ```text
//! <base>/<YYYYMMDD>/<YYYYMMDD-HHMM>/<YYYYMMDD-HHMMSS>-<id>
//! ```
//!
//! Times are rendered in the process's local time zone.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::constants::{DAY_BUCKET_FORMAT, FILE_NAME_FORMAT, MINUTE_BUCKET_FORMAT};
use crate::error::{AuditError, Result};

/// Convert nanoseconds since the Unix epoch to local time
pub fn local_time(unix_nanos: i64) -> DateTime<Local> {
    DateTime::from_timestamp_nanos(unix_nanos).with_timezone(&Local)
}

/// Reject identifiers that would escape or break the file name
pub fn validate_identifier(id: &str) -> Result<()> {
    let unusable = id.is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\', '\0']);
    if unusable {
        return Err(AuditError::InvalidIdentifier(id.to_string()));
    }
    Ok(())
}

/// Minute bucket directory holding every record created in that minute
pub fn bucket_dir(base: &Path, unix_nanos: i64) -> PathBuf {
    let ts = local_time(unix_nanos);
    base.join(ts.format(DAY_BUCKET_FORMAT).to_string())
        .join(ts.format(MINUTE_BUCKET_FORMAT).to_string())
}

/// Full path of the record file for `id` created at `unix_nanos`
pub fn record_path(base: &Path, unix_nanos: i64, id: &str) -> Result<PathBuf> {
    validate_identifier(id)?;
    let ts = local_time(unix_nanos);
    let file_name = format!("{}-{}", ts.format(FILE_NAME_FORMAT), id);
    Ok(bucket_dir(base, unix_nanos).join(file_name))
}
