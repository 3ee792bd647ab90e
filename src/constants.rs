// Defaults shared by the writer, its configuration and the identifier generator.
// Permission modes are octal; the strftime patterns define the on-disk layout.

// =============================================================================
// Filesystem defaults
// =============================================================================

/// Default permission mode for bucket directories (rwxr-xr-x)
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Default permission mode for record files and the audit file (rw-r--r--)
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Highest permission value accepted in configuration (setuid/setgid/sticky + rwx)
pub const MAX_PERMISSION_MODE: u32 = 0o7777;

/// Prefix of the throwaway file used to check base directory writability
pub const WRITABILITY_CHECK_PREFIX: &str = ".audit-check-";

// =============================================================================
// Record layout
// =============================================================================

/// Day bucket directory name, e.g. `20240115`
pub const DAY_BUCKET_FORMAT: &str = "%Y%m%d";

/// Minute bucket directory name, e.g. `20240115-1030`
pub const MINUTE_BUCKET_FORMAT: &str = "%Y%m%d-%H%M";

/// Record file name prefix, e.g. `20240115-103042`; the identifier follows a `-`
pub const FILE_NAME_FORMAT: &str = "%Y%m%d-%H%M%S";

// =============================================================================
// Identifier defaults
// =============================================================================

/// Default transaction identifier length
pub const DEFAULT_TRANSACTION_ID_LENGTH: usize = 20;

/// Alphabet transaction identifiers are drawn from
pub const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
