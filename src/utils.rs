//! Utility functions
use std::time::{SystemTime, UNIX_EPOCH};

use crate::errors::{BackupError, BackupErrorKind};

/// Seconds since the unix epoch
pub(crate) fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// File name of the archive of a backup started at `timestamp`
pub(crate) fn archive_name(timestamp: u64) -> String {
    format!("backup.{timestamp}.tar.gz")
}

/// Get password from the user
pub(crate) fn get_password() -> Result<String, BackupError> {
    rpassword::read_password()
        .map_err(|e| BackupError::from(e).with_kind(BackupErrorKind::Configuration))
}
