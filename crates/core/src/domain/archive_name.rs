// Backup archive naming convention: <prefix>-<YYYYMMDD_HHMMSS>.tar.gz

use chrono::{DateTime, Utc};

pub const ARCHIVE_EXTENSION: &str = ".tar.gz";

/// Timestamp layout embedded in archive names
pub const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Default archive name prefix
pub const DEFAULT_ARCHIVE_PREFIX: &str = "backup";

pub fn archive_file_name(prefix: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}-{}{}",
        prefix,
        at.format(ARCHIVE_TIMESTAMP_FORMAT),
        ARCHIVE_EXTENSION
    )
}

/// Matches `<prefix>-*.tar.gz` (glob-style, the middle part is not parsed)
pub fn is_archive_name(prefix: &str, file_name: &str) -> bool {
    let head = format!("{}-", prefix);
    file_name.len() >= head.len() + ARCHIVE_EXTENSION.len()
        && file_name.starts_with(&head)
        && file_name.ends_with(ARCHIVE_EXTENSION)
}
