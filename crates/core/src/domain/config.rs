// Job configurations (one per maintenance job)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::archive_name::DEFAULT_ARCHIVE_PREFIX;
use super::policy::{ExclusionSet, RetentionPolicy, RotationPolicy};

/// Default directory scanned by log rotation
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Archive job configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    pub source_dir: PathBuf,
    /// Full path of the archive to write
    pub destination: PathBuf,
    #[serde(default)]
    pub exclude: ExclusionSet,
}

/// Retention job configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionConfig {
    pub backup_dir: PathBuf,
    /// Only `<prefix>-*.tar.gz` files are considered
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default)]
    pub policy: RetentionPolicy,
}

fn default_prefix() -> String {
    DEFAULT_ARCHIVE_PREFIX.to_string()
}

impl RetentionConfig {
    pub fn new(backup_dir: impl Into<PathBuf>, keep_days: u32) -> Self {
        Self {
            backup_dir: backup_dir.into(),
            prefix: default_prefix(),
            policy: RetentionPolicy::new(keep_days),
        }
    }
}

/// Rotation job configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationConfig {
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default)]
    pub policy: RotationPolicy,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_DIR)
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            policy: RotationPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_config_defaults() {
        let config: RotationConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RotationConfig::default());
        assert_eq!(config.log_dir, PathBuf::from("logs"));
        assert_eq!(config.policy.max_age_days, 30);
    }

    #[test]
    fn test_retention_config_defaults() {
        let config: RetentionConfig =
            serde_json::from_str(r#"{"backup_dir": "/var/backups"}"#).unwrap();
        assert_eq!(config.prefix, "backup");
        assert_eq!(config.policy.keep_days, 7);
    }
}
