//! Layered settings for the `hostkeeper` binary
//!
//! Precedence (lowest first):
//! 1. Built-in defaults
//! 2. Default config file (`<config dir>/hostkeeper/config.toml`)
//! 3. `--config` file
//! 4. Environment variables (`HOSTKEEPER_BACKUP__KEEP_DAYS=14`, ...)
//!
//! CLI flags are applied by the caller after `load` returns.

use chrono::{DateTime, Utc};
use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use hostkeeper_core::domain::archive_name::DEFAULT_ARCHIVE_PREFIX;
use hostkeeper_core::domain::config::DEFAULT_LOG_DIR;
use hostkeeper_core::domain::policy::{
    DEFAULT_CPU_THRESHOLD, DEFAULT_DISK_THRESHOLD, DEFAULT_KEEP_DAYS, DEFAULT_MAX_LOG_AGE_DAYS,
    DEFAULT_MAX_LOG_SIZE_MB, DEFAULT_RAM_THRESHOLD,
};
use hostkeeper_core::domain::{
    archive_file_name, ArchiveConfig, ExclusionSet, RetentionConfig, RetentionPolicy,
    RotationConfig, RotationPolicy, ThresholdSet,
};
use hostkeeper_core::{AppError, Result};

pub const ENV_PREFIX: &str = "HOSTKEEPER";
const DEFAULT_SOURCE_DIR: &str = ".";
const FALLBACK_BACKUP_DIR: &str = "~/.hostkeeper/backups";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupSettings {
    pub source_dir: String,
    pub backup_dir: String,
    pub exclude_patterns: Vec<String>,
    pub keep_days: u32,
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationSettings {
    pub log_dir: String,
    pub max_age_days: u32,
    pub max_size_mb: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSettings {
    pub alert_cpu_threshold: f32,
    pub alert_ram_threshold: f32,
    pub alert_disk_threshold: f32,
    /// Query GPUs when a capability is available
    pub gpu: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub backup: BackupSettings,
    pub rotation: RotationSettings,
    pub metrics: MetricsSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backup: BackupSettings {
                source_dir: DEFAULT_SOURCE_DIR.to_string(),
                backup_dir: default_backup_dir(),
                exclude_patterns: Vec::new(),
                keep_days: DEFAULT_KEEP_DAYS,
                prefix: DEFAULT_ARCHIVE_PREFIX.to_string(),
            },
            rotation: RotationSettings {
                log_dir: DEFAULT_LOG_DIR.to_string(),
                max_age_days: DEFAULT_MAX_LOG_AGE_DAYS,
                max_size_mb: DEFAULT_MAX_LOG_SIZE_MB,
            },
            metrics: MetricsSettings {
                alert_cpu_threshold: DEFAULT_CPU_THRESHOLD,
                alert_ram_threshold: DEFAULT_RAM_THRESHOLD,
                alert_disk_threshold: DEFAULT_DISK_THRESHOLD,
                gpu: true,
            },
        }
    }
}

fn config_err(e: config::ConfigError) -> AppError {
    AppError::Config(e.to_string())
}

/// `<config dir>/hostkeeper/config` (extension resolved by the config crate)
pub fn default_config_path() -> PathBuf {
    ProjectDirs::from("", "", "hostkeeper")
        .map(|p| p.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config")
}

/// `<data dir>/hostkeeper/backups`, outside any source tree
pub fn default_backup_dir() -> String {
    ProjectDirs::from("", "", "hostkeeper")
        .map(|p| p.data_dir().join("backups").to_string_lossy().into_owned())
        .unwrap_or_else(|| FALLBACK_BACKUP_DIR.to_string())
}

/// Pattern excluding `backup_dir` from a walk of `source_dir` when it is
/// nested inside it, so archives never contain earlier archives
fn nested_backup_pattern(source_dir: &Path, backup_dir: &Path) -> Option<String> {
    let backup_dir = backup_dir.canonicalize().ok()?;
    let relative = backup_dir.strip_prefix(source_dir).ok()?;
    if relative.as_os_str().is_empty() {
        return None;
    }
    let relative = relative.to_string_lossy().replace('\\', "/");
    Some(format!("{}/", relative))
}

/// Expand `~` and `$VAR` in a configured path
pub fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).into_owned()),
    }
}

impl Settings {
    /// Load settings from defaults, config files and the process environment
    pub fn load(cli_config_path: Option<&Path>) -> Result<Self> {
        Self::load_layered(&default_config_path(), cli_config_path, None)
    }

    /// `env` replaces the process environment when given
    pub(crate) fn load_layered(
        default_path: &Path,
        cli_config_path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let defaults = Settings::default();

        let mut builder = Config::builder()
            // 1. Built-in defaults
            .set_default("backup.source_dir", defaults.backup.source_dir)
            .map_err(config_err)?
            .set_default("backup.backup_dir", defaults.backup.backup_dir)
            .map_err(config_err)?
            .set_default("backup.exclude_patterns", defaults.backup.exclude_patterns)
            .map_err(config_err)?
            .set_default("backup.keep_days", defaults.backup.keep_days as i64)
            .map_err(config_err)?
            .set_default("backup.prefix", defaults.backup.prefix)
            .map_err(config_err)?
            .set_default("rotation.log_dir", defaults.rotation.log_dir)
            .map_err(config_err)?
            .set_default("rotation.max_age_days", defaults.rotation.max_age_days as i64)
            .map_err(config_err)?
            .set_default("rotation.max_size_mb", defaults.rotation.max_size_mb as i64)
            .map_err(config_err)?
            .set_default(
                "metrics.alert_cpu_threshold",
                defaults.metrics.alert_cpu_threshold as f64,
            )
            .map_err(config_err)?
            .set_default(
                "metrics.alert_ram_threshold",
                defaults.metrics.alert_ram_threshold as f64,
            )
            .map_err(config_err)?
            .set_default(
                "metrics.alert_disk_threshold",
                defaults.metrics.alert_disk_threshold as f64,
            )
            .map_err(config_err)?
            .set_default("metrics.gpu", defaults.metrics.gpu)
            .map_err(config_err)?
            // 2. Default config file
            .add_source(File::with_name(&default_path.to_string_lossy()).required(false));

        // 3. Explicit config file must exist
        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // 4. Environment: HOSTKEEPER_ROTATION__MAX_SIZE_MB, HOSTKEEPER_BACKUP__EXCLUDE_PATTERNS=a,b
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("backup.exclude_patterns")
                .try_parsing(true)
                .source(env),
        );

        let settings: Settings = builder
            .build()
            .map_err(config_err)?
            .try_deserialize()
            .map_err(config_err)?;

        settings.thresholds().validate()?;

        Ok(settings)
    }

    /// Archive config writing `<backup_dir>/<prefix>-<timestamp>.tar.gz`
    ///
    /// The source is canonicalized when it exists so `.` still yields a base
    /// name for the archive root. A destination directory inside the source
    /// is added to the exclusions.
    pub fn archive_config(&self, now: DateTime<Utc>, output: Option<PathBuf>) -> ArchiveConfig {
        let source = expand_path(&self.backup.source_dir);
        let source_dir = source.canonicalize().unwrap_or(source);

        let destination = output.unwrap_or_else(|| {
            expand_path(&self.backup.backup_dir)
                .join(archive_file_name(&self.backup.prefix, now))
        });

        let mut patterns = self.backup.exclude_patterns.clone();
        if let Some(pattern) = destination
            .parent()
            .and_then(|dir| nested_backup_pattern(&source_dir, dir))
        {
            if !patterns.contains(&pattern) {
                patterns.push(pattern);
            }
        }

        ArchiveConfig {
            source_dir,
            destination,
            exclude: ExclusionSet::new(patterns),
        }
    }

    pub fn retention_config(&self) -> RetentionConfig {
        RetentionConfig {
            backup_dir: expand_path(&self.backup.backup_dir),
            prefix: self.backup.prefix.clone(),
            policy: RetentionPolicy::new(self.backup.keep_days),
        }
    }

    pub fn rotation_config(&self) -> RotationConfig {
        RotationConfig {
            log_dir: expand_path(&self.rotation.log_dir),
            policy: RotationPolicy::from_megabytes(
                self.rotation.max_size_mb,
                self.rotation.max_age_days,
            ),
        }
    }

    pub fn thresholds(&self) -> ThresholdSet {
        ThresholdSet::new(
            self.metrics.alert_cpu_threshold,
            self.metrics.alert_ram_threshold,
            self.metrics.alert_disk_threshold,
        )
    }
}
