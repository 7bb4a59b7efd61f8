// Maintenance policies: exclusion, retention, rotation and alert thresholds

use serde::{Deserialize, Serialize};

use super::error::{DomainError, Result};
use super::metrics::HostMetrics;
use super::report::{Metric, ReportItem, ReportStatus};

/// Milliseconds in one day
pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Bytes in one megabyte (1024^2)
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Default retention period for backup archives (days)
pub const DEFAULT_KEEP_DAYS: u32 = 7;

/// Default age after which compressed logs are deleted (days)
pub const DEFAULT_MAX_LOG_AGE_DAYS: u32 = 30;

/// Default size above which a log is compressed (MB)
pub const DEFAULT_MAX_LOG_SIZE_MB: u64 = 100;

/// Default alert thresholds (percent)
pub const DEFAULT_CPU_THRESHOLD: f32 = 80.0;
pub const DEFAULT_RAM_THRESHOLD: f32 = 80.0;
pub const DEFAULT_DISK_THRESHOLD: f32 = 90.0;

pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

pub fn signed_bytes_to_mb(bytes: i64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// Whole days elapsed since `modified_ms` (floor, clamped at zero for future mtimes)
pub fn age_days(modified_ms: i64, now_ms: i64) -> u64 {
    ((now_ms - modified_ms).max(0) / MILLIS_PER_DAY) as u64
}

/// True when a file modified at `modified_ms` falls before `now - max_days`.
///
/// A file exactly `max_days` old sits on the cutoff and is kept.
pub fn is_older_than(modified_ms: i64, now_ms: i64, max_days: u32) -> bool {
    let cutoff = now_ms - i64::from(max_days) * MILLIS_PER_DAY;
    modified_ms < cutoff
}

/// Archive exclusion rules
///
/// A relative path is excluded iff any pattern is a *substring* of it.
/// This is plain containment, not glob matching: `"log"` excludes
/// `catalog/a.txt` as well as `logs/app.log`. Order of patterns is irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ExclusionSet {
    patterns: Vec<String>,
}

impl ExclusionSet {
    /// Build a rule set; empty patterns are discarded since they would match every path
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(Into::into)
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn is_excluded(&self, relative_path: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| relative_path.contains(pattern.as_str()))
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl From<Vec<String>> for ExclusionSet {
    fn from(patterns: Vec<String>) -> Self {
        Self::new(patterns)
    }
}

impl From<ExclusionSet> for Vec<String> {
    fn from(set: ExclusionSet) -> Self {
        set.patterns
    }
}

/// Backup archive retention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub keep_days: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            keep_days: DEFAULT_KEEP_DAYS,
        }
    }
}

impl RetentionPolicy {
    pub fn new(keep_days: u32) -> Self {
        Self { keep_days }
    }

    /// Archive is kept iff modified >= now - keep_days
    pub fn is_expired(&self, modified_ms: i64, now_ms: i64) -> bool {
        is_older_than(modified_ms, now_ms, self.keep_days)
    }
}

/// Log rotation thresholds
///
/// `max_size_bytes` triggers compression of `*.log`, `max_age_days` triggers
/// deletion of `*.log.gz`. The two apply to disjoint file sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationPolicy {
    pub max_size_bytes: u64,
    pub max_age_days: u32,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self::from_megabytes(DEFAULT_MAX_LOG_SIZE_MB, DEFAULT_MAX_LOG_AGE_DAYS)
    }
}

impl RotationPolicy {
    pub fn new(max_size_bytes: u64, max_age_days: u32) -> Self {
        Self {
            max_size_bytes,
            max_age_days,
        }
    }

    pub fn from_megabytes(max_size_mb: u64, max_age_days: u32) -> Self {
        Self::new(max_size_mb.saturating_mul(1024 * 1024), max_age_days)
    }

    /// Strictly greater than: a log of exactly `max_size_bytes` stays as is
    pub fn should_compress(&self, size_bytes: u64) -> bool {
        size_bytes > self.max_size_bytes
    }

    pub fn should_delete(&self, modified_ms: i64, now_ms: i64) -> bool {
        is_older_than(modified_ms, now_ms, self.max_age_days)
    }
}

/// Alert thresholds (percent) for the health check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSet {
    pub cpu: f32,
    pub ram: f32,
    pub disk: f32,
}

impl Default for ThresholdSet {
    fn default() -> Self {
        Self {
            cpu: DEFAULT_CPU_THRESHOLD,
            ram: DEFAULT_RAM_THRESHOLD,
            disk: DEFAULT_DISK_THRESHOLD,
        }
    }
}

impl ThresholdSet {
    pub fn new(cpu: f32, ram: f32, disk: f32) -> Self {
        Self { cpu, ram, disk }
    }

    pub fn validate(&self) -> Result<()> {
        for (metric, value) in [
            (Metric::Cpu, self.cpu),
            (Metric::Ram, self.ram),
            (Metric::Disk, self.disk),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(DomainError::InvalidThreshold {
                    metric: metric.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }

    /// Compare a sample against every threshold.
    ///
    /// All three checks always run; the returned status is the most severe
    /// one reached (cpu/ram -> warning, disk -> critical).
    pub fn evaluate(&self, metrics: &HostMetrics) -> (ReportStatus, Vec<ReportItem>) {
        let checks = [
            (Metric::Cpu, metrics.cpu_percent, self.cpu, ReportStatus::Warning),
            (Metric::Ram, metrics.ram_percent, self.ram, ReportStatus::Warning),
            (Metric::Disk, metrics.disk_percent, self.disk, ReportStatus::Critical),
        ];

        let mut status = ReportStatus::Success;
        let mut alerts = Vec::new();

        for (metric, value, threshold, severity) in checks {
            if value > threshold {
                status.escalate(severity);
                alerts.push(ReportItem::Alert {
                    metric,
                    value,
                    threshold,
                    severity,
                    message: format!(
                        "{} usage {:.1}% exceeds threshold {:.1}%",
                        metric.label(),
                        value,
                        threshold
                    ),
                });
            }
        }

        (status, alerts)
    }
}
