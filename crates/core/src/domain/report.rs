// Maintenance Report - one per job invocation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use super::metrics::HostMetrics;

/// Report status, ordered by severity (success < warning < critical < error)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Job completed; for the health check this means "healthy"
    Success,
    Warning,
    Critical,
    Error,
}

impl ReportStatus {
    /// Raise to `to` if more severe; never downgrades
    pub fn escalate(&mut self, to: ReportStatus) {
        if to > *self {
            *self = to;
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Success => "success",
            ReportStatus::Warning => "warning",
            ReportStatus::Critical => "critical",
            ReportStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which job produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Archive,
    Retention,
    Rotation,
    Health,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::Archive => write!(f, "archive"),
            JobKind::Retention => write!(f, "retention"),
            JobKind::Rotation => write!(f, "rotation"),
            JobKind::Health => write!(f, "health"),
        }
    }
}

/// Host metric checked against a threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Cpu,
    Ram,
    Disk,
}

impl Metric {
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Cpu => "CPU",
            Metric::Ram => "RAM",
            Metric::Disk => "Disk",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::Cpu => write!(f, "cpu"),
            Metric::Ram => write!(f, "ram"),
            Metric::Disk => write!(f, "disk"),
        }
    }
}

/// Round to two decimals (presentation only)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn serialize_mb<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round2(*value))
}

/// Per-item outcome record
///
/// Sizes are carried in full-precision MB and only rounded when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportItem {
    Archived {
        name: String,
        #[serde(serialize_with = "serialize_mb")]
        size_mb: f64,
        file_count: usize,
    },
    Compressed {
        name: String,
        #[serde(serialize_with = "serialize_mb")]
        original_mb: f64,
        #[serde(serialize_with = "serialize_mb")]
        compressed_mb: f64,
        /// original - compressed; negative for incompressible content
        #[serde(serialize_with = "serialize_mb")]
        freed_mb: f64,
    },
    Deleted {
        name: String,
        #[serde(serialize_with = "serialize_mb")]
        size_mb: f64,
        age_days: u64,
    },
    Alert {
        metric: Metric,
        value: f32,
        threshold: f32,
        severity: ReportStatus,
        message: String,
    },
}

impl ReportItem {
    pub fn name(&self) -> String {
        match self {
            ReportItem::Archived { name, .. }
            | ReportItem::Compressed { name, .. }
            | ReportItem::Deleted { name, .. } => name.clone(),
            ReportItem::Alert { metric, .. } => metric.to_string(),
        }
    }

    /// Space released by this item (MB)
    pub fn freed_mb(&self) -> f64 {
        match self {
            ReportItem::Compressed { freed_mb, .. } => *freed_mb,
            ReportItem::Deleted { size_mb, .. } => *size_mb,
            ReportItem::Archived { .. } | ReportItem::Alert { .. } => 0.0,
        }
    }

    pub fn age_days(&self) -> Option<u64> {
        match self {
            ReportItem::Deleted { age_days, .. } => Some(*age_days),
            _ => None,
        }
    }
}

/// Classification of a recorded error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemErrorKind {
    /// Job-level failure; the whole job was aborted
    Job,
    Delete,
    Compress,
}

/// (item identifier, error) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    pub item: String,
    pub kind: ItemErrorKind,
    pub message: String,
}

impl ItemError {
    pub fn new(item: impl Into<String>, kind: ItemErrorKind, message: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            kind,
            message: message.into(),
        }
    }
}

/// Aggregate numeric summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportTotals {
    pub files_archived: usize,
    pub files_excluded: usize,
    #[serde(serialize_with = "serialize_mb")]
    pub archive_size_mb: f64,
    pub compressed_count: usize,
    pub deleted_count: usize,
    #[serde(serialize_with = "serialize_mb")]
    pub total_freed_mb: f64,
    pub alert_count: usize,
}

/// Structured result of one job invocation
///
/// `summary` is not stored: it is derived from the other fields on demand and
/// emitted during serialization only.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MaintenanceReport {
    pub run_id: String,
    pub job: JobKind,
    pub timestamp: DateTime<Utc>,
    pub status: ReportStatus,
    #[serde(default)]
    pub items: Vec<ReportItem>,
    #[serde(default)]
    pub totals: ReportTotals,
    #[serde(default)]
    pub errors: Vec<ItemError>,
    #[serde(default)]
    pub metrics: Option<HostMetrics>,
}

impl MaintenanceReport {
    pub fn is_error(&self) -> bool {
        self.status == ReportStatus::Error
    }

    /// Single human-readable line, reproducible from the other fields
    pub fn summary(&self) -> String {
        if self.is_error() {
            let reason = self
                .errors
                .first()
                .map(|e| e.message.as_str())
                .unwrap_or("unknown error");
            return format!("{} job failed: {}", self.job, reason);
        }

        let line = match self.job {
            JobKind::Archive => {
                let name = self
                    .items
                    .first()
                    .map(ReportItem::name)
                    .unwrap_or_default();
                format!(
                    "Archived {} files ({} excluded) into {}: {:.2} MB",
                    self.totals.files_archived,
                    self.totals.files_excluded,
                    name,
                    self.totals.archive_size_mb
                )
            }
            JobKind::Retention => format!(
                "Deleted {} expired archives, freed {:.2} MB",
                self.totals.deleted_count, self.totals.total_freed_mb
            ),
            JobKind::Rotation => format!(
                "Compressed {} logs, deleted {} old logs, freed {:.2} MB",
                self.totals.compressed_count,
                self.totals.deleted_count,
                self.totals.total_freed_mb
            ),
            JobKind::Health => match &self.metrics {
                Some(m) => format!(
                    "Host {}: cpu {:.1}%, ram {:.1}%, disk {:.1}% ({} alerts)",
                    self.status,
                    m.cpu_percent,
                    m.ram_percent,
                    m.disk_percent,
                    self.totals.alert_count
                ),
                None => format!("Host {} ({} alerts)", self.status, self.totals.alert_count),
            },
        };

        if self.errors.is_empty() {
            line
        } else {
            format!("{} ({} errors)", line, self.errors.len())
        }
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Serialize)]
struct EncodedReport<'a> {
    run_id: &'a str,
    job: JobKind,
    timestamp: &'a DateTime<Utc>,
    status: ReportStatus,
    items: &'a [ReportItem],
    totals: &'a ReportTotals,
    errors: &'a [ItemError],
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics: Option<&'a HostMetrics>,
    summary: String,
}

impl Serialize for MaintenanceReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        EncodedReport {
            run_id: &self.run_id,
            job: self.job,
            timestamp: &self.timestamp,
            status: self.status,
            items: &self.items,
            totals: &self.totals,
            errors: &self.errors,
            metrics: self.metrics.as_ref(),
            summary: self.summary(),
        }
        .serialize(serializer)
    }
}

/// Accumulates items and errors while a job runs and keeps totals consistent
#[derive(Debug)]
pub struct ReportBuilder {
    report: MaintenanceReport,
}

impl ReportBuilder {
    pub fn new(run_id: impl Into<String>, job: JobKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            report: MaintenanceReport {
                run_id: run_id.into(),
                job,
                timestamp,
                status: ReportStatus::Success,
                items: Vec::new(),
                totals: ReportTotals::default(),
                errors: Vec::new(),
                metrics: None,
            },
        }
    }

    pub fn job(&self) -> JobKind {
        self.report.job
    }

    pub fn run_id(&self) -> &str {
        &self.report.run_id
    }

    pub fn record(&mut self, item: ReportItem) {
        let totals = &mut self.report.totals;
        match &item {
            ReportItem::Archived {
                size_mb,
                file_count,
                ..
            } => {
                totals.archive_size_mb += size_mb;
                totals.files_archived += file_count;
            }
            ReportItem::Compressed { freed_mb, .. } => {
                totals.compressed_count += 1;
                totals.total_freed_mb += freed_mb;
            }
            ReportItem::Deleted { size_mb, .. } => {
                totals.deleted_count += 1;
                totals.total_freed_mb += size_mb;
            }
            ReportItem::Alert { severity, .. } => {
                totals.alert_count += 1;
                self.report.status.escalate(*severity);
            }
        }
        self.report.items.push(item);
    }

    pub fn record_error(&mut self, error: ItemError) {
        self.report.errors.push(error);
    }

    pub fn record_excluded(&mut self, count: usize) {
        self.report.totals.files_excluded += count;
    }

    pub fn escalate(&mut self, status: ReportStatus) {
        self.report.status.escalate(status);
    }

    pub fn set_metrics(&mut self, metrics: HostMetrics) {
        self.report.metrics = Some(metrics);
    }

    /// Close the report; item errors turn an otherwise successful run into a warning
    pub fn finish(mut self) -> MaintenanceReport {
        if !self.report.errors.is_empty() {
            self.report.status.escalate(ReportStatus::Warning);
        }
        self.report
    }

    /// Abort: discard partial results and keep a single job-level error
    pub fn fail(mut self, item: impl Into<String>, message: impl Into<String>) -> MaintenanceReport {
        self.report.status = ReportStatus::Error;
        self.report.items.clear();
        self.report.totals = ReportTotals::default();
        self.report.metrics = None;
        self.report.errors = vec![ItemError::new(item, ItemErrorKind::Job, message)];
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn builder(job: JobKind) -> ReportBuilder {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        ReportBuilder::new("run-1", job, at)
    }

    #[test]
    fn test_status_escalation_never_downgrades() {
        let mut status = ReportStatus::Success;
        status.escalate(ReportStatus::Critical);
        status.escalate(ReportStatus::Warning);
        assert_eq!(status, ReportStatus::Critical);

        status.escalate(ReportStatus::Error);
        assert_eq!(status, ReportStatus::Error);
    }

    #[test]
    fn test_totals_follow_items() {
        let mut b = builder(JobKind::Rotation);
        b.record(ReportItem::Compressed {
            name: "app.log".to_string(),
            original_mb: 150.0,
            compressed_mb: 10.0,
            freed_mb: 140.0,
        });
        b.record(ReportItem::Compressed {
            name: "noise.log".to_string(),
            original_mb: 1.0,
            compressed_mb: 1.25,
            freed_mb: -0.25,
        });
        b.record(ReportItem::Deleted {
            name: "old.log.gz".to_string(),
            size_mb: 5.0,
            age_days: 40,
        });

        let report = b.finish();
        assert_eq!(report.status, ReportStatus::Success);
        assert_eq!(report.totals.compressed_count, 2);
        assert_eq!(report.totals.deleted_count, 1);
        assert!((report.totals.total_freed_mb - 144.75).abs() < 1e-9);
        assert_eq!(
            report.summary(),
            "Compressed 2 logs, deleted 1 old logs, freed 144.75 MB"
        );
    }

    #[test]
    fn test_item_errors_downgrade_to_warning() {
        let mut b = builder(JobKind::Retention);
        b.record_error(ItemError::new(
            "backup-1.tar.gz",
            ItemErrorKind::Delete,
            "permission denied",
        ));

        let report = b.finish();
        assert_eq!(report.status, ReportStatus::Warning);
        assert_eq!(
            report.summary(),
            "Deleted 0 expired archives, freed 0.00 MB (1 errors)"
        );
    }

    #[test]
    fn test_fail_discards_partial_results() {
        let mut b = builder(JobKind::Archive);
        b.record(ReportItem::Archived {
            name: "backup.tar.gz".to_string(),
            size_mb: 1.0,
            file_count: 3,
        });

        let report = b.fail("/missing", "source directory not found");
        assert!(report.is_error());
        assert!(report.items.is_empty());
        assert_eq!(report.totals, ReportTotals::default());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind, ItemErrorKind::Job);
        assert_eq!(
            report.summary(),
            "archive job failed: source directory not found"
        );
    }

    #[test]
    fn test_serialization_rounds_and_derives_summary() {
        let mut b = builder(JobKind::Retention);
        b.record(ReportItem::Deleted {
            name: "backup-a.tar.gz".to_string(),
            size_mb: 1.23456,
            age_days: 10,
        });
        let report = b.finish();

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["job"], "retention");
        assert_eq!(value["items"][0]["type"], "deleted");
        assert_eq!(value["items"][0]["size_mb"], 1.23);
        assert_eq!(value["items"][0]["age_days"], 10);
        assert_eq!(value["totals"]["total_freed_mb"], 1.23);
        assert_eq!(value["summary"], report.summary());
        assert!(value.get("metrics").is_none());

        // internal accounting keeps full precision
        assert!((report.totals.total_freed_mb - 1.23456).abs() < 1e-12);
    }

    #[test]
    fn test_summary_is_not_read_back() {
        let report = builder(JobKind::Retention).finish();
        let mut value = serde_json::to_value(&report).unwrap();
        value["summary"] = serde_json::json!("tampered");

        let decoded: MaintenanceReport = serde_json::from_value(value).unwrap();
        assert_eq!(decoded.summary(), report.summary());
    }

    #[test]
    fn test_alerts_escalate_status() {
        let mut b = builder(JobKind::Health);
        b.record(ReportItem::Alert {
            metric: Metric::Disk,
            value: 95.0,
            threshold: 90.0,
            severity: ReportStatus::Critical,
            message: "Disk usage 95.0% exceeds threshold 90.0%".to_string(),
        });

        let report = b.finish();
        assert_eq!(report.status, ReportStatus::Critical);
        assert_eq!(report.totals.alert_count, 1);
        assert_eq!(report.summary(), "Host critical (1 alerts)");
    }
}
