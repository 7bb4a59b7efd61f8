// Domain Layer - Pure maintenance policy and report types

pub mod archive_name;
pub mod config;
pub mod error;
pub mod metrics;
pub mod policy;
pub mod report;

// Re-exports
pub use archive_name::{archive_file_name, is_archive_name, ARCHIVE_EXTENSION};
pub use config::{ArchiveConfig, RetentionConfig, RotationConfig};
pub use error::DomainError;
pub use metrics::{GpuMetrics, HostMetrics};
pub use policy::{ExclusionSet, RetentionPolicy, RotationPolicy, ThresholdSet};
pub use report::{
    ItemError, ItemErrorKind, JobKind, MaintenanceReport, Metric, ReportBuilder, ReportItem,
    ReportStatus, ReportTotals,
};
