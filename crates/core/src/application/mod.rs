// Application Layer - Maintenance jobs

pub mod archive;
pub mod context;
pub mod metric_sampler;
pub mod retention;
pub mod rotation;

// Re-exports
pub use archive::ArchiveJob;
pub use context::JobContext;
pub use metric_sampler::MetricSampler;
pub use retention::RetentionJob;
pub use rotation::RotationJob;
