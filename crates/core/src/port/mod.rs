// Port Layer - Interfaces for external dependencies

pub mod compressor;
pub mod file_enumerator;
pub mod file_store;
pub mod id_provider; // For deterministic testing
pub mod report_sink;
pub mod system_probe;
pub mod time_provider;

// Re-exports
pub use compressor::{ArchiveMember, ArchiveRequest, Compressor};
pub use file_enumerator::{FileEntry, FileEnumerator, WalkScope};
pub use file_store::FileStore;
pub use id_provider::IdProvider;
pub use report_sink::{JobEvent, ReportSink, TracingSink};
pub use system_probe::{GpuProbe, SystemProbe};
pub use time_provider::TimeProvider;
