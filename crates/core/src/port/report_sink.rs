// Reporting sink port
// Jobs receive their sink by injection; there is no process-wide job logger.

use tracing::{debug, error, info, warn};

use crate::domain::{ItemError, JobKind, ReportItem, ReportStatus};

/// Progress event emitted by a running job
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Started {
        job: JobKind,
        run_id: String,
    },
    Item {
        run_id: String,
        item: ReportItem,
    },
    ItemFailed {
        run_id: String,
        error: ItemError,
    },
    Finished {
        job: JobKind,
        run_id: String,
        status: ReportStatus,
        summary: String,
    },
}

/// Destination for job progress events
pub trait ReportSink: Send + Sync {
    fn emit(&self, event: JobEvent);
}

/// Default sink: forwards events to `tracing`
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn emit(&self, event: JobEvent) {
        match event {
            JobEvent::Started { job, run_id } => {
                info!(job = %job, run_id = %run_id, "Maintenance job started");
            }
            JobEvent::Item { run_id, item } => match &item {
                ReportItem::Alert {
                    metric,
                    value,
                    threshold,
                    severity,
                    ..
                } => {
                    warn!(
                        run_id = %run_id,
                        metric = %metric,
                        value = %value,
                        threshold = %threshold,
                        severity = %severity,
                        "Threshold exceeded"
                    );
                }
                other => {
                    debug!(
                        run_id = %run_id,
                        item = %other.name(),
                        freed_mb = other.freed_mb(),
                        age_days = ?other.age_days(),
                        "Item processed"
                    );
                }
            },
            JobEvent::ItemFailed { run_id, error } => {
                warn!(
                    run_id = %run_id,
                    item = %error.item,
                    kind = ?error.kind,
                    error = %error.message,
                    "Item failed"
                );
            }
            JobEvent::Finished {
                job,
                run_id,
                status,
                summary,
            } => {
                if status == ReportStatus::Error {
                    error!(job = %job, run_id = %run_id, summary = %summary, "Maintenance job failed");
                } else {
                    info!(
                        job = %job,
                        run_id = %run_id,
                        status = %status,
                        summary = %summary,
                        "Maintenance job completed"
                    );
                }
            }
        }
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Mock sink keeping every event in memory
    #[derive(Default)]
    pub struct RecordingSink {
        events: Mutex<Vec<JobEvent>>,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<JobEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ReportSink for RecordingSink {
        fn emit(&self, event: JobEvent) {
            self.events.lock().unwrap().push(event);
        }
    }
}
