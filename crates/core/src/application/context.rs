// Shared collaborators of every job: clock, run ids, reporting sink

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::domain::{ItemError, JobKind, MaintenanceReport, ReportBuilder, ReportItem};
use crate::port::id_provider::UuidProvider;
use crate::port::time_provider::SystemTimeProvider;
use crate::port::{IdProvider, JobEvent, ReportSink, TimeProvider, TracingSink};

/// Job context
///
/// Every job owns one; it stamps reports with a run id and timestamp and
/// forwards progress to the injected sink.
#[derive(Clone)]
pub struct JobContext {
    time_provider: Arc<dyn TimeProvider>,
    id_provider: Arc<dyn IdProvider>,
    sink: Arc<dyn ReportSink>,
}

impl JobContext {
    pub fn new(
        time_provider: Arc<dyn TimeProvider>,
        id_provider: Arc<dyn IdProvider>,
        sink: Arc<dyn ReportSink>,
    ) -> Self {
        Self {
            time_provider,
            id_provider,
            sink,
        }
    }

    /// Production wiring: system clock, UUID run ids, tracing sink
    pub fn system() -> Self {
        Self::new(
            Arc::new(SystemTimeProvider),
            Arc::new(UuidProvider),
            Arc::new(TracingSink),
        )
    }

    pub fn now_millis(&self) -> i64 {
        self.time_provider.now_millis()
    }

    /// Wall-clock time used for archive names
    pub fn now_utc(&self) -> DateTime<Utc> {
        self.time_provider.now_utc()
    }

    pub(crate) fn begin(&self, job: JobKind) -> ReportBuilder {
        let run_id = self.id_provider.generate_id();
        self.sink.emit(JobEvent::Started {
            job,
            run_id: run_id.clone(),
        });
        ReportBuilder::new(run_id, job, self.time_provider.now_utc())
    }

    pub(crate) fn record(&self, report: &mut ReportBuilder, item: ReportItem) {
        self.sink.emit(JobEvent::Item {
            run_id: report.run_id().to_string(),
            item: item.clone(),
        });
        report.record(item);
    }

    pub(crate) fn record_error(&self, report: &mut ReportBuilder, error: ItemError) {
        self.sink.emit(JobEvent::ItemFailed {
            run_id: report.run_id().to_string(),
            error: error.clone(),
        });
        report.record_error(error);
    }

    pub(crate) fn finish(&self, report: MaintenanceReport) -> MaintenanceReport {
        self.sink.emit(JobEvent::Finished {
            job: report.job,
            run_id: report.run_id.clone(),
            status: report.status,
            summary: report.summary(),
        });
        report
    }
}

impl Default for JobContext {
    fn default() -> Self {
        Self::system()
    }
}
