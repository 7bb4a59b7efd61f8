// Archive Job - compressed backup of a source tree with exclusion filtering

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::application::JobContext;
use crate::domain::policy::bytes_to_mb;
use crate::domain::{ArchiveConfig, DomainError, JobKind, MaintenanceReport, ReportItem};
use crate::port::{ArchiveMember, ArchiveRequest, Compressor, FileEnumerator, WalkScope};

/// Builds one tar.gz archive of `source_dir`
///
/// Any failure aborts the job with an `error` report; there is no partial
/// "some files archived" outcome.
pub struct ArchiveJob {
    enumerator: Arc<dyn FileEnumerator>,
    compressor: Arc<dyn Compressor>,
    context: JobContext,
}

impl ArchiveJob {
    pub fn new(
        enumerator: Arc<dyn FileEnumerator>,
        compressor: Arc<dyn Compressor>,
        context: JobContext,
    ) -> Self {
        Self {
            enumerator,
            compressor,
            context,
        }
    }

    pub async fn run(&self, config: &ArchiveConfig) -> MaintenanceReport {
        let mut report = self.context.begin(JobKind::Archive);
        let source = config.source_dir.display().to_string();

        let root_name = match source_base_name(&config.source_dir) {
            Ok(name) => name,
            Err(e) => return self.context.finish(report.fail(&source, e.to_string())),
        };

        let entries = match self
            .enumerator
            .enumerate(&config.source_dir, WalkScope::Tree)
            .await
        {
            Ok(entries) => entries,
            Err(e) if e.is_not_found() => {
                let message = format!("source directory not found: {}", source);
                return self.context.finish(report.fail(&source, message));
            }
            Err(e) => return self.context.finish(report.fail(&source, e.to_string())),
        };

        let total = entries.len();
        let members: Vec<ArchiveMember> = entries
            .into_iter()
            .filter(|entry| !config.exclude.is_excluded(&entry.relative_display()))
            .map(|entry| ArchiveMember {
                source: entry.path,
                relative_path: entry.relative_path,
            })
            .collect();
        let file_count = members.len();
        let excluded = total - file_count;

        debug!(
            source = %source,
            included = file_count,
            excluded = excluded,
            patterns = ?config.exclude.patterns(),
            "Archive members selected"
        );

        let destination = config.destination.display().to_string();
        let request = ArchiveRequest {
            destination: config.destination.clone(),
            root_name,
            members,
        };

        match self.compressor.write_archive(request).await {
            Ok(size_bytes) => {
                let size_mb = bytes_to_mb(size_bytes);
                info!(
                    destination = %destination,
                    files = file_count,
                    size_mb = size_mb,
                    "Archive created"
                );
                report.record_excluded(excluded);
                self.context.record(
                    &mut report,
                    ReportItem::Archived {
                        name: destination,
                        size_mb,
                        file_count,
                    },
                );
                self.context.finish(report.finish())
            }
            Err(e) => self.context.finish(report.fail(&destination, e.to_string())),
        }
    }
}

fn source_base_name(dir: &Path) -> Result<String, DomainError> {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| DomainError::MissingBaseName(dir.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::context::test_support::{context, NOW};
    use crate::domain::{ExclusionSet, ItemErrorKind, ReportStatus};
    use crate::port::compressor::mocks::MockCompressor;
    use crate::port::file_enumerator::mocks::StaticEnumerator;
    use crate::port::JobEvent;
    use std::path::PathBuf;

    fn config(exclude: &[&str]) -> ArchiveConfig {
        ArchiveConfig {
            source_dir: PathBuf::from("/srv/project"),
            destination: PathBuf::from("/backups/backup-20231114_221320.tar.gz"),
            exclude: ExclusionSet::new(exclude.iter().copied()),
        }
    }

    #[tokio::test]
    async fn test_excluded_paths_are_left_out() {
        let enumerator = StaticEnumerator::new("/srv/project")
            .with_file("a.txt", 10, NOW)
            .with_file("node_modules/x.js", 10, NOW)
            .with_file("src/lib.rs", 10, NOW);
        let compressor = Arc::new(MockCompressor::new(3 * 1024 * 1024, 0));
        let (ctx, _) = context();
        let job = ArchiveJob::new(Arc::new(enumerator), compressor.clone(), ctx);

        let report = job.run(&config(&["node_modules"])).await;

        assert_eq!(report.status, ReportStatus::Success);
        assert_eq!(report.totals.files_archived, 2);
        assert_eq!(report.totals.files_excluded, 1);
        assert!((report.totals.archive_size_mb - 3.0).abs() < 1e-9);

        let requests = compressor.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].root_name, "project");
        let members: Vec<_> = requests[0]
            .members
            .iter()
            .map(|m| m.relative_path.clone())
            .collect();
        assert_eq!(
            members,
            vec![PathBuf::from("a.txt"), PathBuf::from("src/lib.rs")]
        );
    }

    #[tokio::test]
    async fn test_missing_source_is_job_error() {
        let enumerator = StaticEnumerator::new("/elsewhere");
        let compressor = Arc::new(MockCompressor::new(0, 0));
        let (ctx, sink) = context();
        let job = ArchiveJob::new(Arc::new(enumerator), compressor.clone(), ctx);

        let report = job.run(&config(&[])).await;

        assert_eq!(report.status, ReportStatus::Error);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind, ItemErrorKind::Job);
        assert!(report.errors[0].message.contains("not found"));
        assert!(report.items.is_empty());
        assert!(compressor.requests().is_empty());

        let events = sink.events();
        assert!(matches!(events.first(), Some(JobEvent::Started { .. })));
        assert!(matches!(
            events.last(),
            Some(JobEvent::Finished {
                status: ReportStatus::Error,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_write_failure_reports_no_partial_result() {
        let enumerator = StaticEnumerator::new("/srv/project").with_file("a.txt", 10, NOW);
        let compressor = Arc::new(MockCompressor::failing("disk full"));
        let (ctx, _) = context();
        let job = ArchiveJob::new(Arc::new(enumerator), compressor, ctx);

        let report = job.run(&config(&[])).await;

        assert!(report.is_error());
        assert!(report.items.is_empty());
        assert_eq!(report.totals.files_archived, 0);
        assert!(report.summary().contains("disk full"));
    }

    #[tokio::test]
    async fn test_unreadable_entry_aborts_archive() {
        let enumerator = StaticEnumerator::new("/srv/project")
            .with_file("a.txt", 10, NOW)
            .with_unreadable("private");
        let compressor = Arc::new(MockCompressor::new(1024, 0));
        let (ctx, _) = context();
        let job = ArchiveJob::new(Arc::new(enumerator), compressor.clone(), ctx);

        let report = job.run(&config(&[])).await;

        assert_eq!(report.status, ReportStatus::Error);
        assert_eq!(report.errors[0].kind, ItemErrorKind::Job);
        assert!(report.errors[0].message.contains("private"));
        assert!(compressor.requests().is_empty());
    }

    #[tokio::test]
    async fn test_source_without_base_name_is_rejected() {
        let enumerator = StaticEnumerator::new("/");
        let (ctx, _) = context();
        let job = ArchiveJob::new(
            Arc::new(enumerator),
            Arc::new(MockCompressor::new(0, 0)),
            ctx,
        );

        let mut cfg = config(&[]);
        cfg.source_dir = PathBuf::from("/");
        let report = job.run(&cfg).await;

        assert!(report.is_error());
        assert!(report.errors[0].message.contains("base name"));
    }
}
