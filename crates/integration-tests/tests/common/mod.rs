//! Shared wiring for end-to-end tests: real filesystem adapters, fixed clock

#![allow(dead_code)]

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use flate2::read::GzDecoder;
use hostkeeper_core::application::{ArchiveJob, JobContext, RetentionJob, RotationJob};
use hostkeeper_core::domain::policy::MILLIS_PER_DAY;
use hostkeeper_core::port::id_provider::mocks::SequentialIdProvider;
use hostkeeper_core::port::report_sink::mocks::RecordingSink;
use hostkeeper_core::port::time_provider::mocks::FixedTimeProvider;
use hostkeeper_infra_fs::{LocalFileStore, TarGzCompressor, WalkDirEnumerator};

/// Real adapters plus a clock pinned to "now" so mtimes can be placed exactly
pub struct Harness {
    pub now_ms: i64,
    pub clock: Arc<FixedTimeProvider>,
    pub sink: Arc<RecordingSink>,
    pub context: JobContext,
}

impl Harness {
    pub fn new() -> Self {
        // whole seconds so mtimes survive coarse filesystem timestamps
        let now_ms = chrono::Utc::now().timestamp() * 1000;
        let clock = Arc::new(FixedTimeProvider::new(now_ms));
        let sink = Arc::new(RecordingSink::new());
        let context = JobContext::new(
            clock.clone(),
            Arc::new(SequentialIdProvider::default()),
            sink.clone(),
        );

        Self {
            now_ms,
            clock,
            sink,
            context,
        }
    }

    pub fn archive_job(&self) -> ArchiveJob {
        ArchiveJob::new(
            Arc::new(WalkDirEnumerator::new()),
            Arc::new(TarGzCompressor::new()),
            self.context.clone(),
        )
    }

    pub fn retention_job(&self) -> RetentionJob {
        RetentionJob::new(
            Arc::new(WalkDirEnumerator::new()),
            Arc::new(LocalFileStore::new()),
            self.context.clone(),
        )
    }

    pub fn rotation_job(&self) -> RotationJob {
        RotationJob::new(
            Arc::new(WalkDirEnumerator::new()),
            Arc::new(LocalFileStore::new()),
            Arc::new(TarGzCompressor::new()),
            self.context.clone(),
        )
    }

    /// Set a file's mtime to `now - days`
    pub fn age_file(&self, path: &Path, days: i64) {
        set_mtime_ms(path, self.now_ms - days * MILLIS_PER_DAY);
    }
}

pub fn set_mtime_ms(path: &Path, mtime_ms: i64) {
    let mtime = UNIX_EPOCH + Duration::from_millis(mtime_ms as u64);
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(mtime)
        .unwrap();
}

/// Sorted entry paths of a `.tar.gz`
pub fn archive_entries(path: &Path) -> Vec<String> {
    let mut archive = tar::Archive::new(GzDecoder::new(File::open(path).unwrap()));
    let mut names: Vec<String> = archive
        .entries()
        .unwrap()
        .map(|e| e.unwrap().path().unwrap().to_string_lossy().replace('\\', "/"))
        .collect();
    names.sort();
    names
}

pub fn gunzip(path: &Path) -> Vec<u8> {
    let mut out = Vec::new();
    GzDecoder::new(File::open(path).unwrap())
        .read_to_end(&mut out)
        .unwrap();
    out
}

/// Compressible text of roughly `len` bytes
pub fn log_content(len: usize) -> Vec<u8> {
    let line = b"2024-03-09T14:05:07Z INFO request served status=200 path=/health\n";
    line.iter().copied().cycle().take(len).collect()
}
