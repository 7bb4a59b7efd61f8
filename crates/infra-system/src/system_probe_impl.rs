// System probe implementation
// reason: sysinfo for cross-platform system monitoring
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use sysinfo::{Disks, System, MINIMUM_CPU_UPDATE_INTERVAL};
use tracing::debug;

use hostkeeper_core::domain::HostMetrics;
use hostkeeper_core::error::{AppError, Result};
use hostkeeper_core::port::SystemProbe;

/// Default CPU averaging window
pub const DEFAULT_CPU_WINDOW: Duration = Duration::from_secs(1);

const BYTES_PER_MB: u64 = 1024 * 1024;
const BYTES_PER_GB: u64 = 1024 * 1024 * 1024;

/// System probe implementation using sysinfo
///
/// Each sample builds a fresh `System`, refreshes CPU twice across the
/// averaging window and reads memory plus the filesystem mounted at `/`.
pub struct SystemProbeImpl {
    cpu_window: Duration,
}

impl SystemProbeImpl {
    pub fn new() -> Self {
        Self {
            cpu_window: DEFAULT_CPU_WINDOW,
        }
    }

    /// Override the CPU averaging window (never below sysinfo's minimum)
    pub fn with_cpu_window(window: Duration) -> Self {
        Self {
            cpu_window: window.max(MINIMUM_CPU_UPDATE_INTERVAL),
        }
    }
}

impl Default for SystemProbeImpl {
    fn default() -> Self {
        Self::new()
    }
}

fn percent(used: u64, total: u64) -> f32 {
    if total == 0 {
        return 0.0;
    }
    (used as f64 / total as f64 * 100.0) as f32
}

/// (used, total) bytes for the root filesystem, falling back to the first disk
fn root_disk_usage(disks: &Disks) -> Option<(u64, u64)> {
    let disk = disks
        .iter()
        .find(|d| d.mount_point() == Path::new("/"))
        .or_else(|| disks.iter().next())?;

    let total = disk.total_space();
    let used = total.saturating_sub(disk.available_space());
    Some((used, total))
}

#[async_trait]
impl SystemProbe for SystemProbeImpl {
    async fn sample(&self) -> Result<HostMetrics> {
        let mut sys = System::new();

        // CPU usage is a delta between two refreshes
        sys.refresh_cpu();
        tokio::time::sleep(self.cpu_window.max(MINIMUM_CPU_UPDATE_INTERVAL)).await;
        sys.refresh_cpu();
        sys.refresh_memory();

        let cpu_percent = sys.global_cpu_info().cpu_usage().clamp(0.0, 100.0);

        let memory_total = sys.total_memory();
        if memory_total == 0 {
            return Err(AppError::Internal(
                "memory information unavailable".to_string(),
            ));
        }
        let memory_used = sys.used_memory();

        let disks = Disks::new_with_refreshed_list();
        let (disk_used, disk_total) = root_disk_usage(&disks)
            .ok_or_else(|| AppError::NotFound("no mounted filesystem found".to_string()))?;

        let metrics = HostMetrics {
            cpu_percent,
            ram_percent: percent(memory_used, memory_total),
            disk_percent: percent(disk_used, disk_total),
            memory_used_mb: memory_used / BYTES_PER_MB,
            memory_total_mb: memory_total / BYTES_PER_MB,
            disk_used_gb: disk_used / BYTES_PER_GB,
            disk_total_gb: disk_total / BYTES_PER_GB,
            gpus: None,
        };

        debug!(
            cpu = %metrics.cpu_percent,
            ram = %metrics.ram_percent,
            disk = %metrics.disk_percent,
            mem_total_mb = %metrics.memory_total_mb,
            "System metrics collected"
        );

        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(50, 200), 25.0);
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(10, 10), 100.0);
    }

    #[test]
    fn test_cpu_window_respects_minimum() {
        let probe = SystemProbeImpl::with_cpu_window(Duration::ZERO);
        assert_eq!(probe.cpu_window, MINIMUM_CPU_UPDATE_INTERVAL);
    }

    #[tokio::test]
    async fn test_sample() {
        let probe = SystemProbeImpl::with_cpu_window(Duration::from_millis(250));

        // Sandboxed hosts may hide disks; only check values when sampling works
        if let Ok(metrics) = probe.sample().await {
            assert!((0.0..=100.0).contains(&metrics.cpu_percent));
            assert!((0.0..=100.0).contains(&metrics.ram_percent));
            assert!((0.0..=100.0).contains(&metrics.disk_percent));
            assert!(metrics.memory_total_mb > 0);
            assert!(metrics.gpus.is_none());
        }
    }
}
