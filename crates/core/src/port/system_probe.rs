// System resource monitoring port
// reason: async-trait needed, the CPU sample waits on a timed window
use async_trait::async_trait;

use crate::domain::{GpuMetrics, HostMetrics};
use crate::error::Result;

/// System probe port for resource monitoring
#[async_trait]
pub trait SystemProbe: Send + Sync {
    /// Take one sample of CPU, RAM and root-filesystem usage
    ///
    /// CPU usage is averaged over a short fixed window, so this call
    /// intentionally waits (about one second) before returning.
    ///
    /// # Example
    /// ```text
    /// let metrics = probe.sample().await?;
    /// if metrics.disk_percent > 90.0 {
    ///     println!("Disk almost full");
    /// }
    /// ```
    async fn sample(&self) -> Result<HostMetrics>;
}

/// Optional GPU capability
///
/// Absence is not an error: `query` returns None and the GPU section is
/// simply omitted from the report.
#[async_trait]
pub trait GpuProbe: Send + Sync {
    async fn query(&self) -> Option<Vec<GpuMetrics>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::sync::{Arc, Mutex};

    /// Mock SystemProbe for testing
    pub struct MockSystemProbe {
        metrics: Arc<Mutex<HostMetrics>>,
        fail: bool,
    }

    impl MockSystemProbe {
        pub fn new(cpu_percent: f32, ram_percent: f32, disk_percent: f32) -> Self {
            Self {
                metrics: Arc::new(Mutex::new(HostMetrics {
                    cpu_percent,
                    ram_percent,
                    disk_percent,
                    memory_used_mb: 1024,
                    memory_total_mb: 2048,
                    disk_used_gb: 100,
                    disk_total_gb: 500,
                    gpus: None,
                })),
                fail: false,
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(0.0, 0.0, 0.0)
            }
        }

        pub fn set_cpu_usage(&self, cpu_percent: f32) {
            self.metrics.lock().unwrap().cpu_percent = cpu_percent;
        }
    }

    #[async_trait]
    impl SystemProbe for MockSystemProbe {
        async fn sample(&self) -> Result<HostMetrics> {
            if self.fail {
                return Err(AppError::Internal("probe unavailable".to_string()));
            }
            Ok(self.metrics.lock().unwrap().clone())
        }
    }

    /// Mock GPU capability; `None` simulates a host without GPUs
    pub struct MockGpuProbe {
        gpus: Option<Vec<GpuMetrics>>,
    }

    impl MockGpuProbe {
        pub fn new(gpus: Option<Vec<GpuMetrics>>) -> Self {
            Self { gpus }
        }

        pub fn single(utilization_percent: f32) -> Self {
            Self::new(Some(vec![GpuMetrics {
                index: 0,
                name: "Mock GPU".to_string(),
                utilization_percent,
                memory_used_mb: 2048,
                memory_total_mb: 8192,
                temperature_c: Some(60.0),
            }]))
        }
    }

    #[async_trait]
    impl GpuProbe for MockGpuProbe {
        async fn query(&self) -> Option<Vec<GpuMetrics>> {
            self.gpus.clone()
        }
    }
}
