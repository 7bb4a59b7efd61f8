// Host resource metrics (one sample)

use serde::{Deserialize, Serialize};

/// Host resource metrics captured by a single probe sample
///
/// Percentages are in the 0.0 - 100.0 range. Absolute figures are kept
/// alongside so callers can apply their own policy later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostMetrics {
    pub cpu_percent: f32,
    pub ram_percent: f32,
    pub disk_percent: f32,
    pub memory_used_mb: u64,
    pub memory_total_mb: u64,
    pub disk_used_gb: u64,
    pub disk_total_gb: u64,
    /// None when no GPU capability is available on this host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpus: Option<Vec<GpuMetrics>>,
}

/// Per-device GPU metrics (best-effort enrichment)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuMetrics {
    pub index: u32,
    pub name: String,
    pub utilization_percent: f32,
    pub memory_used_mb: u64,
    pub memory_total_mb: u64,
    pub temperature_c: Option<f32>,
}

impl GpuMetrics {
    pub fn memory_percent(&self) -> f32 {
        if self.memory_total_mb == 0 {
            return 0.0;
        }
        self.memory_used_mb as f32 / self.memory_total_mb as f32 * 100.0
    }
}
