// Metric Sampler - one host sample checked against alert thresholds

use std::sync::Arc;
use tracing::debug;

use crate::application::JobContext;
use crate::domain::{JobKind, MaintenanceReport, ThresholdSet};
use crate::port::{GpuProbe, SystemProbe};

/// Samples CPU/RAM/disk once and classifies the host as
/// healthy (success) / warning / critical
pub struct MetricSampler {
    probe: Arc<dyn SystemProbe>,
    gpu: Option<Arc<dyn GpuProbe>>,
    context: JobContext,
}

impl MetricSampler {
    pub fn new(probe: Arc<dyn SystemProbe>, context: JobContext) -> Self {
        Self {
            probe,
            gpu: None,
            context,
        }
    }

    /// Enable GPU enrichment (queried once per sample)
    pub fn with_gpu(mut self, gpu: Arc<dyn GpuProbe>) -> Self {
        self.gpu = Some(gpu);
        self
    }

    pub async fn run(&self, thresholds: &ThresholdSet) -> MaintenanceReport {
        let mut report = self.context.begin(JobKind::Health);

        if let Err(e) = thresholds.validate() {
            return self.context.finish(report.fail("thresholds", e.to_string()));
        }

        let mut metrics = match self.probe.sample().await {
            Ok(metrics) => metrics,
            Err(e) => return self.context.finish(report.fail("host", e.to_string())),
        };

        if let Some(gpu) = &self.gpu {
            metrics.gpus = gpu.query().await.filter(|gpus| !gpus.is_empty());
            if metrics.gpus.is_none() {
                debug!("GPU capability present but returned no devices");
            }
        }

        let (status, alerts) = thresholds.evaluate(&metrics);
        for alert in alerts {
            self.context.record(&mut report, alert);
        }
        report.escalate(status);
        report.set_metrics(metrics);

        self.context.finish(report.finish())
    }
}
