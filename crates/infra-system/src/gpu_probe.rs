// GPU probe (nvidia-smi)
// reason: tokio process with timeout, absence of the tool is not an error
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use hostkeeper_core::domain::GpuMetrics;
use hostkeeper_core::port::GpuProbe;

const NVIDIA_SMI: &str = "nvidia-smi";
const QUERY_FIELDS: &str =
    "--query-gpu=index,name,utilization.gpu,memory.used,memory.total,temperature.gpu";
const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Queries NVIDIA devices through `nvidia-smi`
///
/// Returns None when the binary is missing, exits non-zero, times out or
/// prints nothing parseable.
pub struct NvidiaSmiProbe {
    program: String,
}

impl NvidiaSmiProbe {
    pub fn new() -> Self {
        Self {
            program: NVIDIA_SMI.to_string(),
        }
    }

    /// Use a different executable (absolute path or name on PATH)
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for NvidiaSmiProbe {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a numeric CSV field; `[N/A]` and friends yield None
fn number(field: &str) -> Option<f32> {
    field.trim().parse::<f32>().ok()
}

fn parse_line(line: &str) -> Option<GpuMetrics> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 6 {
        return None;
    }

    Some(GpuMetrics {
        index: fields[0].parse().ok()?,
        name: fields[1].to_string(),
        utilization_percent: number(fields[2])?,
        memory_used_mb: number(fields[3])? as u64,
        memory_total_mb: number(fields[4])? as u64,
        temperature_c: number(fields[5]),
    })
}

/// Parse `csv,noheader,nounits` output, skipping malformed lines
pub(crate) fn parse_output(stdout: &str) -> Option<Vec<GpuMetrics>> {
    let gpus: Vec<GpuMetrics> = stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let parsed = parse_line(line);
            if parsed.is_none() {
                debug!(line, "Skipping unparseable nvidia-smi line");
            }
            parsed
        })
        .collect();

    if gpus.is_empty() {
        None
    } else {
        Some(gpus)
    }
}

#[async_trait]
impl GpuProbe for NvidiaSmiProbe {
    async fn query(&self) -> Option<Vec<GpuMetrics>> {
        let child = Command::new(&self.program)
            .arg(QUERY_FIELDS)
            .arg("--format=csv,noheader,nounits")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                debug!(program = %self.program, error = %e, "GPU query unavailable");
                return None;
            }
        };

        let output = match timeout(QUERY_TIMEOUT, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                debug!(error = %e, "GPU query failed");
                return None;
            }
            Err(_) => {
                debug!(timeout_secs = QUERY_TIMEOUT.as_secs(), "GPU query timed out");
                return None;
            }
        };

        if !output.status.success() {
            debug!(status = %output.status, "GPU query exited with failure");
            return None;
        }

        let gpus = parse_output(&String::from_utf8_lossy(&output.stdout));
        debug!(count = gpus.as_ref().map_or(0, Vec::len), "GPU query completed");
        gpus
    }
}
