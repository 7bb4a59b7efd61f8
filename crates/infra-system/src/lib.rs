// Hostkeeper Infrastructure - Host Adapters
// Implements: SystemProbe, GpuProbe

pub mod gpu_probe;
pub mod system_probe_impl;

pub use gpu_probe::NvidiaSmiProbe;
pub use system_probe_impl::SystemProbeImpl;
