use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use super::snapshot::{DiskUsage, HostInfo, MemoryInfo, NetCounters, Partition};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0} is unavailable")]
    Unavailable(&'static str),

    #[error("process {0} is gone")]
    ProcessGone(u32),

    #[error("no usage data for mount {}", .0.display())]
    MountNotFound(PathBuf),

    #[error("socket table query failed: {0}")]
    Sockets(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Point-in-time OS metrics. Every query fails independently.
///
/// Per-process queries go through a `Handle` obtained from [`open_process`],
/// which the caller is expected to keep for as long as the PID stays alive:
/// providers may hang rate baselines (CPU percent) off it.
///
/// [`open_process`]: MetricsProvider::open_process
pub trait MetricsProvider {
    type Handle;

    /// System-wide CPU utilization over `window`. Blocks for the window.
    fn cpu_percent(&mut self, window: Duration) -> ProviderResult<f64>;

    fn memory(&mut self) -> ProviderResult<MemoryInfo>;

    fn partitions(&mut self) -> ProviderResult<Vec<Partition>>;

    fn disk_usage(&mut self, mount_point: &Path) -> ProviderResult<DiskUsage>;

    fn host_info(&mut self) -> ProviderResult<HostInfo>;

    /// Per-interface counters, or a single aggregate entry.
    fn net_counters(&mut self) -> ProviderResult<Vec<NetCounters>>;

    fn pids(&mut self) -> ProviderResult<Vec<u32>>;

    fn open_process(&mut self, pid: u32) -> ProviderResult<Self::Handle>;

    fn process_name(&mut self, handle: &mut Self::Handle) -> ProviderResult<String>;

    /// Percent since the previous call on the same handle.
    fn process_cpu_percent(&mut self, handle: &mut Self::Handle) -> ProviderResult<f64>;

    fn process_memory(&mut self, handle: &mut Self::Handle) -> ProviderResult<u64>;

    /// Lifetime bytes read + written.
    fn process_io_bytes(&mut self, handle: &mut Self::Handle) -> ProviderResult<u64>;

    fn process_connections(&mut self, handle: &mut Self::Handle) -> ProviderResult<usize>;
}
