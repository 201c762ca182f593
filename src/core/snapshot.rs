use std::path::PathBuf;

use super::process::ProcessSample;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryInfo {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

impl MemoryInfo {
    pub fn used_ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.used as f64 / self.total as f64
    }
}

/// A mounted filesystem as enumerated by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub device: String,
    pub mount_point: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiskUsage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

impl DiskUsage {
    pub fn from_total_and_free(total: u64, free: u64) -> Self {
        Self {
            total,
            used: total.saturating_sub(free),
            free,
        }
    }

    pub fn used_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.used as f64 / self.total as f64 * 100.0
    }
}

/// Usage record for one mount in a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct DiskInfo {
    pub path: PathBuf,
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub used_percent: f64,
}

impl DiskInfo {
    pub fn new(path: PathBuf, usage: &DiskUsage) -> Self {
        Self {
            path,
            total: usage.total,
            used: usage.used,
            free: usage.free,
            used_percent: usage.used_percent(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostInfo {
    pub hostname: String,
    pub os: String,
    pub platform: String,
    pub uptime_secs: u64,
}

/// Cumulative byte counters for one interface, or the aggregate of all of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetCounters {
    pub interface: String,
    pub bytes_sent: u64,
    pub bytes_recv: u64,
}

/// One poll's full result. Immutable once produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemSnapshot {
    pub cpu_percent: f64,
    pub memory: MemoryInfo,
    pub disks: Vec<DiskInfo>,
    pub host: HostInfo,
    pub net_sent: u64,
    pub net_recv: u64,
    pub process_count: usize,

    pub top_cpu: Vec<ProcessSample>,
    pub top_memory: Vec<ProcessSample>,
    pub top_disk: Vec<ProcessSample>,
    pub top_net: Vec<ProcessSample>,
}

impl SystemSnapshot {
    pub fn net_total(&self) -> u64 {
        self.net_sent.saturating_add(self.net_recv)
    }
}
