use std::cmp::Ordering;

use super::process::ProcessSample;

pub const DEFAULT_TOP_N: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankMetric {
    Cpu,
    Memory,
    DiskRate,
    Connections,
}

impl RankMetric {
    pub const ALL: [RankMetric; 4] = [
        RankMetric::Cpu,
        RankMetric::Memory,
        RankMetric::DiskRate,
        RankMetric::Connections,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RankMetric::Cpu => "Top CPU",
            RankMetric::Memory => "Top Mem",
            RankMetric::DiskRate => "Top Disk I/O",
            RankMetric::Connections => "Top Net Conns",
        }
    }

    /// Metric descending, then PID ascending.
    pub fn compare(&self, a: &ProcessSample, b: &ProcessSample) -> Ordering {
        let by_metric = match self {
            RankMetric::Cpu => b.cpu_percent.total_cmp(&a.cpu_percent),
            RankMetric::Memory => b.resident_memory_bytes.cmp(&a.resident_memory_bytes),
            RankMetric::DiskRate => b.disk_rate_bytes_per_sec.cmp(&a.disk_rate_bytes_per_sec),
            RankMetric::Connections => b.net_connection_count.cmp(&a.net_connection_count),
        };
        by_metric.then_with(|| a.pid.cmp(&b.pid))
    }
}

/// The four ranked views of one poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rankings {
    pub cpu: Vec<ProcessSample>,
    pub memory: Vec<ProcessSample>,
    pub disk: Vec<ProcessSample>,
    pub net: Vec<ProcessSample>,
}

pub fn top_n(samples: &[ProcessSample], metric: RankMetric, limit: usize) -> Vec<ProcessSample> {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| metric.compare(a, b));
    sorted.truncate(limit);
    sorted
}

pub fn rank_all(samples: &[ProcessSample], limit: usize) -> Rankings {
    Rankings {
        cpu: top_n(samples, RankMetric::Cpu, limit),
        memory: top_n(samples, RankMetric::Memory, limit),
        disk: top_n(samples, RankMetric::DiskRate, limit),
        net: top_n(samples, RankMetric::Connections, limit),
    }
}
