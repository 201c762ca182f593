//! Scripted in-memory provider for exercising the sampler without an OS.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::provider::{MetricsProvider, ProviderError, ProviderResult};
use super::snapshot::{DiskUsage, HostInfo, MemoryInfo, NetCounters, Partition};

#[derive(Debug, Clone, Default)]
pub struct FakeProcess {
    pub name: Option<String>,
    pub cpu: Option<f64>,
    pub memory: Option<u64>,
    pub io: Option<u64>,
    pub connections: Option<usize>,
}

impl FakeProcess {
    pub fn new(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            cpu: Some(0.0),
            memory: Some(0),
            io: Some(0),
            connections: Some(0),
        }
    }

    /// Every per-field query fails.
    pub fn unreadable() -> Self {
        Self::default()
    }

    pub fn cpu(mut self, percent: f64) -> Self {
        self.cpu = Some(percent);
        self
    }

    pub fn memory(mut self, bytes: u64) -> Self {
        self.memory = Some(bytes);
        self
    }

    pub fn io(mut self, bytes: u64) -> Self {
        self.io = Some(bytes);
        self
    }

    pub fn connections(mut self, count: usize) -> Self {
        self.connections = Some(count);
        self
    }
}

#[derive(Debug)]
pub struct FakeHandle {
    pid: u32,
}

#[derive(Debug, Default)]
pub struct FakeProvider {
    pub cpu: Option<f64>,
    pub memory: Option<MemoryInfo>,
    pub host: Option<HostInfo>,
    pub net: Option<Vec<NetCounters>>,
    pub partitions: Option<Vec<Partition>>,
    pub usage: HashMap<PathBuf, DiskUsage>,
    pub processes: BTreeMap<u32, FakeProcess>,
    pub unopenable: HashSet<u32>,
    pub enumeration_fails: bool,

    pub opened: Vec<u32>,
    pub usage_queries: Vec<PathBuf>,
    pub cpu_windows: Vec<Duration>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            partitions: Some(Vec::new()),
            ..Default::default()
        }
    }

    /// Every query fails.
    pub fn unavailable() -> Self {
        Self {
            enumeration_fails: true,
            ..Default::default()
        }
    }

    pub fn add_process(&mut self, pid: u32, process: FakeProcess) {
        self.processes.insert(pid, process);
    }

    pub fn remove_process(&mut self, pid: u32) {
        self.processes.remove(&pid);
    }

    pub fn process_mut(&mut self, pid: u32) -> &mut FakeProcess {
        self.processes.entry(pid).or_default()
    }

    pub fn add_mount(&mut self, device: &str, mount: &str, usage: Option<DiskUsage>) {
        let mount_point = PathBuf::from(mount);
        if let Some(usage) = usage {
            self.usage.insert(mount_point.clone(), usage);
        }
        self.partitions.get_or_insert_with(Vec::new).push(Partition {
            device: device.to_string(),
            mount_point,
        });
    }

    fn process(&self, handle: &FakeHandle) -> ProviderResult<&FakeProcess> {
        self.processes
            .get(&handle.pid)
            .ok_or(ProviderError::ProcessGone(handle.pid))
    }
}

impl MetricsProvider for FakeProvider {
    type Handle = FakeHandle;

    fn cpu_percent(&mut self, window: Duration) -> ProviderResult<f64> {
        self.cpu_windows.push(window);
        self.cpu.ok_or(ProviderError::Unavailable("cpu"))
    }

    fn memory(&mut self) -> ProviderResult<MemoryInfo> {
        self.memory.clone().ok_or(ProviderError::Unavailable("memory"))
    }

    fn partitions(&mut self) -> ProviderResult<Vec<Partition>> {
        self.partitions.clone().ok_or(ProviderError::Unavailable("partitions"))
    }

    fn disk_usage(&mut self, mount_point: &Path) -> ProviderResult<DiskUsage> {
        self.usage_queries.push(mount_point.to_path_buf());
        self.usage
            .get(mount_point)
            .cloned()
            .ok_or_else(|| ProviderError::MountNotFound(mount_point.to_path_buf()))
    }

    fn host_info(&mut self) -> ProviderResult<HostInfo> {
        self.host.clone().ok_or(ProviderError::Unavailable("host"))
    }

    fn net_counters(&mut self) -> ProviderResult<Vec<NetCounters>> {
        self.net.clone().ok_or(ProviderError::Unavailable("network"))
    }

    fn pids(&mut self) -> ProviderResult<Vec<u32>> {
        if self.enumeration_fails {
            return Err(ProviderError::Unavailable("process table"));
        }
        Ok(self.processes.keys().copied().collect())
    }

    fn open_process(&mut self, pid: u32) -> ProviderResult<FakeHandle> {
        if self.unopenable.contains(&pid) || !self.processes.contains_key(&pid) {
            return Err(ProviderError::ProcessGone(pid));
        }
        self.opened.push(pid);
        Ok(FakeHandle { pid })
    }

    fn process_name(&mut self, handle: &mut FakeHandle) -> ProviderResult<String> {
        self.process(handle)?
            .name
            .clone()
            .ok_or(ProviderError::Unavailable("name"))
    }

    fn process_cpu_percent(&mut self, handle: &mut FakeHandle) -> ProviderResult<f64> {
        self.process(handle)?.cpu.ok_or(ProviderError::Unavailable("cpu"))
    }

    fn process_memory(&mut self, handle: &mut FakeHandle) -> ProviderResult<u64> {
        self.process(handle)?.memory.ok_or(ProviderError::Unavailable("memory"))
    }

    fn process_io_bytes(&mut self, handle: &mut FakeHandle) -> ProviderResult<u64> {
        self.process(handle)?.io.ok_or(ProviderError::Unavailable("io"))
    }

    fn process_connections(&mut self, handle: &mut FakeHandle) -> ProviderResult<usize> {
        self.process(handle)?
            .connections
            .ok_or(ProviderError::Unavailable("connections"))
    }
}
