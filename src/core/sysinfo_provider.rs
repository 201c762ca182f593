use std::collections::HashMap;
use std::path::Path;
use std::thread;
use std::time::Duration;

use netstat2::{get_sockets_info, AddressFamilyFlags, ProtocolFlags};
use sysinfo::{
    CpuRefreshKind, Disks, MemoryRefreshKind, Networks, Pid, ProcessRefreshKind, ProcessesToUpdate,
    RefreshKind, System, MINIMUM_CPU_UPDATE_INTERVAL,
};
use tracing::debug;

use super::provider::{MetricsProvider, ProviderError, ProviderResult};
use super::snapshot::{DiskUsage, HostInfo, MemoryInfo, NetCounters, Partition};

/// A PID known to be present in the provider's process table.
#[derive(Debug, Clone, Copy)]
pub struct ProcessHandle {
    pid: Pid,
}

/// Production provider: `sysinfo` for host, disk, network and process data,
/// `netstat2` for per-process socket counts.
///
/// Process CPU percent comes from sysinfo's own tracking between two
/// refreshes of the same process, so one instance must live for the whole run.
pub struct SysinfoProvider {
    system: System,
    disks: Disks,
    sockets_by_pid: Option<HashMap<u32, usize>>,
}

impl SysinfoProvider {
    pub fn new() -> Self {
        let refresh_kind = RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::nothing().with_cpu_usage())
            .with_memory(MemoryRefreshKind::everything())
            .with_processes(process_refresh_kind());

        Self {
            system: System::new_with_specifics(refresh_kind),
            disks: Disks::new(),
            sockets_by_pid: None,
        }
    }

    fn process(&self, handle: &ProcessHandle) -> ProviderResult<&sysinfo::Process> {
        self.system
            .process(handle.pid)
            .ok_or(ProviderError::ProcessGone(handle.pid.as_u32()))
    }
}

impl Default for SysinfoProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn process_refresh_kind() -> ProcessRefreshKind {
    ProcessRefreshKind::nothing()
        .with_cpu()
        .with_memory()
        .with_disk_usage()
}

fn count_sockets_by_pid() -> ProviderResult<HashMap<u32, usize>> {
    let af_flags = AddressFamilyFlags::IPV4 | AddressFamilyFlags::IPV6;
    let proto_flags = ProtocolFlags::TCP | ProtocolFlags::UDP;
    let sockets_info = get_sockets_info(af_flags, proto_flags)
        .map_err(|e| ProviderError::Sockets(e.to_string()))?;

    let mut counts = HashMap::new();
    for si in sockets_info {
        for pid in si.associated_pids {
            *counts.entry(pid).or_insert(0) += 1;
        }
    }
    Ok(counts)
}

impl MetricsProvider for SysinfoProvider {
    type Handle = ProcessHandle;

    fn cpu_percent(&mut self, window: Duration) -> ProviderResult<f64> {
        self.system.refresh_cpu_usage();
        thread::sleep(window.max(MINIMUM_CPU_UPDATE_INTERVAL));
        self.system.refresh_cpu_usage();

        if self.system.cpus().is_empty() {
            return Err(ProviderError::Unavailable("cpu usage"));
        }
        Ok(self.system.global_cpu_usage() as f64)
    }

    fn memory(&mut self) -> ProviderResult<MemoryInfo> {
        self.system.refresh_memory();

        let total = self.system.total_memory();
        if total == 0 {
            return Err(ProviderError::Unavailable("memory totals"));
        }
        Ok(MemoryInfo {
            total,
            used: self.system.used_memory(),
            free: self.system.free_memory(),
        })
    }

    fn partitions(&mut self) -> ProviderResult<Vec<Partition>> {
        self.disks = Disks::new_with_refreshed_list();

        Ok(self
            .disks
            .list()
            .iter()
            .map(|disk| Partition {
                device: disk.name().to_string_lossy().into_owned(),
                mount_point: disk.mount_point().to_path_buf(),
            })
            .collect())
    }

    // sysinfo only exposes space available to unprivileged users, so blocks
    // reserved for root count as used.
    fn disk_usage(&mut self, mount_point: &Path) -> ProviderResult<DiskUsage> {
        self.disks
            .list()
            .iter()
            .find(|disk| disk.mount_point() == mount_point)
            .map(|disk| DiskUsage::from_total_and_free(disk.total_space(), disk.available_space()))
            .ok_or_else(|| ProviderError::MountNotFound(mount_point.to_path_buf()))
    }

    fn host_info(&mut self) -> ProviderResult<HostInfo> {
        Ok(HostInfo {
            hostname: System::host_name().unwrap_or_default(),
            os: std::env::consts::OS.to_string(),
            platform: System::distribution_id(),
            uptime_secs: System::uptime(),
        })
    }

    fn net_counters(&mut self) -> ProviderResult<Vec<NetCounters>> {
        let networks = Networks::new_with_refreshed_list();
        if networks.list().is_empty() {
            return Err(ProviderError::Unavailable("network interfaces"));
        }

        let mut total = NetCounters {
            interface: "all".to_string(),
            ..Default::default()
        };
        for data in networks.list().values() {
            total.bytes_sent = total.bytes_sent.saturating_add(data.total_transmitted());
            total.bytes_recv = total.bytes_recv.saturating_add(data.total_received());
        }
        Ok(vec![total])
    }

    fn pids(&mut self) -> ProviderResult<Vec<u32>> {
        self.system
            .refresh_processes_specifics(ProcessesToUpdate::All, true, process_refresh_kind());

        self.sockets_by_pid = match count_sockets_by_pid() {
            Ok(counts) => Some(counts),
            Err(e) => {
                debug!(error = %e, "socket counts unavailable this poll");
                None
            }
        };

        let pids: Vec<u32> = self
            .system
            .processes()
            .iter()
            .filter(|(_, process)| process.thread_kind().is_none())
            .map(|(pid, _)| pid.as_u32())
            .collect();

        if pids.is_empty() {
            return Err(ProviderError::Unavailable("process table"));
        }
        Ok(pids)
    }

    fn open_process(&mut self, pid: u32) -> ProviderResult<ProcessHandle> {
        let pid = Pid::from_u32(pid);
        match self.system.process(pid) {
            Some(_) => Ok(ProcessHandle { pid }),
            None => Err(ProviderError::ProcessGone(pid.as_u32())),
        }
    }

    fn process_name(&mut self, handle: &mut ProcessHandle) -> ProviderResult<String> {
        Ok(self.process(handle)?.name().to_string_lossy().into_owned())
    }

    fn process_cpu_percent(&mut self, handle: &mut ProcessHandle) -> ProviderResult<f64> {
        Ok(self.process(handle)?.cpu_usage() as f64)
    }

    fn process_memory(&mut self, handle: &mut ProcessHandle) -> ProviderResult<u64> {
        Ok(self.process(handle)?.memory())
    }

    fn process_io_bytes(&mut self, handle: &mut ProcessHandle) -> ProviderResult<u64> {
        let usage = self.process(handle)?.disk_usage();
        Ok(usage.total_read_bytes.saturating_add(usage.total_written_bytes))
    }

    fn process_connections(&mut self, handle: &mut ProcessHandle) -> ProviderResult<usize> {
        let pid = handle.pid.as_u32();
        match &self.sockets_by_pid {
            Some(counts) => Ok(counts.get(&pid).copied().unwrap_or(0)),
            None => Err(ProviderError::Unavailable("socket table")),
        }
    }
}
