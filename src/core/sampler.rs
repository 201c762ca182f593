use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use super::filters::MountFilter;
use super::process::ProcessSample;
use super::provider::{MetricsProvider, ProviderError, ProviderResult};
use super::ranker::{rank_all, DEFAULT_TOP_N};
use super::snapshot::{DiskInfo, SystemSnapshot};

pub const DEFAULT_CPU_WINDOW: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct SamplerSettings {
    pub cpu_window: Duration,
    pub top_n: usize,
    pub mount_filter: MountFilter,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            cpu_window: DEFAULT_CPU_WINDOW,
            top_n: DEFAULT_TOP_N,
            mount_filter: MountFilter::new()
                .with_device_prefix("/dev/loop")
                .with_mount_prefix("/snap/"),
        }
    }
}

/// Polls a [`MetricsProvider`] and differences per-process counters between polls.
///
/// Process handles and the last good I/O reading of every live PID are kept
/// across polls and retired as soon as the PID drops out of the live enumeration.
/// Not meant to be polled from two threads at once; see [`Poller`](super::poller::Poller).
pub struct Sampler<P: MetricsProvider> {
    provider: P,
    settings: SamplerSettings,
    handles: HashMap<u32, P::Handle>,
    io_baselines: HashMap<u32, IoReading>,
    last_time: Instant,
}

/// Cumulative I/O counter as last read successfully, and when.
#[derive(Debug, Clone, Copy)]
struct IoReading {
    bytes: u64,
    at: Instant,
}

impl<P: MetricsProvider> Sampler<P> {
    pub fn new(provider: P, settings: SamplerSettings) -> Self {
        Self::starting_at(provider, settings, Instant::now())
    }

    pub fn starting_at(provider: P, settings: SamplerSettings, start: Instant) -> Self {
        Self {
            provider,
            settings,
            handles: HashMap::new(),
            io_baselines: HashMap::new(),
            last_time: start,
        }
    }

    pub fn settings(&self) -> &SamplerSettings {
        &self.settings
    }

    pub fn poll(&mut self) -> SystemSnapshot {
        let mut snapshot = self.sample_system();
        self.sample_processes(Instant::now(), &mut snapshot);
        snapshot
    }

    /// Like [`poll`](Self::poll), with the process section stamped at `now`.
    pub fn poll_at(&mut self, now: Instant) -> SystemSnapshot {
        let mut snapshot = self.sample_system();
        self.sample_processes(now, &mut snapshot);
        snapshot
    }

    fn sample_system(&mut self) -> SystemSnapshot {
        let mut snapshot = SystemSnapshot {
            cpu_percent: or_default("system cpu", self.provider.cpu_percent(self.settings.cpu_window)),
            memory: or_default("memory", self.provider.memory()),
            host: or_default("host info", self.provider.host_info()),
            ..Default::default()
        };

        snapshot.disks = self.sample_disks();

        let counters = or_default("network counters", self.provider.net_counters());
        if let Some(first) = counters.into_iter().next() {
            snapshot.net_sent = first.bytes_sent;
            snapshot.net_recv = first.bytes_recv;
        }

        snapshot
    }

    fn sample_disks(&mut self) -> Vec<DiskInfo> {
        let partitions = or_default("disk partitions", self.provider.partitions());

        let filter = &self.settings.mount_filter;
        let mounts: Vec<PathBuf> = partitions
            .into_iter()
            .filter(|p| filter.matches_partition(p))
            .map(|p| p.mount_point)
            .collect();

        let mut disks = Vec::with_capacity(mounts.len());
        for mount in mounts {
            match self.provider.disk_usage(&mount) {
                Ok(usage) => disks.push(DiskInfo::new(mount, &usage)),
                Err(e) => trace!(mount = %mount.display(), error = %e, "skipping mount"),
            }
        }
        disks
    }

    fn sample_processes(&mut self, now: Instant, snapshot: &mut SystemSnapshot) {
        let pids = match self.provider.pids() {
            Ok(pids) => pids,
            Err(e) => {
                warn!(error = %e, "process enumeration failed");
                return;
            }
        };

        let elapsed = rate_window(self.last_time, now);

        let mut samples = Vec::with_capacity(pids.len());
        for &pid in &pids {
            if let Some(sample) = self.sample_process(pid, now) {
                samples.push(sample);
            }
        }

        self.last_time = now;
        let retired = self.purge(&pids);

        debug!(
            processes = samples.len(),
            tracked = self.handles.len(),
            retired,
            elapsed_secs = elapsed,
            "poll complete"
        );

        let rankings = rank_all(&samples, self.settings.top_n);
        snapshot.process_count = samples.len();
        snapshot.top_cpu = rankings.cpu;
        snapshot.top_memory = rankings.memory;
        snapshot.top_disk = rankings.disk;
        snapshot.top_net = rankings.net;
    }

    fn sample_process(&mut self, pid: u32, now: Instant) -> Option<ProcessSample> {
        let handle = match self.handles.entry(pid) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => match self.provider.open_process(pid) {
                Ok(handle) => entry.insert(handle),
                Err(e) => {
                    trace!(pid, error = %e, "process not acquirable, skipping");
                    return None;
                }
            },
        };

        let provider = &mut self.provider;
        let name = process_field(pid, "name", provider.process_name(handle));
        let cpu_percent = process_field(pid, "cpu", provider.process_cpu_percent(handle));
        let resident_memory_bytes = process_field(pid, "memory", provider.process_memory(handle));
        let io_bytes = match provider.process_io_bytes(handle) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                trace!(pid, what = "io", error = %e, "process query failed");
                None
            }
        };

        // A failed read leaves the previous baseline in place for the next poll.
        let disk_rate_bytes_per_sec = match (io_bytes, self.io_baselines.get(&pid)) {
            (Some(current), Some(previous)) => {
                disk_rate(previous.bytes, current, rate_window(previous.at, now))
            }
            _ => 0,
        };
        if let Some(bytes) = io_bytes {
            self.io_baselines.insert(pid, IoReading { bytes, at: now });
        }

        let net_connection_count =
            process_field(pid, "connections", provider.process_connections(handle));

        Some(ProcessSample {
            pid,
            name,
            cpu_percent,
            resident_memory_bytes,
            cumulative_disk_bytes: io_bytes.unwrap_or_default(),
            disk_rate_bytes_per_sec,
            net_connection_count,
        })
    }

    /// Drops cached state for every PID not in `live`. Returns how many were dropped.
    fn purge(&mut self, live: &[u32]) -> usize {
        let live: HashSet<u32> = live.iter().copied().collect();
        let before = self.handles.len();

        self.handles.retain(|pid, _| live.contains(pid));
        self.io_baselines.retain(|pid, _| live.contains(pid));

        before - self.handles.len()
    }
}

/// Seconds between two polls, floored to 1 when the clock did not move forward.
pub fn rate_window(last: Instant, now: Instant) -> f64 {
    let secs = now.saturating_duration_since(last).as_secs_f64();
    if secs > 0.0 {
        secs
    } else {
        1.0
    }
}

/// Bytes per second between two cumulative readings. A counter that went
/// backwards (reset, PID reuse) reads as 0.
pub fn disk_rate(previous: u64, current: u64, elapsed_secs: f64) -> u64 {
    if current < previous {
        return 0;
    }
    let elapsed = if elapsed_secs > 0.0 { elapsed_secs } else { 1.0 };
    ((current - previous) as f64 / elapsed) as u64
}

fn or_default<T: Default>(what: &'static str, result: ProviderResult<T>) -> T {
    result.unwrap_or_else(|e: ProviderError| {
        debug!(what, error = %e, "sub-query failed");
        T::default()
    })
}

fn process_field<T: Default>(pid: u32, what: &'static str, result: ProviderResult<T>) -> T {
    result.unwrap_or_else(|e| {
        trace!(pid, what, error = %e, "process query failed");
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fake::{FakeProcess, FakeProvider};
    use crate::core::snapshot::{DiskUsage, HostInfo, MemoryInfo, NetCounters};

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    fn sampler(provider: FakeProvider, start: Instant) -> Sampler<FakeProvider> {
        Sampler::starting_at(provider, SamplerSettings::default(), start)
    }

    fn find(snapshot: &SystemSnapshot, pid: u32) -> Option<&ProcessSample> {
        snapshot.top_memory.iter().find(|s| s.pid == pid)
    }

    #[test]
    fn disk_rate_follows_counter_and_clamps_resets() {
        let t0 = Instant::now();
        let mut provider = FakeProvider::new();
        provider.add_process(100, FakeProcess::new("worker").io(1000));
        let mut sampler = sampler(provider, t0);

        let first = sampler.poll_at(t0);
        assert_eq!(find(&first, 100).map(|s| s.disk_rate_bytes_per_sec), Some(0));

        sampler.provider.process_mut(100).io = Some(3000);
        let second = sampler.poll_at(t0 + secs(1));
        assert_eq!(find(&second, 100).map(|s| s.disk_rate_bytes_per_sec), Some(2000));

        sampler.provider.process_mut(100).io = Some(2500);
        let third = sampler.poll_at(t0 + secs(2));
        assert_eq!(find(&third, 100).map(|s| s.disk_rate_bytes_per_sec), Some(0));
    }

    #[test]
    fn first_sighting_has_zero_rate() {
        let t0 = Instant::now();
        let mut provider = FakeProvider::new();
        provider.add_process(1, FakeProcess::new("old").io(10));
        let mut sampler = sampler(provider, t0);
        sampler.poll_at(t0);

        sampler.provider.add_process(2, FakeProcess::new("new").io(1_000_000));
        let snapshot = sampler.poll_at(t0 + secs(1));
        assert_eq!(find(&snapshot, 2).map(|s| s.disk_rate_bytes_per_sec), Some(0));
    }

    #[test]
    fn rate_divides_by_elapsed_time() {
        let t0 = Instant::now();
        let mut provider = FakeProvider::new();
        provider.add_process(5, FakeProcess::new("copy").io(0));
        let mut sampler = sampler(provider, t0);
        sampler.poll_at(t0);

        sampler.provider.process_mut(5).io = Some(8000);
        let snapshot = sampler.poll_at(t0 + secs(4));
        assert_eq!(find(&snapshot, 5).map(|s| s.disk_rate_bytes_per_sec), Some(2000));
    }

    #[test]
    fn clock_that_did_not_advance_floors_to_one_second() {
        let t0 = Instant::now() + secs(10);
        let mut provider = FakeProvider::new();
        provider.add_process(5, FakeProcess::new("copy").io(0));
        let mut sampler = sampler(provider, t0);
        sampler.poll_at(t0);

        sampler.provider.process_mut(5).io = Some(500);
        let same_instant = sampler.poll_at(t0);
        assert_eq!(find(&same_instant, 5).map(|s| s.disk_rate_bytes_per_sec), Some(500));

        sampler.provider.process_mut(5).io = Some(800);
        let backwards = sampler.poll_at(t0 - secs(5));
        assert_eq!(find(&backwards, 5).map(|s| s.disk_rate_bytes_per_sec), Some(300));
    }

    #[test]
    fn exited_processes_are_purged_from_both_caches() {
        let t0 = Instant::now();
        let mut provider = FakeProvider::new();
        provider.add_process(7, FakeProcess::new("short-lived").memory(1 << 30));
        provider.add_process(8, FakeProcess::new("daemon").memory(1 << 20));
        let mut sampler = sampler(provider, t0);

        sampler.poll_at(t0);
        assert!(sampler.handles.contains_key(&7));
        assert!(sampler.io_baselines.contains_key(&7));

        sampler.provider.remove_process(7);
        let snapshot = sampler.poll_at(t0 + secs(1));

        assert!(!sampler.handles.contains_key(&7));
        assert!(!sampler.io_baselines.contains_key(&7));
        for list in [&snapshot.top_cpu, &snapshot.top_memory, &snapshot.top_disk, &snapshot.top_net] {
            assert!(list.iter().all(|s| s.pid != 7));
        }
        assert_eq!(sampler.handles.len(), 1);
    }

    #[test]
    fn handles_are_acquired_once_per_pid() {
        let t0 = Instant::now();
        let mut provider = FakeProvider::new();
        provider.add_process(1, FakeProcess::new("a"));
        provider.add_process(2, FakeProcess::new("b"));
        let mut sampler = sampler(provider, t0);

        for tick in 0..3 {
            sampler.poll_at(t0 + secs(tick));
        }
        assert_eq!(sampler.provider.opened, vec![1, 2]);
    }

    #[test]
    fn unacquirable_process_is_skipped_without_affecting_others() {
        let t0 = Instant::now();
        let mut provider = FakeProvider::new();
        provider.add_process(1, FakeProcess::new("alive"));
        provider.add_process(2, FakeProcess::new("racing"));
        provider.unopenable.insert(2);
        let mut sampler = sampler(provider, t0);

        let snapshot = sampler.poll_at(t0);
        assert_eq!(snapshot.process_count, 1);
        assert!(find(&snapshot, 1).is_some());
        assert!(find(&snapshot, 2).is_none());
        assert!(!sampler.handles.contains_key(&2));
        assert!(!sampler.io_baselines.contains_key(&2));
    }

    #[test]
    fn failing_process_queries_default_to_zero() {
        let t0 = Instant::now();
        let mut provider = FakeProvider::new();
        provider.add_process(9, FakeProcess::unreadable());
        let mut sampler = sampler(provider, t0);

        let snapshot = sampler.poll_at(t0);
        let sample = find(&snapshot, 9).cloned();
        assert_eq!(
            sample,
            Some(ProcessSample {
                pid: 9,
                name: String::new(),
                cpu_percent: 0.0,
                resident_memory_bytes: 0,
                cumulative_disk_bytes: 0,
                disk_rate_bytes_per_sec: 0,
                net_connection_count: 0,
            })
        );
    }

    #[test]
    fn failed_io_read_keeps_previous_baseline() {
        let t0 = Instant::now();
        let mut provider = FakeProvider::new();
        provider.add_process(100, FakeProcess::new("worker").io(1000));
        let mut sampler = sampler(provider, t0);
        sampler.poll_at(t0);

        sampler.provider.process_mut(100).io = None;
        let failed = sampler.poll_at(t0 + secs(1));
        let sample = find(&failed, 100).expect("pid stays listed");
        assert_eq!((sample.cumulative_disk_bytes, sample.disk_rate_bytes_per_sec), (0, 0));

        sampler.provider.process_mut(100).io = Some(3000);
        let recovered = sampler.poll_at(t0 + secs(2));
        assert_eq!(find(&recovered, 100).map(|s| s.disk_rate_bytes_per_sec), Some(1000));
    }

    #[test]
    fn io_unreadable_on_first_sighting_has_no_baseline() {
        let t0 = Instant::now();
        let mut provider = FakeProvider::new();
        provider.add_process(4, FakeProcess::new("late"));
        provider.process_mut(4).io = None;
        let mut sampler = sampler(provider, t0);
        sampler.poll_at(t0);
        assert!(!sampler.io_baselines.contains_key(&4));

        sampler.provider.process_mut(4).io = Some(1_000_000);
        let snapshot = sampler.poll_at(t0 + secs(1));
        assert_eq!(find(&snapshot, 4).map(|s| s.disk_rate_bytes_per_sec), Some(0));
    }

    #[test]
    fn failed_mount_is_left_out() {
        let mut provider = FakeProvider::new();
        provider.add_mount("/dev/sda1", "/", Some(DiskUsage::from_total_and_free(100, 40)));
        provider.add_mount("/dev/sdb1", "/data", None);
        provider.add_mount("/dev/sdc1", "/backup", Some(DiskUsage::from_total_and_free(200, 50)));
        let mut sampler = sampler(provider, Instant::now());

        let snapshot = sampler.poll();
        let mounts: Vec<_> = snapshot.disks.iter().map(|d| d.path.clone()).collect();
        assert_eq!(mounts, vec![PathBuf::from("/"), PathBuf::from("/backup")]);
        assert_eq!(snapshot.disks[0].used, 60);
        assert!((snapshot.disks[0].used_percent - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn loop_and_snap_mounts_are_filtered() {
        let mut provider = FakeProvider::new();
        provider.add_mount("/dev/sda1", "/", Some(DiskUsage::from_total_and_free(10, 5)));
        provider.add_mount("/dev/loop4", "/mnt/iso", Some(DiskUsage::from_total_and_free(10, 0)));
        provider.add_mount("/dev/sdd1", "/snap/core/17", Some(DiskUsage::from_total_and_free(10, 0)));
        let mut sampler = sampler(provider, Instant::now());

        let snapshot = sampler.poll();
        assert_eq!(snapshot.disks.len(), 1);
        assert_eq!(sampler.provider.usage_queries, vec![PathBuf::from("/")]);
    }

    #[test]
    fn system_section_is_copied_through() {
        let mut provider = FakeProvider::new();
        provider.cpu = Some(37.5);
        provider.memory = Some(MemoryInfo { total: 16, used: 4, free: 12 });
        provider.host = Some(HostInfo {
            hostname: "box".into(),
            os: "linux".into(),
            platform: "debian".into(),
            uptime_secs: 3600,
        });
        provider.net = Some(vec![
            NetCounters { interface: "eth0".into(), bytes_sent: 10, bytes_recv: 20 },
            NetCounters { interface: "wlan0".into(), bytes_sent: 99, bytes_recv: 99 },
        ]);
        let mut sampler = sampler(provider, Instant::now());

        let snapshot = sampler.poll();
        assert_eq!(snapshot.cpu_percent, 37.5);
        assert_eq!(snapshot.memory.used, 4);
        assert_eq!(snapshot.host.hostname, "box");
        assert_eq!((snapshot.net_sent, snapshot.net_recv), (10, 20));
        assert_eq!(sampler.provider.cpu_windows, vec![DEFAULT_CPU_WINDOW]);
    }

    #[test]
    fn unavailable_provider_yields_zeroed_snapshot() {
        let mut sampler = sampler(FakeProvider::unavailable(), Instant::now());
        assert_eq!(sampler.poll(), SystemSnapshot::default());
    }

    #[test]
    fn failed_enumeration_keeps_caches() {
        let t0 = Instant::now();
        let mut provider = FakeProvider::new();
        provider.add_process(3, FakeProcess::new("kept").io(100));
        let mut sampler = sampler(provider, t0);
        sampler.poll_at(t0);

        sampler.provider.enumeration_fails = true;
        let snapshot = sampler.poll_at(t0 + secs(1));
        assert!(snapshot.top_cpu.is_empty());
        assert!(sampler.handles.contains_key(&3));

        sampler.provider.enumeration_fails = false;
        sampler.provider.process_mut(3).io = Some(700);
        let snapshot = sampler.poll_at(t0 + secs(2));
        assert_eq!(find(&snapshot, 3).map(|s| s.disk_rate_bytes_per_sec), Some(300));
    }

    #[test]
    fn top_lists_respect_configured_limit() {
        let t0 = Instant::now();
        let mut provider = FakeProvider::new();
        for pid in 1..=12 {
            provider.add_process(pid, FakeProcess::new("p").cpu(pid as f64).connections(1));
        }
        let mut sampler = sampler(provider, t0);

        let snapshot = sampler.poll_at(t0);
        assert_eq!(snapshot.process_count, 12);
        assert_eq!(snapshot.top_cpu.len(), 5);
        assert_eq!(snapshot.top_net.len(), 5);
        assert_eq!(snapshot.top_cpu[0].pid, 12);
        assert_eq!(
            snapshot.top_net.iter().map(|s| s.pid).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5]
        );
    }

    #[test]
    fn rate_helpers_handle_edge_cases() {
        assert_eq!(disk_rate(1000, 3000, 1.0), 2000);
        assert_eq!(disk_rate(3000, 2500, 1.0), 0);
        assert_eq!(disk_rate(0, 100, 0.0), 100);
        assert_eq!(disk_rate(0, 100, -3.0), 100);

        let now = Instant::now();
        assert_eq!(rate_window(now, now), 1.0);
        assert_eq!(rate_window(now, now + Duration::from_millis(500)), 0.5);
    }
}
