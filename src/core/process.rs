/// One process's metrics at one poll.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSample {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
    pub resident_memory_bytes: u64,
    pub cumulative_disk_bytes: u64,     // Lifetime read + written bytes
    pub disk_rate_bytes_per_sec: u64,   // Derived from the previous sample of this PID
    pub net_connection_count: usize,
}

impl ProcessSample {
    pub fn new(pid: u32, name: impl Into<String>) -> Self {
        Self {
            pid,
            name: name.into(),
            cpu_percent: 0.0,
            resident_memory_bytes: 0,
            cumulative_disk_bytes: 0,
            disk_rate_bytes_per_sec: 0,
            net_connection_count: 0,
        }
    }

    pub fn with_cpu(mut self, cpu_percent: f64) -> Self {
        self.cpu_percent = cpu_percent;
        self
    }

    pub fn with_memory(mut self, bytes: u64) -> Self {
        self.resident_memory_bytes = bytes;
        self
    }

    pub fn with_disk_rate(mut self, bytes_per_sec: u64) -> Self {
        self.disk_rate_bytes_per_sec = bytes_per_sec;
        self
    }

    pub fn with_connections(mut self, count: usize) -> Self {
        self.net_connection_count = count;
        self
    }

    /// Display label, shortened for fixed-width tables.
    pub fn short_name(&self, max_chars: usize) -> String {
        if self.name.chars().count() <= max_chars {
            return self.name.clone();
        }
        let keep = max_chars.saturating_sub(3);
        let mut short: String = self.name.chars().take(keep).collect();
        short.push_str("...");
        short
    }
}
