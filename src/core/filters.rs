use super::snapshot::Partition;

/// Excludes virtual and loopback mounts by reserved device/mount prefixes.
#[derive(Debug, Clone, Default)]
pub struct MountFilter {
    pub device_prefixes: Vec<String>,
    pub mount_prefixes: Vec<String>,
}

impl MountFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.device_prefixes.push(prefix.into());
        self
    }

    pub fn with_mount_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.mount_prefixes.push(prefix.into());
        self
    }

    pub fn matches_partition(&self, partition: &Partition) -> bool {
        if self.device_prefixes.iter().any(|p| partition.device.starts_with(p.as_str())) {
            return false;
        }

        let mount = partition.mount_point.to_string_lossy();
        if self.mount_prefixes.iter().any(|p| mount.starts_with(p.as_str())) {
            return false;
        }

        true
    }
}

impl std::fmt::Display for MountFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();

        if !self.device_prefixes.is_empty() {
            parts.push(format!("devices: {}", self.device_prefixes.join(", ")));
        }

        if !self.mount_prefixes.is_empty() {
            parts.push(format!("mounts: {}", self.mount_prefixes.join(", ")));
        }

        if parts.is_empty() {
            write!(f, "No mount filters")
        } else {
            write!(f, "{}", parts.join("; "))
        }
    }
}
