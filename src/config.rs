//! Startup configuration: TOML file, then command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::core::filters::MountFilter;
use crate::core::ranker::DEFAULT_TOP_N;
use crate::core::sampler::SamplerSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sampler: SamplerConfig,
    pub disks: DisksConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Time between polls
    pub refresh_ms: u64,
    /// Blocking window for the system-wide CPU sample
    pub cpu_window_ms: u64,
    /// Entries per ranked list
    pub top_n: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DisksConfig {
    pub exclude_device_prefixes: Vec<String>,
    pub exclude_mount_prefixes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    /// Log output file. Logging is off without one: the terminal belongs to the UI.
    pub file: Option<PathBuf>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            refresh_ms: 1000,
            cpu_window_ms: 200,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl Default for DisksConfig {
    fn default() -> Self {
        Self {
            exclude_device_prefixes: vec!["/dev/loop".to_string()],
            exclude_mount_prefixes: vec!["/snap/".to_string()],
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Defaults when `path` is `None`; otherwise the file must exist and parse.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(data: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(data)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sampler.top_n == 0 {
            return Err(ConfigError::Invalid("sampler.top_n must be at least 1".into()));
        }
        if self.sampler.cpu_window_ms == 0 {
            return Err(ConfigError::Invalid("sampler.cpu_window_ms must be positive".into()));
        }
        if self.sampler.refresh_ms <= self.sampler.cpu_window_ms {
            return Err(ConfigError::Invalid(format!(
                "sampler.refresh_ms ({}) must exceed sampler.cpu_window_ms ({})",
                self.sampler.refresh_ms, self.sampler.cpu_window_ms
            )));
        }
        Ok(())
    }

    pub fn refresh(&self) -> Duration {
        Duration::from_millis(self.sampler.refresh_ms)
    }

    pub fn sampler_settings(&self) -> SamplerSettings {
        SamplerSettings {
            cpu_window: Duration::from_millis(self.sampler.cpu_window_ms),
            top_n: self.sampler.top_n,
            mount_filter: self.mount_filter(),
        }
    }

    pub fn mount_filter(&self) -> MountFilter {
        let filter = self
            .disks
            .exclude_device_prefixes
            .iter()
            .fold(MountFilter::new(), |f, p| f.with_device_prefix(p.clone()));
        self.disks
            .exclude_mount_prefixes
            .iter()
            .fold(filter, |f, p| f.with_mount_prefix(p.clone()))
    }
}
