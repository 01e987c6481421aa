//! Marshalling configuration loaded from TOML
//!
//! Every field has a default, so an empty document is a valid config.

use crate::error::Result;
use crate::memory::{BufferPool, MultiBufferPool, SynchronizedPool};
use crate::platform::{Cpu, Os, Platform};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarshalConfig {
    #[serde(default)]
    pub pool: PoolSettings,

    #[serde(default)]
    pub platform: PlatformSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSettings {
    /// Largest request served from a bucket; larger requests allocate directly
    #[serde(default = "default_max_buffer_size")]
    pub max_buffer_size: usize,

    #[serde(default = "default_max_items_per_size")]
    pub max_items_per_size: usize,

    /// Wrap the pool in a mutex so it can be shared between threads
    #[serde(default)]
    pub thread_safe: bool,
}

/// Target platform override, the host when unset
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformSettings {
    #[serde(default)]
    pub os: Option<Os>,

    #[serde(default)]
    pub cpu: Option<Cpu>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,

    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_buffer_size: default_max_buffer_size(),
            max_items_per_size: default_max_items_per_size(),
            thread_safe: false,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
            file: None,
        }
    }
}

fn default_max_buffer_size() -> usize { 8192 }
fn default_max_items_per_size() -> usize { 16 }
fn default_level() -> String { "info".to_string() }

impl MarshalConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

impl PoolSettings {
    /// Build the configured pool
    pub fn build(&self) -> Box<dyn BufferPool + Send> {
        let pool = MultiBufferPool::new(self.max_buffer_size, self.max_items_per_size);
        if self.thread_safe {
            Box::new(SynchronizedPool::new(pool))
        } else {
            Box::new(pool)
        }
    }
}

impl PlatformSettings {
    /// Target platform, filling unset parts from the host
    pub fn resolve(&self) -> Result<Platform> {
        match (self.os, self.cpu) {
            (Some(os), Some(cpu)) => Platform::new(os, cpu).supported(),
            (None, None) => Platform::host(),
            (os, cpu) => {
                let host = Platform::host()?;
                Platform::new(os.unwrap_or(host.os), cpu.unwrap_or(host.cpu)).supported()
            }
        }
    }
}
