//! Optional TOML configuration file
//!
//! ```toml
//! log_level = "info"
//!
//! [sync]
//! tick_interval_secs = 10
//! watch_retry_backoff_secs = 5
//! watch_reconnect_delay_secs = 1
//! queue_capacity = 256
//! overflow = "supersede"
//! subscriber_buffer = 16
//! probe_timeout_secs = 5
//!
//! [server]
//! bind = "0.0.0.0"
//! port = 8080
//! ```
//!
//! Every key is optional. Command-line flags take precedence over the file.

use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use podviz_sync::{OverflowPolicy, SyncConfig};

const MIN_TICK_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Default tracing directive; `RUST_LOG` wins when set
    pub log_level: String,
    pub sync: SyncSection,
    pub server: ServerSection,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            sync: SyncSection::default(),
            server: ServerSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncSection {
    pub tick_interval_secs: f64,
    pub watch_retry_backoff_secs: u64,
    pub watch_reconnect_delay_secs: u64,
    pub queue_capacity: usize,
    pub overflow: OverflowPolicy,
    pub subscriber_buffer: usize,
    pub probe_timeout_secs: u64,
}

impl Default for SyncSection {
    fn default() -> Self {
        let defaults = SyncConfig::default();
        Self {
            tick_interval_secs: defaults.tick_interval.as_secs_f64(),
            watch_retry_backoff_secs: defaults.watch_retry_backoff.as_secs(),
            watch_reconnect_delay_secs: defaults.watch_reconnect_delay.as_secs(),
            queue_capacity: defaults.queue_capacity,
            overflow: defaults.overflow,
            subscriber_buffer: defaults.subscriber_buffer,
            probe_timeout_secs: defaults.probe_timeout.as_secs(),
        }
    }
}

impl SyncSection {
    pub fn to_sync_config(&self) -> Result<SyncConfig> {
        let tick = if self.tick_interval_secs > 0.0 {
            Duration::try_from_secs_f64(self.tick_interval_secs).with_context(|| {
                format!("tick_interval_secs {} is out of range", self.tick_interval_secs)
            })?
        } else if self.tick_interval_secs.is_nan() {
            anyhow::bail!("tick_interval_secs must be a number");
        } else {
            MIN_TICK_INTERVAL
        };
        Ok(SyncConfig {
            tick_interval: tick.max(MIN_TICK_INTERVAL),
            watch_retry_backoff: Duration::from_secs(self.watch_retry_backoff_secs),
            watch_reconnect_delay: Duration::from_secs(self.watch_reconnect_delay_secs),
            queue_capacity: self.queue_capacity.max(1),
            overflow: self.overflow,
            subscriber_buffer: self.subscriber_buffer.max(1),
            probe_timeout: Duration::from_secs(self.probe_timeout_secs),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: IpAddr,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
        }
    }
}

impl FileConfig {
    /// Read `path`, or return defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply command-line overrides on top of the file values
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
        if let Some(secs) = overrides.tick_interval_secs {
            self.sync.tick_interval_secs = secs;
        }
        if let Some(bind) = overrides.bind {
            self.server.bind = bind;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        self
    }
}

/// Values given on the command line, if any
#[derive(Debug, Default)]
pub struct Overrides {
    pub log_level: Option<String>,
    pub tick_interval_secs: Option<f64>,
    pub bind: Option<IpAddr>,
    pub port: Option<u16>,
}
