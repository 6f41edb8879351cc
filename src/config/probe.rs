use std::time::Duration;

use serde::Deserialize;

use crate::constants::DEFAULT_CONNECT_TIMEOUT_IN_MS;
use crate::constants::DEFAULT_PROBE_BUFFER_SIZE;
use crate::constants::DEFAULT_READ_TIMEOUT_IN_MS;
use crate::Error;
use crate::Result;

/// Bounds applied to every membership query. Each query is a single attempt.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ProbeConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_in_ms: u64,

    /// Applies to writing the probe line and to reading the answer
    #[serde(default = "default_read_timeout")]
    pub read_timeout_in_ms: u64,

    /// Upper bound of the single read performed per query
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            connect_timeout_in_ms: default_connect_timeout(),
            read_timeout_in_ms: default_read_timeout(),
            buffer_size: default_buffer_size(),
        }
    }
}

impl ProbeConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_in_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_in_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout_in_ms == 0 || self.read_timeout_in_ms == 0 {
            return Err(Error::InvalidConfig(
                "probe timeouts must be greater than 0".into(),
            ));
        }

        if self.buffer_size == 0 {
            return Err(Error::InvalidConfig("probe.buffer_size must be greater than 0".into()));
        }

        Ok(())
    }
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_IN_MS
}
fn default_read_timeout() -> u64 {
    DEFAULT_READ_TIMEOUT_IN_MS
}
fn default_buffer_size() -> usize {
    DEFAULT_PROBE_BUFFER_SIZE
}
