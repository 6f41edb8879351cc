use serde::Deserialize;

use crate::constants::DEFAULT_CONTAINER_PORT;
use crate::constants::DEFAULT_FIRST_HOST_PORT;
use crate::constants::DEFAULT_IMAGE;
use crate::constants::DEFAULT_NETWORK;
use crate::constants::DEFAULT_QUERY_HOST;
use crate::Error;
use crate::Result;

#[derive(Debug, Deserialize, Clone)]
pub struct RuntimeConfig {
    /// Image every node container is created from
    #[serde(default = "default_image")]
    pub image: String,

    /// Shared virtual network; created on first use
    #[serde(default = "default_network")]
    pub network: String,

    /// Port the node listens for membership queries on inside its container
    #[serde(default = "default_container_port")]
    pub container_port: u16,

    /// First host port published for a node's query endpoint
    #[serde(default = "default_first_host_port")]
    pub first_host_port: u16,

    /// Host on which published ports are reachable from the harness
    #[serde(default = "default_query_host")]
    pub query_host: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            image: default_image(),
            network: default_network(),
            container_port: default_container_port(),
            first_host_port: default_first_host_port(),
            query_host: default_query_host(),
        }
    }
}

impl RuntimeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.image.trim().is_empty() {
            return Err(Error::InvalidConfig("runtime.image cannot be empty".into()));
        }

        if self.network.trim().is_empty() {
            return Err(Error::InvalidConfig("runtime.network cannot be empty".into()));
        }

        if self.container_port == 0 {
            return Err(Error::InvalidConfig(
                "runtime.container_port must be non-zero".into(),
            ));
        }

        if self.first_host_port == 0 || self.first_host_port == u16::MAX {
            return Err(Error::InvalidConfig(format!(
                "runtime.first_host_port {} leaves no room for allocation",
                self.first_host_port
            )));
        }

        if self.query_host.trim().is_empty() {
            return Err(Error::InvalidConfig("runtime.query_host cannot be empty".into()));
        }

        Ok(())
    }
}

fn default_image() -> String {
    DEFAULT_IMAGE.to_string()
}
fn default_network() -> String {
    DEFAULT_NETWORK.to_string()
}
fn default_container_port() -> u16 {
    DEFAULT_CONTAINER_PORT
}
fn default_first_host_port() -> u16 {
    DEFAULT_FIRST_HOST_PORT
}
fn default_query_host() -> String {
    DEFAULT_QUERY_HOST.to_string()
}
