//! Orchestration runtime seam.
//!
//! The harness never talks to a container engine directly: node handles go
//! through [`ContainerRuntime`], which [`DockerRuntime`] implements on top of
//! the local Docker daemon. Tests substitute a mock or an in-process
//! simulation.

mod docker;
pub use docker::*;


use std::fmt;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::Result;

/// Runtime-assigned reference to one created container
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything needed to materialise one node process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub network: String,
    pub env: Vec<(String, String)>,
    /// Port served inside the container
    pub container_port: u16,
    /// Host port `container_port` is published on
    pub host_port: u16,
}

impl ContainerSpec {
    /// `KEY=value` pairs in the shape container engines expect
    pub fn env_pairs(&self) -> Vec<String> {
        self.env.iter().map(|(k, v)| format!("{k}={v}")).collect()
    }

    pub fn env_var(
        &self,
        key: &str,
    ) -> Option<&str> {
        self.env.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

/// Coarse process status as reported by the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerStatus {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
}

impl ContainerStatus {
    /// Anything short of having exited counts as alive
    pub fn is_alive(&self) -> bool {
        !matches!(self, ContainerStatus::Exited | ContainerStatus::Dead)
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ContainerRuntime: Send + Sync + 'static {
    /// Get the named network, creating it when absent
    async fn ensure_network(
        &self,
        network: &str,
    ) -> Result<()>;

    /// Create the container described by `spec` and start it
    async fn run_container(
        &self,
        spec: &ContainerSpec,
    ) -> Result<ContainerId>;

    /// Resume an existing container; starting a running one is not an error
    async fn start_container(
        &self,
        id: &ContainerId,
    ) -> Result<()>;

    /// Terminate immediately, without a grace period
    async fn kill_container(
        &self,
        id: &ContainerId,
    ) -> Result<()>;

    /// Release the container and everything it holds
    async fn remove_container(
        &self,
        id: &ContainerId,
    ) -> Result<()>;

    /// Fresh status, or `None` when the container no longer exists
    async fn container_status(
        &self,
        id: &ContainerId,
    ) -> Result<Option<ContainerStatus>>;

    /// Combined stdout and stderr captured so far
    async fn container_logs(
        &self,
        id: &ContainerId,
    ) -> Result<String>;

    /// Detach the container from `network` while leaving it running
    async fn disconnect_network(
        &self,
        network: &str,
        id: &ContainerId,
    ) -> Result<()>;
}
