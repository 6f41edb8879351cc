//! One cluster participant as seen from the harness.
//!
//! A [`NodeHandle`] owns the node's container reference, its published query
//! endpoint and its seed list. Every lifecycle call is safe to repeat or to
//! issue out of order, since teardown always runs `stop` then `remove`
//! whatever the scenario did before.

use std::sync::Arc;

use tracing::debug;
use tracing::info;
use tracing::warn;

use super::join_seeds;
use super::member_id;
use super::Endpoint;
use super::NodeState;
use super::PortAllocator;
use crate::constants::ENV_HOST;
use crate::constants::ENV_SEEDS;
use crate::ContainerId;
use crate::ContainerRuntime;
use crate::ContainerSpec;
use crate::EnvironmentError;
use crate::Error;
use crate::Result;
use crate::RuntimeConfig;

pub struct NodeHandle<R>
where
    R: ContainerRuntime,
{
    name: String,
    seeds: Vec<String>,
    state: NodeState,
    endpoint: Option<Endpoint>,
    container: Option<ContainerId>,
    /// Cleared by `disconnect`; survives stop/start like a real network detach
    attached: bool,

    runtime: Arc<R>,
    settings: Arc<RuntimeConfig>,
}

impl<R> NodeHandle<R>
where
    R: ContainerRuntime,
{
    pub fn new(
        name: impl Into<String>,
        seeds: Vec<String>,
        runtime: Arc<R>,
        settings: Arc<RuntimeConfig>,
    ) -> Self {
        Self {
            name: name.into(),
            seeds,
            state: NodeState::Configured,
            endpoint: None,
            container: None,
            attached: false,
            runtime,
            settings,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cluster identity, `<name>:4445`
    pub fn id(&self) -> String {
        member_id(&self.name)
    }

    pub fn seeds(&self) -> &[String] {
        &self.seeds
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    pub fn container(&self) -> Option<&ContainerId> {
        self.container.as_ref()
    }

    fn container_spec(
        &self,
        host_port: u16,
    ) -> ContainerSpec {
        ContainerSpec {
            name: self.name.clone(),
            image: self.settings.image.clone(),
            network: self.settings.network.clone(),
            env: vec![
                (ENV_HOST.to_string(), self.name.clone()),
                (ENV_SEEDS.to_string(), join_seeds(&self.seeds)),
            ],
            container_port: self.settings.container_port,
            host_port,
        }
    }

    fn illegal(
        &self,
        operation: &'static str,
    ) -> Error {
        Error::IllegalTransition {
            node: self.name.clone(),
            from: self.state,
            operation,
        }
    }

    /// Materialise a fresh container on the shared network.
    ///
    /// The host port is taken from `ports` before the runtime is contacted, so
    /// a failed creation still consumes it. A container that was created but
    /// could not start stays referenced (as `Stopped`) so teardown removes it.
    #[tracing::instrument(skip_all, fields(node = %self.name))]
    pub async fn create(
        &mut self,
        ports: &mut PortAllocator,
    ) -> Result<()> {
        if self.container.is_some() {
            return Err(self.illegal("create"));
        }

        let host_port = ports.allocate()?;
        self.endpoint = Some(Endpoint::new(self.settings.query_host.clone(), host_port));

        self.runtime.ensure_network(&self.settings.network).await?;

        let spec = self.container_spec(host_port);
        info!(node = %self.name, host_port, seeds = %join_seeds(&self.seeds), "creating node");
        let id = match self.runtime.run_container(&spec).await {
            Ok(id) => id,
            Err(e) => {
                if let Error::Environment(EnvironmentError::CreatedNotStarted { id, .. }) = &e {
                    warn!(node = %self.name, container = %id, "created but not started, kept for teardown");
                    self.container = Some(id.clone());
                    self.attached = true;
                    self.state = NodeState::Stopped;
                }
                return Err(e);
            }
        };

        debug!(node = %self.name, container = %id, "node created");
        self.container = Some(id);
        self.attached = true;
        self.state = NodeState::Running;
        Ok(())
    }

    /// Resume the existing container, or create one when there is none.
    /// Starting a node that already executes succeeds without effect.
    pub async fn start(
        &mut self,
        ports: &mut PortAllocator,
    ) -> Result<()> {
        let Some(id) = self.container.clone() else {
            return self.create(ports).await;
        };

        if self.state.is_executing() {
            debug!(node = %self.name, state = %self.state, "start: already executing");
        }

        self.runtime.start_container(&id).await?;
        self.state = if self.attached {
            NodeState::Running
        } else {
            NodeState::Disconnected
        };
        info!(node = %self.name, state = %self.state, "node started");
        Ok(())
    }

    /// Kill the process without a grace period; no-op when it is not executing
    pub async fn stop(&mut self) -> Result<()> {
        if !self.running().await? {
            debug!(node = %self.name, state = %self.state, "stop: not executing");
            return Ok(());
        }

        if let Some(id) = &self.container {
            self.runtime.kill_container(id).await?;
        }
        self.state = NodeState::Stopped;
        info!(node = %self.name, "node stopped");
        Ok(())
    }

    /// Release the container. No-op when there is none.
    pub async fn remove(&mut self) -> Result<()> {
        let Some(id) = self.container.take() else {
            return Ok(());
        };

        if let Err(e) = self.runtime.remove_container(&id).await {
            warn!(node = %self.name, container = %id, "remove failed: {e}");
            self.container = Some(id);
            return Err(e);
        }

        self.attached = false;
        self.state = NodeState::Removed;
        info!(node = %self.name, "node removed");
        Ok(())
    }

    /// Refresh liveness from the runtime.
    ///
    /// Returns `false` when there is no container or the runtime no longer
    /// knows it. A process found dead is recorded as stopped.
    pub async fn running(&mut self) -> Result<bool> {
        let Some(id) = &self.container else {
            return Ok(false);
        };

        let status = self.runtime.container_status(id).await?;
        let alive = status.as_ref().is_some_and(|s| s.is_alive());

        if !alive && self.state.is_executing() {
            debug!(node = %self.name, ?status, "process is gone");
            self.state = NodeState::Stopped;
        }
        Ok(alive)
    }

    /// Partition the node: detach it from the shared network, keep it executing
    #[tracing::instrument(skip_all, fields(node = %self.name))]
    pub async fn disconnect(&mut self) -> Result<()> {
        if !self.state.can_disconnect() {
            return Err(self.illegal("disconnect"));
        }
        let Some(id) = &self.container else {
            return Err(self.illegal("disconnect"));
        };

        self.runtime.disconnect_network(&self.settings.network, id).await?;
        self.attached = false;
        self.state = NodeState::Disconnected;
        info!(node = %self.name, network = %self.settings.network, "node disconnected");
        Ok(())
    }

    /// Container output so far, `None` before the node was ever created
    pub async fn logs(&self) -> Result<Option<String>> {
        match &self.container {
            Some(id) => Ok(Some(self.runtime.container_logs(id).await?)),
            None => Ok(None),
        }
    }
}
