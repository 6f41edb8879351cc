//! Cluster-wide topology operations and membership assertions.
//!
//! The controller owns every [`NodeHandle`] of a scenario together with the
//! port allocator they draw query endpoints from. Assertions query each node
//! exactly once and never retry: callers wait for convergence explicitly
//! before asserting.

use std::sync::Arc;

use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::SeedRow;
use super::TeardownFailure;
use super::TeardownReport;
use super::Topology;
use crate::member_id;
use crate::parse_seeds;
use crate::ContainerRuntime;
use crate::Error;
use crate::MembershipAssertionError;
use crate::MembershipClient;
use crate::MembershipView;
use crate::NodeHandle;
use crate::PortAllocator;
use crate::Result;
use crate::RuntimeConfig;
use crate::Settings;

pub struct ClusterController<R>
where
    R: ContainerRuntime,
{
    runtime: Arc<R>,
    runtime_config: Arc<RuntimeConfig>,
    client: MembershipClient,
    ports: PortAllocator,
    topology: Topology<R>,
    /// Handles replaced by a later declaration; still owed a teardown
    retired: Vec<NodeHandle<R>>,
}

impl<R> ClusterController<R>
where
    R: ContainerRuntime,
{
    pub fn new(
        runtime: Arc<R>,
        settings: &Settings,
    ) -> Self {
        let ports = PortAllocator::new(settings.runtime.first_host_port);
        Self::with_ports(runtime, settings, ports)
    }

    /// Continue allocating from `ports`, e.g. one handed back by an earlier
    /// controller through [`into_ports`](Self::into_ports)
    pub fn with_ports(
        runtime: Arc<R>,
        settings: &Settings,
        ports: PortAllocator,
    ) -> Self {
        Self {
            runtime,
            runtime_config: Arc::new(settings.runtime.clone()),
            client: MembershipClient::new(settings.probe),
            ports,
            topology: Topology::default(),
            retired: Vec::new(),
        }
    }

    /// Hand the allocator back so a later controller never reuses a port
    pub fn into_ports(self) -> PortAllocator {
        self.ports
    }

    pub fn topology(&self) -> &Topology<R> {
        &self.topology
    }

    pub fn ports(&self) -> &PortAllocator {
        &self.ports
    }

    pub fn node(
        &self,
        name: &str,
    ) -> Result<&NodeHandle<R>> {
        self.topology.get(name).ok_or_else(|| Error::UnknownNode(name.to_string()))
    }

    fn node_mut(
        &mut self,
        name: &str,
    ) -> Result<&mut NodeHandle<R>> {
        self.topology
            .get_mut(name)
            .ok_or_else(|| Error::UnknownNode(name.to_string()))
    }

    fn build_handle(
        &self,
        row: &SeedRow,
    ) -> NodeHandle<R> {
        NodeHandle::new(
            row.node.trim(),
            parse_seeds(&row.seeds),
            self.runtime.clone(),
            self.runtime_config.clone(),
        )
    }

    /// Replace the topology with one configured handle per row
    pub fn configure_seeds<I>(
        &mut self,
        rows: I,
    ) where
        I: IntoIterator<Item = SeedRow>,
    {
        let previous = self.topology.drain();
        self.retired.extend(previous);

        self.add_nodes(rows);
        info!(nodes = ?self.topology.names(), "topology configured");
    }

    /// Declare additional nodes on top of the current topology.
    ///
    /// Returns the names in row order. Redeclaring a name retires the old
    /// handle so teardown still reaches its container.
    pub fn add_nodes<I>(
        &mut self,
        rows: I,
    ) -> Vec<String>
    where
        I: IntoIterator<Item = SeedRow>,
    {
        let mut added = Vec::new();
        for row in rows {
            let handle = self.build_handle(&row);
            debug!(node = %handle.name(), seeds = ?handle.seeds(), "node configured");
            added.push(handle.name().to_string());
            if let Some(previous) = self.topology.insert(handle) {
                warn!(node = %previous.name(), "node redeclared, retiring previous handle");
                self.retired.push(previous);
            }
        }
        added
    }

    /// Start every node in declaration order.
    ///
    /// A failing node does not stop the others; failures are logged and
    /// returned, and show up later as probe failures.
    pub async fn start_all(&mut self) -> Vec<(String, Error)> {
        let Self {
            topology, ports, ..
        } = self;

        let mut failures = Vec::new();
        for node in topology.iter_mut() {
            if let Err(e) = node.start(ports).await {
                error!(node = %node.name(), "failed to start: {e}");
                failures.push((node.name().to_string(), e));
            }
        }
        failures
    }

    pub async fn start(
        &mut self,
        name: &str,
    ) -> Result<()> {
        let node = self
            .topology
            .get_mut(name)
            .ok_or_else(|| Error::UnknownNode(name.to_string()))?;
        node.start(&mut self.ports).await
    }

    pub async fn stop(
        &mut self,
        name: &str,
    ) -> Result<()> {
        self.node_mut(name)?.stop().await
    }

    pub async fn disconnect(
        &mut self,
        name: &str,
    ) -> Result<()> {
        self.node_mut(name)?.disconnect().await
    }

    /// Names of nodes whose process is currently executing, in declaration order
    pub async fn running_nodes(&mut self) -> Result<Vec<String>> {
        let mut running = Vec::new();
        for node in self.topology.iter_mut() {
            if node.running().await? {
                running.push(node.name().to_string());
            }
        }
        Ok(running)
    }

    /// Single membership probe against `name`
    pub async fn query(
        &self,
        name: &str,
    ) -> Result<MembershipView> {
        let node = self.node(name)?;
        let endpoint = node.endpoint().ok_or_else(|| Error::NoEndpoint(name.to_string()))?;
        self.client.query(endpoint).await
    }

    /// Every running node must report at least the identities of `expected_names`.
    ///
    /// Extra members, duplicates and the node's own identity are tolerated.
    pub async fn assert_all_joined_one_cluster(
        &mut self,
        expected_names: &[String],
    ) -> Result<()> {
        let expected: Vec<String> = expected_names.iter().map(|n| member_id(n)).collect();
        let running = self.running_nodes().await?;

        for name in &running {
            self.check_includes(name, &expected).await?;
        }

        info!(nodes = ?running, "all running nodes joined one cluster");
        Ok(())
    }

    async fn check_includes(
        &self,
        name: &str,
        expected: &[String],
    ) -> Result<()> {
        let view = self.query(name).await?;
        let missing = view.missing(expected.iter().map(String::as_str));
        if !missing.is_empty() {
            return Err(MembershipAssertionError::MissingMembers {
                node: name.to_string(),
                actual: view.members().to_vec(),
                expected: expected.to_vec(),
            }
            .into());
        }
        debug!(node = %name, %view, "joined");
        Ok(())
    }

    /// `name` must report exactly its own identity and nothing else
    pub async fn assert_failed_to_join(
        &self,
        name: &str,
    ) -> Result<()> {
        let own = member_id(name);
        let view = self.query(name).await?;

        if !view.is_exactly([own.as_str()]) {
            return Err(MembershipAssertionError::NotIsolated {
                node: name.to_string(),
                actual: view.members().to_vec(),
                expected: vec![own],
            }
            .into());
        }

        info!(node = %name, "node is alone in its cluster");
        Ok(())
    }

    /// No running node other than `removed_name` may still list it
    pub async fn assert_removed(
        &mut self,
        removed_name: &str,
    ) -> Result<()> {
        let removed = member_id(removed_name);
        let running = self.running_nodes().await?;

        for name in running.iter().filter(|n| n.as_str() != removed_name) {
            let view = self.query(name).await?;
            if view.contains(&removed) {
                return Err(MembershipAssertionError::StillPresent {
                    node: name.clone(),
                    removed: removed.clone(),
                    actual: view.members().to_vec(),
                }
                .into());
            }
        }

        info!(node = %removed_name, "node removed from every running view");
        Ok(())
    }

    /// Emit each node's container output through the log
    pub async fn dump_logs(&self) {
        for node in self.retired.iter().chain(self.topology.iter()) {
            match node.logs().await {
                Ok(Some(logs)) => {
                    info!(node = %node.name(), "log:\n==============\n{logs}");
                }
                Ok(None) => {}
                Err(e) => warn!(node = %node.name(), "failed to fetch logs: {e}"),
            }
        }
    }

    /// Stop then remove every node ever declared.
    ///
    /// Never fails: each error is logged and recorded, and cleanup carries on
    /// with the remaining nodes. The topology is empty afterwards.
    #[tracing::instrument(skip_all)]
    pub async fn teardown(&mut self) -> TeardownReport {
        let mut report = TeardownReport::default();
        let mut nodes = std::mem::take(&mut self.retired);
        nodes.extend(self.topology.drain());

        for mut node in nodes {
            let name = node.name().to_string();
            let mut clean = true;

            if let Err(e) = node.stop().await {
                error!(node = %name, "teardown stop failed: {e}");
                report.failures.push(TeardownFailure {
                    node: name.clone(),
                    operation: "stop",
                    error: e.to_string(),
                });
                clean = false;
            }

            if let Err(e) = node.remove().await {
                error!(node = %name, "teardown remove failed: {e}");
                report.failures.push(TeardownFailure {
                    node: name.clone(),
                    operation: "remove",
                    error: e.to_string(),
                });
                clean = false;
            }

            if clean {
                report.cleaned.push(name);
            }
        }

        info!(
            cleaned = report.cleaned.len(),
            failed = report.failures.len(),
            "teardown finished"
        );
        report
    }
}
