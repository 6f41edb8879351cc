//! In-process stand-in for the container runtime.
//!
//! Every running container gets a real TCP query endpoint on its host port.
//! Membership is derived from the seed graph instead of gossip: a node that
//! is not its own primary seed joins every running, attached node it lists,
//! and each node reports the connected component it belongs to. A node cut
//! off from the network reports only itself.

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use cdcf_e2e::constants::ENV_SEEDS;
use cdcf_e2e::member_id;
use cdcf_e2e::parse_seeds;
use cdcf_e2e::ContainerId;
use cdcf_e2e::ContainerRuntime;
use cdcf_e2e::ContainerSpec;
use cdcf_e2e::ContainerStatus;
use cdcf_e2e::EnvironmentError;
use cdcf_e2e::Result;
use cdcf_e2e::Settings;
use parking_lot::Mutex;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::debug;

struct SimContainer {
    spec: ContainerSpec,
    status: ContainerStatus,
    attached: bool,
    server: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct SimState {
    networks: HashSet<String>,
    containers: HashMap<String, SimContainer>,
    next_id: u64,
    refuse_create: HashSet<String>,
}

#[derive(Clone, Default)]
pub struct SimRuntime {
    state: Arc<Mutex<SimState>>,
}

impl SimRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make creating a container for `name` fail
    pub fn refuse_create(
        &self,
        name: &str,
    ) {
        self.state.lock().refuse_create.insert(name.to_string());
    }

    /// Containers still known to the runtime, i.e. not removed yet
    pub fn container_count(&self) -> usize {
        self.state.lock().containers.len()
    }

    pub fn has_network(
        &self,
        network: &str,
    ) -> bool {
        self.state.lock().networks.contains(network)
    }

    async fn serve(
        &self,
        id: &str,
        port: u16,
    ) -> Result<JoinHandle<()>> {
        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        let state = self.state.clone();
        let id = id.to_string();

        Ok(tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let state = state.clone();
                let id = id.clone();
                tokio::spawn(async move {
                    let mut buf = [0u8; 64];
                    if socket.read(&mut buf).await.is_err() {
                        return;
                    }
                    let members = view_of(&state.lock(), &id);
                    let mut response = members.join("\n");
                    response.push('\n');
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        }))
    }

    async fn shutdown_server(
        &self,
        id: &ContainerId,
    ) {
        let server = self
            .state
            .lock()
            .containers
            .get_mut(id.as_str())
            .and_then(|c| c.server.take());
        if let Some(server) = server {
            server.abort();
            let _ = server.await;
        }
    }
}

fn node_name(identity: &str) -> &str {
    identity.split(':').next().unwrap_or(identity)
}

/// Members reported by container `id`
fn view_of(
    state: &SimState,
    id: &str,
) -> Vec<String> {
    let Some(me) = state.containers.get(id) else {
        return Vec::new();
    };
    if !me.attached {
        return vec![member_id(&me.spec.name)];
    }

    let reachable: HashMap<&str, &SimContainer> = state
        .containers
        .values()
        .filter(|c| c.attached && c.status == ContainerStatus::Running)
        .map(|c| (c.spec.name.as_str(), c))
        .collect();

    let mut edges: HashMap<&str, Vec<&str>> = HashMap::new();
    for (name, container) in &reachable {
        let seeds = parse_seeds(container.spec.env_var(ENV_SEEDS).unwrap_or_default());
        let primary = seeds.first().map_or(true, |s| node_name(s) == *name);
        if primary {
            continue;
        }
        for seed in &seeds {
            if let Some((&seed, _)) = reachable.get_key_value(node_name(seed)) {
                if seed != *name {
                    edges.entry(*name).or_default().push(seed);
                    edges.entry(seed).or_default().push(*name);
                }
            }
        }
    }

    let mut component = BTreeSet::new();
    let mut pending = vec![me.spec.name.as_str()];
    while let Some(name) = pending.pop() {
        if component.insert(name) {
            pending.extend(edges.get(name).into_iter().flatten().copied());
        }
    }
    component.into_iter().map(member_id).collect()
}

#[async_trait]
impl ContainerRuntime for SimRuntime {
    async fn ensure_network(
        &self,
        network: &str,
    ) -> Result<()> {
        self.state.lock().networks.insert(network.to_string());
        Ok(())
    }

    async fn run_container(
        &self,
        spec: &ContainerSpec,
    ) -> Result<ContainerId> {
        let id = {
            let mut state = self.state.lock();
            if state.refuse_create.contains(&spec.name) {
                return Err(EnvironmentError::ContainerCreate {
                    name: spec.name.clone(),
                    source: "creation refused".into(),
                }
                .into());
            }
            state.next_id += 1;
            format!("sim-{}-{}", spec.name, state.next_id)
        };

        let server = self.serve(&id, spec.host_port).await?;
        debug!(%id, port = spec.host_port, "sim container running");
        self.state.lock().containers.insert(
            id.clone(),
            SimContainer {
                spec: spec.clone(),
                status: ContainerStatus::Running,
                attached: true,
                server: Some(server),
            },
        );
        Ok(ContainerId::new(id))
    }

    async fn start_container(
        &self,
        id: &ContainerId,
    ) -> Result<()> {
        let port = {
            let mut state = self.state.lock();
            let Some(container) = state.containers.get_mut(id.as_str()) else {
                return Err(EnvironmentError::ContainerStart {
                    name: id.to_string(),
                    source: "no such container".into(),
                }
                .into());
            };
            if container.status == ContainerStatus::Running {
                return Ok(());
            }
            container.status = ContainerStatus::Running;
            container.spec.host_port
        };

        let server = self.serve(id.as_str(), port).await?;
        if let Some(container) = self.state.lock().containers.get_mut(id.as_str()) {
            container.server = Some(server);
        }
        Ok(())
    }

    async fn kill_container(
        &self,
        id: &ContainerId,
    ) -> Result<()> {
        if let Some(container) = self.state.lock().containers.get_mut(id.as_str()) {
            container.status = ContainerStatus::Exited;
        }
        self.shutdown_server(id).await;
        Ok(())
    }

    async fn remove_container(
        &self,
        id: &ContainerId,
    ) -> Result<()> {
        self.shutdown_server(id).await;
        self.state.lock().containers.remove(id.as_str());
        Ok(())
    }

    async fn container_status(
        &self,
        id: &ContainerId,
    ) -> Result<Option<ContainerStatus>> {
        Ok(self.state.lock().containers.get(id.as_str()).map(|c| c.status))
    }

    async fn container_logs(
        &self,
        id: &ContainerId,
    ) -> Result<String> {
        let state = self.state.lock();
        Ok(match state.containers.get(id.as_str()) {
            Some(c) => format!("{} is {:?}, attached: {}\n", c.spec.name, c.status, c.attached),
            None => String::new(),
        })
    }

    async fn disconnect_network(
        &self,
        _network: &str,
        id: &ContainerId,
    ) -> Result<()> {
        if let Some(container) = self.state.lock().containers.get_mut(id.as_str()) {
            container.attached = false;
        }
        Ok(())
    }
}

pub fn settings(first_host_port: u16) -> Settings {
    let mut settings = Settings::default();
    settings.runtime.first_host_port = first_host_port;
    settings.probe.connect_timeout_in_ms = 1_000;
    settings.probe.read_timeout_in_ms = 1_000;
    settings
}

pub fn identities(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| member_id(n)).collect()
}

pub fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}
