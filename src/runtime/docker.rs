use std::collections::HashMap;

use async_trait::async_trait;
use bollard::container::Config;
use bollard::container::CreateContainerOptions;
use bollard::container::InspectContainerOptions;
use bollard::container::KillContainerOptions;
use bollard::container::LogsOptions;
use bollard::container::RemoveContainerOptions;
use bollard::container::StartContainerOptions;
use bollard::errors::Error as DockerError;
use bollard::models::ContainerStateStatusEnum;
use bollard::models::HostConfig;
use bollard::models::PortBinding;
use bollard::network::CreateNetworkOptions;
use bollard::network::DisconnectNetworkOptions;
use bollard::network::InspectNetworkOptions;
use bollard::Docker;
use futures::StreamExt;
use tracing::debug;
use tracing::info;

use super::ContainerId;
use super::ContainerRuntime;
use super::ContainerSpec;
use super::ContainerStatus;
use crate::EnvironmentError;
use crate::Result;

/// [`ContainerRuntime`] backed by the local Docker daemon
#[derive(Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect through `DOCKER_HOST` or the platform's default socket
    pub fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults().map_err(|e| {
            EnvironmentError::Unavailable {
                source: Box::new(e),
            }
        })?;
        Ok(Self { docker })
    }

    pub fn with_client(docker: Docker) -> Self {
        Self { docker }
    }
}

fn status_code(err: &DockerError) -> Option<u16> {
    match err {
        DockerError::DockerResponseServerError { status_code, .. } => Some(*status_code),
        _ => None,
    }
}

fn is_not_found(err: &DockerError) -> bool {
    status_code(err) == Some(404)
}

pub(crate) fn map_status(status: ContainerStateStatusEnum) -> Option<ContainerStatus> {
    match status {
        ContainerStateStatusEnum::CREATED => Some(ContainerStatus::Created),
        ContainerStateStatusEnum::RUNNING => Some(ContainerStatus::Running),
        ContainerStateStatusEnum::PAUSED => Some(ContainerStatus::Paused),
        ContainerStateStatusEnum::RESTARTING => Some(ContainerStatus::Restarting),
        ContainerStateStatusEnum::REMOVING => Some(ContainerStatus::Removing),
        ContainerStateStatusEnum::EXITED => Some(ContainerStatus::Exited),
        ContainerStateStatusEnum::DEAD => Some(ContainerStatus::Dead),
        ContainerStateStatusEnum::EMPTY => None,
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn ensure_network(
        &self,
        network: &str,
    ) -> Result<()> {
        match self
            .docker
            .inspect_network(network, None::<InspectNetworkOptions<String>>)
            .await
        {
            Ok(_) => return Ok(()),
            Err(e) if is_not_found(&e) => {}
            Err(e) => {
                return Err(EnvironmentError::NetworkCreate {
                    network: network.to_string(),
                    source: Box::new(e),
                }
                .into())
            }
        }

        info!(%network, "creating network");
        self.docker
            .create_network(CreateNetworkOptions {
                name: network,
                ..Default::default()
            })
            .await
            .map_err(|e| EnvironmentError::NetworkCreate {
                network: network.to_string(),
                source: Box::new(e),
            })?;
        Ok(())
    }

    async fn run_container(
        &self,
        spec: &ContainerSpec,
    ) -> Result<ContainerId> {
        let port_key = format!("{}/tcp", spec.container_port);

        let mut exposed_ports = HashMap::new();
        exposed_ports.insert(port_key.clone(), HashMap::new());

        let mut port_bindings = HashMap::new();
        port_bindings.insert(
            port_key,
            Some(vec![PortBinding {
                host_ip: None,
                host_port: Some(spec.host_port.to_string()),
            }]),
        );

        let config = Config {
            image: Some(spec.image.clone()),
            env: Some(spec.env_pairs()),
            exposed_ports: Some(exposed_ports),
            host_config: Some(HostConfig {
                network_mode: Some(spec.network.clone()),
                port_bindings: Some(port_bindings),
                ..Default::default()
            }),
            ..Default::default()
        };

        let created = self
            .docker
            .create_container(
                Some(CreateContainerOptions {
                    name: spec.name.as_str(),
                    ..Default::default()
                }),
                config,
            )
            .await
            .map_err(|e| EnvironmentError::ContainerCreate {
                name: spec.name.clone(),
                source: Box::new(e),
            })?;

        for warning in &created.warnings {
            debug!(name = %spec.name, %warning, "container create warning");
        }

        let id = ContainerId::new(created.id);
        self.docker
            .start_container(id.as_str(), None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| EnvironmentError::CreatedNotStarted {
                name: spec.name.clone(),
                id: id.clone(),
                source: Box::new(e),
            })?;

        Ok(id)
    }

    async fn start_container(
        &self,
        id: &ContainerId,
    ) -> Result<()> {
        match self
            .docker
            .start_container(id.as_str(), None::<StartContainerOptions<String>>)
            .await
        {
            Ok(()) => Ok(()),
            // 304: already started
            Err(e) if status_code(&e) == Some(304) => Ok(()),
            Err(e) => Err(EnvironmentError::ContainerStart {
                name: id.to_string(),
                source: Box::new(e),
            }
            .into()),
        }
    }

    async fn kill_container(
        &self,
        id: &ContainerId,
    ) -> Result<()> {
        match self
            .docker
            .kill_container(id.as_str(), None::<KillContainerOptions<String>>)
            .await
        {
            Ok(()) => Ok(()),
            // 409: not running
            Err(e) if status_code(&e) == Some(409) => Ok(()),
            Err(e) => Err(EnvironmentError::ContainerStop {
                name: id.to_string(),
                source: Box::new(e),
            }
            .into()),
        }
    }

    async fn remove_container(
        &self,
        id: &ContainerId,
    ) -> Result<()> {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        match self.docker.remove_container(id.as_str(), Some(options)).await {
            Ok(()) => Ok(()),
            Err(e) if is_not_found(&e) => Ok(()),
            Err(e) => Err(EnvironmentError::ContainerRemove {
                name: id.to_string(),
                source: Box::new(e),
            }
            .into()),
        }
    }

    async fn container_status(
        &self,
        id: &ContainerId,
    ) -> Result<Option<ContainerStatus>> {
        match self
            .docker
            .inspect_container(id.as_str(), None::<InspectContainerOptions>)
            .await
        {
            Ok(inspect) => Ok(inspect
                .state
                .and_then(|state| state.status)
                .and_then(map_status)),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(EnvironmentError::ContainerInspect {
                name: id.to_string(),
                source: Box::new(e),
            }
            .into()),
        }
    }

    async fn container_logs(
        &self,
        id: &ContainerId,
    ) -> Result<String> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            ..Default::default()
        };

        let mut stream = self.docker.logs(id.as_str(), Some(options));
        let mut output = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| EnvironmentError::Logs {
                name: id.to_string(),
                source: Box::new(e),
            })?;
            output.push_str(&chunk.to_string());
        }
        Ok(output)
    }

    async fn disconnect_network(
        &self,
        network: &str,
        id: &ContainerId,
    ) -> Result<()> {
        self.docker
            .disconnect_network(
                network,
                DisconnectNetworkOptions {
                    container: id.as_str(),
                    force: false,
                },
            )
            .await
            .map_err(|e| EnvironmentError::Disconnect {
                name: id.to_string(),
                network: network.to_string(),
                source: Box::new(e),
            })?;
        Ok(())
    }
}
