// Path: crates/cli/src/orchestrator/backend.rs

use anyhow::{Context, Result};
use async_trait::async_trait;
use bollard::{
    models::{ContainerCreateBody, HostConfig, PortBinding},
    query_parameters::{
        CreateContainerOptionsBuilder, LogsOptionsBuilder, RemoveContainerOptionsBuilder,
        StartContainerOptions, StopContainerOptionsBuilder,
    },
    Docker,
};
use forklift_types::config::ContainerConfig;
use futures_util::stream::StreamExt;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// The node under test. Owned by the command that launched it.
#[async_trait]
pub trait NodeBackend: Send {
    /// Brings the node up. A no-op for nodes managed elsewhere.
    async fn launch(&mut self) -> Result<()>;

    /// Returns everything the node has logged so far, for failure diagnosis.
    async fn collect_logs(&mut self) -> Result<String>;

    /// Releases all resources. Safe to call more than once.
    async fn cleanup(&mut self) -> Result<()>;

    fn describe(&self) -> String;
}

/// A node started outside the harness.
#[derive(Debug, Clone, Default)]
pub struct ExternalNode {
    log_file: Option<PathBuf>,
}

impl ExternalNode {
    pub fn new(log_file: Option<PathBuf>) -> Self {
        Self { log_file }
    }
}

#[async_trait]
impl NodeBackend for ExternalNode {
    async fn launch(&mut self) -> Result<()> {
        Ok(())
    }

    async fn collect_logs(&mut self) -> Result<String> {
        match &self.log_file {
            Some(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading node log file {}", path.display())),
            None => Ok(String::new()),
        }
    }

    async fn cleanup(&mut self) -> Result<()> {
        Ok(())
    }

    fn describe(&self) -> String {
        match &self.log_file {
            Some(path) => format!("external node (logs: {})", path.display()),
            None => "external node".to_string(),
        }
    }
}

/// A single-container node run through the local Docker daemon.
pub struct DockerNode {
    docker: Docker,
    config: ContainerConfig,
    container_id: Option<String>,
}

impl DockerNode {
    pub fn new(config: ContainerConfig) -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()
            .context("connecting to the Docker daemon")?;
        Ok(Self {
            docker,
            config,
            container_id: None,
        })
    }

    fn container_name(&self) -> String {
        self.config
            .name
            .clone()
            .unwrap_or_else(|| "forklift-node".to_string())
    }
}

#[async_trait]
impl NodeBackend for DockerNode {
    async fn launch(&mut self) -> Result<()> {
        let name = self.container_name();
        let rpc_port = format!("{}/tcp", self.config.rpc_port);

        let env: Vec<String> = self
            .config
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        let mut exposed_ports = HashMap::new();
        exposed_ports.insert(rpc_port.clone(), HashMap::new());
        let mut port_bindings = HashMap::new();
        port_bindings.insert(
            rpc_port,
            Some(vec![PortBinding {
                host_ip: Some("127.0.0.1".to_string()),
                host_port: Some(self.config.rpc_port.to_string()),
            }]),
        );

        let host_config = HostConfig {
            port_bindings: Some(port_bindings),
            ..Default::default()
        };
        let body = ContainerCreateBody {
            image: Some(self.config.image.clone()),
            env: Some(env),
            exposed_ports: Some(exposed_ports),
            host_config: Some(host_config),
            ..Default::default()
        };

        // A run killed before cleanup leaves its container behind under the same name.
        match self
            .docker
            .remove_container(
                &name,
                Some(RemoveContainerOptionsBuilder::default().force(true).build()),
            )
            .await
        {
            Ok(()) => {
                tracing::warn!(target: "backend", container = %name, "Removed leftover container")
            }
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => {}
            Err(e) => {
                return Err(e).with_context(|| format!("removing leftover container {}", name))
            }
        }

        let options = Some(CreateContainerOptionsBuilder::default().name(&name).build());
        let id = self
            .docker
            .create_container(options, body)
            .await
            .with_context(|| format!("creating container {} from {}", name, self.config.image))?
            .id;
        self.container_id = Some(id.clone());
        self.docker
            .start_container(&id, None::<StartContainerOptions>)
            .await
            .with_context(|| format!("starting container {}", name))?;

        tracing::info!(
            target: "backend",
            container = %name,
            id = %id,
            image = %self.config.image,
            grace_secs = self.config.startup_grace_secs,
            "Node container started"
        );
        tokio::time::sleep(self.config.startup_grace()).await;
        Ok(())
    }

    async fn collect_logs(&mut self) -> Result<String> {
        let Some(id) = self.container_id.as_deref() else {
            return Ok(String::new());
        };
        let options = Some(
            LogsOptionsBuilder::default()
                .follow(false)
                .stdout(true)
                .stderr(true)
                .build(),
        );
        let mut stream = self.docker.logs(id, options);
        let mut logs = String::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(output) => logs.push_str(&output.to_string()),
                Err(e) => {
                    tracing::warn!(target: "backend", error = %e, "Log stream ended early");
                    break;
                }
            }
        }
        Ok(logs)
    }

    async fn cleanup(&mut self) -> Result<()> {
        let Some(id) = self.container_id.take() else {
            return Ok(());
        };
        self.docker
            .stop_container(&id, Some(StopContainerOptionsBuilder::default().t(5).build()))
            .await
            .ok();
        self.docker
            .remove_container(
                &id,
                Some(RemoveContainerOptionsBuilder::default().force(true).build()),
            )
            .await
            .with_context(|| format!("removing container {}", id))?;
        tracing::info!(target: "backend", id = %id, "Node container removed");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("docker container {} ({})", self.container_name(), self.config.image)
    }
}

/// Bounded wait used between cleanup attempts.
pub const CLEANUP_TIMEOUT: Duration = Duration::from_secs(30);

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_external_node_reads_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.log");
        std::fs::write(&path, "INF committed state height=10\n").unwrap();

        let mut node = ExternalNode::new(Some(path));
        node.launch().await.unwrap();
        assert!(node.collect_logs().await.unwrap().contains("height=10"));
        node.cleanup().await.unwrap();
    }

    #[tokio::test]
    async fn test_external_node_without_log_file() {
        let mut node = ExternalNode::default();
        assert_eq!(node.collect_logs().await.unwrap(), "");
        assert_eq!(node.describe(), "external node");
    }
}
