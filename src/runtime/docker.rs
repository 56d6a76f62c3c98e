use super::ContainerRuntime;
use crate::error::EngineError;
use async_trait::async_trait;
use bollard::container::InspectContainerOptions;
use bollard::Docker;
use log::{debug, info};
use std::path::{Path, PathBuf};
use tokio::process::Command;

pub struct DockerRuntime {
    docker_bin: String,
    compose_file: PathBuf,
    api: Docker,
}

impl DockerRuntime {
    pub fn new(docker_bin: String, compose_file: PathBuf) -> Result<Self, EngineError> {
        // Connect to the local Docker daemon using default settings.
        // This handles unix socket on Linux.
        let api = Docker::connect_with_local_defaults().map_err(EngineError::Connect)?;
        Ok(Self {
            docker_bin,
            compose_file,
            api,
        })
    }

    fn compose_args(&self, rest: &[&str]) -> Vec<String> {
        compose_args(&self.compose_file, rest)
    }

    /// Run the docker CLI and return its trimmed combined output.
    async fn exec(&self, args: Vec<String>) -> Result<String, EngineError> {
        let command = format!("{} {}", self.docker_bin, args.join(" "));
        debug!("Running: {}", command);

        let output = Command::new(&self.docker_bin)
            .args(&args)
            .output()
            .await
            .map_err(|source| EngineError::Spawn {
                command: command.clone(),
                source,
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(EngineError::Command {
                command,
                status: output.status.to_string(),
                output: combined,
            });
        }
        Ok(combined.trim().to_string())
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn compose_up(&self) -> Result<(), EngineError> {
        self.exec(self.compose_args(&["up", "-d"])).await?;
        info!("Compose project up from {}", self.compose_file.display());
        println!("Containers started successfully.");
        Ok(())
    }

    async fn running_ids(&self) -> Result<Vec<String>, EngineError> {
        let out = self.exec(self.compose_args(&["ps", "-q"])).await?;
        Ok(out.split_whitespace().map(str::to_string).collect())
    }

    async fn inspect_address(&self, id: &str) -> Result<String, EngineError> {
        let detail = self
            .api
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
            .map_err(|source| EngineError::Inspect {
                id: id.to_string(),
                source,
            })?;

        get_primary_ip(&detail).ok_or_else(|| EngineError::NoAddress { id: id.to_string() })
    }

    async fn compose_down(&self) -> Result<(), EngineError> {
        self.exec(self.compose_args(&["down"])).await?;
        println!("Containers stopped and removed successfully.");
        Ok(())
    }
}

fn compose_args(compose_file: &Path, rest: &[&str]) -> Vec<String> {
    let mut args = vec![
        "compose".to_string(),
        "-f".to_string(),
        compose_file.display().to_string(),
    ];
    args.extend(rest.iter().map(|s| s.to_string()));
    args
}

/// First non-empty IPv4 address across the container's networks, falling
/// back to a global IPv6 address. Networks are visited in name order.
fn get_primary_ip(detail: &bollard::models::ContainerInspectResponse) -> Option<String> {
    let networks = detail.network_settings.as_ref()?.networks.as_ref()?;
    let mut names: Vec<&String> = networks.keys().collect();
    names.sort();

    let ipv4 = names
        .iter()
        .filter_map(|name| networks[*name].ip_address.as_ref())
        .find(|ip| !ip.is_empty());
    if let Some(ip) = ipv4 {
        return Some(ip.clone());
    }

    names
        .iter()
        .filter_map(|name| networks[*name].global_ipv6_address.as_ref())
        .find(|ip| !ip.is_empty())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bollard::models::{ContainerInspectResponse, EndpointSettings, NetworkSettings};
    use std::collections::HashMap;

    fn detail(networks: Vec<(&str, &str, &str)>) -> ContainerInspectResponse {
        let networks: HashMap<String, EndpointSettings> = networks
            .into_iter()
            .map(|(name, v4, v6)| {
                (
                    name.to_string(),
                    EndpointSettings {
                        ip_address: Some(v4.to_string()),
                        global_ipv6_address: Some(v6.to_string()),
                        ..Default::default()
                    },
                )
            })
            .collect();
        ContainerInspectResponse {
            network_settings: Some(NetworkSettings {
                networks: Some(networks),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn prefers_ipv4_in_network_name_order() {
        let d = detail(vec![("zeta", "10.0.0.9", ""), ("alpha", "172.18.0.2", "")]);
        assert_eq!(get_primary_ip(&d).as_deref(), Some("172.18.0.2"));
    }

    #[test]
    fn skips_empty_ipv4_and_falls_back_to_ipv6() {
        let d = detail(vec![("lab", "", "fd00::2")]);
        assert_eq!(get_primary_ip(&d).as_deref(), Some("fd00::2"));
    }

    #[test]
    fn detached_container_has_no_address() {
        assert_eq!(get_primary_ip(&detail(vec![("none", "", "")])), None);
        assert_eq!(get_primary_ip(&ContainerInspectResponse::default()), None);
    }

    #[test]
    fn compose_commands_target_the_manifest() {
        assert_eq!(
            compose_args(Path::new("lab/docker-compose.yml"), &["ps", "-q"]),
            ["compose", "-f", "lab/docker-compose.yml", "ps", "-q"]
        );
    }
}
