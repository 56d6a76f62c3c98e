//! Compose manifest for the lab.
//!
//! The manifest is a pure function of the machine count, image, first
//! published port and network name: one `bastion` service plus `minion-1` to
//! `minion-N`, each publishing its sshd on `port_base + ordinal` and attached
//! to a single bridge network.

use std::collections::BTreeMap;
use std::path::Path;

use log::info;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::error::ComposeError;
use crate::types::hostname_for;

const COMPOSE_VERSION: &str = "3.8";
const SSH_PORT: u16 = 22;

#[derive(Debug, Serialize)]
pub struct ComposeFile {
    pub version: String,
    pub services: Services,
    pub networks: BTreeMap<String, Network>,
}

/// Services keep their insertion order in the rendered YAML.
#[derive(Debug, Default)]
pub struct Services(pub Vec<(String, Service)>);

impl Serialize for Services {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, service) in &self.0 {
            map.serialize_entry(name, service)?;
        }
        map.end()
    }
}

#[derive(Debug, Serialize)]
pub struct Service {
    pub container_name: String,
    pub hostname: String,
    pub image: String,
    pub ports: Vec<PortMapping>,
    pub networks: Vec<String>,
}

/// Long-form port syntax, so no `HOST:GUEST` string is ever read as a number.
#[derive(Debug, Serialize)]
pub struct PortMapping {
    pub target: u16,
    pub published: u16,
}

#[derive(Debug, Serialize)]
pub struct Network {
    pub driver: String,
}

impl ComposeFile {
    pub fn for_lab(machines: usize, image: &str, port_base: u16, network: &str) -> Self {
        let services = (0..=machines)
            .map(|ordinal| {
                let name = hostname_for(ordinal);
                let service = Service {
                    container_name: name.clone(),
                    hostname: name.clone(),
                    image: image.to_string(),
                    ports: vec![PortMapping {
                        target: SSH_PORT,
                        published: port_base.saturating_add(ordinal as u16),
                    }],
                    networks: vec![network.to_string()],
                };
                (name, service)
            })
            .collect();

        let mut networks = BTreeMap::new();
        networks.insert(
            network.to_string(),
            Network {
                driver: "bridge".into(),
            },
        );

        Self {
            version: COMPOSE_VERSION.into(),
            services: Services(services),
            networks,
        }
    }

    pub fn render(&self) -> Result<String, ComposeError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Render the lab manifest and write it to `path`.
pub async fn write_manifest(
    path: &Path,
    machines: usize,
    image: &str,
    port_base: u16,
    network: &str,
) -> Result<(), ComposeError> {
    let content = ComposeFile::for_lab(machines, image, port_base, network).render()?;
    tokio::fs::write(path, content)
        .await
        .map_err(|source| ComposeError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    info!("Manifest covers bastion and {} minions", machines);
    println!("{} generated successfully.", path.display());
    Ok(())
}
