//! Provisioning run: manifest, start, discover, reconcile, login, teardown.

use std::sync::Arc;

use log::{info, warn};

use crate::compose;
use crate::config::Config;
use crate::coordinator::reconcile_all;
use crate::discovery::discover;
use crate::error::ProvisionError;
use crate::hosts::writer::HostsWriter;
use crate::hosts::HostsStore;
use crate::login::{instructions, SshLogin};
use crate::runtime::ContainerRuntime;
use crate::types::{AddressRecord, Instance};

/// What the user asked for on the command line.
#[derive(Debug, Clone)]
pub struct LabRequest {
    pub machines: usize,
    pub image: String,
    pub cleanup: bool,
}

pub struct Provisioner<S: HostsStore> {
    config: Config,
    runtime: Arc<dyn ContainerRuntime>,
    hosts: S,
    login: Option<SshLogin>,
}

impl<S: HostsStore> Provisioner<S> {
    pub fn new(config: Config, runtime: Arc<dyn ContainerRuntime>, hosts: S) -> Self {
        let login = config.login.then(|| SshLogin::from_config(&config));
        Self {
            config,
            runtime,
            hosts,
            login,
        }
    }

    pub async fn run(self, request: &LabRequest) -> Result<Vec<AddressRecord>, ProvisionError> {
        compose::write_manifest(
            &self.config.compose_file,
            request.machines,
            &request.image,
            self.config.port_base,
            &self.config.network_name,
        )
        .await?;

        self.runtime
            .compose_up()
            .await
            .map_err(ProvisionError::Start)?;

        let ids = self
            .runtime
            .running_ids()
            .await
            .map_err(ProvisionError::List)?;
        let expected = request.machines + 1;
        if ids.len() != expected {
            return Err(ProvisionError::CountMismatch {
                expected,
                actual: ids.len(),
            });
        }

        let instances = Instance::from_ids(ids);
        let records = discover(Arc::clone(&self.runtime), &instances).await?;

        let writer = HostsWriter::spawn(self.hosts);
        let reconciled = reconcile_all(&writer.client(), &records).await;
        writer.shutdown().await;
        reconciled?;
        info!(
            "{} updated for {} hosts",
            self.config.hosts_file.display(),
            records.len()
        );

        if let Some(login) = &self.login {
            println!(
                "\nAttempting SSH login to bastion (password '{}' is sent in clear text):",
                self.config.ssh_password
            );
            match login.run().await {
                Ok(()) => println!("Successfully logged into bastion."),
                Err(e) => warn!("Bastion login failed: {}", e),
            }
        }

        println!("\nSSH Connection Instructions (using your SSH key):");
        for line in instructions(&self.config.ssh_user, request.machines) {
            println!("{}", line);
        }

        if request.cleanup {
            self.runtime
                .compose_down()
                .await
                .map_err(ProvisionError::Teardown)?;
        }

        Ok(records)
    }
}
