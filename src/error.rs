//! Error types for each provisioning stage.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures talking to the container engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("command '{command}' failed: {status}\nOutput: {output}")]
    Command {
        command: String,
        status: String,
        output: String,
    },
    #[error("failed to connect to the Docker daemon: {0}")]
    Connect(#[source] bollard::errors::Error),
    #[error("inspecting container {id}: {source}")]
    Inspect {
        id: String,
        #[source]
        source: bollard::errors::Error,
    },
    #[error("container {id} has no network address")]
    NoAddress { id: String },
}

/// Failure to learn the address of one instance.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("inspecting container {id}: {source}")]
    Instance {
        id: String,
        #[source]
        source: EngineError,
    },
    #[error("container {id} reported an invalid address '{address}'")]
    InvalidAddress { id: String, address: String },
    #[error("discovery task for container {id} did not complete: {source}")]
    Join {
        id: String,
        #[source]
        source: tokio::task::JoinError,
    },
}

impl DiscoveryError {
    /// The engine identifier of the instance that failed.
    pub fn instance_id(&self) -> &str {
        match self {
            DiscoveryError::Instance { id, .. }
            | DiscoveryError::InvalidAddress { id, .. }
            | DiscoveryError::Join { id, .. } => id,
        }
    }
}

/// Failure of one read-modify-write cycle on the hosts file.
#[derive(Debug, Error)]
pub enum HostsError {
    #[error("opening hosts file for {hostname}: {source}")]
    Open {
        hostname: String,
        #[source]
        source: io::Error,
    },
    #[error("scanning hosts file for {hostname}: {source}")]
    Scan {
        hostname: String,
        #[source]
        source: io::Error,
    },
    #[error("writing hosts file for {hostname}: {source}")]
    Write {
        hostname: String,
        #[source]
        source: io::Error,
    },
    #[error("truncating hosts file for {hostname}: {source}")]
    Truncate {
        hostname: String,
        #[source]
        source: io::Error,
    },
}

impl HostsError {
    pub fn hostname(&self) -> &str {
        match self {
            HostsError::Open { hostname, .. }
            | HostsError::Scan { hostname, .. }
            | HostsError::Write { hostname, .. }
            | HostsError::Truncate { hostname, .. } => hostname,
        }
    }
}

/// Failure to reconcile one hostname through the writer task.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("updating hosts file: {0}")]
    Hosts(#[from] HostsError),
    #[error("hosts writer stopped before {hostname} was applied")]
    WriterClosed { hostname: String },
    #[error("reconcile task for {hostname} did not complete: {source}")]
    Join {
        hostname: String,
        #[source]
        source: tokio::task::JoinError,
    },
}

/// Failure to render or write the compose manifest.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("rendering compose manifest: {0}")]
    Render(#[from] serde_yaml::Error),
    #[error("writing {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Fatal failures of a provisioning run.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error("starting containers: {0}")]
    Start(#[source] EngineError),
    #[error("listing containers: {0}")]
    List(#[source] EngineError),
    #[error("unexpected number of containers found: expected {expected}, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
    #[error("container inspection failed: {0}")]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error("cleaning up containers: {0}")]
    Teardown(#[source] EngineError),
}
