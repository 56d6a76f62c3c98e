//! minions entry point.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgAction, Parser};
use log::info;

mod compose;
mod config;
mod coordinator;
mod discovery;
mod error;
mod hosts;
mod login;
mod provision;
mod runtime;
mod types;

use config::Config;
use hosts::FileHostsStore;
use provision::{LabRequest, Provisioner};
use runtime::DockerRuntime;

#[derive(Parser, Debug)]
#[command(name = "minions")]
#[command(about = "Provision a bastion and N minion containers with local name resolution", long_about = None)]
struct Cli {
    /// Number of minion services to create (must be > 0)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    machines: u32,

    /// Cleanup containers after execution
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true"
    )]
    cleanup: bool,

    /// Docker image to use for containers (overrides the configured image)
    #[arg(long)]
    image: Option<String>,

    /// Extra TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();

    // Load configuration
    let cfg = Config::load(cli.config.as_deref())?;
    info!("Starting minions with config: {:?}", cfg);

    let machines = cli.machines as usize;
    if machines > cfg.max_machines() {
        anyhow::bail!(
            "--machines {} would publish ports past {} (port_base {})",
            machines,
            u16::MAX,
            cfg.port_base
        );
    }

    let request = LabRequest {
        machines,
        image: cli.image.unwrap_or_else(|| cfg.image.clone()),
        cleanup: cli.cleanup,
    };

    let runtime = Arc::new(DockerRuntime::new(
        cfg.docker_bin.clone(),
        cfg.compose_file.clone(),
    )?);
    let hosts = FileHostsStore::new(cfg.hosts_file.clone());

    Provisioner::new(cfg, runtime, hosts).run(&request).await?;

    info!("Done.");
    Ok(())
}
