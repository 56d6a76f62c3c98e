//! Bastion login and connection instructions.

use std::process::Stdio;

use log::debug;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::Config;
use crate::error::EngineError;
use crate::types::{hostname_for, BASTION};

/// Interactive ssh session to the bastion through its published port.
#[derive(Debug, Clone)]
pub struct SshLogin {
    bin: String,
    user: String,
    host: String,
    port: u16,
    password: String,
}

impl SshLogin {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            bin: cfg.ssh_bin.clone(),
            user: cfg.ssh_user.clone(),
            host: cfg.ssh_host.clone(),
            port: cfg.port_base,
            password: cfg.ssh_password.clone(),
        }
    }

    pub fn args(&self) -> Vec<String> {
        vec![
            "-p".to_string(),
            self.port.to_string(),
            format!("{}@{}", self.user, self.host),
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
        ]
    }

    /// Run ssh with the password on stdin and the terminal on stdout/stderr.
    pub async fn run(&self) -> Result<(), EngineError> {
        let args = self.args();
        let command = format!("{} {}", self.bin, args.join(" "));
        debug!("Running: {}", command);

        let spawn_err = |source| EngineError::Spawn {
            command: command.clone(),
            source,
        };
        let mut child = Command::new(&self.bin)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(spawn_err)?;

        if let Some(mut stdin) = child.stdin.take() {
            // ssh may exit before reading; a broken pipe shows up in the exit status.
            let _ = stdin.write_all(format!("{}\n", self.password).as_bytes()).await;
        }

        let status = child.wait().await.map_err(spawn_err)?;
        if !status.success() {
            return Err(EngineError::Command {
                command,
                status: status.to_string(),
                output: String::new(),
            });
        }
        Ok(())
    }
}

/// One `ssh user@host` line per lab host, bastion first.
pub fn instructions(user: &str, machines: usize) -> Vec<String> {
    std::iter::once(BASTION.to_string())
        .chain((1..=machines).map(hostname_for))
        .map(|host| format!("ssh {}@{}", user, host))
        .collect()
}
