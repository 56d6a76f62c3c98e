//! Test double for the container runtime.
//!
//! Serves a preset container listing and per-container addresses, and
//! records every call so orchestration tests can assert on the sequence.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::ContainerRuntime;
use crate::error::EngineError;

#[derive(Default)]
pub struct MockRuntime {
    ids: Vec<String>,
    addresses: HashMap<String, String>,
    fail_up: bool,
    fail_down: bool,
    calls: Mutex<Vec<String>>,
}

impl MockRuntime {
    /// A lab whose containers answer with the given `(id, address)` pairs.
    pub fn with_containers(containers: &[(&str, &str)]) -> Self {
        MockRuntime {
            ids: containers.iter().map(|(id, _)| id.to_string()).collect(),
            addresses: containers
                .iter()
                .map(|(id, ip)| (id.to_string(), ip.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    /// Make `inspect_address` fail for `id`.
    pub fn without_address(mut self, id: &str) -> Self {
        self.addresses.remove(id);
        self
    }

    pub fn failing_up(mut self) -> Self {
        self.fail_up = true;
        self
    }

    pub fn failing_down(mut self) -> Self {
        self.fail_down = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn command_failure(command: &str) -> EngineError {
        EngineError::Command {
            command: command.to_string(),
            status: "exit status: 1".into(),
            output: "mock failure".into(),
        }
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn compose_up(&self) -> Result<(), EngineError> {
        self.record("up".into());
        if self.fail_up {
            return Err(Self::command_failure("docker compose up -d"));
        }
        Ok(())
    }

    async fn running_ids(&self) -> Result<Vec<String>, EngineError> {
        self.record("ps".into());
        Ok(self.ids.clone())
    }

    async fn inspect_address(&self, id: &str) -> Result<String, EngineError> {
        self.record(format!("inspect {}", id));
        self.addresses
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::NoAddress { id: id.to_string() })
    }

    async fn compose_down(&self) -> Result<(), EngineError> {
        self.record("down".into());
        if self.fail_down {
            return Err(Self::command_failure("docker compose down"));
        }
        Ok(())
    }
}
