use crate::error::EngineError;
use async_trait::async_trait;

pub mod docker;
pub use docker::DockerRuntime;

#[cfg(test)]
pub mod mock;

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Bring the lab described by the compose manifest up, detached.
    async fn compose_up(&self) -> Result<(), EngineError>;

    /// Identifiers of the lab's running containers, in engine listing order.
    async fn running_ids(&self) -> Result<Vec<String>, EngineError>;

    /// Primary network address of one container, as reported by the engine.
    async fn inspect_address(&self, id: &str) -> Result<String, EngineError>;

    /// Stop and remove the lab.
    async fn compose_down(&self) -> Result<(), EngineError>;
}
