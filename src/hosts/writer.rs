//! Single writer for the hosts file.
//!
//! The writer owns the [`HostsStore`] and applies [`HostsUpdate`]s one at a
//! time, so no two read-modify-write cycles ever overlap.  Any number of
//! [`HostsClient`]s may submit updates concurrently; each waits for the
//! outcome of its own cycle.

use std::net::IpAddr;

use log::{debug, info, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::{reconcile, HostsStore};
use crate::error::ReconcileError;
use crate::types::HostsUpdate;

const QUEUE_DEPTH: usize = 128;

pub struct HostsWriter {
    tx: mpsc::Sender<HostsUpdate>,
    task: JoinHandle<usize>,
}

impl HostsWriter {
    /// Start the writer on the blocking pool, taking ownership of `store`.
    pub fn spawn<S: HostsStore>(store: S) -> Self {
        let (tx, mut rx) = mpsc::channel::<HostsUpdate>(QUEUE_DEPTH);

        let task = tokio::task::spawn_blocking(move || {
            let mut applied = 0;
            while let Some(update) = rx.blocking_recv() {
                let result = reconcile(&store, update.address, &update.hostname);
                match &result {
                    Ok(()) => {
                        applied += 1;
                        debug!("Hosts entry written: {} {}", update.address, update.hostname);
                    }
                    Err(e) => warn!("Hosts update for {} failed: {}", e.hostname(), e),
                }
                if update.reply.send(result).is_err() {
                    warn!("Requester for {} went away before the reply", update.hostname);
                }
            }
            applied
        });

        Self { tx, task }
    }

    pub fn client(&self) -> HostsClient {
        HostsClient {
            tx: self.tx.clone(),
        }
    }

    /// Close the queue, wait for pending updates to drain and return how many
    /// were applied successfully.
    pub async fn shutdown(self) -> usize {
        drop(self.tx);
        match self.task.await {
            Ok(applied) => {
                info!("Hosts writer finished, {} entries written", applied);
                applied
            }
            Err(e) => {
                warn!("Hosts writer did not finish cleanly: {}", e);
                0
            }
        }
    }
}

/// Handle for submitting updates to a [`HostsWriter`].
#[derive(Clone)]
pub struct HostsClient {
    tx: mpsc::Sender<HostsUpdate>,
}

impl HostsClient {
    /// Map `hostname` to `address`, waiting until the writer has applied it.
    pub async fn reconcile(&self, address: IpAddr, hostname: &str) -> Result<(), ReconcileError> {
        let (reply, outcome) = oneshot::channel();
        let closed = || ReconcileError::WriterClosed {
            hostname: hostname.to_string(),
        };

        self.tx
            .send(HostsUpdate {
                address,
                hostname: hostname.to_string(),
                reply,
            })
            .await
            .map_err(|_| closed())?;

        outcome.await.map_err(|_| closed())??;
        Ok(())
    }
}
