//! Address discovery.
//!
//! One task per instance asks the container runtime for that instance's
//! address.  Every task runs to completion before results are inspected; a
//! failure in one never cancels its siblings.  When any task failed, the
//! failure of the earliest instance in listing order is returned and the rest
//! are logged.

use std::net::IpAddr;
use std::sync::Arc;

use futures_util::future;
use log::{debug, error, info};

use crate::error::DiscoveryError;
use crate::runtime::ContainerRuntime;
use crate::types::{AddressRecord, Instance};

/// Discover the address of every instance, in input order.
pub async fn discover(
    runtime: Arc<dyn ContainerRuntime>,
    instances: &[Instance],
) -> Result<Vec<AddressRecord>, DiscoveryError> {
    info!("Discovering addresses of {} containers", instances.len());

    let handles: Vec<_> = instances
        .iter()
        .cloned()
        .map(|instance| {
            let runtime = Arc::clone(&runtime);
            tokio::spawn(async move { discover_one(runtime.as_ref(), instance).await })
        })
        .collect();

    let results = future::join_all(handles).await;

    let mut records = Vec::with_capacity(instances.len());
    let mut failures = Vec::new();
    for (instance, result) in instances.iter().zip(results) {
        match result {
            Ok(Ok(record)) => records.push(record),
            Ok(Err(e)) => failures.push(e),
            Err(source) => failures.push(DiscoveryError::Join {
                id: instance.id.clone(),
                source,
            }),
        }
    }

    for e in &failures {
        error!("Discovery failed for container {}: {}", e.instance_id(), e);
    }
    match failures.into_iter().next() {
        Some(first) => Err(first),
        None => Ok(records),
    }
}

async fn discover_one(
    runtime: &dyn ContainerRuntime,
    instance: Instance,
) -> Result<AddressRecord, DiscoveryError> {
    let raw = runtime
        .inspect_address(&instance.id)
        .await
        .map_err(|source| DiscoveryError::Instance {
            id: instance.id.clone(),
            source,
        })?;

    let trimmed = raw.trim();
    let address: IpAddr = trimmed
        .parse()
        .map_err(|_| DiscoveryError::InvalidAddress {
            id: instance.id.clone(),
            address: trimmed.to_string(),
        })?;

    debug!("{} -> {}", instance, address);
    Ok(AddressRecord { instance, address })
}
