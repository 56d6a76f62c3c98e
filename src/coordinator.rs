//! Concurrent hosts reconciliation.
//!
//! One task per discovered instance submits its entry to the hosts writer.
//! All tasks are awaited whatever their outcome; if any failed, the failure
//! of the earliest record in input order is returned.

use futures_util::future;
use log::{error, info};

use crate::error::ReconcileError;
use crate::hosts::writer::HostsClient;
use crate::types::AddressRecord;

pub async fn reconcile_all(
    client: &HostsClient,
    records: &[AddressRecord],
) -> Result<(), ReconcileError> {
    info!("Updating hosts entries for {} containers", records.len());

    let handles: Vec<_> = records
        .iter()
        .map(|record| {
            let client = client.clone();
            let address = record.address;
            let hostname = record.hostname().to_string();
            tokio::spawn(async move { client.reconcile(address, &hostname).await })
        })
        .collect();

    let results = future::join_all(handles).await;

    let failures: Vec<ReconcileError> = records
        .iter()
        .zip(results)
        .filter_map(|(record, result)| match result {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(source) => Some(ReconcileError::Join {
                hostname: record.hostname().to_string(),
                source,
            }),
        })
        .collect();

    for e in &failures {
        error!("Error updating hosts file: {}", e);
    }
    match failures.into_iter().next() {
        Some(first) => Err(first),
        None => Ok(()),
    }
}
