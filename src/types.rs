//! Data structures shared by the provisioning stages.
//!
//! An [`Instance`] is one running container of the lab.  Its hostname is
//! fixed by its position in the engine's listing, never by anything the
//! engine reports later, so the same listing always yields the same names.

use std::fmt;
use std::net::IpAddr;

use tokio::sync::oneshot;

use crate::error::HostsError;

/// Hostname of the first instance of every lab.
pub const BASTION: &str = "bastion";

/// Derive the hostname for the instance at `ordinal` in the engine listing.
pub fn hostname_for(ordinal: usize) -> String {
    if ordinal == 0 {
        BASTION.to_string()
    } else {
        format!("minion-{}", ordinal)
    }
}

/// A running container of the lab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    /// Opaque identifier assigned by the container engine.
    pub id: String,
    /// 0 for the bastion, 1..=N for the minions.
    pub ordinal: usize,
    pub name: String,
}

impl Instance {
    pub fn new(id: impl Into<String>, ordinal: usize) -> Self {
        Self {
            id: id.into(),
            ordinal,
            name: hostname_for(ordinal),
        }
    }

    /// Build instances from an engine listing, naming them by position.
    pub fn from_ids<I, S>(ids: I) -> Vec<Instance>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ids.into_iter()
            .enumerate()
            .map(|(ordinal, id)| Instance::new(id, ordinal))
            .collect()
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// The discovered address of one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    pub instance: Instance,
    pub address: IpAddr,
}

impl AddressRecord {
    pub fn hostname(&self) -> &str {
        &self.instance.name
    }
}

/// A request for the hosts writer task to map `hostname` to `address`.
///
/// The outcome of the read-modify-write cycle is sent back on `reply`.
#[derive(Debug)]
pub struct HostsUpdate {
    pub address: IpAddr,
    pub hostname: String,
    pub reply: oneshot::Sender<Result<(), HostsError>>,
}
