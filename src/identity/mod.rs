//! Identity Module
//!
//! Resolves who this node is: its placement from the local metadata service
//! and its cluster membership from the instance's tag set.

pub mod discovery;
pub mod resolver;

pub use discovery::*;
pub use resolver::*;

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Identity of the local instance, immutable once resolved at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceIdentity {
    /// Cloud region
    pub region: String,
    /// Availability zone within the region
    pub zone: String,
    /// Instance identifier
    pub instance_id: String,
    /// Internal (private) IP address
    pub internal_ip: IpAddr,
}
