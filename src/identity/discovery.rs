//! Cluster membership discovery from the instance's tag set.
//!
//! Fetches exactly one instance description by id, reads the cluster tag and
//! the private IP, and fails unless both are present and valid. Partial
//! success is not a state: a node that knows its cluster but not its IP (or
//! vice versa) cannot participate.

use crate::catalog::tags::TAG_CLUSTER_ID;
use crate::domain::ports::{CloudInventory, InstanceDescription, InstanceFilter};
use crate::error::{Error, Result};
use std::net::IpAddr;
use tracing::info;

/// Cluster membership of the local instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceDiscovery {
    /// Logical cluster this instance belongs to; never empty
    pub cluster_tag: String,
    /// Internal IP address of this instance
    pub internal_ip: IpAddr,
}

/// Discover the cluster tag and internal IP for the given instance
pub async fn discover_cluster(
    inventory: &dyn CloudInventory,
    instance_id: &str,
) -> Result<InstanceDiscovery> {
    let instance = describe_single_instance(inventory, instance_id).await?;

    let cluster_tag = instance
        .tags
        .iter()
        .find(|tag| tag.key == TAG_CLUSTER_ID)
        .map(|tag| tag.value.clone())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::ClusterTagMissing {
            tag: TAG_CLUSTER_ID,
            instance_id: instance_id.to_string(),
        })?;

    let raw_ip = instance.private_ip_address.unwrap_or_default();
    let internal_ip: IpAddr = raw_ip.parse().map_err(|_| Error::InternalIpInvalid {
        instance_id: instance_id.to_string(),
        raw: raw_ip.clone(),
    })?;

    info!(cluster = %cluster_tag, ip = %internal_ip, instance = %instance_id, "discovered cluster membership");

    Ok(InstanceDiscovery {
        cluster_tag,
        internal_ip,
    })
}

/// Describe exactly one instance, accumulating across pages
///
/// Zero or multiple matches for a single id means the inventory API drifted
/// from its contract; refusing to pick an arbitrary match keeps discovery
/// deterministic.
async fn describe_single_instance(
    inventory: &dyn CloudInventory,
    instance_id: &str,
) -> Result<InstanceDescription> {
    let filter = InstanceFilter::by_id(instance_id);

    let mut instances = Vec::new();
    let mut page_token: Option<String> = None;
    loop {
        let page = inventory
            .describe_instances(&filter, page_token.as_deref())
            .await
            .map_err(|source| Error::CloudApi {
                operation: "describe-instances",
                source,
            })?;

        instances.extend(page.instances);

        match page.next_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    if instances.len() != 1 {
        return Err(Error::InstanceLookup {
            instance_id: instance_id.to_string(),
            count: instances.len(),
        });
    }

    Ok(instances.swap_remove(0))
}
