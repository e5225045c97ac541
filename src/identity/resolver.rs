//! Instance placement resolution from the local metadata service.
//!
//! Queries region, then availability zone, then instance id, in that order;
//! the first failure aborts naming the field that could not be resolved.
//! There are no retries: metadata is served from the local host and a failure
//! means the environment is misconfigured, not that the call was unlucky.

use crate::domain::ports::MetadataSource;
use crate::error::{Error, MetadataField, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Placement of the local instance as reported by the metadata service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceLocation {
    pub region: String,
    pub zone: String,
    pub instance_id: String,
}

/// Resolve the local instance's placement
pub async fn resolve_location(metadata: &dyn MetadataSource) -> Result<InstanceLocation> {
    let region = metadata.region().await.map_err(|source| Error::Metadata {
        field: MetadataField::Region,
        source,
    })?;

    let zone = metadata
        .availability_zone()
        .await
        .map_err(|source| Error::Metadata {
            field: MetadataField::AvailabilityZone,
            source,
        })?;

    let instance_id = metadata
        .instance_id()
        .await
        .map_err(|source| Error::Metadata {
            field: MetadataField::InstanceId,
            source,
        })?;

    debug!(%region, %zone, instance = %instance_id, "resolved instance location");

    Ok(InstanceLocation {
        region,
        zone,
        instance_id,
    })
}
