//! Top-level volume manager facade.
//!
//! Owns the instance's identity and cluster membership for the process
//! lifetime and wires the catalog, allocator, and orchestrator together.

use crate::attach::allocator::DeviceAllocator;
use crate::attach::orchestrator::AttachOrchestrator;
use crate::catalog::query::VolumeCatalog;
use crate::catalog::volume::VolumeDescriptor;
use crate::domain::ports::{ClockRef, CloudInventoryRef, MetadataSource, TokioClock};
use crate::error::Result;
use crate::identity::discovery::discover_cluster;
use crate::identity::resolver::resolve_location;
use crate::identity::InstanceIdentity;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::info;

/// Node-local manager for cluster volume discovery and attachment
pub struct VolumeManager {
    identity: InstanceIdentity,
    cluster_tag: String,
    catalog: Arc<VolumeCatalog>,
    allocator: Arc<DeviceAllocator>,
    orchestrator: AttachOrchestrator,
}

impl std::fmt::Debug for VolumeManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolumeManager")
            .field("identity", &self.identity)
            .field("cluster_tag", &self.cluster_tag)
            .finish_non_exhaustive()
    }
}

impl VolumeManager {
    /// Bootstrap with the production clock and default device pool
    pub async fn bootstrap(
        metadata: &dyn MetadataSource,
        inventory: CloudInventoryRef,
    ) -> Result<Self> {
        Self::bootstrap_with(
            metadata,
            inventory,
            Arc::new(TokioClock),
            DeviceAllocator::new(),
        )
        .await
    }

    /// Bootstrap with an injected clock and allocator
    ///
    /// Resolves identity and discovers cluster membership up front; any
    /// failure there is fatal and nothing is constructed.
    pub async fn bootstrap_with(
        metadata: &dyn MetadataSource,
        inventory: CloudInventoryRef,
        clock: ClockRef,
        allocator: DeviceAllocator,
    ) -> Result<Self> {
        let location = resolve_location(metadata).await?;
        let discovery = discover_cluster(inventory.as_ref(), &location.instance_id).await?;

        let identity = InstanceIdentity {
            region: location.region,
            zone: location.zone,
            instance_id: location.instance_id,
            internal_ip: discovery.internal_ip,
        };

        info!(
            cluster = %discovery.cluster_tag,
            instance = %identity.instance_id,
            zone = %identity.zone,
            "volume manager ready"
        );

        let catalog = Arc::new(VolumeCatalog::new(
            inventory.clone(),
            identity.instance_id.clone(),
        ));
        let allocator = Arc::new(allocator);
        let orchestrator = AttachOrchestrator::new(
            inventory,
            catalog.clone(),
            allocator.clone(),
            clock,
            identity.instance_id.clone(),
        );

        Ok(Self {
            identity,
            cluster_tag: discovery.cluster_tag,
            catalog,
            allocator,
            orchestrator,
        })
    }

    /// The logical cluster this node belongs to
    pub fn cluster_id(&self) -> &str {
        &self.cluster_tag
    }

    /// This node's internal IP address
    pub fn internal_ip(&self) -> IpAddr {
        self.identity.internal_ip
    }

    /// Full identity of this node
    pub fn identity(&self) -> &InstanceIdentity {
        &self.identity
    }

    /// This node's device allocator
    pub fn allocator(&self) -> &DeviceAllocator {
        &self.allocator
    }

    /// List volumes attachable in this node's zone
    pub async fn find_volumes(&self) -> Result<Vec<VolumeDescriptor>> {
        let filter = VolumeCatalog::mountable_filter(&self.cluster_tag, &self.identity.zone);
        self.catalog.list(&filter).await
    }

    /// Attach the volume to this node, returning the device path
    pub async fn attach_volume(&self, volume: &mut VolumeDescriptor) -> Result<String> {
        self.orchestrator.attach(volume).await
    }
}
