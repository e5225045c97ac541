//! Cluster Volume Manager
//!
//! Node-local block volume discovery and attachment for clustered etcd
//! masters running on cloud instances. The manager resolves the node's
//! identity from instance metadata, discovers its cluster via instance tags,
//! lists candidate cluster volumes through the inventory API, and drives
//! asynchronous attach requests to completion.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       VolumeManager                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐  ┌──────────────┐  ┌───────────────────┐  │
//! │  │   Identity   │  │    Volume    │  │      Attach       │  │
//! │  │  Resolver +  │  │   Catalog    │  │   Orchestrator    │  │
//! │  │  Discoverer  │  │ (tag decode) │  │ + DeviceAllocator │  │
//! │  └──────┬───────┘  └──────┬───────┘  └─────────┬─────────┘  │
//! │         │                 │                    │            │
//! ├─────────┴─────────────────┴────────────────────┴────────────┤
//! │        Ports: MetadataSource / CloudInventory / Clock       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cloud metadata and inventory clients are external collaborators
//! implementing the ports in [`domain::ports`]; this crate only consumes
//! their typed results. Detaching, filesystem mounting, and cluster
//! membership logic are out of scope: this component makes a disk appear at
//! a device path, higher layers decide what to do with it.
//!
//! # Modules
//!
//! - [`identity`]: instance identity resolution and cluster discovery
//! - [`catalog`]: volume listing, tag decoding, attach-status polling
//! - [`attach`]: device path allocation and the attach state machine
//! - [`manager`]: process-lifetime facade wiring the pieces together
//! - [`domain`]: ports to the external cloud client
//! - [`error`]: error types and classification

pub mod attach;
pub mod catalog;
pub mod domain;
pub mod error;
pub mod identity;
pub mod manager;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export commonly used types
pub use attach::{
    AttachOrchestrator, AttachState, DeviceAllocator, DeviceReservation, DEFAULT_DEVICE_POOL,
    DEFAULT_POLL_INTERVAL, STATUS_ATTACHING,
};

pub use catalog::{
    decode_volume, DecodedVolume, EtcdClusterSpec, EtcdSpecError, TagIssue, VolumeCatalog,
    VolumeDescriptor, VolumeInfo, TAG_CLUSTER_ID, TAG_ETCD_CLUSTER_PREFIX, TAG_MASTER_ID,
    TAG_NAME, TAG_ROLE_MASTER,
};

pub use domain::ports::{
    AttachmentDescription, Clock, ClockRef, CloudInventory, CloudInventoryRef, FilterPredicate,
    InstanceDescription, InstanceFilter, InstancePage, MetadataSource, MetadataSourceRef,
    TagPair, TokioClock, VolumeDescription, VolumeFilter, VolumePage,
};

pub use error::{BoxError, Error, ErrorClass, MetadataField, Result};

pub use identity::{
    discover_cluster, resolve_location, InstanceDiscovery, InstanceIdentity, InstanceLocation,
};

pub use manager::VolumeManager;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
