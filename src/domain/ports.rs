//! Domain Ports - trait boundaries to the cloud provider
//!
//! These traits define the seams between the volume manager and the external
//! systems it consumes: the local instance metadata service, the cloud
//! inventory/attach API, and wall-clock time. Client adapters implement these
//! traits; the manager only consumes their typed results.
//!
//! Transport failures cross the boundary as [`BoxError`]; the manager wraps
//! them with the failing operation's name so diagnostics keep the full chain.

use crate::error::BoxError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Wire Types
// =============================================================================

/// A single key/value tag as reported by the inventory API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPair {
    pub key: String,
    pub value: String,
}

impl TagPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One attachment record on a volume description
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentDescription {
    /// Instance the volume is attached to, if any
    #[serde(default)]
    pub instance_id: Option<String>,
    /// Device path on that instance, if reported
    #[serde(default)]
    pub device: Option<String>,
}

/// A volume as described by the inventory API
///
/// `state` is passed through verbatim; the manager interprets only the
/// transitional `attaching` value and treats everything else as opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeDescription {
    pub volume_id: String,
    pub state: String,
    #[serde(default)]
    pub availability_zone: Option<String>,
    #[serde(default)]
    pub attachments: Vec<AttachmentDescription>,
    #[serde(default)]
    pub tags: Vec<TagPair>,
}

/// An instance as described by the inventory API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceDescription {
    pub instance_id: String,
    #[serde(default)]
    pub private_ip_address: Option<String>,
    #[serde(default)]
    pub tags: Vec<TagPair>,
}

/// One page of instance descriptions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstancePage {
    pub instances: Vec<InstanceDescription>,
    pub next_token: Option<String>,
}

/// One page of volume descriptions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VolumePage {
    pub volumes: Vec<VolumeDescription>,
    pub next_token: Option<String>,
}

// =============================================================================
// Filters
// =============================================================================

/// A single server-side predicate; a filter is the AND of its predicates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterPredicate {
    /// Tag with this key has exactly this value
    TagEquals { key: String, value: String },
    /// Tag with this key is present, any value
    TagPresent { key: String },
    /// Volume lives in this availability zone
    AvailabilityZone { zone: String },
    /// Volume is currently attached to this instance
    AttachedToInstance { instance_id: String },
}

/// Filter for volume listing; `volume_ids` and `predicates` are both ANDed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeFilter {
    pub predicates: Vec<FilterPredicate>,
    pub volume_ids: Vec<String>,
}

impl VolumeFilter {
    /// Filter matching exactly one volume by id
    pub fn by_id(volume_id: impl Into<String>) -> Self {
        Self {
            predicates: Vec::new(),
            volume_ids: vec![volume_id.into()],
        }
    }
}

/// Filter for instance listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceFilter {
    pub instance_ids: Vec<String>,
}

impl InstanceFilter {
    pub fn by_id(instance_id: impl Into<String>) -> Self {
        Self {
            instance_ids: vec![instance_id.into()],
        }
    }
}

// =============================================================================
// Metadata Source Port
// =============================================================================

/// Port for the local instance metadata service
///
/// Queries are expected to be immediately available on the host; callers do
/// not retry, a failure is environment misconfiguration.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn region(&self) -> std::result::Result<String, BoxError>;

    async fn availability_zone(&self) -> std::result::Result<String, BoxError>;

    async fn instance_id(&self) -> std::result::Result<String, BoxError>;
}

// =============================================================================
// Cloud Inventory Port
// =============================================================================

/// Port for the cloud inventory/attach API
///
/// Listing calls are paginated; callers accumulate across pages and treat a
/// failure on any page as a whole-operation failure. `attach_volume` is
/// asynchronous on the cloud side: success only means the request was
/// accepted, completion is observed via subsequent describe polling.
#[async_trait]
pub trait CloudInventory: Send + Sync {
    async fn describe_instances(
        &self,
        filter: &InstanceFilter,
        page_token: Option<&str>,
    ) -> std::result::Result<InstancePage, BoxError>;

    async fn describe_volumes(
        &self,
        filter: &VolumeFilter,
        page_token: Option<&str>,
    ) -> std::result::Result<VolumePage, BoxError>;

    async fn attach_volume(
        &self,
        device: &str,
        instance_id: &str,
        volume_id: &str,
    ) -> std::result::Result<(), BoxError>;
}

// =============================================================================
// Clock Port
// =============================================================================

/// Port for time, injectable so tests can drive poll sequences without
/// real delays
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production clock backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// =============================================================================
// Type Aliases for Arc'd Traits
// =============================================================================

pub type MetadataSourceRef = Arc<dyn MetadataSource>;
pub type CloudInventoryRef = Arc<dyn CloudInventory>;
pub type ClockRef = Arc<dyn Clock>;
