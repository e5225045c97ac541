//! Volume tag contract and fail-safe decoding.
//!
//! Decoding is pure: it always assembles a full descriptor and reports any
//! problems as [`TagIssue`] values. The caller decides whether to log and
//! enforces exclusion, so malformed cloud metadata can never produce a
//! volume a caller might act on incorrectly.

use crate::catalog::volume::{EtcdClusterSpec, VolumeDescriptor, VolumeInfo};
use crate::domain::ports::VolumeDescription;

// =============================================================================
// Tag Keys
// =============================================================================

/// Differentiates logically independent clusters in the same region
pub const TAG_CLUSTER_ID: &str = "KubernetesCluster";

/// Marks a resource as belonging to the master role
pub const TAG_ROLE_MASTER: &str = "k8s.io/role/master";

/// Master ordinal a volume belongs to; value must parse as an integer
pub const TAG_MASTER_ID: &str = "k8s.io/master/id";

/// Prefix of the etcd cluster family; the suffix names the cluster
pub const TAG_ETCD_CLUSTER_PREFIX: &str = "k8s.io/etcd/";

/// Reserved display-name tag, recognized and ignored
pub const TAG_NAME: &str = "Name";

// =============================================================================
// Decode Outcome
// =============================================================================

/// A problem found while decoding one volume's tag set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagIssue {
    /// Master-id tag value did not parse as an integer; excludes the volume
    InvalidMasterId { key: String, value: String },
    /// Etcd cluster tag value violated the spec format; excludes the volume
    InvalidEtcdSpec {
        key: String,
        value: String,
        reason: String,
    },
    /// Unrecognized tag key; informational only
    UnknownTag { key: String, value: String },
}

impl TagIssue {
    /// Whether this issue excludes the owning volume from catalog results
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TagIssue::UnknownTag { .. })
    }
}

impl std::fmt::Display for TagIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagIssue::InvalidMasterId { key, value } => {
                write!(f, "invalid master-id tag {}={}", key, value)
            }
            TagIssue::InvalidEtcdSpec { key, value, reason } => {
                write!(f, "invalid etcd cluster tag {}={}: {}", key, value, reason)
            }
            TagIssue::UnknownTag { key, value } => {
                write!(f, "unknown tag {}={}", key, value)
            }
        }
    }
}

/// A fully assembled descriptor plus everything found wrong with its tags
#[derive(Debug, Clone)]
pub struct DecodedVolume {
    pub descriptor: VolumeDescriptor,
    pub issues: Vec<TagIssue>,
}

impl DecodedVolume {
    /// Whether any fatal issue excludes this volume from catalog results
    pub fn excluded(&self) -> bool {
        self.issues.iter().any(TagIssue::is_fatal)
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode one volume description into a descriptor
///
/// `local_instance_id` scopes the attachment fields: `attached_to` is the
/// first non-empty instance id among the attachment records, `local_device`
/// is set only from an attachment to this node.
pub fn decode_volume(description: &VolumeDescription, local_instance_id: &str) -> DecodedVolume {
    let mut descriptor = VolumeDescriptor {
        id: description.volume_id.clone(),
        status: description.state.clone(),
        attached_to: None,
        local_device: None,
        info: VolumeInfo {
            description: description.volume_id.clone(),
            master_id: None,
            etcd_clusters: Vec::new(),
        },
    };

    for attachment in &description.attachments {
        let instance_id = match attachment.instance_id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => continue,
        };

        if descriptor.attached_to.is_none() {
            descriptor.attached_to = Some(instance_id.to_string());
        }
        if instance_id == local_instance_id && descriptor.local_device.is_none() {
            descriptor.local_device = attachment.device.clone();
        }
    }

    let mut issues = Vec::new();

    for tag in &description.tags {
        match tag.key.as_str() {
            TAG_CLUSTER_ID | TAG_ROLE_MASTER | TAG_NAME => {}
            TAG_MASTER_ID => match tag.value.parse::<i32>() {
                Ok(master_id) => descriptor.info.master_id = Some(master_id),
                Err(_) => issues.push(TagIssue::InvalidMasterId {
                    key: tag.key.clone(),
                    value: tag.value.clone(),
                }),
            },
            key if key.starts_with(TAG_ETCD_CLUSTER_PREFIX) => {
                let cluster_key = &key[TAG_ETCD_CLUSTER_PREFIX.len()..];
                match EtcdClusterSpec::parse(cluster_key, &tag.value) {
                    Ok(spec) => descriptor.info.etcd_clusters.push(spec),
                    Err(err) => issues.push(TagIssue::InvalidEtcdSpec {
                        key: tag.key.clone(),
                        value: tag.value.clone(),
                        reason: err.to_string(),
                    }),
                }
            }
            _ => issues.push(TagIssue::UnknownTag {
                key: tag.key.clone(),
                value: tag.value.clone(),
            }),
        }
    }

    DecodedVolume { descriptor, issues }
}
