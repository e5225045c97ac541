//! Decoded volume descriptors and the etcd cluster spec wrapper.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Volume Descriptor
// =============================================================================

/// Structured information decoded from a volume's tag set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeInfo {
    /// Human-readable description; defaults to the volume id
    pub description: String,
    /// Master ordinal this volume belongs to, if tagged
    pub master_id: Option<i32>,
    /// Etcd clusters this volume carries data for, in tag order
    pub etcd_clusters: Vec<EtcdClusterSpec>,
}

/// A cluster volume as seen through the catalog
///
/// `attached_to` and `local_device` reflect the cloud's authoritative state
/// as of the last catalog query; they are never cached beyond a single call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeDescriptor {
    /// Volume identifier
    pub id: String,
    /// Cloud-reported status, passed through verbatim
    pub status: String,
    /// Instance the volume is attached to, if any
    pub attached_to: Option<String>,
    /// Local device path, set only when attached to this node
    pub local_device: Option<String>,
    /// Decoded tag information
    pub info: VolumeInfo,
}

impl VolumeDescriptor {
    /// Check whether the cloud reports this volume attached to the
    /// given instance
    pub fn is_attached_to(&self, instance_id: &str) -> bool {
        self.attached_to.as_deref() == Some(instance_id)
    }
}

// =============================================================================
// Etcd Cluster Spec
// =============================================================================

/// Structural error in an etcd cluster tag value
///
/// Never propagated past the tag decoder; the owning volume is excluded
/// instead (fail-safe).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EtcdSpecError {
    #[error("expected <node>/<node,node,...>, got {value:?}")]
    Malformed { value: String },

    #[error("node name is empty")]
    EmptyNodeName,

    #[error("member list is empty")]
    EmptyMembers,

    #[error("node {node_name:?} is not in the member list")]
    NodeNotMember { node_name: String },
}

/// An etcd cluster membership spec carried in a volume tag
///
/// The value format is an external interface (`<node>/<node,node,...>`);
/// this wrapper only validates structure and fails safe on violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtcdClusterSpec {
    /// Cluster key, taken from the tag key suffix
    pub cluster_key: String,
    /// This volume's member name within the cluster
    pub node_name: String,
    /// All member names, in declaration order
    pub node_names: Vec<String>,
}

impl EtcdClusterSpec {
    /// Parse a tag value for the cluster named by `cluster_key`
    pub fn parse(cluster_key: &str, value: &str) -> Result<Self, EtcdSpecError> {
        let (node_name, members) = value.split_once('/').ok_or_else(|| EtcdSpecError::Malformed {
            value: value.to_string(),
        })?;

        if node_name.is_empty() {
            return Err(EtcdSpecError::EmptyNodeName);
        }

        let node_names: Vec<String> = members
            .split(',')
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect();

        if node_names.is_empty() {
            return Err(EtcdSpecError::EmptyMembers);
        }

        if !node_names.iter().any(|name| name == node_name) {
            return Err(EtcdSpecError::NodeNotMember {
                node_name: node_name.to_string(),
            });
        }

        Ok(Self {
            cluster_key: cluster_key.to_string(),
            node_name: node_name.to_string(),
            node_names,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_parse_spec() {
        let spec = EtcdClusterSpec::parse("main", "a/a,b,c").unwrap();
        assert_eq!(spec.cluster_key, "main");
        assert_eq!(spec.node_name, "a");
        assert_eq!(spec.node_names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_single_member() {
        let spec = EtcdClusterSpec::parse("events", "a/a").unwrap();
        assert_eq!(spec.node_names, vec!["a"]);
    }

    #[test]
    fn test_parse_missing_separator() {
        let err = EtcdClusterSpec::parse("main", "abc").unwrap_err();
        assert_matches!(err, EtcdSpecError::Malformed { .. });
    }

    #[test]
    fn test_parse_empty_node_name() {
        let err = EtcdClusterSpec::parse("main", "/a,b").unwrap_err();
        assert_matches!(err, EtcdSpecError::EmptyNodeName);
    }

    #[test]
    fn test_parse_empty_members() {
        let err = EtcdClusterSpec::parse("main", "a/").unwrap_err();
        assert_matches!(err, EtcdSpecError::EmptyMembers);
    }

    #[test]
    fn test_parse_node_not_member() {
        let err = EtcdClusterSpec::parse("main", "d/a,b,c").unwrap_err();
        assert_matches!(err, EtcdSpecError::NodeNotMember { .. });
    }

    #[test]
    fn test_is_attached_to() {
        let descriptor = VolumeDescriptor {
            id: "vol-1".into(),
            status: "in-use".into(),
            attached_to: Some("i-0abc".into()),
            local_device: None,
            info: VolumeInfo::default(),
        };
        assert!(descriptor.is_attached_to("i-0abc"));
        assert!(!descriptor.is_attached_to("i-other"));
    }
}
