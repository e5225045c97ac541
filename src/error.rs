//! Error types for the cluster volume manager
//!
//! Errors fall into the taxonomy used throughout the crate: environment
//! (metadata unresolvable), discovery (cluster tag / instance lookup),
//! transport (cloud API call failure), allocation (device pool exhausted),
//! and state (cloud-reported state that contradicts local intent).
//! Malformed tag data is deliberately *not* an error: the catalog converts
//! it into a per-volume exclusion (see [`crate::catalog::TagIssue`]).

use thiserror::Error;

/// Transport-level failure reported by an external client implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// =============================================================================
// Metadata Fields
// =============================================================================

/// The metadata field whose resolution failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataField {
    Region,
    AvailabilityZone,
    InstanceId,
}

impl std::fmt::Display for MetadataField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataField::Region => write!(f, "region"),
            MetadataField::AvailabilityZone => write!(f, "zone"),
            MetadataField::InstanceId => write!(f, "instance-id"),
        }
    }
}

// =============================================================================
// Error Type
// =============================================================================

/// Unified error type for the volume manager
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Environment Errors
    // =========================================================================
    #[error("error querying instance metadata (for {field}): {source}")]
    Metadata {
        field: MetadataField,
        #[source]
        source: BoxError,
    },

    // =========================================================================
    // Discovery Errors
    // =========================================================================
    #[error("unexpected number of instances found with id {instance_id:?}: {count}")]
    InstanceLookup { instance_id: String, count: usize },

    #[error("cluster tag {tag:?} not found on this instance ({instance_id:?})")]
    ClusterTagMissing {
        tag: &'static str,
        instance_id: String,
    },

    #[error("internal IP not found on this instance ({instance_id:?}): {raw:?}")]
    InternalIpInvalid { instance_id: String, raw: String },

    // =========================================================================
    // Transport Errors
    // =========================================================================
    #[error("cloud API call failed ({operation}): {source}")]
    CloudApi {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("error attaching volume {volume_id:?}: {source}")]
    AttachRequest {
        volume_id: String,
        #[source]
        source: BoxError,
    },

    // =========================================================================
    // Allocation Errors
    // =========================================================================
    #[error("all devices in use")]
    NoDevicesAvailable,

    // =========================================================================
    // State Errors
    // =========================================================================
    #[error("volume {volume_id:?} disappeared during attach")]
    VolumeVanished { volume_id: String },

    #[error("multiple volumes found with id {volume_id:?}: {count}")]
    AmbiguousVolume { volume_id: String, count: usize },

    #[error("unable to attach volume {volume_id:?}, already attached to {attached_to:?}")]
    AttachedElsewhere {
        volume_id: String,
        attached_to: String,
    },

    #[error("observed unexpected volume state {status:?} for volume {volume_id:?}")]
    UnexpectedVolumeState { volume_id: String, status: String },
}

// =============================================================================
// Error Classification
// =============================================================================

/// Broad class of an error, for callers deciding whether to abort startup,
/// surface the failure, or treat it as terminal for a single volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Metadata/identity unresolvable; fatal at startup, never retried
    Environment,
    /// Missing/ambiguous cluster tag or instance match
    Discovery,
    /// Cloud API call failure; propagated, no internal retry
    Transport,
    /// Device pool exhausted on this node
    Allocation,
    /// Cloud-reported state contradicts local intent
    State,
}

impl Error {
    /// Classify this error within the crate's taxonomy
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::Metadata { .. } => ErrorClass::Environment,

            Error::InstanceLookup { .. }
            | Error::ClusterTagMissing { .. }
            | Error::InternalIpInvalid { .. } => ErrorClass::Discovery,

            Error::CloudApi { .. } | Error::AttachRequest { .. } => ErrorClass::Transport,

            Error::NoDevicesAvailable => ErrorClass::Allocation,

            Error::VolumeVanished { .. }
            | Error::AmbiguousVolume { .. }
            | Error::AttachedElsewhere { .. }
            | Error::UnexpectedVolumeState { .. } => ErrorClass::State,
        }
    }

    /// Check if this error is fatal for the whole process rather than for a
    /// single volume operation
    pub fn is_startup_fatal(&self) -> bool {
        matches!(self.class(), ErrorClass::Environment | ErrorClass::Discovery)
    }
}

/// Result type alias for the volume manager
pub type Result<T> = std::result::Result<T, Error>;
