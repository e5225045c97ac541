//! Attach orchestration state machine.
//!
//! Drives one volume from `NotAttached` to a terminal state:
//!
//! ```text
//! NotAttached -> DeviceAssigned -> AttachRequested -> Polling
//!                                                       |-> Attached
//!                                                       |-> FailedElsewhere
//!                                                       |-> FailedUnexpectedState
//!                                                       |-> FailedTransport
//! ```
//!
//! The poll loop is unbounded by design: this is a one-shot node-bootstrap
//! attach, not a general reconciliation loop. A caller wanting a deadline
//! runs the future on a cancellable task and accepts that cloud-side state
//! may be left mid-transition.

use crate::attach::allocator::DeviceAllocator;
use crate::catalog::query::VolumeCatalog;
use crate::catalog::volume::VolumeDescriptor;
use crate::domain::ports::{ClockRef, CloudInventoryRef};
use crate::error::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Interval between attach-status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Transitional status the cloud reports while an attach is in flight
pub const STATUS_ATTACHING: &str = "attaching";

// =============================================================================
// Attach State
// =============================================================================

/// State of one attach operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachState {
    NotAttached,
    DeviceAssigned,
    AttachRequested,
    Polling,
    Attached,
    FailedElsewhere,
    FailedUnexpectedState,
    FailedTransport,
}

impl AttachState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AttachState::Attached
                | AttachState::FailedElsewhere
                | AttachState::FailedUnexpectedState
                | AttachState::FailedTransport
        )
    }
}

impl std::fmt::Display for AttachState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AttachState::NotAttached => "not-attached",
            AttachState::DeviceAssigned => "device-assigned",
            AttachState::AttachRequested => "attach-requested",
            AttachState::Polling => "polling",
            AttachState::Attached => "attached",
            AttachState::FailedElsewhere => "failed-elsewhere",
            AttachState::FailedUnexpectedState => "failed-unexpected-state",
            AttachState::FailedTransport => "failed-transport",
        };
        write!(f, "{}", name)
    }
}

/// Terminal state an error maps to, for logging
fn terminal_state(err: &Error) -> AttachState {
    match err {
        Error::AttachedElsewhere { .. } => AttachState::FailedElsewhere,
        Error::UnexpectedVolumeState { .. }
        | Error::VolumeVanished { .. }
        | Error::AmbiguousVolume { .. } => AttachState::FailedUnexpectedState,
        // Allocation failure terminates before any cloud call was made
        Error::NoDevicesAvailable => AttachState::NotAttached,
        _ => AttachState::FailedTransport,
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Drives attach operations for this node
pub struct AttachOrchestrator {
    inventory: CloudInventoryRef,
    catalog: Arc<VolumeCatalog>,
    allocator: Arc<DeviceAllocator>,
    clock: ClockRef,
    instance_id: String,
    poll_interval: Duration,
}

impl AttachOrchestrator {
    pub fn new(
        inventory: CloudInventoryRef,
        catalog: Arc<VolumeCatalog>,
        allocator: Arc<DeviceAllocator>,
        clock: ClockRef,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            inventory,
            catalog,
            allocator,
            clock,
            instance_id: instance_id.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the poll interval; tests shorten it, production keeps
    /// the default
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Attach the volume to this instance, returning the device path
    ///
    /// Idempotent against re-invocation: a descriptor that already carries a
    /// `local_device` short-circuits without allocating or calling the cloud.
    /// On success the device is recorded on the descriptor.
    pub async fn attach(&self, volume: &mut VolumeDescriptor) -> Result<String> {
        if let Some(device) = volume.local_device.clone() {
            debug!(volume = %volume.id, %device, "volume already attached to this node");
            return Ok(device);
        }

        match self.attach_new(volume).await {
            Ok(device) => {
                info!(volume = %volume.id, device = %device, state = %AttachState::Attached, "volume attached");
                Ok(device)
            }
            Err(err) => {
                warn!(volume = %volume.id, state = %terminal_state(&err), error = %err, "attach failed");
                Err(err)
            }
        }
    }

    async fn attach_new(&self, volume: &mut VolumeDescriptor) -> Result<String> {
        let device = self.allocator.assign(&volume.id)?;
        debug!(volume = %volume.id, %device, state = %AttachState::DeviceAssigned, "attach state");

        if let Err(source) = self
            .inventory
            .attach_volume(&device, &self.instance_id, &volume.id)
            .await
        {
            // The request may have reached the cloud before failing, so the
            // reservation is kept rather than racing an in-flight attach.
            // The device stays leaked until process restart.
            return Err(Error::AttachRequest {
                volume_id: volume.id.clone(),
                source,
            });
        }
        debug!(volume = %volume.id, %device, state = %AttachState::AttachRequested, "attach state");

        self.poll_until_terminal(volume, device).await
    }

    /// Wait (forever) for the volume to attach or reach a
    /// failure-to-attach condition
    async fn poll_until_terminal(
        &self,
        volume: &mut VolumeDescriptor,
        device: String,
    ) -> Result<String> {
        loop {
            debug!(volume = %volume.id, state = %AttachState::Polling, "attach state");
            let observed = self.catalog.poll_by_id(&volume.id).await?;

            if observed.is_empty() {
                return Err(Error::VolumeVanished {
                    volume_id: volume.id.clone(),
                });
            }
            if observed.len() > 1 {
                return Err(Error::AmbiguousVolume {
                    volume_id: volume.id.clone(),
                    count: observed.len(),
                });
            }

            let current = &observed[0];
            if let Some(attached_to) = current.attached_to.as_deref() {
                if attached_to == self.instance_id {
                    volume.local_device = Some(device.clone());
                    return Ok(device);
                }

                self.allocator.release(&device, &volume.id);
                return Err(Error::AttachedElsewhere {
                    volume_id: volume.id.clone(),
                    attached_to: attached_to.to_string(),
                });
            }

            if current.status != STATUS_ATTACHING {
                // An unrecognized status is assumed non-transient
                return Err(Error::UnexpectedVolumeState {
                    volume_id: volume.id.clone(),
                    status: current.status.clone(),
                });
            }

            debug!(volume = %volume.id, status = %current.status, "waiting for volume to attach");
            self.clock.sleep(self.poll_interval).await;
        }
    }
}
