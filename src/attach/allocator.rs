//! Node-local device path allocation.
//!
//! The allocator owns the only state shared across concurrent attach
//! operations: the mapping from device path to reserved volume id. The lock
//! is held for the scan/mutate only, never across network calls, so
//! allocation cannot block on cloud latency. Constructed once per process
//! and passed by reference; tests instantiate independent allocators.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, info};

/// Default ordered pool of device path candidates
pub const DEFAULT_DEVICE_POOL: &[&str] = &[
    "/dev/xvdu",
    "/dev/xvdv",
    "/dev/xvdw",
    "/dev/xvdx",
    "/dev/xvdy",
    "/dev/xvdz",
];

/// One reserved device path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceReservation {
    /// Volume the path is reserved for
    pub volume_id: String,
    /// When the reservation was taken
    pub reserved_at: DateTime<Utc>,
}

/// Allocator over a fixed ordered pool of device paths
pub struct DeviceAllocator {
    pool: Vec<String>,
    reservations: Mutex<HashMap<String, DeviceReservation>>,
}

impl DeviceAllocator {
    /// Allocator over the platform default pool
    pub fn new() -> Self {
        Self::with_pool(DEFAULT_DEVICE_POOL.iter().map(|d| d.to_string()).collect())
    }

    /// Allocator over a caller-supplied pool
    pub fn with_pool(pool: Vec<String>) -> Self {
        Self {
            pool,
            reservations: Mutex::new(HashMap::new()),
        }
    }

    /// Reserve the first free device path for the given volume
    pub fn assign(&self, volume_id: &str) -> Result<String> {
        let mut reservations = self.reservations.lock();

        for device in &self.pool {
            if reservations.contains_key(device) {
                continue;
            }
            reservations.insert(
                device.clone(),
                DeviceReservation {
                    volume_id: volume_id.to_string(),
                    reserved_at: Utc::now(),
                },
            );
            debug!(%device, volume = %volume_id, "reserved device");
            return Ok(device.clone());
        }

        Err(Error::NoDevicesAvailable)
    }

    /// Release a reservation after a confirmed attach failure
    ///
    /// Panics if the path is not reserved for the given volume: that means
    /// the local bookkeeping no longer reflects reality and the process
    /// must not keep operating on the device map.
    pub fn release(&self, device: &str, volume_id: &str) {
        let mut reservations = self.reservations.lock();

        let current = reservations
            .get(device)
            .map(|reservation| reservation.volume_id.clone());
        if current.as_deref() == Some(volume_id) {
            reservations.remove(device);
            info!(%device, volume = %volume_id, "released device");
        } else {
            panic!(
                "device map corrupted: {:?} reserved for {:?}, not {:?}",
                device, current, volume_id
            );
        }
    }

    /// Snapshot of current reservations, device path to volume id
    pub fn reserved(&self) -> HashMap<String, String> {
        self.reservations
            .lock()
            .iter()
            .map(|(device, reservation)| (device.clone(), reservation.volume_id.clone()))
            .collect()
    }

    /// The ordered pool this allocator scans
    pub fn pool(&self) -> &[String] {
        &self.pool
    }
}

impl Default for DeviceAllocator {
    fn default() -> Self {
        Self::new()
    }
}
