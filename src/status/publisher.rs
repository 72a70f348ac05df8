//! # Snapshot Publisher
//!
//! Single-slot hand-off between the controller session and status readers.
//! Publishing overwrites whatever was not yet taken, so a slow reader always
//! gets the most recent frame and never a backlog.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::snapshot::Snapshot;

/// Overwrite-on-full single-slot buffer.
#[derive(Debug, Default)]
pub struct SnapshotPublisher {
    slot: Mutex<Option<Snapshot>>,
}

impl SnapshotPublisher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // The slot holds plain data, so a poisoned lock is still usable.
    fn slot(&self) -> MutexGuard<'_, Option<Snapshot>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `snapshot`, replacing any unread one.
    pub fn publish(&self, snapshot: Snapshot) {
        *self.slot() = Some(snapshot);
    }

    /// Takes the pending snapshot, leaving the slot empty.
    pub fn try_take(&self) -> Option<Snapshot> {
        self.slot().take()
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.slot().is_some()
    }
}

/// Shared "controller link is up" flag.
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct Connectivity(Arc<AtomicBool>);

impl Connectivity {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, connected: bool) {
        self.0.store(connected, Ordering::SeqCst);
    }

    #[must_use]
    pub fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Read side handed to the web layer.
#[derive(Debug, Clone)]
pub struct StatusHandle {
    publisher: Arc<SnapshotPublisher>,
    connectivity: Connectivity,
    device_name: String,
}

impl StatusHandle {
    #[must_use]
    pub fn new(publisher: Arc<SnapshotPublisher>, connectivity: Connectivity, device_name: &str) -> Self {
        Self {
            publisher,
            connectivity,
            device_name: device_name.to_string(),
        }
    }

    #[must_use]
    pub fn get_connectivity(&self) -> bool {
        self.connectivity.get()
    }

    /// Takes the latest snapshot, or the no-data placeholder if none is
    /// pending.
    #[must_use]
    pub fn get_latest_snapshot(&self) -> Snapshot {
        self.publisher
            .try_take()
            .unwrap_or_else(|| Snapshot::no_data(&self.device_name, self.connectivity.get()))
    }
}
