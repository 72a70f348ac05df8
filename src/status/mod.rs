//! # Status Module
//!
//! Read-only view of the bridge for the web layer.
//!
//! This module handles:
//! - Projecting controller state into JSON snapshots
//! - Handing the latest snapshot across threads through a single slot
//! - Sharing the connectivity flag

pub mod publisher;
pub mod snapshot;

pub use publisher::{Connectivity, SnapshotPublisher, StatusHandle};
pub use snapshot::{ButtonSnapshot, Snapshot};
