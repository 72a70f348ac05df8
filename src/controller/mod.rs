//! # Controller Module
//!
//! Arduino controller input handling.
//!
//! This module handles:
//! - Parsing the 12-field serial frame
//! - Applying deadzones and the trigger response curve
//! - Deciding which changes are worth forwarding to the virtual device

pub mod differ;
pub mod frame;
pub mod signal;
pub mod state;

pub use differ::{ChangeSet, StateDiffer};
pub use frame::{FrameError, RawFrame};
pub use signal::{SignalMapper, StickSide};
pub use state::{Button, NormalizedState, SentState};
