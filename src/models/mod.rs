//! Models module for the Screenplay Editor
//!
//! This module contains the block tree, block kinds and change events
//! used by the flow controller, the renumbering pass and the session.

pub mod core;
pub mod elements;
pub mod events;

// Re-export commonly used types
pub use self::core::*;
pub use elements::{BlockKind, ChildKind, TextDirection, UnknownBlockKind, ALL_BLOCK_KINDS};
pub use events::{ChangeEvent, ChangeNotifier, ChangeReason, SubscriptionId};
