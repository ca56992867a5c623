//! Derived document structure
//!
//! State recomputed from the block tree after edits. Nothing here is
//! stored outside the document itself.
//!
//! ## Modules
//!
//! - `renumber`: sequential scene heading numbers

pub mod renumber;

// Re-exports for convenience
pub use renumber::{compute_renumber_patch, run_renumber_pass, RenumberPatch, SceneNumberChange};
