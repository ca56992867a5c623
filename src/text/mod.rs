//! Cursor positions inside the block tree
//!
//! ## Modules
//!
//! - `cursor`: block path + character offset

pub mod cursor;

// Re-exports for convenience
pub use cursor::Cursor;
