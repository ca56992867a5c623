//! Screenplay Editor WASM API
//!
//! This module provides the JavaScript-facing API for the screenplay editor.
//! It includes shared utilities for serialization, error handling and
//! logging, as well as the API functions organized by functional domain.
//!
//! # Module Structure
//!
//! - `helpers`: Shared utilities for serialization, error handling, and logging
//! - `types`: Result shapes returned to JavaScript
//! - `store`: Bridge from the host's storage object to `ScreenplayStore`
//! - `core`: Session lifecycle, editing, preferences
//! - `documents`: Save/open/list/delete, import and export
//! - `migration`: Template switch prompts

pub mod helpers;
pub mod types;
pub mod store;
pub mod core;
pub mod documents;
pub mod migration;

// Re-export all public functions from modules to keep a flat public API
pub use self::core::*;
pub use documents::*;
pub use migration::*;
