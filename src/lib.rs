//! Screenplay Editor WASM Module
//!
//! Structured-document core for a screenplay editor: template grammars
//! describe the block types of a screenplay format and how Enter/Tab move
//! between them; the editing session applies those rules to one document,
//! keeps scene numbers consistent, and moves screenplays in and out of
//! storage and export formats.

pub mod models;
pub mod text;
pub mod templates;
pub mod flow;
pub mod structure;
pub mod persistence;
pub mod converters;
pub mod session;
pub mod api;

// Re-export commonly used types
pub use models::core::*;
pub use models::elements::*;
pub use models::events::*;
pub use session::{EditingSession, MigrationState, MigrationStep, SessionError};
pub use templates::{builtin_registry, TemplateGrammar, TemplateRegistry};
pub use text::Cursor;

use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    init_logging();

    log::info!("Screenplay Editor WASM module initialized");
}

#[cfg(feature = "console_log")]
fn init_logging() {
    if console_log::init_with_level(log::Level::Debug).is_err() {
        wasm_warn!("Logger already initialized");
    }
}

#[cfg(not(feature = "console_log"))]
fn init_logging() {}
