//! Shared types for the WASM API
//!
//! This module contains the result types returned to JavaScript.

use serde::Serialize;
use serde_json::Value;

use crate::converters::document_to_json;
use crate::session::{EditingSession, MigrationState, MigrationStep};
use crate::templates::RuntimeConfig;
use crate::text::Cursor;

/// Everything the host needs to re-render after an operation
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub template_id: String,
    pub template_name: String,
    pub current_file: Option<String>,
    pub document: Value,        // DocumentJSON
    pub cursor: Cursor,
    pub migration: MigrationState,
}

impl SessionSnapshot {
    pub fn of(session: &EditingSession) -> Self {
        Self {
            template_id: session.template_id().to_string(),
            template_name: session.grammar().name.to_string(),
            current_file: session.current_file().map(str::to_string),
            document: document_to_json(session.document()),
            cursor: session.cursor().clone(),
            migration: session.migration_state().clone(),
        }
    }
}

/// Result of a key press, shortcut or text input
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EditResult {
    /// When true the host must suppress the editor's default behavior
    pub handled: bool,
    pub snapshot: SessionSnapshot,
}

/// Result of a template migration step
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MigrationResult {
    pub step: MigrationStep,
    pub snapshot: SessionSnapshot,
}

/// Live shortcut/flow configuration, for the shortcut editor
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ConfigView {
    pub storage_key: String,
    pub config: RuntimeConfig,
}
