//! Screenplay storage collaborator
//!
//! The session never talks to a backend directly. Everything goes through
//! `ScreenplayStore`, a request/response boundary keyed by screenplay
//! name. `MemoryStore` is the in-process implementation used natively and
//! in tests. The host's client answers asynchronously, so the WASM layer
//! awaits it between the session's prepare and report calls instead.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Version written into every saved payload
pub const PAYLOAD_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("Screenplay '{0}' not found")]
    NotFound(String),

    #[error("Screenplay '{0}' already exists")]
    AlreadyExists(String),

    #[error("Invalid screenplay name '{0}'")]
    InvalidName(String),

    /// The backend or the network failed
    #[error("{operation} failed: {reason}")]
    Backend { operation: String, reason: String },
}

impl PersistenceError {
    pub fn backend(operation: &str, reason: impl Into<String>) -> Self {
        PersistenceError::Backend {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }
}

/// Metadata stored beside the document
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileMeta {
    pub template_id: String,
    pub version: String,
}

impl FileMeta {
    pub fn for_template(template_id: &str) -> Self {
        Self {
            template_id: template_id.to_string(),
            version: PAYLOAD_VERSION.to_string(),
        }
    }
}

/// The `{meta, content}` wrapper around a DocumentJSON tree
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScreenplayPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<FileMeta>,
    pub content: Value,
}

impl ScreenplayPayload {
    pub fn new(template_id: &str, content: Value) -> Self {
        Self {
            meta: Some(FileMeta::for_template(template_id)),
            content,
        }
    }

    pub fn template_id(&self) -> Option<&str> {
        self.meta.as_ref().map(|m| m.template_id.as_str())
    }

    /// Accept both the wrapped shape and a bare legacy DocumentJSON tree
    pub fn from_stored(value: Value) -> Self {
        let is_wrapped = value
            .as_object()
            .map(|obj| obj.contains_key("content") && !obj.contains_key("type"))
            .unwrap_or(false);
        if is_wrapped {
            if let Ok(payload) = serde_json::from_value::<ScreenplayPayload>(value.clone()) {
                return payload;
            }
            // Unreadable meta: keep the content, lose the template id
            if let Some(content) = value.get("content") {
                return Self {
                    meta: None,
                    content: content.clone(),
                };
            }
        }
        Self {
            meta: None,
            content: value,
        }
    }
}

/// Backend for named screenplays
pub trait ScreenplayStore {
    /// First save of a new name
    fn create(&mut self, name: &str, payload: &ScreenplayPayload) -> Result<(), PersistenceError>;

    /// Overwrite an existing screenplay
    fn save(&mut self, name: &str, payload: &ScreenplayPayload) -> Result<(), PersistenceError>;

    fn list(&self) -> Result<Vec<String>, PersistenceError>;

    /// Raw stored value: wrapped payload or legacy bare DocumentJSON
    fn open(&self, name: &str) -> Result<Value, PersistenceError>;

    fn delete(&mut self, name: &str) -> Result<(), PersistenceError>;
}

/// In-memory store; payloads are kept as JSON values, exactly as a
/// remote backend would return them
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, Value>,
    failing: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a backend error
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    /// Store a raw value (e.g. a legacy bare document)
    pub fn insert_raw(&mut self, name: &str, value: Value) {
        self.entries.insert(name.to_string(), value);
    }

    pub fn get_raw(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check(&self, operation: &str) -> Result<(), PersistenceError> {
        if self.failing {
            return Err(PersistenceError::backend(operation, "storage unavailable"));
        }
        Ok(())
    }

    fn encode(payload: &ScreenplayPayload) -> Result<Value, PersistenceError> {
        serde_json::to_value(payload).map_err(|e| PersistenceError::backend("encode", e.to_string()))
    }
}

fn validate_name(name: &str) -> Result<(), PersistenceError> {
    if name.trim().is_empty() {
        return Err(PersistenceError::InvalidName(name.to_string()));
    }
    Ok(())
}

impl ScreenplayStore for MemoryStore {
    fn create(&mut self, name: &str, payload: &ScreenplayPayload) -> Result<(), PersistenceError> {
        self.check("create")?;
        validate_name(name)?;
        if self.entries.contains_key(name) {
            return Err(PersistenceError::AlreadyExists(name.to_string()));
        }
        self.entries.insert(name.to_string(), Self::encode(payload)?);
        Ok(())
    }

    fn save(&mut self, name: &str, payload: &ScreenplayPayload) -> Result<(), PersistenceError> {
        self.check("save")?;
        if !self.entries.contains_key(name) {
            return Err(PersistenceError::NotFound(name.to_string()));
        }
        self.entries.insert(name.to_string(), Self::encode(payload)?);
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, PersistenceError> {
        self.check("list")?;
        Ok(self.entries.keys().cloned().collect())
    }

    fn open(&self, name: &str) -> Result<Value, PersistenceError> {
        self.check("open")?;
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| PersistenceError::NotFound(name.to_string()))
    }

    fn delete(&mut self, name: &str) -> Result<(), PersistenceError> {
        self.check("delete")?;
        self.entries
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| PersistenceError::NotFound(name.to_string()))
    }
}
