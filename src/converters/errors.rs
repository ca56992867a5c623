//! Error types for screenplay import
//!
//! Every import failure leaves the session untouched; the message is shown
//! to the user as-is.

use thiserror::Error;

use crate::models::BlockKind;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportError {
    /// Only `.lss` files can be imported
    #[error("Unsupported file type '{0}': only .lss files are supported")]
    UnsupportedExtension(String),

    /// File is not valid JSON
    #[error("Failed to parse file: {0}")]
    MalformedJson(String),

    /// A node type that no block kind answers to
    #[error("Unknown node type '{0}'")]
    UnknownNodeType(String),

    /// Well-formed JSON that is not a document tree
    #[error("Invalid document structure: {0}")]
    InvalidStructure(String),

    /// The document uses a block type its grammar does not declare
    #[error("Block type '{kind}' is not part of template '{template_id}'")]
    ForeignBlock { kind: BlockKind, template_id: String },
}

impl From<serde_json::Error> for ImportError {
    fn from(e: serde_json::Error) -> Self {
        ImportError::MalformedJson(e.to_string())
    }
}

/// Export failures (template or serialization problems, never user input)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl From<mustache::Error> for ExportError {
    fn from(e: mustache::Error) -> Self {
        ExportError::Template(e.to_string())
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        ExportError::Serialization(e.to_string())
    }
}
