//! `.lss` project files
//!
//! An `.lss` file is the pretty-printed `{meta, content}` payload. Older
//! files are a bare DocumentJSON tree with no meta; they load under the
//! default template.

use serde_json::Value;

use super::document_json::{document_from_json, document_to_json};
use super::errors::ImportError;
use crate::models::Document;
use crate::persistence::ScreenplayPayload;

pub const LSS_EXTENSION: &str = "lss";

/// Suffixes stripped from a user-supplied export name
const KNOWN_SUFFIXES: [&str; 4] = [".lss", ".json", ".doc", ".pdf"];

/// Name used when the user leaves the export name empty
pub const DEFAULT_EXPORT_NAME: &str = "screenplay";

/// A parsed import, before any grammar is chosen
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedScreenplay {
    /// Template id from the file meta, when present
    pub template_id: Option<String>,
    pub document: Document,
}

/// Wrap a document for storage or export
pub fn build_payload(document: &Document, template_id: &str) -> ScreenplayPayload {
    ScreenplayPayload::new(template_id, document_to_json(document))
}

pub fn export_lss(document: &Document, template_id: &str) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&build_payload(document, template_id))
}

/// Decode a stored or imported payload value
pub fn read_payload(value: Value) -> Result<ImportedScreenplay, ImportError> {
    let payload = ScreenplayPayload::from_stored(value);
    let document = document_from_json(&payload.content)?;
    Ok(ImportedScreenplay {
        template_id: payload.template_id().map(str::to_string),
        document,
    })
}

/// Import the text of an `.lss` file
pub fn import_lss(file_name: &str, text: &str) -> Result<ImportedScreenplay, ImportError> {
    let has_extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.eq_ignore_ascii_case(LSS_EXTENSION))
        .unwrap_or(false);
    if !has_extension {
        return Err(ImportError::UnsupportedExtension(file_name.to_string()));
    }

    let value: Value = serde_json::from_str(text)?;
    read_payload(value)
}

/// User-supplied export name without a known file suffix
pub fn export_stem(base: &str) -> String {
    let trimmed = base.trim();
    let lower = trimmed.to_ascii_lowercase();
    let stem = KNOWN_SUFFIXES
        .iter()
        .find(|suffix| lower.ends_with(*suffix))
        .map(|suffix| &trimmed[..trimmed.len() - suffix.len()])
        .unwrap_or(trimmed);
    if stem.is_empty() {
        DEFAULT_EXPORT_NAME.to_string()
    } else {
        stem.to_string()
    }
}

pub fn export_file_name(base: &str, extension: &str) -> String {
    format!("{}.{}", export_stem(base), extension)
}
