//! Format converters
//!
//! Pure functions between a `Document` (plus its grammar) and external
//! formats. None of them feed back into the editing session.
//!
//! - `document_json`: the typed-tree wire form used for storage
//! - `lss`: wrapped `.lss` project files, legacy bare trees
//! - `html`: `.doc` envelope and the print surface

pub mod document_json;
pub mod errors;
pub mod html;
pub mod lss;

pub use document_json::{document_from_json, document_to_json, WireNode};
pub use errors::{ExportError, ImportError};
pub use lss::{build_payload, export_file_name, export_lss, export_stem, import_lss, read_payload, ImportedScreenplay};

use serde::{Deserialize, Serialize};

/// Export targets offered to the user
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Lss,
    /// HTML saved as `.doc` (the menu calls it "docx")
    #[serde(alias = "docx")]
    Doc,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Lss => "lss",
            ExportFormat::Doc => "doc",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Lss => "application/json",
            ExportFormat::Doc => "application/msword",
            ExportFormat::Pdf => "text/html",
        }
    }
}

/// A rendered export ready for download (or printing, for PDF)
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportedFile {
    pub file_name: String,
    pub mime_type: &'static str,
    pub format: ExportFormat,
    pub contents: String,
}
