//! Screenplay files: storage, import and export
//!
//! Storage calls take the host's storage object (see `store`) on every
//! call rather than holding it inside the session. They are async: the
//! session is read before the store is awaited and updated after it
//! settles, never locked across the wait.

use wasm_bindgen::prelude::*;

use crate::api::core::{snapshot, with_session};
use crate::api::helpers::{deserialize, persistence_error, serialize};
use crate::api::store::JsStore;
use crate::converters::ExportFormat;
use crate::wasm_info;

#[wasm_bindgen(js_name = newScreenplay)]
pub fn new_screenplay() -> Result<JsValue, JsValue> {
    with_session("newScreenplay", |session| session.new_screenplay())?;
    snapshot("newScreenplay")
}

/// Save under the current name; fails with a "save as" hint when unnamed
#[wasm_bindgen(js_name = saveScreenplay)]
pub async fn save_screenplay(store_js: JsValue) -> Result<JsValue, JsValue> {
    let store = JsStore::new(store_js)?;
    let (name, payload) = with_session("saveScreenplay", |session| {
        Ok((session.save_target()?, session.payload()))
    })?;
    store
        .save(&name, &payload)
        .await
        .map_err(|e| persistence_error("saveScreenplay", e))?;
    snapshot("saveScreenplay")
}

#[wasm_bindgen(js_name = saveScreenplayAs)]
pub async fn save_screenplay_as(store_js: JsValue, name: String) -> Result<JsValue, JsValue> {
    let store = JsStore::new(store_js)?;
    wasm_info!("saveScreenplayAs: '{}'", name);
    let payload = with_session("saveScreenplayAs", |session| Ok(session.payload()))?;
    store
        .create(&name, &payload)
        .await
        .map_err(|e| persistence_error("saveScreenplayAs", e))?;
    with_session("saveScreenplayAs", |session| {
        session.adopt_name(&name);
        Ok(())
    })?;
    snapshot("saveScreenplayAs")
}

#[wasm_bindgen(js_name = openScreenplay)]
pub async fn open_screenplay(store_js: JsValue, name: String) -> Result<JsValue, JsValue> {
    let store = JsStore::new(store_js)?;
    wasm_info!("openScreenplay: '{}'", name);
    with_session("openScreenplay", |session| session.ensure_idle())?;
    let raw = store
        .open(&name)
        .await
        .map_err(|e| persistence_error("openScreenplay", e))?;
    with_session("openScreenplay", |session| session.open_stored(&name, raw))?;
    snapshot("openScreenplay")
}

#[wasm_bindgen(js_name = listScreenplays)]
pub async fn list_screenplays(store_js: JsValue) -> Result<JsValue, JsValue> {
    let store = JsStore::new(store_js)?;
    let names = store
        .list()
        .await
        .map_err(|e| persistence_error("listScreenplays", e))?;
    serialize(&names, "listScreenplays")
}

#[wasm_bindgen(js_name = deleteScreenplay)]
pub async fn delete_screenplay(store_js: JsValue, name: String) -> Result<JsValue, JsValue> {
    let store = JsStore::new(store_js)?;
    store
        .delete(&name)
        .await
        .map_err(|e| persistence_error("deleteScreenplay", e))?;
    with_session("deleteScreenplay", |session| {
        session.forget_deleted(&name);
        Ok(())
    })?;
    snapshot("deleteScreenplay")
}

/// Import a `.lss` file's text; the screenplay comes in unnamed
#[wasm_bindgen(js_name = importScreenplay)]
pub fn import_screenplay(file_name: &str, text: &str) -> Result<JsValue, JsValue> {
    wasm_info!("importScreenplay: '{}' ({} bytes)", file_name, text.len());
    with_session("importScreenplay", |session| session.import(file_name, text))?;
    snapshot("importScreenplay")
}

/// Render an export
///
/// # Parameters
/// - `format`: `"lss"`, `"doc"` (or `"docx"`), `"pdf"`
/// - `base_name`: user-chosen name; empty falls back to "screenplay"
///
/// # Returns
/// `{ fileName, mimeType, format, contents }`. For `"pdf"` the contents are
/// a print surface the host hands to the print dialog.
#[wasm_bindgen(js_name = exportScreenplay)]
pub fn export_screenplay(format: JsValue, base_name: &str) -> Result<JsValue, JsValue> {
    let format: ExportFormat = deserialize(format, "exportScreenplay: unknown format")?;
    let file = with_session("exportScreenplay", |session| session.export(format, base_name))?;
    wasm_info!("exportScreenplay: {} ({} bytes)", file.file_name, file.contents.len());
    serialize(&file, "exportScreenplay")
}
