//! WASM API for the editing session
//!
//! One session lives in WASM and is the canonical owner of the document.
//! Every call returns a fresh `SessionSnapshot` so the host can re-render
//! without tracking changes itself.

use lazy_static::lazy_static;
use std::sync::Mutex;
use wasm_bindgen::prelude::*;

use crate::api::helpers::{deserialize, parse_json, serialize, session_error, validation_error};
use crate::api::types::{ConfigView, EditResult, SessionSnapshot};
use crate::flow::{EditorKey, KeyOutcome};
use crate::session::{EditingSession, SessionError};
use crate::templates::preferences::storage_key;
use crate::templates::{builtin_registry, KeyCombo, PreferenceBook, TemplatePreferences};
use crate::text::Cursor;
use crate::{wasm_info, wasm_log, wasm_warn};

// WASM-owned session (canonical source of truth)
lazy_static! {
    static ref SESSION: Mutex<Option<EditingSession>> = Mutex::new(None);
}

/// Run `f` against the live session
pub(crate) fn with_session<R>(
    context: &str,
    f: impl FnOnce(&mut EditingSession) -> Result<R, SessionError>,
) -> Result<R, JsValue> {
    let mut guard = SESSION
        .lock()
        .map_err(|_| validation_error(format!("{}: session lock poisoned", context)))?;
    let session = guard
        .as_mut()
        .ok_or_else(|| validation_error(format!("{}: session not initialized", context)))?;
    f(session).map_err(|e| session_error(context, e))
}

pub(crate) fn snapshot(context: &str) -> Result<JsValue, JsValue> {
    let snapshot = with_session(context, |session| Ok(SessionSnapshot::of(session)))?;
    serialize(&snapshot, context)
}

fn edit_result(session: &EditingSession, outcome: &KeyOutcome) -> EditResult {
    EditResult {
        handled: outcome.is_handled(),
        snapshot: SessionSnapshot::of(session),
    }
}

// ============================================================================
// Session lifecycle
// ============================================================================

/// Create the session
///
/// # Parameters
/// - `template_id`: grammar to start on; unknown or missing uses the default
/// - `preferences_json`: every saved `typewriter_prefs_*` entry, keyed by
///   template id, or empty
#[wasm_bindgen(js_name = initSession)]
pub fn init_session(template_id: Option<String>, preferences_json: Option<String>) -> Result<JsValue, JsValue> {
    let preferences = match preferences_json.as_deref().map(str::trim) {
        Some(json) if !json.is_empty() => PreferenceBook::from_json(json).unwrap_or_else(|e| {
            wasm_warn!("Ignoring unreadable preferences: {}", e);
            PreferenceBook::new()
        }),
        _ => PreferenceBook::new(),
    };

    let session = EditingSession::with_template(builtin_registry(), template_id.as_deref(), preferences);
    wasm_info!("initSession: template '{}'", session.template_id());

    let mut guard = SESSION
        .lock()
        .map_err(|_| validation_error("initSession: session lock poisoned"))?;
    *guard = Some(session);
    drop(guard);

    snapshot("initSession")
}

#[wasm_bindgen(js_name = getSessionState)]
pub fn get_session_state() -> Result<JsValue, JsValue> {
    snapshot("getSessionState")
}

/// Current document as a DocumentJSON string
#[wasm_bindgen(js_name = getDocumentJson)]
pub fn get_document_json() -> Result<String, JsValue> {
    with_session("getDocumentJson", |session| {
        Ok(crate::converters::document_to_json(session.document()).to_string())
    })
}

#[wasm_bindgen(js_name = listTemplates)]
pub fn list_templates() -> Result<JsValue, JsValue> {
    serialize(&builtin_registry().summaries(), "listTemplates")
}

// ============================================================================
// Editing
// ============================================================================

/// Move the cursor; positions outside the document are clamped
#[wasm_bindgen(js_name = setCursor)]
pub fn set_cursor(cursor_js: JsValue) -> Result<JsValue, JsValue> {
    let cursor: Cursor = deserialize(cursor_js, "setCursor: invalid cursor")?;
    with_session("setCursor", |session| {
        session.set_cursor(cursor);
        Ok(())
    })?;
    snapshot("setCursor")
}

/// Offer a DOM key (`"Enter"`, `"Tab"`, `"Backspace"`) to the flow engine
///
/// Returns `handled: false` when the editor should apply its default.
#[wasm_bindgen(js_name = handleKey)]
pub fn handle_key(key: &str) -> Result<JsValue, JsValue> {
    let Some(key) = EditorKey::from_dom_key(key) else {
        let result = with_session("handleKey", |session| Ok(edit_result(session, &KeyOutcome::PassThrough)))?;
        return serialize(&result, "handleKey");
    };

    wasm_log!("handleKey: {:?}", key);
    let result = with_session("handleKey", |session| {
        let outcome = session.handle_key(key)?;
        Ok(edit_result(session, &outcome))
    })?;
    serialize(&result, "handleKey")
}

/// Offer a key chord to the shortcut table
#[wasm_bindgen(js_name = applyShortcut)]
pub fn apply_shortcut(ctrl: bool, cmd: bool, alt: bool, shift: bool, key: &str) -> Result<JsValue, JsValue> {
    let combo = KeyCombo::from_event(ctrl, cmd, alt, shift, key);
    let result = with_session("applyShortcut", |session| {
        let outcome = session.apply_shortcut(&combo)?;
        Ok(edit_result(session, &outcome))
    })?;
    serialize(&result, "applyShortcut")
}

/// Type text at the cursor; input rules run afterwards
#[wasm_bindgen(js_name = insertText)]
pub fn insert_text(text: &str) -> Result<JsValue, JsValue> {
    let result = with_session("insertText", |session| {
        session.insert_text(text)?;
        Ok(EditResult {
            handled: true,
            snapshot: SessionSnapshot::of(session),
        })
    })?;
    serialize(&result, "insertText")
}

// ============================================================================
// Preferences
// ============================================================================

/// Shortcut and flow configuration in force, plus its storage key
#[wasm_bindgen(js_name = getRuntimeConfig)]
pub fn get_runtime_config() -> Result<JsValue, JsValue> {
    let view = with_session("getRuntimeConfig", |session| {
        Ok(ConfigView {
            storage_key: storage_key(session.template_id()),
            config: session.config().clone(),
        })
    })?;
    serialize(&view, "getRuntimeConfig")
}

/// Every saved preference entry, for the host to persist
#[wasm_bindgen(js_name = getPreferencesJson)]
pub fn get_preferences_json() -> Result<String, JsValue> {
    let book = with_session("getPreferencesJson", |session| Ok(session.preferences().clone()))?;
    book.to_json()
        .map_err(|e| validation_error(format!("getPreferencesJson: {}", e)))
}

/// Save and apply preferences for the active template
#[wasm_bindgen(js_name = savePreferences)]
pub fn save_preferences(preferences_json: &str) -> Result<JsValue, JsValue> {
    let preferences: TemplatePreferences = parse_json(preferences_json, "savePreferences: invalid preferences")?;
    with_session("savePreferences", |session| {
        session.save_preferences(preferences);
        Ok(())
    })?;
    get_runtime_config()
}

#[wasm_bindgen(js_name = resetPreferences)]
pub fn reset_preferences() -> Result<JsValue, JsValue> {
    with_session("resetPreferences", |session| {
        session.reset_preferences();
        Ok(())
    })?;
    get_runtime_config()
}
