//! Editing session
//!
//! Binds one document to one active grammar plus its runtime configuration.
//! The session owns the only writable handle on the document: every edit
//! goes through it, is followed by the renumbering pass, and is published
//! to subscribers as a `ChangeEvent`.
//!
//! ## Modules
//!
//! - `migration`: the template switch state machine

pub mod migration;

use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::converters::{
    build_payload, export_file_name, export_lss, export_stem, html, import_lss, read_payload, ExportError,
    ExportFormat, ExportedFile, ImportError, ImportedScreenplay,
};
use crate::flow::{apply_input_rules, ActiveBinding, EditorKey, FlowController, KeyOutcome};
use crate::models::{
    ChangeEvent, ChangeNotifier, ChangeReason, Document, DocumentError, SubscriptionId,
};
use crate::persistence::{PersistenceError, ScreenplayPayload, ScreenplayStore};
use crate::structure::run_renumber_pass;
use crate::templates::{
    KeyCombo, PreferenceBook, RuntimeConfig, TemplateGrammar, TemplatePreferences, TemplateRegistry,
};
use crate::text::Cursor;

pub use migration::{MigrationState, MigrationStep};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Export(#[from] ExportError),

    /// A template switch is waiting for an answer; other switches and
    /// document replacements are refused until it resolves
    #[error("A template switch is already in progress")]
    MigrationBusy,

    #[error("No template switch is pending")]
    NoPendingMigration,

    /// `save` on a screenplay that was never named
    #[error("The screenplay has no name yet; use save as")]
    NeedsName,
}

pub struct EditingSession {
    registry: Arc<TemplateRegistry>,
    binding: Arc<ActiveBinding>,
    controller: FlowController,
    document: Document,
    cursor: Cursor,
    current_file: Option<String>,
    preferences: PreferenceBook,
    notifier: ChangeNotifier,
    migration: MigrationState,
    commits: u64,
}

impl EditingSession {
    /// Session on the default grammar with an empty document
    pub fn new(registry: Arc<TemplateRegistry>, preferences: PreferenceBook) -> Self {
        Self::with_template(registry, None, preferences)
    }

    /// Session on `template_id` (default grammar when unknown)
    pub fn with_template(
        registry: Arc<TemplateRegistry>,
        template_id: Option<&str>,
        preferences: PreferenceBook,
    ) -> Self {
        let grammar = registry.find_or_default(template_id);
        let binding = Arc::new(Self::make_binding(grammar, &preferences));
        let document = binding.grammar.empty_document();
        let cursor = Cursor::document_start().clamp_to(&document);

        log::info!("Editing session started on template '{}'", binding.grammar.id);
        Self {
            registry,
            controller: FlowController::bound(Arc::clone(&binding)),
            binding,
            document,
            cursor,
            current_file: None,
            preferences,
            notifier: ChangeNotifier::new(),
            migration: MigrationState::Idle,
            commits: 0,
        }
    }

    fn make_binding(grammar: Arc<TemplateGrammar>, preferences: &PreferenceBook) -> ActiveBinding {
        let config = RuntimeConfig::merged(&grammar, preferences.get(grammar.id));
        ActiveBinding::new(grammar, config)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn registry(&self) -> &Arc<TemplateRegistry> {
        &self.registry
    }

    pub fn grammar(&self) -> &Arc<TemplateGrammar> {
        &self.binding.grammar
    }

    pub fn template_id(&self) -> &'static str {
        self.binding.grammar.id
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.binding.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn current_file(&self) -> Option<&str> {
        self.current_file.as_deref()
    }

    pub fn preferences(&self) -> &PreferenceBook {
        &self.preferences
    }

    pub fn is_controller_bound(&self) -> bool {
        self.controller.is_bound()
    }

    // ========================================================================
    // Change notification
    // ========================================================================

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&ChangeEvent) + Send>) -> SubscriptionId {
        self.notifier.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Post-commit hook: renumber, then notify
    ///
    /// Edits that left the revision untouched publish nothing.
    fn commit(&mut self, revision_before: u64, reason: ChangeReason) -> Result<(), SessionError> {
        if reason == ChangeReason::Edit && self.document.revision() == revision_before {
            return Ok(());
        }
        let renumbered = run_renumber_pass(&mut self.document)?;
        self.commits += 1;
        self.notifier.publish(&ChangeEvent {
            revision: self.commits,
            reason,
            template_id: self.template_id().to_string(),
            renumbered,
        });
        Ok(())
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Move the cursor, clamped to an existing text block
    pub fn set_cursor(&mut self, cursor: Cursor) -> &Cursor {
        self.cursor = cursor.clamp_to(&self.document);
        &self.cursor
    }

    pub fn handle_key(&mut self, key: EditorKey) -> Result<KeyOutcome, SessionError> {
        let before = self.document.revision();
        let outcome = self.controller.handle_key(&mut self.document, &self.cursor, key)?;
        if let KeyOutcome::Handled { cursor } = &outcome {
            self.cursor = cursor.clone();
        }
        self.commit(before, ChangeReason::Edit)?;
        Ok(outcome)
    }

    pub fn apply_shortcut(&mut self, combo: &KeyCombo) -> Result<KeyOutcome, SessionError> {
        let before = self.document.revision();
        let outcome = self.controller.apply_shortcut(&mut self.document, &self.cursor, combo)?;
        if let KeyOutcome::Handled { cursor } = &outcome {
            self.cursor = cursor.clone();
        }
        self.commit(before, ChangeReason::Edit)?;
        Ok(outcome)
    }

    /// Type `text` at the cursor, then run the grammar's input rules
    pub fn insert_text(&mut self, text: &str) -> Result<&Cursor, SessionError> {
        let before = self.document.revision();
        let offset = self
            .document
            .insert_text(&self.cursor.path, self.cursor.offset, text)?;
        self.cursor.offset = offset;

        if self.controller.is_bound() {
            let grammar = Arc::clone(&self.binding.grammar);
            if let Some(cursor) = apply_input_rules(&grammar, &mut self.document, &self.cursor)? {
                self.cursor = cursor;
            }
        }
        self.commit(before, ChangeReason::Edit)?;
        Ok(&self.cursor)
    }

    // ========================================================================
    // Document replacement
    // ========================================================================

    /// Refuse document replacement while a template switch is pending
    pub fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.migration.is_idle() {
            Ok(())
        } else {
            Err(SessionError::MigrationBusy)
        }
    }

    /// Swap in a new binding; the controller is unbound while the rest of
    /// the session state changes and rebound last
    fn rebind(&mut self, binding: ActiveBinding) {
        self.controller.unbind();
        self.binding = Arc::new(binding);
        self.controller.bind(Arc::clone(&self.binding));
    }

    fn replace_document(&mut self, document: Document) -> Result<(), SessionError> {
        self.document = if document.is_empty() {
            self.binding.grammar.empty_document()
        } else {
            document
        };
        self.cursor = Cursor::document_start().clamp_to(&self.document);
        self.commit(0, ChangeReason::Replaced)
    }

    /// Start a fresh, unnamed screenplay under the current grammar
    pub fn new_screenplay(&mut self) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.current_file = None;
        let empty = self.binding.grammar.empty_document();
        self.replace_document(empty)
    }

    /// Adopt an opened or imported document with the grammar its meta names
    ///
    /// A file naming a known grammar must fit it. Without a known id the
    /// default grammar is used and the document is conformed to it.
    fn load(&mut self, imported: ImportedScreenplay, file: Option<String>) -> Result<(), SessionError> {
        let named = imported
            .template_id
            .as_deref()
            .and_then(|id| self.registry.find_template(id));
        let (grammar, document) = match named {
            Some(grammar) => {
                if let Some(kind) = grammar.first_foreign_kind(&imported.document) {
                    return Err(ImportError::ForeignBlock {
                        kind,
                        template_id: grammar.id.to_string(),
                    }
                    .into());
                }
                (grammar, imported.document)
            }
            None => {
                let grammar = self.registry.find_or_default(imported.template_id.as_deref());
                let document = grammar.conform(imported.document);
                (grammar, document)
            }
        };

        log::info!("Loading screenplay under template '{}'", grammar.id);
        let binding = Self::make_binding(grammar, &self.preferences);
        self.rebind(binding);
        self.current_file = file;
        self.replace_document(document)
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// The current document wrapped with the active grammar's id
    pub fn payload(&self) -> ScreenplayPayload {
        build_payload(&self.document, self.template_id())
    }

    /// Name `save` writes to
    pub fn save_target(&self) -> Result<String, SessionError> {
        self.current_file.clone().ok_or(SessionError::NeedsName)
    }

    /// Save under the current name
    pub fn save(&mut self, store: &mut dyn ScreenplayStore) -> Result<(), SessionError> {
        let name = self.save_target()?;
        store.save(&name, &self.payload()).map_err(|e| {
            log::warn!("Saving '{}' failed: {}", name, e);
            SessionError::from(e)
        })
    }

    /// Create `name` in the store and adopt it as the current name
    pub fn save_as(&mut self, store: &mut dyn ScreenplayStore, name: &str) -> Result<(), SessionError> {
        store.create(name, &self.payload()).map_err(|e| {
            log::warn!("Creating '{}' failed: {}", name, e);
            SessionError::from(e)
        })?;
        self.adopt_name(name);
        Ok(())
    }

    /// Take `name` as the current file once it exists in the store
    pub fn adopt_name(&mut self, name: &str) {
        self.current_file = Some(name.to_string());
    }

    pub fn open(&mut self, store: &dyn ScreenplayStore, name: &str) -> Result<(), SessionError> {
        self.ensure_idle()?;
        let raw = store.open(name).map_err(|e| {
            log::warn!("Opening '{}' failed: {}", name, e);
            SessionError::from(e)
        })?;
        self.open_stored(name, raw)
    }

    /// Load the raw value a store returned for `name`
    pub fn open_stored(&mut self, name: &str, raw: Value) -> Result<(), SessionError> {
        self.ensure_idle()?;
        let imported = read_payload(raw)?;
        self.load(imported, Some(name.to_string()))
    }

    pub fn list(&self, store: &dyn ScreenplayStore) -> Result<Vec<String>, SessionError> {
        store.list().map_err(|e| {
            log::warn!("Listing screenplays failed: {}", e);
            SessionError::from(e)
        })
    }

    /// Delete a stored screenplay; deleting the open one unnames it
    pub fn delete(&mut self, store: &mut dyn ScreenplayStore, name: &str) -> Result<(), SessionError> {
        store.delete(name).map_err(|e| {
            log::warn!("Deleting '{}' failed: {}", name, e);
            SessionError::from(e)
        })?;
        self.forget_deleted(name);
        Ok(())
    }

    /// `name` is gone from the store
    pub fn forget_deleted(&mut self, name: &str) {
        if self.current_file.as_deref() == Some(name) {
            self.current_file = None;
        }
    }

    // ========================================================================
    // Import / export
    // ========================================================================

    /// Import an `.lss` file; the result is unnamed
    pub fn import(&mut self, file_name: &str, text: &str) -> Result<(), SessionError> {
        self.ensure_idle()?;
        let imported = import_lss(file_name, text)?;
        self.load(imported, None)
    }

    pub fn export(&self, format: ExportFormat, base_name: &str) -> Result<ExportedFile, SessionError> {
        let title = export_stem(base_name);
        let grammar = &self.binding.grammar;
        let contents = match format {
            ExportFormat::Lss => export_lss(&self.document, grammar.id).map_err(ExportError::from)?,
            ExportFormat::Doc => html::render_doc(&self.document, grammar, &title)?,
            ExportFormat::Pdf => html::render_print_surface(&self.document, grammar, &title)?,
        };
        Ok(ExportedFile {
            file_name: export_file_name(base_name, format.extension()),
            mime_type: format.mime_type(),
            format,
            contents,
        })
    }

    // ========================================================================
    // Preferences
    // ========================================================================

    /// Store preferences for the active grammar and apply them now
    pub fn save_preferences(&mut self, preferences: TemplatePreferences) {
        let grammar = Arc::clone(&self.binding.grammar);
        self.preferences.set(grammar.id, preferences);
        let binding = Self::make_binding(grammar, &self.preferences);
        self.rebind(binding);
    }

    /// Drop saved preferences for the active grammar
    pub fn reset_preferences(&mut self) {
        let grammar = Arc::clone(&self.binding.grammar);
        self.preferences.remove(grammar.id);
        let binding = Self::make_binding(grammar, &self.preferences);
        self.rebind(binding);
    }
}

impl std::fmt::Debug for EditingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditingSession")
            .field("template", &self.template_id())
            .field("blocks", &self.document.len())
            .field("cursor", &self.cursor)
            .field("current_file", &self.current_file)
            .field("migration", &self.migration)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlockKind, BlockPath};
    use crate::persistence::MemoryStore;
    use crate::templates::builtin_registry;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn session() -> EditingSession {
        EditingSession::new(builtin_registry(), PreferenceBook::new())
    }

    #[test]
    fn test_starts_on_default_grammar() {
        let session = session();
        assert_eq!(session.template_id(), "american");
        assert_eq!(session.document().kinds(), vec![BlockKind::Paragraph]);
        assert!(session.is_controller_bound());
    }

    #[test]
    fn test_events_published_once_per_edit() {
        let mut session = session();
        let count = Arc::new(AtomicU64::new(0));
        let sink = Arc::clone(&count);
        session.subscribe(Box::new(move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        }));

        session.insert_text("Dawn.").unwrap();
        session.handle_key(EditorKey::Tab).unwrap();
        session.handle_key(EditorKey::Enter).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 3);

        // Backspace inside text is left to the editor
        session.set_cursor(Cursor::document_start());
        let outcome = session.handle_key(EditorKey::Backspace).unwrap();
        assert_eq!(outcome, KeyOutcome::PassThrough);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_new_scene_heading_gets_next_number() {
        let mut session = session();
        session.apply_shortcut(&KeyCombo::parse("Ctrl+1").unwrap()).unwrap();
        session.handle_key(EditorKey::Enter).unwrap();
        session.handle_key(EditorKey::Enter).unwrap();
        session.apply_shortcut(&KeyCombo::parse("Ctrl+1").unwrap()).unwrap();
        assert_eq!(session.document().scene_numbers(), vec![Some(1), Some(2)]);
    }

    #[test]
    fn test_save_without_name() {
        let mut session = session();
        let mut store = MemoryStore::new();
        assert_eq!(session.save(&mut store), Err(SessionError::NeedsName));
        session.save_as(&mut store, "Pilot").unwrap();
        assert_eq!(session.current_file(), Some("Pilot"));
        session.insert_text("More.").unwrap();
        session.save(&mut store).unwrap();
    }

    #[test]
    fn test_export_names_and_formats() {
        let session = session();
        let lss = session.export(ExportFormat::Lss, "Pilot.lss").unwrap();
        assert_eq!(lss.file_name, "Pilot.lss");
        assert!(lss.contents.contains("\"templateId\": \"american\""));

        let doc = session.export(ExportFormat::Doc, "").unwrap();
        assert_eq!(doc.file_name, "screenplay.doc");
        assert!(doc.contents.contains("<title>screenplay</title>"));
    }

    #[test]
    fn test_set_cursor_is_clamped() {
        let mut session = session();
        let cursor = session.set_cursor(Cursor::new(BlockPath::top(5), 3)).clone();
        assert_eq!(cursor, Cursor::document_start());
    }
}
