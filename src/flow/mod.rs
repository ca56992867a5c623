//! Flow controller
//!
//! Intercepts Enter, Tab and Backspace at the cursor block and applies the
//! active flow table. The controller holds a live binding (grammar plus
//! runtime configuration) that the session swaps on template migration;
//! while unbound every key passes through to the editor's default
//! behavior.
//!
//! ## Modules
//!
//! - `procedures`: multi-step table edits behind `BlockAction::RunProcedure`
//! - `input_rules`: typed patterns that retype the current block

pub mod input_rules;
pub mod procedures;

use serde::Serialize;
use std::sync::Arc;

use crate::models::{BlockKind, Document, DocumentError};
use crate::templates::{BlockAction, KeyCombo, RuntimeConfig, TemplateGrammar};
use crate::text::Cursor;

pub use input_rules::apply_input_rules;
pub use procedures::run_procedure;

/// Keys the controller may intercept
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorKey {
    Enter,
    Tab,
    Backspace,
}

impl EditorKey {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_dom_key(key: &str) -> Option<Self> {
        match key {
            "Enter" => Some(EditorKey::Enter),
            "Tab" => Some(EditorKey::Tab),
            "Backspace" => Some(EditorKey::Backspace),
            _ => None,
        }
    }
}

/// Result of offering a key to the controller
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum KeyOutcome {
    /// The controller edited the document (or deliberately did nothing);
    /// the editor must suppress its default behavior
    Handled { cursor: Cursor },

    /// Not intercepted; the editor applies its default behavior
    PassThrough,
}

impl KeyOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, KeyOutcome::Handled { .. })
    }
}

/// Grammar and merged configuration the controller currently follows
#[derive(Debug)]
pub struct ActiveBinding {
    pub grammar: Arc<TemplateGrammar>,
    pub config: RuntimeConfig,
}

impl ActiveBinding {
    pub fn new(grammar: Arc<TemplateGrammar>, config: RuntimeConfig) -> Self {
        Self { grammar, config }
    }
}

#[derive(Debug, Default)]
pub struct FlowController {
    binding: Option<Arc<ActiveBinding>>,
}

impl FlowController {
    /// An unbound controller
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bound(binding: Arc<ActiveBinding>) -> Self {
        Self {
            binding: Some(binding),
        }
    }

    pub fn bind(&mut self, binding: Arc<ActiveBinding>) {
        self.binding = Some(binding);
    }

    pub fn unbind(&mut self) {
        self.binding = None;
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    pub fn binding(&self) -> Option<&Arc<ActiveBinding>> {
        self.binding.as_ref()
    }

    /// Apply the flow table for `key` at `cursor`
    pub fn handle_key(
        &self,
        document: &mut Document,
        cursor: &Cursor,
        key: EditorKey,
    ) -> Result<KeyOutcome, DocumentError> {
        let Some(binding) = &self.binding else {
            return Ok(KeyOutcome::PassThrough);
        };
        let Some(current) = document.block_type_of(&cursor.path) else {
            return Err(DocumentError::InvalidPosition(cursor.path.clone()));
        };
        if !current.is_text_block() {
            return Ok(KeyOutcome::PassThrough);
        }

        match key {
            EditorKey::Enter | EditorKey::Tab => {
                let action = binding.config.flow_rule(current).and_then(|rule| match key {
                    EditorKey::Enter => rule.enter.as_ref(),
                    _ => rule.tab.as_ref(),
                });
                match action {
                    Some(action) => self.run_flow_action(binding, document, cursor, key, current, action),
                    None => Ok(KeyOutcome::PassThrough),
                }
            }
            EditorKey::Backspace => handle_backspace(document, cursor),
        }
    }

    fn run_flow_action(
        &self,
        binding: &ActiveBinding,
        document: &mut Document,
        cursor: &Cursor,
        key: EditorKey,
        current: BlockKind,
        action: &BlockAction,
    ) -> Result<KeyOutcome, DocumentError> {
        if !action_is_valid(&binding.grammar, action) {
            log::warn!(
                "Grammar-authoring defect in '{}': {:?} on {} targets '{}', ignoring",
                binding.grammar.id,
                key,
                current,
                action.target_kind()
            );
            return Ok(KeyOutcome::PassThrough);
        }

        match (key, action) {
            (EditorKey::Enter, BlockAction::RetypeTo(target)) => {
                let new_path = document.insert_block_after(&cursor.path, *target)?;
                Ok(KeyOutcome::Handled {
                    cursor: Cursor::at_start(new_path),
                })
            }
            (_, BlockAction::RetypeTo(target)) => {
                document.replace_block_type(&cursor.path, *target)?;
                Ok(KeyOutcome::Handled {
                    cursor: cursor.clone(),
                })
            }
            (_, BlockAction::RunProcedure(procedure)) => {
                let cursor = run_procedure(procedure, document, cursor)?;
                Ok(KeyOutcome::Handled { cursor })
            }
        }
    }

    /// Run the shortcut bound to `combo`, if any
    pub fn apply_shortcut(
        &self,
        document: &mut Document,
        cursor: &Cursor,
        combo: &KeyCombo,
    ) -> Result<KeyOutcome, DocumentError> {
        let Some(binding) = &self.binding else {
            return Ok(KeyOutcome::PassThrough);
        };
        let Some(shortcut) = binding.config.shortcut_for(combo) else {
            return Ok(KeyOutcome::PassThrough);
        };
        if !action_is_valid(&binding.grammar, &shortcut.action) {
            log::warn!(
                "Grammar-authoring defect in '{}': shortcut {} targets '{}', ignoring",
                binding.grammar.id,
                combo,
                shortcut.action.target_kind()
            );
            return Ok(KeyOutcome::PassThrough);
        }
        if !document
            .block_type_of(&cursor.path)
            .map(|k| k.is_text_block())
            .unwrap_or(false)
        {
            return Err(DocumentError::NotATextBlock(cursor.path.clone()));
        }

        match &shortcut.action {
            BlockAction::RetypeTo(target) => {
                document.replace_block_type(&cursor.path, *target)?;
                Ok(KeyOutcome::Handled {
                    cursor: cursor.clone(),
                })
            }
            BlockAction::RunProcedure(procedure) => {
                let cursor = run_procedure(procedure, document, cursor)?;
                Ok(KeyOutcome::Handled { cursor })
            }
        }
    }
}

/// A flow or shortcut target must be declared by the grammar; procedures
/// additionally need the grammar's table structure
fn action_is_valid(grammar: &TemplateGrammar, action: &BlockAction) -> bool {
    let target = action.target_kind();
    if !target.is_text_block() || !grammar.admits(target) {
        return false;
    }
    match action {
        BlockAction::RetypeTo(_) => true,
        BlockAction::RunProcedure(_) => grammar.admits(BlockKind::Table),
    }
}

/// Delete an empty block at its start, protecting the last block
fn handle_backspace(document: &mut Document, cursor: &Cursor) -> Result<KeyOutcome, DocumentError> {
    let Some(block) = document.get_block_at(&cursor.path) else {
        return Err(DocumentError::InvalidPosition(cursor.path.clone()));
    };
    if !cursor.is_at_block_start() || !block.is_empty() {
        return Ok(KeyOutcome::PassThrough);
    }

    // The last top-level block and the last block of a cell stay
    if document.is_sole_remaining_block(&cursor.path) || document.is_only_child(&cursor.path) {
        return Ok(KeyOutcome::Handled {
            cursor: cursor.clone(),
        });
    }

    // Paths before the deleted block are unaffected by the removal
    let previous = document.previous_text_block(&cursor.path);
    document.delete_block(&cursor.path)?;

    let cursor = match previous {
        Some(path) => Cursor::at_end(document, path),
        None => document
            .first_text_block_in(&cursor.path)
            .map(Cursor::at_start)
            .unwrap_or_else(|| cursor.clamp_to(document)),
    };
    Ok(KeyOutcome::Handled { cursor })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Block, BlockPath};
    use crate::templates::{american, arabic_av_table, FlowRule};

    fn controller_for(grammar: TemplateGrammar) -> FlowController {
        let config = RuntimeConfig::defaults(&grammar);
        FlowController::bound(Arc::new(ActiveBinding::new(Arc::new(grammar), config)))
    }

    #[test]
    fn test_unbound_controller_passes_everything_through() {
        let controller = FlowController::new();
        let mut doc = Document::single(BlockKind::Character);
        let cursor = Cursor::document_start();
        for key in [EditorKey::Enter, EditorKey::Tab, EditorKey::Backspace] {
            assert_eq!(
                controller.handle_key(&mut doc, &cursor, key).unwrap(),
                KeyOutcome::PassThrough
            );
        }
        assert_eq!(doc.revision(), 0);
    }

    #[test]
    fn test_enter_inserts_flow_target() {
        let controller = controller_for(american::grammar());
        let mut doc = Document::from_blocks(vec![Block::with_text(BlockKind::Character, "MAYA")]);
        let outcome = controller
            .handle_key(&mut doc, &Cursor::new(BlockPath::top(0), 4), EditorKey::Enter)
            .unwrap();
        assert_eq!(
            outcome,
            KeyOutcome::Handled {
                cursor: Cursor::at_start(BlockPath::top(1))
            }
        );
        assert_eq!(doc.kinds(), vec![BlockKind::Character, BlockKind::Dialogue]);
    }

    #[test]
    fn test_tab_without_rule_passes_through() {
        let controller = controller_for(arabic_av_table::grammar());
        let mut doc = Document::single(BlockKind::SceneHeading);
        let outcome = controller
            .handle_key(&mut doc, &Cursor::document_start(), EditorKey::Tab)
            .unwrap();
        assert_eq!(outcome, KeyOutcome::PassThrough);
    }

    #[test]
    fn test_undeclared_target_is_ignored() {
        let grammar = american::grammar();
        let mut config = RuntimeConfig::defaults(&grammar);
        config
            .flow
            .insert(BlockKind::Character, FlowRule::new(BlockKind::Sound, BlockKind::Sound));
        let controller = FlowController::bound(Arc::new(ActiveBinding::new(Arc::new(grammar), config)));

        let mut doc = Document::single(BlockKind::Character);
        let outcome = controller
            .handle_key(&mut doc, &Cursor::document_start(), EditorKey::Enter)
            .unwrap();
        assert_eq!(outcome, KeyOutcome::PassThrough);
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_backspace_in_text_passes_through() {
        let controller = controller_for(american::grammar());
        let mut doc = Document::from_blocks(vec![
            Block::new(BlockKind::Paragraph),
            Block::with_text(BlockKind::Dialogue, "Hi"),
        ]);
        let cursor = Cursor::at_start(BlockPath::top(1));
        let outcome = controller.handle_key(&mut doc, &cursor, EditorKey::Backspace).unwrap();
        assert_eq!(outcome, KeyOutcome::PassThrough);
    }

    #[test]
    fn test_backspace_on_first_block_moves_to_next() {
        let controller = controller_for(american::grammar());
        let mut doc = Document::from_blocks(vec![
            Block::new(BlockKind::Paragraph),
            Block::with_text(BlockKind::Dialogue, "Hi"),
        ]);
        let outcome = controller
            .handle_key(&mut doc, &Cursor::document_start(), EditorKey::Backspace)
            .unwrap();
        assert_eq!(
            outcome,
            KeyOutcome::Handled {
                cursor: Cursor::document_start()
            }
        );
        assert_eq!(doc.kinds(), vec![BlockKind::Dialogue]);
    }

    #[test]
    fn test_backspace_keeps_last_block_of_cell() {
        let controller = controller_for(arabic_av_table::grammar());
        let mut doc = Document::from_blocks(vec![Block::new(BlockKind::SceneHeading), Block::table(1, 2)]);
        let cursor = Cursor::at_start(BlockPath::new(vec![1, 0, 1, 0]));
        let outcome = controller.handle_key(&mut doc, &cursor, EditorKey::Backspace).unwrap();
        assert_eq!(outcome, KeyOutcome::Handled { cursor });
        assert_eq!(doc.revision(), 0);
    }

    #[test]
    fn test_shortcut_retypes_in_place() {
        let controller = controller_for(american::grammar());
        let mut doc = Document::from_blocks(vec![Block::with_text(BlockKind::Paragraph, "CUT TO:")]);
        let combo = KeyCombo::parse("Ctrl+6").unwrap();
        let outcome = controller
            .apply_shortcut(&mut doc, &Cursor::document_start(), &combo)
            .unwrap();
        assert!(outcome.is_handled());
        assert_eq!(doc.blocks()[0].kind, BlockKind::Transition);
        assert_eq!(doc.blocks()[0].text_content(), "CUT TO:");
    }

    #[test]
    fn test_unknown_shortcut_passes_through() {
        let controller = controller_for(american::grammar());
        let mut doc = Document::single(BlockKind::Paragraph);
        let combo = KeyCombo::parse("Ctrl+Q").unwrap();
        let outcome = controller
            .apply_shortcut(&mut doc, &Cursor::document_start(), &combo)
            .unwrap();
        assert_eq!(outcome, KeyOutcome::PassThrough);
    }

    #[test]
    fn test_dom_key_mapping() {
        assert_eq!(EditorKey::from_dom_key("Tab"), Some(EditorKey::Tab));
        assert_eq!(EditorKey::from_dom_key("a"), None);
    }
}
