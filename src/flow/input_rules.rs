//! Typed-pattern retyping
//!
//! After text input, the whole content of the cursor block is matched
//! against the grammar's input rules. A match clears the block and retypes
//! it, so typing `"> "` on an empty line starts a transition.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::{Document, DocumentError};
use crate::templates::{InputRule, TemplateGrammar};
use crate::text::Cursor;

static COMPILED: Lazy<Mutex<HashMap<&'static str, Option<Regex>>>> = Lazy::new(|| Mutex::new(HashMap::new()));

fn rule_matches(rule: &InputRule, text: &str) -> bool {
    let Ok(mut cache) = COMPILED.lock() else {
        return false;
    };
    let regex = cache.entry(rule.pattern).or_insert_with(|| match Regex::new(rule.pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            log::warn!("Invalid input rule pattern '{}': {}", rule.pattern, e);
            None
        }
    });
    regex.as_ref().map(|r| r.is_match(text)).unwrap_or(false)
}

/// Apply the first matching input rule at `cursor`
///
/// Returns the new cursor when the block was retyped.
pub fn apply_input_rules(
    grammar: &TemplateGrammar,
    document: &mut Document,
    cursor: &Cursor,
) -> Result<Option<Cursor>, DocumentError> {
    let Some(block) = document.get_block_at(&cursor.path) else {
        return Err(DocumentError::InvalidPosition(cursor.path.clone()));
    };
    if !block.kind.is_text_block() {
        return Ok(None);
    }
    let text = block.text_content();
    let current = block.kind;

    let Some(rule) = grammar
        .input_rules
        .iter()
        .find(|rule| rule_matches(rule, &text))
    else {
        return Ok(None);
    };
    if !grammar.admits(rule.target) {
        log::warn!(
            "Grammar-authoring defect in '{}': input rule targets '{}'",
            grammar.id,
            rule.target
        );
        return Ok(None);
    }

    log::debug!("Input rule '{}' retypes {} to {}", rule.pattern, current, rule.target);
    document.clear_content(&cursor.path)?;
    document.replace_block_type(&cursor.path, rule.target)?;
    Ok(Some(Cursor::at_start(cursor.path.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Block, BlockKind, BlockPath};
    use crate::templates::{american, arabic_av_table};

    #[test]
    fn test_arrow_space_starts_transition() {
        let grammar = american::grammar();
        let mut doc = Document::from_blocks(vec![Block::with_text(BlockKind::Paragraph, "> ")]);
        let cursor = Cursor::new(BlockPath::top(0), 2);
        let moved = apply_input_rules(&grammar, &mut doc, &cursor).unwrap();
        assert_eq!(moved, Some(Cursor::document_start()));
        assert_eq!(doc.blocks()[0].kind, BlockKind::Transition);
        assert!(doc.blocks()[0].is_empty());
    }

    #[test]
    fn test_pattern_must_cover_whole_block() {
        let grammar = american::grammar();
        let mut doc = Document::from_blocks(vec![Block::with_text(BlockKind::Paragraph, "a > ")]);
        let cursor = Cursor::new(BlockPath::top(0), 4);
        assert_eq!(apply_input_rules(&grammar, &mut doc, &cursor).unwrap(), None);
    }

    #[test]
    fn test_grammar_without_rules() {
        let grammar = arabic_av_table::grammar();
        let mut doc = Document::from_blocks(vec![Block::with_text(BlockKind::SceneHeading, "> ")]);
        let cursor = Cursor::new(BlockPath::top(0), 2);
        assert_eq!(apply_input_rules(&grammar, &mut doc, &cursor).unwrap(), None);
        assert_eq!(doc.blocks()[0].text_content(), "> ");
    }
}
