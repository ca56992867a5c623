// Scene renumbering: the pure patch and its effect through the session

use std::sync::{Arc, Mutex};

use serde_json::json;

use screenplay_wasm::flow::EditorKey;
use screenplay_wasm::models::{Block, BlockKind, BlockPath, ChangeEvent, ChangeReason, Document};
use screenplay_wasm::structure::{compute_renumber_patch, run_renumber_pass, SceneNumberChange};
use screenplay_wasm::templates::{builtin_registry, KeyCombo, PreferenceBook};
use screenplay_wasm::text::Cursor;
use screenplay_wasm::EditingSession;

fn heading(text: &str, number: u32) -> Block {
    let mut block = Block::with_text(BlockKind::SceneHeading, text);
    block.set_scene_number(number);
    block
}

#[test]
fn test_patch_lists_only_wrong_numbers() {
    let doc = Document::from_blocks(vec![
        heading("INT. A", 1),
        Block::with_text(BlockKind::Paragraph, "Rain."),
        heading("INT. B", 5),
        heading("INT. C", 3),
    ]);

    let patch = compute_renumber_patch(&doc).unwrap();
    assert_eq!(
        patch.changes,
        vec![SceneNumberChange {
            index: 2,
            from: Some(5),
            to: 2
        }]
    );
}

#[test]
fn test_pass_is_idempotent() {
    let mut bad = heading("INT. B", 1);
    bad.attrs.insert("sceneNumber".to_string(), json!("2a"));
    let mut doc = Document::from_blocks(vec![heading("INT. A", 4), bad]);

    assert!(run_renumber_pass(&mut doc).unwrap());
    assert_eq!(doc.scene_numbers(), vec![Some(1), Some(2)]);

    let revision = doc.revision();
    assert!(!run_renumber_pass(&mut doc).unwrap());
    assert_eq!(doc.revision(), revision);
    assert!(compute_renumber_patch(&doc).is_none());
}

#[test]
fn test_document_without_headings() {
    let doc = Document::from_blocks(vec![Block::with_text(BlockKind::Paragraph, "Rain.")]);
    assert!(compute_renumber_patch(&doc).is_none());
}

#[test]
fn test_deleting_a_heading_renumbers_the_rest() {
    let mut session = EditingSession::new(builtin_registry(), PreferenceBook::new());
    let events: Arc<Mutex<Vec<ChangeEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    session.subscribe(Box::new(move |event| sink.lock().unwrap().push(event.clone())));

    let ctrl_1 = KeyCombo::parse("Ctrl+1").unwrap();
    session.apply_shortcut(&ctrl_1).unwrap();
    session.insert_text("INT. A").unwrap();
    session.handle_key(EditorKey::Enter).unwrap();
    session.handle_key(EditorKey::Enter).unwrap();
    session.apply_shortcut(&ctrl_1).unwrap();
    session.handle_key(EditorKey::Enter).unwrap();
    session.apply_shortcut(&ctrl_1).unwrap();
    assert_eq!(session.document().scene_numbers(), vec![Some(1), Some(2), Some(3)]);

    // Remove the empty middle heading
    session.set_cursor(Cursor::at_start(BlockPath::top(2)));
    assert!(session.handle_key(EditorKey::Backspace).unwrap().is_handled());
    assert_eq!(session.document().scene_numbers(), vec![Some(1), Some(2)]);

    let events = events.lock().unwrap();
    let last = events.last().unwrap();
    assert_eq!(last.reason, ChangeReason::Edit);
    assert!(last.renumbered);
    assert_eq!(last.template_id, "american");
}
