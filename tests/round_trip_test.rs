// Save/open and export/import keep blocks, marks, numbers and template

use serde_json::json;

use screenplay_wasm::converters::{document_from_json, document_to_json, ExportFormat};
use screenplay_wasm::flow::EditorKey;
use screenplay_wasm::models::{
    Block, BlockKind, Document, HighlightAttrs, InlineNode, Mark, TextStyleAttrs,
};
use screenplay_wasm::persistence::MemoryStore;
use screenplay_wasm::templates::{builtin_registry, KeyCombo, PreferenceBook};
use screenplay_wasm::EditingSession;

fn av_session() -> EditingSession {
    let mut session =
        EditingSession::with_template(builtin_registry(), Some("arabic_av_table"), PreferenceBook::new());
    session.insert_text("مشهد").unwrap();
    session.handle_key(EditorKey::Enter).unwrap();
    session.insert_text("بيت").unwrap();
    session.apply_shortcut(&KeyCombo::parse("Ctrl+2").unwrap()).unwrap();
    session.insert_text("لقطة").unwrap();
    session.apply_shortcut(&KeyCombo::parse("Ctrl+7").unwrap()).unwrap();
    session.insert_text("موسيقى").unwrap();
    session
}

#[test]
fn test_marks_and_breaks_survive_json() {
    let mut heading = Block::with_text(BlockKind::SceneHeading, "");
    heading.content = vec![
        InlineNode::marked("INT. ", vec![Mark::Bold]),
        InlineNode::marked("LAB", vec![Mark::Bold, Mark::Underline]),
    ];
    let mut action = Block::with_text(BlockKind::Paragraph, "Line one");
    action.content.push(InlineNode::HardBreak { marks: Vec::new() });
    action.content.push(InlineNode::text("Line two"));

    let mut dialogue = Block::with_text(BlockKind::Dialogue, "");
    dialogue.attrs.insert("textAlign".to_string(), json!("center"));
    dialogue.content = vec![
        InlineNode::marked("quietly ", vec![Mark::Italic, Mark::Strike]),
        InlineNode::marked("ls -la", vec![Mark::Code]),
        InlineNode::marked(
            " now",
            vec![
                Mark::Highlight(HighlightAttrs {
                    color: Some("#ffeb3b".to_string()),
                }),
                Mark::TextStyle(TextStyleAttrs {
                    color: Some("#c62828".to_string()),
                    font_family: Some("Courier Prime".to_string()),
                }),
            ],
        ),
    ];

    let doc = Document::from_blocks(vec![heading, action, dialogue]);
    let wire = document_to_json(&doc);
    assert_eq!(wire["content"][2]["attrs"]["textAlign"], "center");
    assert_eq!(wire["content"][2]["content"][2]["marks"][1]["attrs"]["fontFamily"], "Courier Prime");
    let back = document_from_json(&wire).unwrap();
    assert_eq!(back.blocks(), doc.blocks());
}

#[test]
fn test_export_then_import_restores_av_screenplay() {
    let session = av_session();
    let file = session.export(ExportFormat::Lss, "Episode").unwrap();
    assert_eq!(file.file_name, "Episode.lss");

    let mut fresh = EditingSession::new(builtin_registry(), PreferenceBook::new());
    fresh.import(&file.file_name, &file.contents).unwrap();

    assert_eq!(fresh.template_id(), "arabic_av_table");
    assert_eq!(fresh.document().blocks(), session.document().blocks());
    assert_eq!(fresh.current_file(), None);
    assert!(fresh.is_controller_bound());
}

#[test]
fn test_save_then_open_restores_document_and_template() {
    let mut session = av_session();
    let mut store = MemoryStore::new();
    session.save_as(&mut store, "Episode 1").unwrap();

    let mut other = EditingSession::new(builtin_registry(), PreferenceBook::new());
    other.open(&store, "Episode 1").unwrap();
    assert_eq!(other.template_id(), "arabic_av_table");
    assert_eq!(other.current_file(), Some("Episode 1"));
    assert_eq!(other.document().blocks(), session.document().blocks());
    assert_eq!(other.list(&store).unwrap(), vec!["Episode 1".to_string()]);
}

#[test]
fn test_legacy_document_opens_under_default_template() {
    let mut store = MemoryStore::new();
    store.insert_raw(
        "Old",
        json!({
            "type": "doc",
            "content": [
                {"type": "sceneHeading", "attrs": {"sceneNumber": 7}, "content": [{"type": "text", "text": "INT. A"}]},
                {"type": "sceneHeading", "attrs": {"sceneNumber": 7}}
            ]
        }),
    );

    let mut session =
        EditingSession::with_template(builtin_registry(), Some("arabic_v2"), PreferenceBook::new());
    session.open(&store, "Old").unwrap();
    assert_eq!(session.template_id(), "american");
    assert_eq!(session.current_file(), Some("Old"));
    assert_eq!(session.document().scene_numbers(), vec![Some(1), Some(2)]);
}

#[test]
fn test_deleting_open_screenplay_unnames_session() {
    let mut session = EditingSession::new(builtin_registry(), PreferenceBook::new());
    let mut store = MemoryStore::new();
    session.save_as(&mut store, "Pilot").unwrap();
    session.save_as(&mut store, "Pilot v2").unwrap();

    session.delete(&mut store, "Pilot").unwrap();
    assert_eq!(session.current_file(), Some("Pilot v2"));
    session.delete(&mut store, "Pilot v2").unwrap();
    assert_eq!(session.current_file(), None);
    assert!(store.is_empty());
}
