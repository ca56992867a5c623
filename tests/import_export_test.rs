// Import validation and export formats

use serde_json::json;

use screenplay_wasm::converters::{ExportFormat, ImportError};
use screenplay_wasm::models::BlockKind;
use screenplay_wasm::session::SessionError;
use screenplay_wasm::templates::{builtin_registry, KeyCombo, PreferenceBook};
use screenplay_wasm::EditingSession;

fn session() -> EditingSession {
    EditingSession::new(builtin_registry(), PreferenceBook::new())
}

#[test]
fn test_only_lss_files_import() {
    let mut session = session();
    session.insert_text("Keep.").unwrap();

    let err = session.import("pilot.fdx", "{}").unwrap_err();
    assert_eq!(
        err,
        SessionError::Import(ImportError::UnsupportedExtension("pilot.fdx".to_string()))
    );
    let err = session.import("pilot.LSS", "{oops").unwrap_err();
    assert!(matches!(err, SessionError::Import(ImportError::MalformedJson(_))));
    assert_eq!(session.document().blocks()[0].text_content(), "Keep.");
}

#[test]
fn test_unknown_template_in_meta_uses_default() {
    let text = json!({
        "meta": {"templateId": "noir", "version": "1.0"},
        "content": {"type": "doc", "content": [
            {"type": "character", "content": [{"type": "text", "text": "NOOR"}]}
        ]}
    })
    .to_string();

    let mut session =
        EditingSession::with_template(builtin_registry(), Some("arabic_v2"), PreferenceBook::new());
    session.import("noir.lss", &text).unwrap();
    assert_eq!(session.template_id(), "american");
    assert_eq!(session.document().kinds(), vec![BlockKind::Character]);
}

#[test]
fn test_blocks_foreign_to_template_are_refused() {
    let text = json!({
        "meta": {"templateId": "american", "version": "1.0"},
        "content": {"type": "doc", "content": [
            {"type": "sceneHeading", "attrs": {"sceneNumber": 1}},
            {"type": "table", "content": [
                {"type": "tableRow", "content": [
                    {"type": "tableCell", "content": [{"type": "paragraph"}]},
                    {"type": "tableCell", "content": [{"type": "sound"}]}
                ]}
            ]}
        ]}
    })
    .to_string();

    let mut session =
        EditingSession::with_template(builtin_registry(), Some("arabic_v2"), PreferenceBook::new());
    let err = session.import("mixed.lss", &text).unwrap_err();
    assert_eq!(
        err,
        SessionError::Import(ImportError::ForeignBlock {
            kind: BlockKind::Table,
            template_id: "american".to_string()
        })
    );
    assert_eq!(session.template_id(), "arabic_v2");
}

#[test]
fn test_legacy_table_file_is_conformed_to_default() {
    let text = json!({"type": "doc", "content": [
        {"type": "sceneHeading", "attrs": {"sceneNumber": 4}, "content": [{"type": "text", "text": "INT. ROOF"}]},
        {"type": "table", "content": [
            {"type": "tableRow", "content": [
                {"type": "tableCell", "content": [
                    {"type": "paragraph", "content": [{"type": "text", "text": "Wide shot"}]}
                ]},
                {"type": "tableCell", "content": [
                    {"type": "sound", "content": [{"type": "text", "text": "Rain"}]}
                ]}
            ]}
        ]}
    ]})
    .to_string();

    let mut session =
        EditingSession::with_template(builtin_registry(), Some("arabic_av_table"), PreferenceBook::new());
    session.import("old.lss", &text).unwrap();

    assert_eq!(session.template_id(), "american");
    assert_eq!(
        session.document().kinds(),
        vec![BlockKind::SceneHeading, BlockKind::Paragraph, BlockKind::Paragraph]
    );
    let texts: Vec<String> = session.document().blocks().iter().map(|b| b.text_content()).collect();
    assert_eq!(texts, vec!["INT. ROOF", "Wide shot", "Rain"]);
    assert_eq!(session.document().scene_numbers(), vec![Some(1)]);
}

#[test]
fn test_empty_import_gets_default_block() {
    let text = json!({"type": "doc", "content": []}).to_string();
    let mut session = session();
    session.import("blank.lss", &text).unwrap();
    assert_eq!(session.document().kinds(), vec![BlockKind::Paragraph]);
}

#[test]
fn test_doc_export_is_html_envelope() {
    let mut session = session();
    session.apply_shortcut(&KeyCombo::parse("Ctrl+1").unwrap()).unwrap();
    session.insert_text("INT. LAB - NIGHT").unwrap();

    let file = session.export(ExportFormat::Doc, "Lab.lss").unwrap();
    assert_eq!(file.file_name, "Lab.doc");
    assert_eq!(file.mime_type, "application/msword");
    assert!(file.contents.contains("<html dir=\"ltr\">"));
    assert!(file.contents.contains("<title>Lab</title>"));
    assert!(file.contents.contains("INT. LAB - NIGHT"));
    assert!(file.contents.contains("data-scene-number=\"1\""));
}

#[test]
fn test_pdf_export_is_print_surface() {
    let session =
        EditingSession::with_template(builtin_registry(), Some("arabic_v2"), PreferenceBook::new());
    let file = session.export(ExportFormat::Pdf, "").unwrap();
    assert_eq!(file.file_name, "screenplay.pdf");
    assert!(file.contents.contains("@page"));
    assert!(file.contents.contains("<html dir=\"rtl\">"));
}

#[test]
fn test_docx_alias_parses_to_doc() {
    let format: ExportFormat = serde_json::from_value(json!("docx")).unwrap();
    assert_eq!(format, ExportFormat::Doc);
}
