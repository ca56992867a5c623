//! HTML export
//!
//! Renders a document with the active grammar's render rules and wraps it
//! in a minimal HTML envelope with a screenplay stylesheet. The same
//! envelope, with print page rules, is the print surface handed to the
//! host for PDF output.

use serde::Serialize;

use super::errors::ExportError;
use crate::models::{Block, Document, InlineNode, Mark};
use crate::templates::{SceneNumberStyle, TemplateGrammar};

const ENVELOPE_TEMPLATE: &str = include_str!("templates/screenplay.doc.mustache");

/// Values substituted into the envelope template
#[derive(Serialize, Debug, Clone)]
struct EnvelopeContext {
    title: String,
    direction: &'static str,
    body: String,
    print: bool,
}

/// `.doc` export: HTML that word processors open as a document
pub fn render_doc(document: &Document, grammar: &TemplateGrammar, title: &str) -> Result<String, ExportError> {
    render_envelope(document, grammar, title, false)
}

/// Print surface for PDF output
pub fn render_print_surface(document: &Document, grammar: &TemplateGrammar, title: &str) -> Result<String, ExportError> {
    render_envelope(document, grammar, title, true)
}

fn render_envelope(
    document: &Document,
    grammar: &TemplateGrammar,
    title: &str,
    print: bool,
) -> Result<String, ExportError> {
    let context = EnvelopeContext {
        title: title.to_string(),
        direction: grammar.direction.as_attr(),
        body: render_body(document, grammar),
        print,
    };
    let template = mustache::compile_str(ENVELOPE_TEMPLATE)?;
    Ok(template.render_to_string(&context)?)
}

/// Body markup only
pub fn render_body(document: &Document, grammar: &TemplateGrammar) -> String {
    let mut out = String::new();
    for block in document.blocks() {
        render_block(block, grammar, &mut out);
        out.push('\n');
    }
    out
}

fn render_block(block: &Block, grammar: &TemplateGrammar, out: &mut String) {
    let rule = grammar.render_rule(block.kind);

    let mut style = String::new();
    if let Some(rule_style) = rule.style {
        style.push_str(rule_style);
    }
    if let Some(align) = block.attrs.get("textAlign").and_then(|v| v.as_str()) {
        if !style.is_empty() && !style.ends_with(' ') {
            style.push(' ');
        }
        style.push_str(&format!("text-align: {};", align));
    }

    out.push_str(&format!(
        "<{} class=\"{}\" dir=\"{}\"",
        rule.tag,
        rule.class,
        rule.direction.as_attr()
    ));
    if !style.is_empty() {
        out.push_str(&format!(" style=\"{}\"", escape_html(&style)));
    }
    let number = if block.kind.carries_scene_number() {
        block.scene_number()
    } else {
        None
    };
    if let Some(number) = number {
        out.push_str(&format!(" data-scene-number=\"{}\"", number));
    }
    out.push('>');

    match (number, grammar.scene_number_style) {
        (Some(n), SceneNumberStyle::BothMargins) => {
            let label = grammar.scene_number_style.label(n);
            out.push_str(&format!("<span class=\"scene-number-left\">{}</span>", escape_html(&label)));
            render_inline(&block.content, out);
            out.push_str(&format!("<span class=\"scene-number-right\">{}</span>", escape_html(&label)));
        }
        (Some(n), SceneNumberStyle::Prefixed(_)) => {
            let label = grammar.scene_number_style.label(n);
            out.push_str(&format!("<span class=\"scene-number\">{}</span>", escape_html(&label)));
            render_inline(&block.content, out);
        }
        (None, _) => render_inline(&block.content, out),
    }

    for child in &block.children {
        render_block(child, grammar, out);
    }
    out.push_str(&format!("</{}>", rule.tag));
}

fn render_inline(content: &[InlineNode], out: &mut String) {
    for node in content {
        match node {
            InlineNode::Text { text, marks } => {
                for mark in marks {
                    out.push_str(&open_mark(mark));
                }
                out.push_str(&escape_html(text));
                for mark in marks.iter().rev() {
                    out.push_str(close_mark(mark));
                }
            }
            InlineNode::HardBreak { .. } => out.push_str("<br>"),
        }
    }
}

fn open_mark(mark: &Mark) -> String {
    match mark {
        Mark::Bold => "<strong>".to_string(),
        Mark::Italic => "<em>".to_string(),
        Mark::Underline => "<u>".to_string(),
        Mark::Strike => "<s>".to_string(),
        Mark::Code => "<code>".to_string(),
        Mark::Highlight(attrs) => match &attrs.color {
            Some(color) => format!("<mark style=\"background-color: {}\">", escape_html(color)),
            None => "<mark>".to_string(),
        },
        Mark::TextStyle(attrs) => {
            let mut style = String::new();
            if let Some(color) = &attrs.color {
                style.push_str(&format!("color: {};", color));
            }
            if let Some(family) = &attrs.font_family {
                style.push_str(&format!("font-family: {};", family));
            }
            format!("<span style=\"{}\">", escape_html(&style))
        }
    }
}

fn close_mark(mark: &Mark) -> &'static str {
    match mark {
        Mark::Bold => "</strong>",
        Mark::Italic => "</em>",
        Mark::Underline => "</u>",
        Mark::Strike => "</s>",
        Mark::Code => "</code>",
        Mark::Highlight(_) => "</mark>",
        Mark::TextStyle(_) => "</span>",
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BlockKind;
    use crate::templates::{american, arabic, arabic_av_table};

    #[test]
    fn test_american_heading_numbers_in_both_margins() {
        let doc = Document::from_blocks(vec![Block::with_text(BlockKind::SceneHeading, "INT. LAB - NIGHT")]);
        let body = render_body(&doc, &american::grammar());
        assert!(body.starts_with("<scene-heading class=\"sceneHeading\" dir=\"ltr\" data-scene-number=\"1\">"));
        assert_eq!(body.matches("1.</span>").count(), 2);
    }

    #[test]
    fn test_arabic_heading_prefix_and_direction() {
        let doc = Document::from_blocks(vec![Block::with_text(BlockKind::SceneHeading, "ليل")]);
        let body = render_body(&doc, &arabic::grammar());
        assert!(body.contains("dir=\"rtl\""));
        assert!(body.contains("<span class=\"scene-number\">المشهد 1</span>"));
    }

    #[test]
    fn test_text_and_marks_are_escaped() {
        let doc = Document::from_blocks(vec![Block {
            content: vec![InlineNode::marked("<Bang> & run", vec![Mark::Bold, Mark::Italic])],
            ..Block::new(BlockKind::Paragraph)
        }]);
        let body = render_body(&doc, &american::grammar());
        assert!(body.contains("<strong><em>&lt;Bang&gt; &amp; run</em></strong>"));
    }

    #[test]
    fn test_tables_render_nested() {
        let doc = Document::from_blocks(vec![Block::table(1, 2)]);
        let body = render_body(&doc, &arabic_av_table::grammar());
        assert!(body.starts_with("<table class=\"av-script-table\""));
        assert_eq!(body.matches("<td ").count(), 2);
    }

    #[test]
    fn test_envelope() {
        let doc = Document::single(BlockKind::Paragraph);
        let html = render_doc(&doc, &american::grammar(), "Pilot & Co").unwrap();
        assert!(html.contains("<title>Pilot &amp; Co</title>"));
        assert!(html.contains("Courier New"));
        assert!(!html.contains("@page"));

        let print = render_print_surface(&doc, &american::grammar(), "Pilot").unwrap();
        assert!(print.contains("@page"));
    }
}
