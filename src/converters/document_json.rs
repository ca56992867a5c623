//! DocumentJSON conversion
//!
//! The wire form is the rich-text engine's typed tree:
//!
//! ```json
//! {"type": "doc", "content": [
//!   {"type": "sceneHeading", "attrs": {"sceneNumber": 1},
//!    "content": [{"type": "text", "text": "INT. HOUSE", "marks": [{"type": "bold"}]}]}
//! ]}
//! ```
//!
//! Block types, attributes and known marks survive a round trip
//! unchanged. Marks this crate does not model are dropped with a warning.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::ImportError;
use crate::models::{Block, BlockKind, Document, InlineNode, Mark};

const DOC_NODE: &str = "doc";
const TEXT_NODE: &str = "text";
const HARD_BREAK_NODE: &str = "hardBreak";

/// One node of the wire tree
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct WireNode {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<WireNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<Vec<Value>>,
}

// ============================================================================
// Document → wire
// ============================================================================

pub fn document_to_wire(document: &Document) -> WireNode {
    WireNode {
        node_type: DOC_NODE.to_string(),
        content: Some(document.blocks().iter().map(block_to_wire).collect()),
        ..WireNode::default()
    }
}

pub fn document_to_json(document: &Document) -> Value {
    serde_json::to_value(document_to_wire(document)).unwrap_or(Value::Null)
}

fn block_to_wire(block: &Block) -> WireNode {
    let attrs = if block.attrs.is_empty() {
        None
    } else {
        Some(block.attrs.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    };

    let content = if block.kind.is_text_block() {
        if block.content.is_empty() {
            None
        } else {
            Some(block.content.iter().map(inline_to_wire).collect())
        }
    } else {
        Some(block.children.iter().map(block_to_wire).collect())
    };

    WireNode {
        node_type: block.kind.name().to_string(),
        attrs,
        content,
        ..WireNode::default()
    }
}

fn marks_to_wire(marks: &[Mark]) -> Option<Vec<Value>> {
    if marks.is_empty() {
        return None;
    }
    Some(marks.iter().filter_map(|m| serde_json::to_value(m).ok()).collect())
}

fn inline_to_wire(node: &InlineNode) -> WireNode {
    match node {
        InlineNode::Text { text, marks } => WireNode {
            node_type: TEXT_NODE.to_string(),
            text: Some(text.clone()),
            marks: marks_to_wire(marks),
            ..WireNode::default()
        },
        InlineNode::HardBreak { marks } => WireNode {
            node_type: HARD_BREAK_NODE.to_string(),
            marks: marks_to_wire(marks),
            ..WireNode::default()
        },
    }
}

// ============================================================================
// wire → Document
// ============================================================================

pub fn document_from_json(value: &Value) -> Result<Document, ImportError> {
    let root: WireNode = serde_json::from_value(value.clone())
        .map_err(|e| ImportError::InvalidStructure(e.to_string()))?;
    document_from_wire(&root)
}

pub fn document_from_wire(root: &WireNode) -> Result<Document, ImportError> {
    if root.node_type != DOC_NODE {
        return Err(ImportError::InvalidStructure(format!(
            "root node is '{}', expected '{}'",
            root.node_type, DOC_NODE
        )));
    }

    let mut blocks = Vec::new();
    for node in root.content.iter().flatten() {
        let block = block_from_wire(node)?;
        if matches!(block.kind, BlockKind::TableRow | BlockKind::TableCell) {
            return Err(ImportError::InvalidStructure(format!(
                "'{}' cannot appear at the top level",
                block.kind
            )));
        }
        blocks.push(block);
    }
    Ok(Document::from_blocks(blocks))
}

fn block_from_wire(node: &WireNode) -> Result<Block, ImportError> {
    let kind: BlockKind = node
        .node_type
        .parse()
        .map_err(|_| ImportError::UnknownNodeType(node.node_type.clone()))?;

    let mut block = Block::container(kind, Vec::new());
    if let Some(attrs) = &node.attrs {
        block.attrs = attrs.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    }

    match kind.child_kind() {
        None => {
            for child in node.content.iter().flatten() {
                block.content.push(inline_from_wire(child, kind)?);
            }
        }
        Some(expected) => {
            for child in node.content.iter().flatten() {
                let child = block_from_wire(child)?;
                if !expected.admits(child.kind) {
                    return Err(ImportError::InvalidStructure(format!(
                        "'{}' cannot contain '{}'",
                        kind, child.kind
                    )));
                }
                block.children.push(child);
            }
        }
    }
    Ok(block)
}

fn marks_from_wire(marks: &Option<Vec<Value>>) -> Vec<Mark> {
    marks
        .iter()
        .flatten()
        .filter_map(|raw| match serde_json::from_value::<Mark>(raw.clone()) {
            Ok(mark) => Some(mark),
            Err(_) => {
                log::warn!("Dropping unsupported mark {}", raw);
                None
            }
        })
        .collect()
}

fn inline_from_wire(node: &WireNode, parent: BlockKind) -> Result<InlineNode, ImportError> {
    match node.node_type.as_str() {
        TEXT_NODE => Ok(InlineNode::Text {
            text: node.text.clone().unwrap_or_default(),
            marks: marks_from_wire(&node.marks),
        }),
        HARD_BREAK_NODE => Ok(InlineNode::HardBreak {
            marks: marks_from_wire(&node.marks),
        }),
        other => Err(ImportError::InvalidStructure(format!(
            "'{}' cannot contain '{}'",
            parent, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_text_block_has_no_content_key() {
        let doc = Document::single(BlockKind::Dialogue);
        let json = document_to_json(&doc);
        assert_eq!(json, json!({"type": "doc", "content": [{"type": "dialogue"}]}));
    }

    #[test]
    fn test_legacy_action_name_loads_as_paragraph() {
        let doc = document_from_json(&json!({
            "type": "doc",
            "content": [{"type": "action", "content": [{"type": "text", "text": "Rain."}]}]
        }))
        .unwrap();
        assert_eq!(doc.blocks()[0].kind, BlockKind::Paragraph);
        assert_eq!(doc.blocks()[0].text_content(), "Rain.");
    }

    #[test]
    fn test_unknown_node_type() {
        let err = document_from_json(&json!({"type": "doc", "content": [{"type": "montage"}]}));
        assert_eq!(err, Err(ImportError::UnknownNodeType("montage".to_string())));
    }

    #[test]
    fn test_rejects_misplaced_structure() {
        let err = document_from_json(&json!({"type": "doc", "content": [{"type": "tableCell"}]}));
        assert!(matches!(err, Err(ImportError::InvalidStructure(_))));

        let err = document_from_json(&json!({
            "type": "doc",
            "content": [{"type": "table", "content": [{"type": "paragraph"}]}]
        }));
        assert!(matches!(err, Err(ImportError::InvalidStructure(_))));
    }

    #[test]
    fn test_unknown_marks_are_dropped() {
        let doc = document_from_json(&json!({
            "type": "doc",
            "content": [{"type": "paragraph", "content": [
                {"type": "text", "text": "go", "marks": [{"type": "link", "attrs": {"href": "x"}}, {"type": "italic"}]}
            ]}]
        }))
        .unwrap();
        assert_eq!(doc.blocks()[0].content[0], InlineNode::marked("go", vec![Mark::Italic]));
    }

    #[test]
    fn test_hard_break_round_trip() {
        let doc = Document::from_blocks(vec![Block {
            content: vec![
                InlineNode::text("ONE"),
                InlineNode::HardBreak { marks: Vec::new() },
                InlineNode::text("TWO"),
            ],
            ..Block::new(BlockKind::Transition)
        }]);
        let back = document_from_json(&document_to_json(&doc)).unwrap();
        assert_eq!(back.blocks(), doc.blocks());
    }
}
