//! Core data structures for the Screenplay Editor
//!
//! This module defines the block tree: typed blocks with inline content,
//! table containers, and the Document that owns them. Blocks are addressed
//! by `BlockPath` (child indices from the document root).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub use super::elements::{BlockKind, ChildKind, TextDirection};

/// Attribute key of the scene number on scene headings
pub const SCENE_NUMBER_ATTR: &str = "sceneNumber";

/// Errors raised by structural edits on the document tree
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocumentError {
    #[error("No block at position {0}")]
    InvalidPosition(BlockPath),

    #[error("Block at {0} does not hold inline content")]
    NotATextBlock(BlockPath),

    #[error("Block type {kind} is not allowed at {path}")]
    NotAllowedHere { kind: BlockKind, path: BlockPath },

    #[error("Offset {offset} out of range (block length {len})")]
    OffsetOutOfRange { offset: usize, len: usize },
}

/// Address of a block: child indices from the document root
///
/// `[2]` is the third top-level block, `[1, 0, 1, 0]` is the first block of
/// the second cell of the first row of the table at top-level index 1.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockPath(pub Vec<usize>);

impl BlockPath {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    /// Path of a top-level block
    pub fn top(index: usize) -> Self {
        Self(vec![index])
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_top_level(&self) -> bool {
        self.0.len() == 1
    }

    /// Index of the top-level ancestor (the block itself when top-level)
    pub fn top_index(&self) -> Option<usize> {
        self.0.first().copied()
    }

    /// Index within the parent container
    pub fn last_index(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn parent(&self) -> Option<BlockPath> {
        if self.0.is_empty() {
            return None;
        }
        Some(BlockPath(self.0[..self.0.len() - 1].to_vec()))
    }

    pub fn child(&self, index: usize) -> BlockPath {
        let mut indices = self.0.clone();
        indices.push(index);
        BlockPath(indices)
    }

    /// Sibling at `index` under the same parent
    pub fn with_last(&self, index: usize) -> BlockPath {
        let mut indices = self.0.clone();
        if let Some(last) = indices.last_mut() {
            *last = index;
        }
        BlockPath(indices)
    }
}

impl fmt::Display for BlockPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        write!(f, "[{}]", parts.join("/"))
    }
}

/// Inline formatting mark, in the engine's `{type, attrs}` shape
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", content = "attrs", rename_all = "camelCase")]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    Highlight(HighlightAttrs),
    TextStyle(TextStyleAttrs),
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct HighlightAttrs {
    #[serde(default)]
    pub color: Option<String>,
}

/// Color and font family travel together on the text-style mark
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TextStyleAttrs {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub font_family: Option<String>,
}

/// Inline content of a text block
#[derive(Clone, Debug, PartialEq)]
pub enum InlineNode {
    Text { text: String, marks: Vec<Mark> },
    HardBreak { marks: Vec<Mark> },
}

impl InlineNode {
    pub fn text(text: impl Into<String>) -> Self {
        InlineNode::Text {
            text: text.into(),
            marks: Vec::new(),
        }
    }

    pub fn marked(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        InlineNode::Text {
            text: text.into(),
            marks,
        }
    }

    /// Length in characters (a hard break counts as one)
    pub fn char_len(&self) -> usize {
        match self {
            InlineNode::Text { text, .. } => text.chars().count(),
            InlineNode::HardBreak { .. } => 1,
        }
    }
}

/// A typed node in the document tree
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub kind: BlockKind,

    /// Per-type extra data (`sceneNumber`, `textAlign`, ...)
    pub attrs: BTreeMap<String, Value>,

    /// Inline content (text blocks only)
    pub content: Vec<InlineNode>,

    /// Nested blocks (table containers only)
    pub children: Vec<Block>,
}

impl Block {
    /// Create an empty block; containers get their minimal valid children
    pub fn new(kind: BlockKind) -> Self {
        match kind {
            BlockKind::Table => Self::table(1, 2),
            BlockKind::TableRow => Self::table_row(2),
            BlockKind::TableCell => Self::table_cell(),
            _ => {
                let mut block = Self::bare(kind);
                if kind.carries_scene_number() {
                    block.attrs.insert(SCENE_NUMBER_ATTR.to_string(), Value::from(1u32));
                }
                block
            }
        }
    }

    fn bare(kind: BlockKind) -> Self {
        Self {
            kind,
            attrs: BTreeMap::new(),
            content: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Text block with a single unmarked run
    pub fn with_text(kind: BlockKind, text: &str) -> Self {
        let mut block = Self::new(kind);
        if !text.is_empty() {
            block.content.push(InlineNode::text(text));
        }
        block
    }

    /// Table of empty paragraph cells
    pub fn table(rows: usize, cols: usize) -> Self {
        let mut table = Self::bare(BlockKind::Table);
        table.children = (0..rows.max(1)).map(|_| Self::table_row(cols)).collect();
        table
    }

    pub fn table_row(cols: usize) -> Self {
        let mut row = Self::bare(BlockKind::TableRow);
        row.children = (0..cols.max(1)).map(|_| Self::table_cell()).collect();
        row
    }

    pub fn table_cell() -> Self {
        let mut cell = Self::bare(BlockKind::TableCell);
        cell.children.push(Self::new(BlockKind::Paragraph));
        cell
    }

    /// Build a container from explicit children
    pub fn container(kind: BlockKind, children: Vec<Block>) -> Self {
        let mut block = Self::bare(kind);
        block.children = children;
        block
    }

    /// Plain text of the block and everything below it
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.content {
            match node {
                InlineNode::Text { text, .. } => out.push_str(text),
                InlineNode::HardBreak { .. } => out.push('\n'),
            }
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    /// No inline content at all
    pub fn is_empty(&self) -> bool {
        self.char_len() == 0
    }

    pub fn char_len(&self) -> usize {
        self.content.iter().map(InlineNode::char_len).sum()
    }

    /// True when the block holds only whitespace
    pub fn is_blank(&self) -> bool {
        self.text_content().trim().is_empty()
    }

    /// Scene number, when stored as a JSON integer
    pub fn scene_number(&self) -> Option<u32> {
        self.attrs
            .get(SCENE_NUMBER_ATTR)
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
    }

    pub fn set_scene_number(&mut self, number: u32) {
        self.attrs.insert(SCENE_NUMBER_ATTR.to_string(), Value::from(number));
    }

    /// Change the block type, keeping inline content
    ///
    /// Attributes the new type does not define are dropped: a block that
    /// stops being a scene heading loses its number, one that becomes a
    /// scene heading starts at the attribute default.
    fn retype(&mut self, kind: BlockKind) {
        if self.kind.carries_scene_number() && !kind.carries_scene_number() {
            self.attrs.remove(SCENE_NUMBER_ATTR);
        }
        if kind.carries_scene_number() && !self.attrs.contains_key(SCENE_NUMBER_ATTR) {
            self.attrs.insert(SCENE_NUMBER_ATTR.to_string(), Value::from(1u32));
        }
        self.kind = kind;
    }

    /// Insert plain text at a character offset, inheriting the marks of the
    /// run it lands in
    fn insert_text(&mut self, offset: usize, text: &str) -> Result<usize, DocumentError> {
        let len = self.char_len();
        if offset > len {
            return Err(DocumentError::OffsetOutOfRange { offset, len });
        }
        let inserted = text.chars().count();

        // (node index, char offset inside a text run; None = before a hard break)
        let mut spot = None;
        let mut remaining = offset;
        for (idx, node) in self.content.iter().enumerate() {
            let node_len = node.char_len();
            let is_text = matches!(node, InlineNode::Text { .. });
            if is_text && remaining <= node_len {
                spot = Some((idx, Some(remaining)));
                break;
            }
            if !is_text && remaining == 0 {
                spot = Some((idx, None));
                break;
            }
            remaining -= node_len;
        }

        match spot {
            Some((idx, Some(at))) => {
                if let Some(InlineNode::Text { text: run, .. }) = self.content.get_mut(idx) {
                    let byte = run.char_indices().nth(at).map(|(b, _)| b).unwrap_or(run.len());
                    run.insert_str(byte, text);
                }
            }
            Some((idx, None)) => self.content.insert(idx, InlineNode::text(text)),
            None => self.content.push(InlineNode::text(text)),
        }
        Ok(offset + inserted)
    }
}

/// The ordered sequence of top-level blocks being edited
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Document {
    blocks: Vec<Block>,

    /// Incremented on every mutation; lets the session detect "doc changed"
    revision: u64,
}

impl Document {
    /// Create a document with no blocks (only valid transiently)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self { blocks, revision: 0 }
    }

    /// Minimal document: a single empty block of `kind`
    pub fn single(kind: BlockKind) -> Self {
        Self::from_blocks(vec![Block::new(kind)])
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    pub fn get_block_at(&self, path: &BlockPath) -> Option<&Block> {
        let (first, rest) = path.0.split_first()?;
        let mut block = self.blocks.get(*first)?;
        for index in rest {
            block = block.children.get(*index)?;
        }
        Some(block)
    }

    fn block_at_mut(&mut self, path: &BlockPath) -> Option<&mut Block> {
        let (first, rest) = path.0.split_first()?;
        let mut block = self.blocks.get_mut(*first)?;
        for index in rest {
            block = block.children.get_mut(*index)?;
        }
        Some(block)
    }

    /// Mutable access to the sibling list that holds the block at `path`
    fn siblings_mut(&mut self, path: &BlockPath) -> Option<&mut Vec<Block>> {
        match path.parent() {
            Some(parent) if parent.depth() == 0 => Some(&mut self.blocks),
            Some(parent) => self.block_at_mut(&parent).map(|b| &mut b.children),
            None => None,
        }
    }

    /// Kind of the container holding `path` (`None` for the document root)
    fn parent_kind(&self, path: &BlockPath) -> Option<BlockKind> {
        let parent = path.parent()?;
        if parent.depth() == 0 {
            return None;
        }
        self.get_block_at(&parent).map(|b| b.kind)
    }

    fn check_allowed(&self, path: &BlockPath, kind: BlockKind) -> Result<(), DocumentError> {
        let allowed = match self.parent_kind(path) {
            None => !matches!(kind, BlockKind::TableRow | BlockKind::TableCell),
            Some(parent) => parent.child_kind().map(|c| c.admits(kind)).unwrap_or(false),
        };
        if allowed {
            Ok(())
        } else {
            Err(DocumentError::NotAllowedHere {
                kind,
                path: path.clone(),
            })
        }
    }

    pub fn block_type_of(&self, path: &BlockPath) -> Option<BlockKind> {
        self.get_block_at(path).map(|b| b.kind)
    }

    /// Change the type of a text block in place, preserving its content
    pub fn replace_block_type(&mut self, path: &BlockPath, kind: BlockKind) -> Result<(), DocumentError> {
        let current = self
            .block_type_of(path)
            .ok_or_else(|| DocumentError::InvalidPosition(path.clone()))?;
        if !current.is_text_block() {
            return Err(DocumentError::NotATextBlock(path.clone()));
        }
        if !kind.is_text_block() {
            return Err(DocumentError::NotAllowedHere {
                kind,
                path: path.clone(),
            });
        }
        self.check_allowed(path, kind)?;

        if let Some(block) = self.block_at_mut(path) {
            block.retype(kind);
        }
        self.touch();
        Ok(())
    }

    /// Insert a new empty block right after `path`, returning its position
    pub fn insert_block_after(&mut self, path: &BlockPath, kind: BlockKind) -> Result<BlockPath, DocumentError> {
        self.insert_block_at_sibling(path, Block::new(kind))
    }

    /// Insert an already-built block right after `path`
    pub fn insert_block_at_sibling(&mut self, path: &BlockPath, block: Block) -> Result<BlockPath, DocumentError> {
        if self.get_block_at(path).is_none() {
            return Err(DocumentError::InvalidPosition(path.clone()));
        }
        self.check_allowed(path, block.kind)?;

        let index = path
            .last_index()
            .ok_or_else(|| DocumentError::InvalidPosition(path.clone()))?
            + 1;
        let siblings = self
            .siblings_mut(path)
            .ok_or_else(|| DocumentError::InvalidPosition(path.clone()))?;
        siblings.insert(index, block);
        self.touch();
        Ok(path.with_last(index))
    }

    /// Append a block at the end of the document
    pub fn push_block(&mut self, block: Block) -> Result<BlockPath, DocumentError> {
        let path = BlockPath::top(self.blocks.len());
        if matches!(block.kind, BlockKind::TableRow | BlockKind::TableCell) {
            return Err(DocumentError::NotAllowedHere { kind: block.kind, path });
        }
        self.blocks.push(block);
        self.touch();
        Ok(path)
    }

    pub fn delete_block(&mut self, path: &BlockPath) -> Result<Block, DocumentError> {
        if self.get_block_at(path).is_none() {
            return Err(DocumentError::InvalidPosition(path.clone()));
        }
        let index = path
            .last_index()
            .ok_or_else(|| DocumentError::InvalidPosition(path.clone()))?;
        let siblings = self
            .siblings_mut(path)
            .ok_or_else(|| DocumentError::InvalidPosition(path.clone()))?;
        let removed = siblings.remove(index);
        self.touch();
        Ok(removed)
    }

    /// True when `path` is the document's only top-level block
    pub fn is_sole_remaining_block(&self, path: &BlockPath) -> bool {
        self.blocks.len() == 1 && path.0 == [0]
    }

    /// True when `path` is the only block of its container
    pub fn is_only_child(&self, path: &BlockPath) -> bool {
        match path.parent() {
            Some(parent) if parent.depth() > 0 => self
                .get_block_at(&parent)
                .map(|p| p.children.len() == 1)
                .unwrap_or(false),
            _ => self.blocks.len() == 1,
        }
    }

    /// Positions of every text block, in document order
    pub fn text_block_paths(&self) -> Vec<BlockPath> {
        fn walk(block: &Block, path: BlockPath, out: &mut Vec<BlockPath>) {
            if block.kind.is_text_block() {
                out.push(path);
                return;
            }
            for (i, child) in block.children.iter().enumerate() {
                walk(child, path.child(i), out);
            }
        }

        let mut out = Vec::new();
        for (i, block) in self.blocks.iter().enumerate() {
            walk(block, BlockPath::top(i), &mut out);
        }
        out
    }

    /// The text block preceding `path` in document order
    pub fn previous_text_block(&self, path: &BlockPath) -> Option<BlockPath> {
        self.text_block_paths().into_iter().take_while(|p| p != path).last()
    }

    /// First text block at or below `path`
    pub fn first_text_block_in(&self, path: &BlockPath) -> Option<BlockPath> {
        self.text_block_paths()
            .into_iter()
            .find(|p| p.0.starts_with(&path.0))
    }

    pub fn insert_text(&mut self, path: &BlockPath, offset: usize, text: &str) -> Result<usize, DocumentError> {
        let block = self
            .block_at_mut(path)
            .ok_or_else(|| DocumentError::InvalidPosition(path.clone()))?;
        if !block.kind.is_text_block() {
            return Err(DocumentError::NotATextBlock(path.clone()));
        }
        let end = block.insert_text(offset, text)?;
        self.touch();
        Ok(end)
    }

    /// Drop all inline content of a text block
    pub fn clear_content(&mut self, path: &BlockPath) -> Result<(), DocumentError> {
        let block = self
            .block_at_mut(path)
            .ok_or_else(|| DocumentError::InvalidPosition(path.clone()))?;
        if !block.kind.is_text_block() {
            return Err(DocumentError::NotATextBlock(path.clone()));
        }
        block.content.clear();
        self.touch();
        Ok(())
    }

    /// Set the scene number of a top-level block
    pub fn set_scene_number(&mut self, index: usize, number: u32) -> Result<(), DocumentError> {
        let block = self
            .blocks
            .get_mut(index)
            .ok_or_else(|| DocumentError::InvalidPosition(BlockPath::top(index)))?;
        block.set_scene_number(number);
        self.touch();
        Ok(())
    }

    /// Scene numbers of the top-level scene headings, in order
    pub fn scene_numbers(&self) -> Vec<Option<u32>> {
        self.blocks
            .iter()
            .filter(|b| b.kind.carries_scene_number())
            .map(Block::scene_number)
            .collect()
    }

    /// Every kind used anywhere in the tree
    pub fn kinds(&self) -> Vec<BlockKind> {
        fn walk(block: &Block, out: &mut Vec<BlockKind>) {
            out.push(block.kind);
            for child in &block.children {
                walk(child, out);
            }
        }

        let mut out = Vec::new();
        for block in &self.blocks {
            walk(block, &mut out);
        }
        out
    }
}
