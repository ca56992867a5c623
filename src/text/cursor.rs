//! Cursor management for block editing
//!
//! Pure positions with no grammar knowledge: which block, and how many
//! characters into its inline content.

use serde::{Deserialize, Serialize};
use crate::models::{BlockPath, Document};

/// A collapsed cursor inside a text block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Block holding the cursor
    pub path: BlockPath,
    /// Character offset into the block's inline content
    pub offset: usize,
}

impl Cursor {
    pub fn new(path: BlockPath, offset: usize) -> Self {
        Self { path, offset }
    }

    /// Create a cursor at the start of a block
    pub fn at_start(path: BlockPath) -> Self {
        Self { path, offset: 0 }
    }

    /// Create a cursor after the last character of a block
    pub fn at_end(document: &Document, path: BlockPath) -> Self {
        let offset = document
            .get_block_at(&path)
            .map(|block| block.char_len())
            .unwrap_or(0);
        Self { path, offset }
    }

    /// Cursor at the start of the first top-level block
    pub fn document_start() -> Self {
        Self::at_start(BlockPath::top(0))
    }

    pub fn is_at_block_start(&self) -> bool {
        self.offset == 0
    }

    /// Clamp the cursor to an existing text block of `document`
    ///
    /// Falls back to the first text block when the path no longer exists.
    pub fn clamp_to(&self, document: &Document) -> Cursor {
        match document.get_block_at(&self.path) {
            Some(block) if block.kind.is_text_block() => Cursor {
                path: self.path.clone(),
                offset: self.offset.min(block.char_len()),
            },
            _ => document
                .text_block_paths()
                .into_iter()
                .next()
                .map(Cursor::at_start)
                .unwrap_or_else(Cursor::document_start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Block, BlockKind};

    fn doc() -> Document {
        Document::from_blocks(vec![
            Block::with_text(BlockKind::Paragraph, "Hello"),
            Block::table(1, 2),
        ])
    }

    #[test]
    fn test_at_end_uses_char_length() {
        let cursor = Cursor::at_end(&doc(), BlockPath::top(0));
        assert_eq!(cursor.offset, 5);
        assert!(!cursor.is_at_block_start());
    }

    #[test]
    fn test_clamp_offset() {
        let cursor = Cursor::new(BlockPath::top(0), 40).clamp_to(&doc());
        assert_eq!(cursor.offset, 5);
    }

    #[test]
    fn test_clamp_falls_back_from_container_or_missing_block() {
        let cursor = Cursor::at_start(BlockPath::top(1)).clamp_to(&doc());
        assert_eq!(cursor, Cursor::at_start(BlockPath::top(0)));

        let cursor = Cursor::at_start(BlockPath::top(9)).clamp_to(&doc());
        assert_eq!(cursor, Cursor::at_start(BlockPath::top(0)));
    }
}
