//! Table procedures
//!
//! The AV table keeps visuals in column 0 and audio in column 1.
//! `insertTableNode` finds the column a kind belongs to, reuses that cell
//! of the current row while it is blank, and otherwise grows the table by
//! one row (or creates a table when the cursor is outside one). The target
//! cell's first block is retyped and receives the cursor.

use crate::models::{Block, BlockKind, BlockPath, Document, DocumentError};
use crate::templates::Procedure;
use crate::text::Cursor;

/// Column holding the visual track
pub const VISUAL_COLUMN: usize = 0;

/// Column holding the audio track
pub const AUDIO_COLUMN: usize = 1;

/// Minimum width of a table row created by a procedure
const MIN_ROW_CELLS: usize = 2;

/// Run `procedure` at `cursor`, returning the new cursor position
pub fn run_procedure(procedure: &Procedure, document: &mut Document, cursor: &Cursor) -> Result<Cursor, DocumentError> {
    match procedure {
        Procedure::InsertTableNode { node } => insert_table_node(*node, document, cursor),
    }
}

pub fn column_for(kind: BlockKind) -> usize {
    match kind {
        BlockKind::Paragraph => VISUAL_COLUMN,
        _ => AUDIO_COLUMN,
    }
}

/// Position of the table row holding `path`, when `path` is a block in a cell
fn enclosing_row(document: &Document, path: &BlockPath) -> Option<BlockPath> {
    if path.depth() != 4 {
        return None;
    }
    let row = BlockPath::new(path.0[..2].to_vec());
    match document.block_type_of(&row) {
        Some(BlockKind::TableRow) => Some(row),
        _ => None,
    }
}

/// A cell can take a new block when every block in it is blank
fn cell_is_free(document: &Document, cell: &BlockPath) -> bool {
    match document.get_block_at(cell) {
        Some(block) => !block.children.is_empty() && block.children.iter().all(Block::is_blank),
        None => false,
    }
}

fn insert_table_node(node: BlockKind, document: &mut Document, cursor: &Cursor) -> Result<Cursor, DocumentError> {
    let column = column_for(node);

    let target_cell = match enclosing_row(document, &cursor.path) {
        Some(row) => {
            let cell = row.child(column);
            if cell_is_free(document, &cell) {
                cell
            } else {
                let width = document
                    .get_block_at(&row)
                    .map(|r| r.children.len())
                    .unwrap_or(0)
                    .max(MIN_ROW_CELLS);
                let new_row = document.insert_block_at_sibling(&row, Block::table_row(width))?;
                new_row.child(column)
            }
        }
        None => {
            let top = cursor
                .path
                .top_index()
                .ok_or_else(|| DocumentError::InvalidPosition(cursor.path.clone()))?;
            let table = document.insert_block_at_sibling(&BlockPath::top(top), Block::table(1, MIN_ROW_CELLS))?;
            table.child(0).child(column)
        }
    };

    let target = target_cell.child(0);
    document.replace_block_type(&target, node)?;
    Ok(Cursor::at_end(document, target))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_table() -> Document {
        Document::from_blocks(vec![Block::with_text(BlockKind::SceneHeading, "مشهد"), Block::table(1, 2)])
    }

    #[test]
    fn test_columns() {
        assert_eq!(column_for(BlockKind::Paragraph), VISUAL_COLUMN);
        assert_eq!(column_for(BlockKind::Sound), AUDIO_COLUMN);
        assert_eq!(column_for(BlockKind::Dialogue), AUDIO_COLUMN);
    }

    #[test]
    fn test_reuses_free_cell_in_current_row() {
        let mut doc = doc_with_table();
        let cursor = Cursor::at_start(BlockPath::new(vec![1, 0, 0, 0]));
        let procedure = Procedure::InsertTableNode { node: BlockKind::Sound };
        let cursor = run_procedure(&procedure, &mut doc, &cursor).unwrap();
        assert_eq!(cursor.path, BlockPath::new(vec![1, 0, 1, 0]));
        assert_eq!(doc.block_type_of(&cursor.path), Some(BlockKind::Sound));
        assert_eq!(doc.blocks()[1].children.len(), 1);
    }

    #[test]
    fn test_taken_cell_adds_row() {
        let mut doc = doc_with_table();
        doc.insert_text(&BlockPath::new(vec![1, 0, 1, 0]), 0, "music").unwrap();
        let cursor = Cursor::at_start(BlockPath::new(vec![1, 0, 0, 0]));
        let procedure = Procedure::InsertTableNode { node: BlockKind::Dialogue };
        let cursor = run_procedure(&procedure, &mut doc, &cursor).unwrap();
        assert_eq!(cursor.path, BlockPath::new(vec![1, 1, 1, 0]));
        assert_eq!(doc.blocks()[1].children.len(), 2);
        assert_eq!(doc.blocks()[1].children[1].children.len(), 2);
    }

    #[test]
    fn test_outside_table_creates_table_after_block() {
        let mut doc = Document::from_blocks(vec![
            Block::with_text(BlockKind::SceneHeading, "مشهد"),
            Block::new(BlockKind::Transition),
        ]);
        let procedure = Procedure::InsertTableNode { node: BlockKind::Paragraph };
        let cursor = run_procedure(&procedure, &mut doc, &Cursor::document_start()).unwrap();
        assert_eq!(cursor.path, BlockPath::new(vec![1, 0, 0, 0]));
        assert_eq!(
            doc.kinds()[..2],
            [BlockKind::SceneHeading, BlockKind::Table]
        );
        assert_eq!(doc.blocks()[2].kind, BlockKind::Transition);
    }

    #[test]
    fn test_whitespace_only_cell_counts_as_free() {
        let mut doc = doc_with_table();
        doc.insert_text(&BlockPath::new(vec![1, 0, 0, 0]), 0, "  ").unwrap();
        let cursor = Cursor::at_start(BlockPath::new(vec![1, 0, 1, 0]));
        let procedure = Procedure::InsertTableNode { node: BlockKind::Paragraph };
        let cursor = run_procedure(&procedure, &mut doc, &cursor).unwrap();
        assert_eq!(cursor, Cursor::new(BlockPath::new(vec![1, 0, 0, 0]), 2));
    }
}
