//! Scene renumbering pass
//!
//! Recomputes `sceneNumber` on every top-level scene heading so the
//! sequence reads `1, 2, ..., k` in document order. The pass is split in
//! two halves: `compute_renumber_patch` is a pure diff that yields `None`
//! when nothing differs, and `apply` writes the patch. A no-op diff never
//! touches the document, so it never bumps the revision and never
//! re-triggers itself.

use serde::Serialize;

use crate::models::{Document, DocumentError};

/// One scene heading whose stored number is wrong
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct SceneNumberChange {
    /// Top-level index of the heading
    pub index: usize,
    /// Stored number (`None` when missing or not an integer)
    pub from: Option<u32>,
    pub to: u32,
}

/// Minimal set of number corrections
#[derive(Serialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct RenumberPatch {
    pub changes: Vec<SceneNumberChange>,
}

impl RenumberPatch {
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn apply(&self, document: &mut Document) -> Result<(), DocumentError> {
        for change in &self.changes {
            document.set_scene_number(change.index, change.to)?;
        }
        Ok(())
    }
}

/// Single pass over the top-level blocks
///
/// Scene headings nested in tables are not counted.
pub fn compute_renumber_patch(document: &Document) -> Option<RenumberPatch> {
    let mut expected = 0u32;
    let mut changes = Vec::new();

    for (index, block) in document.blocks().iter().enumerate() {
        if !block.kind.carries_scene_number() {
            continue;
        }
        expected += 1;
        let stored = block.scene_number();
        if stored != Some(expected) {
            changes.push(SceneNumberChange {
                index,
                from: stored,
                to: expected,
            });
        }
    }

    if changes.is_empty() {
        None
    } else {
        Some(RenumberPatch { changes })
    }
}

/// Renumber in place; returns whether anything was written
pub fn run_renumber_pass(document: &mut Document) -> Result<bool, DocumentError> {
    match compute_renumber_patch(document) {
        Some(patch) => {
            log::debug!("Renumbering {} scene heading(s)", patch.len());
            patch.apply(document)?;
            Ok(true)
        }
        None => Ok(false),
    }
}
