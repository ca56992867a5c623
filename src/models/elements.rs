//! Block kinds and text direction for screenplay documents
//!
//! This module defines the closed set of block types that any template
//! grammar may draw from. Grammars decide which subset they admit; the
//! document model itself only knows the names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every block type a screenplay document can contain
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum BlockKind {
    /// Scene heading ("INT. HOUSE - DAY"), carries the `sceneNumber` attribute
    SceneHeading,

    /// Action line. Stored under the engine's generic paragraph name.
    #[serde(alias = "action")]
    Paragraph,

    /// Character cue above dialogue
    Character,

    /// Spoken line
    Dialogue,

    /// Acting direction inside dialogue
    Parenthetical,

    /// Transition ("CUT TO:")
    Transition,

    /// Location line rendered under a split scene heading
    SceneLocation,

    /// Sound cue (AV scripts)
    Sound,

    /// Two-column AV table container
    Table,

    /// Row inside a table
    TableRow,

    /// Cell inside a table row, holds text blocks
    TableCell,
}

/// All kinds, in declaration order
pub const ALL_BLOCK_KINDS: [BlockKind; 11] = [
    BlockKind::SceneHeading,
    BlockKind::Paragraph,
    BlockKind::Character,
    BlockKind::Dialogue,
    BlockKind::Parenthetical,
    BlockKind::Transition,
    BlockKind::SceneLocation,
    BlockKind::Sound,
    BlockKind::Table,
    BlockKind::TableRow,
    BlockKind::TableCell,
];

impl BlockKind {
    /// Wire name used in DocumentJSON and preference payloads
    pub fn name(&self) -> &'static str {
        match self {
            BlockKind::SceneHeading => "sceneHeading",
            BlockKind::Paragraph => "paragraph",
            BlockKind::Character => "character",
            BlockKind::Dialogue => "dialogue",
            BlockKind::Parenthetical => "parenthetical",
            BlockKind::Transition => "transition",
            BlockKind::SceneLocation => "sceneLocation",
            BlockKind::Sound => "sound",
            BlockKind::Table => "table",
            BlockKind::TableRow => "tableRow",
            BlockKind::TableCell => "tableCell",
        }
    }

    /// Blocks that hold inline content (as opposed to table structure)
    pub fn is_text_block(&self) -> bool {
        match self {
            BlockKind::SceneHeading
            | BlockKind::Paragraph
            | BlockKind::Character
            | BlockKind::Dialogue
            | BlockKind::Parenthetical
            | BlockKind::Transition
            | BlockKind::SceneLocation
            | BlockKind::Sound => true,
            BlockKind::Table | BlockKind::TableRow | BlockKind::TableCell => false,
        }
    }

    /// Table containers
    pub fn is_structural(&self) -> bool {
        !self.is_text_block()
    }

    /// Only scene headings take part in scene numbering
    pub fn carries_scene_number(&self) -> bool {
        match self {
            BlockKind::SceneHeading => true,
            BlockKind::Paragraph
            | BlockKind::Character
            | BlockKind::Dialogue
            | BlockKind::Parenthetical
            | BlockKind::Transition
            | BlockKind::SceneLocation
            | BlockKind::Sound
            | BlockKind::Table
            | BlockKind::TableRow
            | BlockKind::TableCell => false,
        }
    }

    /// The kind a container expects as its children (`None` for text blocks)
    pub fn child_kind(&self) -> Option<ChildKind> {
        match self {
            BlockKind::Table => Some(ChildKind::Exactly(BlockKind::TableRow)),
            BlockKind::TableRow => Some(ChildKind::Exactly(BlockKind::TableCell)),
            BlockKind::TableCell => Some(ChildKind::AnyText),
            _ => None,
        }
    }

    /// Stylesheet class used by the HTML renderers
    pub fn css_class(&self) -> &'static str {
        match self {
            BlockKind::SceneHeading => "sceneHeading",
            BlockKind::Paragraph => "action",
            BlockKind::Character => "character",
            BlockKind::Dialogue => "dialogue",
            BlockKind::Parenthetical => "parenthetical",
            BlockKind::Transition => "transition",
            BlockKind::SceneLocation => "scene-location",
            BlockKind::Sound => "sound",
            BlockKind::Table => "av-script-table",
            BlockKind::TableRow => "av-script-row",
            BlockKind::TableCell => "av-script-cell",
        }
    }
}

/// What a container block may hold
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChildKind {
    Exactly(BlockKind),
    AnyText,
}

impl ChildKind {
    pub fn admits(&self, kind: BlockKind) -> bool {
        match self {
            ChildKind::Exactly(expected) => *expected == kind,
            ChildKind::AnyText => kind.is_text_block(),
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for an unrecognized block type name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown block type: {0}")]
pub struct UnknownBlockKind(pub String);

impl FromStr for BlockKind {
    type Err = UnknownBlockKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "action" is the legacy name for paragraph
        if s == "action" {
            return Ok(BlockKind::Paragraph);
        }
        ALL_BLOCK_KINDS
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownBlockKind(s.to_string()))
    }
}

/// Writing direction of a rendered block
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

impl TextDirection {
    pub fn as_attr(&self) -> &'static str {
        match self {
            TextDirection::Ltr => "ltr",
            TextDirection::Rtl => "rtl",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_from_str() {
        for kind in ALL_BLOCK_KINDS {
            assert_eq!(kind.name().parse::<BlockKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_action_alias() {
        assert_eq!("action".parse::<BlockKind>().unwrap(), BlockKind::Paragraph);
        let kind: BlockKind = serde_json::from_str("\"action\"").unwrap();
        assert_eq!(kind, BlockKind::Paragraph);
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        assert!("montage".parse::<BlockKind>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&BlockKind::SceneLocation).unwrap();
        assert_eq!(json, "\"sceneLocation\"");
        let json = serde_json::to_string(&BlockKind::TableCell).unwrap();
        assert_eq!(json, "\"tableCell\"");
    }

    #[test]
    fn test_structure_helpers() {
        assert!(BlockKind::Dialogue.is_text_block());
        assert!(BlockKind::TableRow.is_structural());
        assert!(BlockKind::SceneHeading.carries_scene_number());
        assert!(!BlockKind::SceneLocation.carries_scene_number());
        assert!(BlockKind::TableCell.child_kind().unwrap().admits(BlockKind::Sound));
        assert!(!BlockKind::Table.child_kind().unwrap().admits(BlockKind::TableCell));
    }
}
