//! Template grammars
//!
//! A template grammar is an immutable bundle describing one screenplay
//! format: which block types exist, how they render, their default
//! shortcuts, and the flow transition table consulted on Enter/Tab.
//!
//! Grammars are structurally interchangeable. The flow controller, the
//! renumbering pass and the session only ever talk to `TemplateGrammar`;
//! adding a format means adding a file here and registering it.
//!
//! ## Modules
//!
//! - `american`, `arabic`, `arabic_av_table`: the built-in grammars
//! - `registry`: lookup by id with default fallback
//! - `key_combo`: shortcut parsing and normalization
//! - `preferences`: user overrides layered on top of a grammar

pub mod american;
pub mod arabic;
pub mod arabic_av_table;
pub mod key_combo;
pub mod preferences;
pub mod registry;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{Block, BlockKind, Document, TextDirection, SCENE_NUMBER_ATTR};

pub use key_combo::{KeyCombo, KeyComboError};
pub use preferences::{PreferenceBook, RuntimeConfig, ShortcutBinding, TemplatePreferences};
pub use registry::{builtin_registry, TemplateRegistry, TemplateSummary, DEFAULT_TEMPLATE_ID};

/// Multi-step structural edits that a flow rule or shortcut can trigger
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "procedure", rename_all = "camelCase")]
pub enum Procedure {
    /// Place a block of `node` in the AV table: reuse the free cell of the
    /// current row or add a row (or a whole table) and navigate into it
    #[serde(rename_all = "camelCase")]
    InsertTableNode { node: BlockKind },
}

impl Procedure {
    /// Block kind the procedure produces
    pub fn target_kind(&self) -> BlockKind {
        match self {
            Procedure::InsertTableNode { node } => *node,
        }
    }
}

/// What a flow key or shortcut does
///
/// Serialized as a bare block name for `RetypeTo` and as
/// `{"procedure": ..}` for procedures, so saved flow preferences stay in
/// the `{ "enter": "dialogue" }` shape.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum BlockAction {
    RetypeTo(BlockKind),
    RunProcedure(Procedure),
}

impl BlockAction {
    pub fn target_kind(&self) -> BlockKind {
        match self {
            BlockAction::RetypeTo(kind) => *kind,
            BlockAction::RunProcedure(procedure) => procedure.target_kind(),
        }
    }
}

/// Enter/Tab behavior for one block type; a missing key means default
/// editor behavior
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct FlowRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enter: Option<BlockAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab: Option<BlockAction>,
}

impl FlowRule {
    pub fn new(enter: BlockKind, tab: BlockKind) -> Self {
        Self {
            enter: Some(BlockAction::RetypeTo(enter)),
            tab: Some(BlockAction::RetypeTo(tab)),
        }
    }

    pub fn enter_only(enter: BlockKind) -> Self {
        Self {
            enter: Some(BlockAction::RetypeTo(enter)),
            tab: None,
        }
    }
}

/// Flow transition table keyed by the current block type
pub type FlowTable = BTreeMap<BlockKind, FlowRule>;

/// One entry of the element palette
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct BlockTypeDescriptor {
    pub node: BlockKind,
    pub label: &'static str,
    /// Display shortcut shown next to the palette entry
    pub shortcut: KeyCombo,
}

/// How a block type renders to HTML
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderRule {
    pub tag: &'static str,
    pub class: &'static str,
    pub direction: TextDirection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<&'static str>,
}

/// How scene heading numbers are drawn
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SceneNumberStyle {
    /// "12." in both page margins
    BothMargins,
    /// Label before the number, e.g. "المشهد 12"
    Prefixed(&'static str),
}

impl SceneNumberStyle {
    pub fn label(&self, number: u32) -> String {
        match self {
            SceneNumberStyle::BothMargins => format!("{}.", number),
            SceneNumberStyle::Prefixed(prefix) => format!("{} {}", prefix, number),
        }
    }
}

/// Typing that matches `pattern` as the whole block content clears the
/// block and retypes it to `target`
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputRule {
    pub pattern: &'static str,
    pub target: BlockKind,
}

/// An immutable screenplay format
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TemplateGrammar {
    pub id: &'static str,
    pub name: &'static str,
    pub direction: TextDirection,
    pub block_types: Vec<BlockTypeDescriptor>,
    pub top_level_nodes: Vec<BlockKind>,
    pub flow_table: FlowTable,
    pub shortcuts: Vec<ShortcutBinding>,
    pub render_rules: BTreeMap<BlockKind, RenderRule>,
    pub scene_number_style: SceneNumberStyle,
    pub input_rules: Vec<InputRule>,
}

impl TemplateGrammar {
    /// Whether blocks of `kind` may exist under this grammar
    ///
    /// Table structure is admitted when the grammar lists `table` among its
    /// top-level nodes.
    pub fn admits(&self, kind: BlockKind) -> bool {
        if kind.is_structural() {
            return self.top_level_nodes.contains(&BlockKind::Table);
        }
        self.block_types.iter().any(|d| d.node == kind)
    }

    pub fn flow_rule(&self, kind: BlockKind) -> Option<&FlowRule> {
        self.flow_table.get(&kind)
    }

    /// Block used for a fresh document and for default editor behavior
    pub fn default_block(&self) -> BlockKind {
        if self.top_level_nodes.contains(&BlockKind::Paragraph) {
            return BlockKind::Paragraph;
        }
        self.top_level_nodes
            .iter()
            .copied()
            .find(|k| k.is_text_block())
            .unwrap_or(BlockKind::Paragraph)
    }

    /// Minimal valid document under this grammar
    pub fn empty_document(&self) -> Document {
        Document::single(self.default_block())
    }

    /// First block kind in `document` this grammar does not admit
    pub fn first_foreign_kind(&self, document: &Document) -> Option<BlockKind> {
        document.kinds().into_iter().find(|k| !self.admits(*k))
    }

    /// Bend a document written for some unknown grammar into this one
    ///
    /// Tables the grammar cannot hold are flattened into their cells' text
    /// blocks, in row order. Text blocks it does not declare become the
    /// default block with their content kept.
    pub fn conform(&self, document: Document) -> Document {
        let mut blocks = Vec::new();
        for block in document.into_blocks() {
            self.conform_block(block, &mut blocks);
        }
        Document::from_blocks(blocks)
    }

    fn conform_block(&self, mut block: Block, out: &mut Vec<Block>) {
        if block.kind.is_structural() {
            if self.admits(block.kind) {
                for child in std::mem::take(&mut block.children) {
                    self.conform_block(child, &mut block.children);
                }
                out.push(block);
                return;
            }
            log::warn!("Template '{}' has no tables; flattening '{}' into its text blocks", self.id, block.kind);
            for child in block.children {
                self.conform_block(child, out);
            }
            return;
        }

        if !self.admits(block.kind) {
            let fallback = self.default_block();
            log::warn!("Template '{}' has no '{}' blocks; retyping to '{}'", self.id, block.kind, fallback);
            block.kind = fallback;
            if !fallback.carries_scene_number() {
                block.attrs.remove(SCENE_NUMBER_ATTR);
            }
        }
        out.push(block);
    }

    pub fn render_rule(&self, kind: BlockKind) -> RenderRule {
        self.render_rules.get(&kind).copied().unwrap_or(RenderRule {
            tag: "div",
            class: kind.css_class(),
            direction: self.direction,
            style: None,
        })
    }

    /// Flow and shortcut targets that name block types outside the grammar
    pub fn authoring_defects(&self) -> Vec<String> {
        let mut defects = Vec::new();
        for (from, rule) in &self.flow_table {
            for (key, action) in [("enter", &rule.enter), ("tab", &rule.tab)] {
                if let Some(action) = action {
                    if !self.admits(action.target_kind()) {
                        defects.push(format!(
                            "{}: flow {}.{} targets undeclared '{}'",
                            self.id,
                            from,
                            key,
                            action.target_kind()
                        ));
                    }
                }
            }
        }
        for binding in &self.shortcuts {
            if !self.admits(binding.action.target_kind()) {
                defects.push(format!(
                    "{}: shortcut {} targets undeclared '{}'",
                    self.id,
                    binding.combo,
                    binding.action.target_kind()
                ));
            }
        }
        defects
    }
}

/// Palette entry helper used by the grammar definitions
pub(crate) fn descriptor(node: BlockKind, label: &'static str, shortcut: &str) -> BlockTypeDescriptor {
    BlockTypeDescriptor {
        node,
        label,
        shortcut: KeyCombo::parse(shortcut).unwrap_or_else(|_| KeyCombo::unbound()),
    }
}

/// Shortcut that retypes the current block
pub(crate) fn retype_shortcut(node: BlockKind, combo: &str) -> ShortcutBinding {
    ShortcutBinding {
        node,
        combo: KeyCombo::parse(combo).unwrap_or_else(|_| KeyCombo::unbound()),
        action: BlockAction::RetypeTo(node),
    }
}

/// Shortcut that runs a procedure
pub(crate) fn procedure_shortcut(node: BlockKind, combo: &str, procedure: Procedure) -> ShortcutBinding {
    ShortcutBinding {
        node,
        combo: KeyCombo::parse(combo).unwrap_or_else(|_| KeyCombo::unbound()),
        action: BlockAction::RunProcedure(procedure),
    }
}

pub(crate) fn rule(
    tag: &'static str,
    class: &'static str,
    direction: TextDirection,
    style: Option<&'static str>,
) -> RenderRule {
    RenderRule {
        tag,
        class,
        direction,
        style,
    }
}
