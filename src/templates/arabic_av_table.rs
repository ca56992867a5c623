//! Arabic audio-visual table grammar
//!
//! Scenes are headings and locations at the top level; everything in
//! between lives in a two-column table (visual on column 0, audio on
//! column 1). Only headings and locations flow on Enter. Content blocks
//! are placed through the table procedure bound to their shortcuts.

use std::collections::BTreeMap;

use super::{
    descriptor, procedure_shortcut, retype_shortcut, rule, FlowRule, Procedure, SceneNumberStyle,
    TemplateGrammar,
};
use crate::models::{BlockKind, TextDirection};

pub const ID: &str = "arabic_av_table";

pub fn grammar() -> TemplateGrammar {
    use BlockKind::*;
    let rtl = TextDirection::Rtl;

    let mut flow_table = BTreeMap::new();
    flow_table.insert(SceneHeading, FlowRule::enter_only(SceneLocation));
    flow_table.insert(SceneLocation, FlowRule::enter_only(Paragraph));

    let mut render_rules = BTreeMap::new();
    render_rules.insert(SceneHeading, rule("scene-heading", "sceneHeading", rtl, None));
    render_rules.insert(Paragraph, rule("p", "action", rtl, None));
    render_rules.insert(Table, rule("table", "av-script-table", rtl, None));
    render_rules.insert(TableRow, rule("tr", "av-script-row", rtl, None));
    render_rules.insert(TableCell, rule("td", "av-script-cell", rtl, None));

    let table_node = |node| Procedure::InsertTableNode { node };

    TemplateGrammar {
        id: ID,
        name: "Arabic AV Table",
        direction: rtl,
        block_types: vec![
            descriptor(SceneHeading, "Scene Heading", "Cmd+1"),
            descriptor(SceneLocation, "Location", "Cmd+Shift+1"),
            descriptor(Paragraph, "Action", "Cmd+2"),
            descriptor(Character, "Character", "Cmd+3"),
            descriptor(Dialogue, "Dialogue", "Cmd+4"),
            descriptor(Parenthetical, "Parenthetical", "Cmd+5"),
            descriptor(Sound, "Sound", "Cmd+7"),
            descriptor(Transition, "Transition", "Cmd+6"),
        ],
        top_level_nodes: vec![SceneHeading, SceneLocation, Table, Transition],
        flow_table,
        shortcuts: vec![
            retype_shortcut(SceneHeading, "Ctrl+1"),
            retype_shortcut(SceneLocation, "Ctrl+Shift+1"),
            retype_shortcut(Transition, "Ctrl+6"),
            procedure_shortcut(Paragraph, "Ctrl+2", table_node(Paragraph)),
            procedure_shortcut(Character, "Ctrl+3", table_node(Character)),
            procedure_shortcut(Dialogue, "Ctrl+4", table_node(Dialogue)),
            procedure_shortcut(Parenthetical, "Ctrl+5", table_node(Parenthetical)),
            procedure_shortcut(Sound, "Ctrl+7", table_node(Sound)),
        ],
        render_rules,
        scene_number_style: SceneNumberStyle::Prefixed(super::arabic::SCENE_LABEL),
        input_rules: Vec::new(),
    }
}
