//! Arabic screenplay grammar (split scene heading)
//!
//! Right-to-left. The scene heading carries only the number and the
//! interior/time text; the location sits in its own `sceneLocation` block
//! underneath, so Enter on a heading leads to the location line first.

use std::collections::BTreeMap;

use super::{descriptor, retype_shortcut, rule, FlowRule, InputRule, SceneNumberStyle, TemplateGrammar};
use crate::models::{BlockKind, TextDirection};

pub const ID: &str = "arabic_v2";

/// Label drawn before the scene number ("Scene N")
pub const SCENE_LABEL: &str = "المشهد";

pub fn grammar() -> TemplateGrammar {
    use BlockKind::*;
    let rtl = TextDirection::Rtl;

    let mut flow_table = BTreeMap::new();
    flow_table.insert(SceneHeading, FlowRule::new(SceneLocation, Paragraph));
    flow_table.insert(SceneLocation, FlowRule::new(Paragraph, Paragraph));
    flow_table.insert(Paragraph, FlowRule::new(Paragraph, Character));
    flow_table.insert(Character, FlowRule::new(Dialogue, Transition));
    flow_table.insert(Dialogue, FlowRule::new(Character, Parenthetical));
    flow_table.insert(Parenthetical, FlowRule::new(Dialogue, Dialogue));
    flow_table.insert(Transition, FlowRule::new(SceneHeading, SceneHeading));

    let mut render_rules = BTreeMap::new();
    render_rules.insert(SceneHeading, rule("scene-heading", "sceneHeading", rtl, None));
    render_rules.insert(
        SceneLocation,
        rule(
            "div",
            "scene-location",
            rtl,
            Some("text-align: center; font-weight: bold; text-decoration: underline; margin-bottom: 12px;"),
        ),
    );
    render_rules.insert(Paragraph, rule("p", "action", rtl, Some("text-align: right;")));
    render_rules.insert(
        Character,
        rule("div", "character", rtl, Some("text-align: center; font-weight: bold; margin-top: 10px;")),
    );
    render_rules.insert(Dialogue, rule("div", "dialogue", rtl, Some("text-align: center;")));
    render_rules.insert(Parenthetical, rule("div", "parenthetical", rtl, Some("text-align: center;")));
    render_rules.insert(
        Transition,
        rule("div", "transition", rtl, Some("text-align: left; margin-top: 10px; margin-bottom: 10px;")),
    );

    TemplateGrammar {
        id: ID,
        name: "Arabic Screenplay (Split)",
        direction: rtl,
        block_types: vec![
            descriptor(SceneHeading, "Scene heading", "Cmd+1"),
            descriptor(SceneLocation, "Location", "Cmd+Shift+1"),
            descriptor(Paragraph, "Action", "Cmd+2"),
            descriptor(Character, "Character", "Cmd+3"),
            descriptor(Dialogue, "Dialogue", "Cmd+4"),
            descriptor(Parenthetical, "Parenthetical", "Cmd+5"),
            descriptor(Transition, "Transition", "Cmd+6"),
        ],
        top_level_nodes: vec![
            SceneHeading,
            SceneLocation,
            Paragraph,
            Character,
            Dialogue,
            Parenthetical,
            Transition,
        ],
        flow_table,
        shortcuts: vec![
            retype_shortcut(SceneHeading, "Ctrl+1"),
            retype_shortcut(SceneLocation, "Ctrl+Shift+1"),
            retype_shortcut(Paragraph, "Ctrl+2"),
            retype_shortcut(Character, "Ctrl+3"),
            retype_shortcut(Dialogue, "Ctrl+4"),
            retype_shortcut(Parenthetical, "Ctrl+5"),
            retype_shortcut(Transition, "Ctrl+6"),
        ],
        render_rules,
        scene_number_style: SceneNumberStyle::Prefixed(SCENE_LABEL),
        input_rules: vec![InputRule {
            pattern: r"^>\s$",
            target: Transition,
        }],
    }
}
