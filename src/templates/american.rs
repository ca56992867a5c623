//! American Standard screenplay grammar
//!
//! Left-to-right, one scene heading block with the number in both margins.
//! Flow: heading → action → character → dialogue ↔ character, transition
//! cycling back to a new scene heading.

use std::collections::BTreeMap;

use super::{descriptor, retype_shortcut, rule, FlowRule, InputRule, SceneNumberStyle, TemplateGrammar};
use crate::models::{BlockKind, TextDirection};

pub const ID: &str = "american";

pub fn grammar() -> TemplateGrammar {
    use BlockKind::*;
    let ltr = TextDirection::Ltr;

    let mut flow_table = BTreeMap::new();
    flow_table.insert(SceneHeading, FlowRule::new(Paragraph, Paragraph));
    flow_table.insert(Paragraph, FlowRule::new(Paragraph, Character));
    flow_table.insert(Character, FlowRule::new(Dialogue, Transition));
    flow_table.insert(Dialogue, FlowRule::new(Character, Parenthetical));
    flow_table.insert(Parenthetical, FlowRule::new(Dialogue, Dialogue));
    flow_table.insert(Transition, FlowRule::new(SceneHeading, SceneHeading));

    let mut render_rules = BTreeMap::new();
    render_rules.insert(SceneHeading, rule("scene-heading", "sceneHeading", ltr, None));
    render_rules.insert(Paragraph, rule("p", "action", ltr, None));

    TemplateGrammar {
        id: ID,
        name: "American Standard",
        direction: ltr,
        block_types: vec![
            descriptor(SceneHeading, "Scene Heading", "Cmd+1"),
            descriptor(Paragraph, "Action", "Cmd+2"),
            descriptor(Character, "Character", "Cmd+3"),
            descriptor(Dialogue, "Dialogue", "Cmd+4"),
            descriptor(Parenthetical, "Parenthetical", "Cmd+5"),
            descriptor(Transition, "Transition", "Cmd+6"),
        ],
        top_level_nodes: vec![SceneHeading, Paragraph, Character, Dialogue, Parenthetical, Transition],
        flow_table,
        shortcuts: vec![
            retype_shortcut(SceneHeading, "Ctrl+1"),
            retype_shortcut(Paragraph, "Ctrl+2"),
            retype_shortcut(Character, "Ctrl+3"),
            retype_shortcut(Dialogue, "Ctrl+4"),
            retype_shortcut(Parenthetical, "Ctrl+5"),
            retype_shortcut(Transition, "Ctrl+6"),
        ],
        render_rules,
        scene_number_style: SceneNumberStyle::BothMargins,
        input_rules: vec![InputRule {
            pattern: r"^>\s$",
            target: Transition,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::BlockAction;

    #[test]
    fn test_character_flow() {
        let g = grammar();
        let rule = g.flow_rule(BlockKind::Character).unwrap();
        assert_eq!(rule.enter, Some(BlockAction::RetypeTo(BlockKind::Dialogue)));
        assert_eq!(rule.tab, Some(BlockAction::RetypeTo(BlockKind::Transition)));
    }

    #[test]
    fn test_no_tables_or_locations() {
        let g = grammar();
        assert!(!g.admits(BlockKind::SceneLocation));
        assert!(!g.admits(BlockKind::Table));
        assert!(!g.admits(BlockKind::TableCell));
        assert_eq!(g.default_block(), BlockKind::Paragraph);
    }
}
