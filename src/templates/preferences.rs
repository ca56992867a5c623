//! User preferences layered on top of a grammar
//!
//! Preferences are stored per template id, in the same
//! `{ shortcuts: { node: combo }, flow: { node: { enter, tab } } }` shape
//! the host keeps under `typewriter_prefs_<templateId>`. The grammar is
//! never mutated: merging produces a `RuntimeConfig`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{BlockAction, FlowRule, FlowTable, KeyCombo, TemplateGrammar};
use crate::models::BlockKind;

/// Storage key the host uses for a template's preferences
pub fn storage_key(template_id: &str) -> String {
    format!("typewriter_prefs_{}", template_id)
}

/// One shortcut: combo → action on behalf of a palette node
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ShortcutBinding {
    pub node: BlockKind,
    pub combo: KeyCombo,
    pub action: BlockAction,
}

/// Saved overrides for one template
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct TemplatePreferences {
    #[serde(default)]
    pub shortcuts: BTreeMap<BlockKind, KeyCombo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<FlowTable>,
}

/// All saved preferences, keyed by template id
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(transparent)]
pub struct PreferenceBook {
    entries: BTreeMap<String, TemplatePreferences>,
}

impl PreferenceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn get(&self, template_id: &str) -> Option<&TemplatePreferences> {
        self.entries.get(template_id)
    }

    pub fn set(&mut self, template_id: &str, preferences: TemplatePreferences) {
        self.entries.insert(template_id.to_string(), preferences);
    }

    pub fn remove(&mut self, template_id: &str) -> Option<TemplatePreferences> {
        self.entries.remove(template_id)
    }
}

/// Live shortcut and flow configuration for the active grammar
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    pub template_id: String,
    pub shortcuts: Vec<ShortcutBinding>,
    pub flow: FlowTable,
}

impl RuntimeConfig {
    /// The grammar's own defaults
    pub fn defaults(grammar: &TemplateGrammar) -> Self {
        Self {
            template_id: grammar.id.to_string(),
            shortcuts: grammar.shortcuts.clone(),
            flow: grammar.flow_table.clone(),
        }
    }

    /// Defaults with saved preferences applied
    ///
    /// A saved combo replaces the default combo of the same node and keeps
    /// its action; a saved flow table replaces the default one wholesale.
    pub fn merged(grammar: &TemplateGrammar, preferences: Option<&TemplatePreferences>) -> Self {
        let mut config = Self::defaults(grammar);
        let Some(preferences) = preferences else {
            return config;
        };

        for (node, combo) in &preferences.shortcuts {
            if let Some(binding) = config.shortcuts.iter_mut().find(|b| b.node == *node) {
                binding.combo = combo.clone();
            } else if grammar.admits(*node) && node.is_text_block() {
                config.shortcuts.push(ShortcutBinding {
                    node: *node,
                    combo: combo.clone(),
                    action: BlockAction::RetypeTo(*node),
                });
            } else {
                log::warn!(
                    "Ignoring saved shortcut {} for '{}': not part of template '{}'",
                    combo,
                    node,
                    grammar.id
                );
            }
        }

        if let Some(flow) = &preferences.flow {
            config.flow = flow.clone();
        }
        config
    }

    pub fn flow_rule(&self, kind: BlockKind) -> Option<&FlowRule> {
        self.flow.get(&kind)
    }

    /// Binding triggered by `combo`, if any
    pub fn shortcut_for(&self, combo: &KeyCombo) -> Option<&ShortcutBinding> {
        if combo.is_unbound() {
            return None;
        }
        self.shortcuts.iter().find(|b| &b.combo == combo)
    }

    /// Node → combo map for display and for saving
    pub fn shortcut_map(&self) -> BTreeMap<BlockKind, KeyCombo> {
        self.shortcuts
            .iter()
            .map(|b| (b.node, b.combo.clone()))
            .collect()
    }

    /// Preferences that reproduce this configuration
    pub fn to_preferences(&self) -> TemplatePreferences {
        TemplatePreferences {
            shortcuts: self.shortcut_map(),
            flow: Some(self.flow.clone()),
        }
    }
}
