//! Template registry
//!
//! Fixed, ordered set of grammars built once per process. Lookups miss
//! silently; callers that need a grammar no matter what use
//! `find_or_default`, which falls back to American Standard.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::sync::Arc;

use super::{american, arabic, arabic_av_table, BlockTypeDescriptor, TemplateGrammar};
use crate::models::TextDirection;

/// Grammar used whenever a template id is unknown or missing
pub const DEFAULT_TEMPLATE_ID: &str = american::ID;

static BUILTIN: Lazy<Arc<TemplateRegistry>> = Lazy::new(|| Arc::new(TemplateRegistry::builtin()));

/// The process-wide registry of built-in grammars
pub fn builtin_registry() -> Arc<TemplateRegistry> {
    Arc::clone(&BUILTIN)
}

/// What the template picker shows for one grammar
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    pub id: &'static str,
    pub name: &'static str,
    pub direction: TextDirection,
    pub elements: Vec<BlockTypeDescriptor>,
    pub element_count: usize,
}

impl TemplateSummary {
    pub fn of(grammar: &TemplateGrammar) -> Self {
        Self {
            id: grammar.id,
            name: grammar.name,
            direction: grammar.direction,
            elements: grammar.block_types.clone(),
            element_count: grammar.block_types.len(),
        }
    }
}

#[derive(Debug)]
pub struct TemplateRegistry {
    templates: Vec<Arc<TemplateGrammar>>,
    default_index: usize,
}

impl TemplateRegistry {
    /// American, Arabic, Arabic AV table
    pub fn builtin() -> Self {
        Self::new(vec![
            american::grammar(),
            arabic::grammar(),
            arabic_av_table::grammar(),
        ])
    }

    /// Build a registry; the default is the grammar whose id is
    /// `DEFAULT_TEMPLATE_ID`, or the first one
    pub fn new(grammars: Vec<TemplateGrammar>) -> Self {
        for grammar in &grammars {
            for defect in grammar.authoring_defects() {
                log::warn!("Grammar authoring defect: {}", defect);
            }
        }
        let default_index = grammars
            .iter()
            .position(|g| g.id == DEFAULT_TEMPLATE_ID)
            .unwrap_or(0);
        Self {
            templates: grammars.into_iter().map(Arc::new).collect(),
            default_index,
        }
    }

    pub fn list_templates(&self) -> impl Iterator<Item = &Arc<TemplateGrammar>> {
        self.templates.iter()
    }

    pub fn summaries(&self) -> Vec<TemplateSummary> {
        self.templates.iter().map(|g| TemplateSummary::of(g)).collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn find_template(&self, id: &str) -> Option<Arc<TemplateGrammar>> {
        self.templates.iter().find(|g| g.id == id).cloned()
    }

    /// The fallback grammar
    ///
    /// An empty registry still yields a usable grammar so the session never
    /// runs unbound.
    pub fn default_template(&self) -> Arc<TemplateGrammar> {
        self.templates
            .get(self.default_index)
            .cloned()
            .unwrap_or_else(|| Arc::new(american::grammar()))
    }

    /// Lookup with default-fallback policy for persisted or imported ids
    pub fn find_or_default(&self, id: Option<&str>) -> Arc<TemplateGrammar> {
        match id {
            Some(id) => match self.find_template(id) {
                Some(grammar) => grammar,
                None => {
                    let fallback = self.default_template();
                    log::warn!(
                        "Template '{}' not found, falling back to '{}'",
                        id,
                        fallback.id
                    );
                    fallback
                }
            },
            None => self.default_template(),
        }
    }
}
