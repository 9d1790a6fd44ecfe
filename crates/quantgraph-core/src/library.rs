//! The in-memory template library.
//!
//! Constructed once at process start from a template store and never mutated
//! afterwards, so sharing a `&TemplateLibrary` across solves (or threads) is
//! safe by construction. Lookup is keyed by `(topic, mode)`; candidates are
//! always yielded in template-id order, which anchors the matcher's
//! deterministic tie-break.

use std::collections::HashMap;

use crate::pattern::Topic;
use crate::template::{Template, TemplateError, TemplateSpec};

/// A read-only collection of compiled templates indexed by `(topic, mode)`.
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: Vec<Template>,
    index: HashMap<(Topic, String), Vec<usize>>,
}

impl TemplateLibrary {
    /// Builds a library from compiled templates. Templates are sorted by id
    /// so that candidate iteration order is independent of load order.
    pub fn from_templates(mut templates: Vec<Template>) -> Self {
        templates.sort_by(|a, b| a.id.cmp(&b.id));

        let mut index: HashMap<(Topic, String), Vec<usize>> = HashMap::new();
        for (i, tpl) in templates.iter().enumerate() {
            index
                .entry((tpl.topic, tpl.mode.clone()))
                .or_default()
                .push(i);
        }
        TemplateLibrary { templates, index }
    }

    /// Compiles raw specs and builds the library.
    pub fn from_specs(specs: Vec<TemplateSpec>) -> Result<Self, TemplateError> {
        let templates = specs
            .into_iter()
            .map(Template::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_templates(templates))
    }

    /// Iterates the templates registered for `(topic, mode)` in id order.
    pub fn candidates(&self, topic: Topic, mode: &str) -> impl Iterator<Item = &Template> {
        self.index
            .get(&(topic, mode.to_string()))
            .into_iter()
            .flatten()
            .map(move |&i| &self.templates[i])
    }

    /// Iterates all templates in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
