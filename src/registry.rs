//! Class registry and classification.
//!
//! The registry records, for every class name seen in any stylesheet, which
//! stylesheets declare it and how. Classification reduces it to the
//! convertible view: classes owned by exactly one stylesheet and never
//! scoped with `:global`.

use std::collections::HashMap;

use tracing::debug;

use crate::corpus::{Corpus, StylesheetId};

/// Where a class is declared.
///
/// One per (class, stylesheet). The flags hold only if they hold for every
/// appearance of the class in that stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleOccurrence {
    pub stylesheet: StylesheetId,
    /// Every appearance is in a rule not nested in another block.
    pub top_level: bool,
    /// Every appearance is the first token of its selector.
    pub leading: bool,
    /// Some appearance is already scoped with `:global`.
    pub global: bool,
}

/// Everything known about one class name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRecord {
    pub name: String,
    /// Owning stylesheets, in first-seen order.
    pub occurrences: Vec<StyleOccurrence>,
}

impl ClassRecord {
    fn new(name: &str) -> Self {
        ClassRecord {
            name: name.to_string(),
            occurrences: Vec::new(),
        }
    }

    /// Owning stylesheets in first-seen order.
    pub fn owners(&self) -> impl Iterator<Item = StylesheetId> + '_ {
        self.occurrences.iter().map(|o| o.stylesheet)
    }

    /// The occurrence in `stylesheet`, if any.
    pub fn occurrence(&self, stylesheet: StylesheetId) -> Option<&StyleOccurrence> {
        self.occurrences.iter().find(|o| o.stylesheet == stylesheet)
    }
}

/// Class records keyed by name, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    records: Vec<ClassRecord>,
    index: HashMap<String, usize>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        ClassRegistry::default()
    }

    /// Index every class token of every stylesheet in the corpus.
    pub fn build(corpus: &Corpus) -> Self {
        let mut registry = ClassRegistry::new();
        for id in corpus.stylesheet_ids() {
            for (rule, token) in corpus.stylesheet(id).sheet.class_tokens() {
                registry.record(id, &token.name, rule.top_level, token.leading, token.global);
            }
        }
        debug!(classes = registry.len(), "indexed stylesheet classes");
        registry
    }

    /// Record one appearance of `name` in `stylesheet`.
    pub fn record(
        &mut self,
        stylesheet: StylesheetId,
        name: &str,
        top_level: bool,
        leading: bool,
        global: bool,
    ) {
        let idx = match self.index.get(name) {
            Some(idx) => *idx,
            None => {
                self.records.push(ClassRecord::new(name));
                self.index.insert(name.to_string(), self.records.len() - 1);
                self.records.len() - 1
            }
        };
        let record = &mut self.records[idx];
        match record
            .occurrences
            .iter_mut()
            .find(|o| o.stylesheet == stylesheet)
        {
            Some(occurrence) => {
                occurrence.top_level &= top_level;
                occurrence.leading &= leading;
                occurrence.global |= global;
            }
            None => record.occurrences.push(StyleOccurrence {
                stylesheet,
                top_level,
                leading,
                global,
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ClassRecord> {
        self.index.get(name).map(|idx| &self.records[*idx])
    }

    pub fn records(&self) -> &[ClassRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of classes declared in more than one stylesheet.
    pub fn shared_count(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.occurrences.len() > 1)
            .count()
    }
}

/// The convertible view: class name to its single owning stylesheet.
///
/// A class with any `:global` appearance stays global. The top-level and
/// leading flags are reported but do not gate convertibility.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    owners: HashMap<String, StylesheetId>,
}

impl Classification {
    pub fn classify(registry: &ClassRegistry) -> Self {
        let owners: HashMap<String, StylesheetId> = registry
            .records()
            .iter()
            .filter(|record| record.occurrences.len() == 1 && !record.occurrences[0].global)
            .map(|record| (record.name.clone(), record.occurrences[0].stylesheet))
            .collect();
        debug!(
            convertible = owners.len(),
            shared = registry.shared_count(),
            "classified classes"
        );
        Classification { owners }
    }

    /// The owning stylesheet of a convertible class.
    pub fn owner(&self, name: &str) -> Option<StylesheetId> {
        self.owners.get(name).copied()
    }

    pub fn is_convertible(&self, name: &str) -> bool {
        self.owners.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
