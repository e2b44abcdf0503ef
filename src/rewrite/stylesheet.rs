//! Stylesheet rewriting.
//!
//! A convertible class is renamed the first time a script uses it. Every
//! stylesheet that received a rename is queued for a file rename, and in
//! those stylesheets every class left unconverted is wrapped in `:global()`.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use modulize_core::patch::PatchSet;
use modulize_css::escape_ident;

use crate::corpus::{Corpus, StylesheetId};
use crate::naming::camel_case;
use crate::registry::{ClassRegistry, Classification};

/// New class names and the stylesheets they touch.
#[derive(Debug, Clone, Default)]
pub struct ClassRenames {
    new_names: HashMap<String, String>,
    /// Renamed classes in rename order.
    order: Vec<String>,
    /// Stylesheets in first-touch order.
    touched: Vec<StylesheetId>,
    /// New names handed out per stylesheet.
    assigned: HashMap<StylesheetId, HashSet<String>>,
    /// Convertible names already in normal form, per stylesheet.
    reserved: HashMap<StylesheetId, HashSet<String>>,
}

impl ClassRenames {
    /// Prepare renaming for the convertible classes of `registry`.
    pub fn new(registry: &ClassRegistry, classes: &Classification) -> Self {
        let mut reserved: HashMap<StylesheetId, HashSet<String>> = HashMap::new();
        for record in registry.records() {
            if let Some(owner) = classes.owner(&record.name) {
                if camel_case(&record.name) == record.name {
                    reserved
                        .entry(owner)
                        .or_default()
                        .insert(record.name.clone());
                }
            }
        }
        ClassRenames {
            reserved,
            ..ClassRenames::default()
        }
    }

    /// Rename `class`, owned by `owner`, unless it was renamed before.
    ///
    /// A name already in normal form keeps itself. Other names take their
    /// normal form, suffixed `2`, `3`, ... if another class of the same
    /// stylesheet holds it.
    pub fn rename(&mut self, class: &str, owner: StylesheetId) -> &str {
        if !self.new_names.contains_key(class) {
            let new_name = self.pick_name(class, owner);
            debug!(class, new_name = %new_name, stylesheet = %owner, "renamed class");
            self.assigned
                .entry(owner)
                .or_default()
                .insert(new_name.clone());
            if !self.touched.contains(&owner) {
                self.touched.push(owner);
            }
            self.order.push(class.to_string());
            self.new_names.insert(class.to_string(), new_name);
        }
        &self.new_names[class]
    }

    fn pick_name(&self, class: &str, owner: StylesheetId) -> String {
        let normal = camel_case(class);
        if normal == class {
            return normal;
        }
        let base = if normal.is_empty() {
            class.to_string()
        } else {
            normal
        };
        let reserved = self.reserved.get(&owner);
        let assigned = self.assigned.get(&owner);
        let is_free = |name: &str| {
            !reserved.is_some_and(|set| set.contains(name))
                && !assigned.is_some_and(|set| set.contains(name))
        };

        let mut candidate = base.clone();
        let mut suffix = 1u32;
        while !is_free(&candidate) {
            suffix += 1;
            candidate = format!("{}{}", base, suffix);
        }
        candidate
    }

    pub fn new_name(&self, class: &str) -> Option<&str> {
        self.new_names.get(class).map(String::as_str)
    }

    /// Renamed classes in rename order.
    pub fn renamed(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order
            .iter()
            .map(|class| (class.as_str(), self.new_names[class].as_str()))
    }

    /// Stylesheets that received at least one rename, in first-touch order.
    pub fn touched(&self) -> &[StylesheetId] {
        &self.touched
    }

    pub fn is_touched(&self, stylesheet: StylesheetId) -> bool {
        self.touched.contains(&stylesheet)
    }
}

/// Queue the edits for every touched stylesheet.
///
/// Renamed classes get their new name; classes without one are wrapped as
/// `:global(.name)`. Tokens already inside `:global` are left alone.
pub fn rewrite_stylesheets(corpus: &Corpus, renames: &ClassRenames, patch: &mut PatchSet) {
    for &id in renames.touched() {
        let doc = corpus.stylesheet(id);
        let file_id = corpus.stylesheet_file_id(id);
        let mut wrapped = 0usize;

        for (_, token) in doc.sheet.class_tokens() {
            if token.global {
                continue;
            }
            match renames.new_name(&token.name) {
                Some(new_name) => {
                    let text = escape_ident(new_name);
                    if doc.source[token.ident_span.start..token.ident_span.end] != text {
                        patch.replace(file_id, &doc.source, token.ident_span, text, "rename class");
                    }
                }
                None => {
                    let raw = &doc.source[token.span.start..token.span.end];
                    patch.replace(
                        file_id,
                        &doc.source,
                        token.span,
                        format!(":global({})", raw),
                        "keep class global",
                    );
                    wrapped += 1;
                }
            }
        }

        debug!(path = %doc.path(), wrapped, "rewrote stylesheet");
    }
}
