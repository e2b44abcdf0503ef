//! Import identifier allocation.
//!
//! Each (script, stylesheet) pair with at least one matched class gets one
//! local name for the imported style module. The name is fixed on first use
//! and never changes for the rest of the run.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::debug;

use crate::corpus::{ScriptId, StylesheetId};

/// A binding of a style module in a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub script: ScriptId,
    pub stylesheet: StylesheetId,
    pub identifier: String,
}

/// Allocates collision-free identifiers per (script, stylesheet) pair.
#[derive(Debug, Clone)]
pub struct IdentifierAllocator {
    base: String,
    /// Bindings in allocation order.
    bindings: Vec<Binding>,
    index: HashMap<(ScriptId, StylesheetId), usize>,
    /// Names handed out so far, per script.
    allocated: HashMap<ScriptId, HashSet<String>>,
}

impl IdentifierAllocator {
    pub fn new(base: impl Into<String>) -> Self {
        IdentifierAllocator {
            base: base.into(),
            bindings: Vec::new(),
            index: HashMap::new(),
            allocated: HashMap::new(),
        }
    }

    /// The identifier for a pair, allocating it on first use.
    ///
    /// Probes `base`, `base2`, `base3`, ... against the names already bound
    /// in the script and the identifiers allocated to it earlier.
    pub fn allocate(
        &mut self,
        script: ScriptId,
        stylesheet: StylesheetId,
        bound: &BTreeSet<String>,
    ) -> &str {
        if let Some(idx) = self.index.get(&(script, stylesheet)) {
            return &self.bindings[*idx].identifier;
        }

        let taken = self.allocated.entry(script).or_default();
        let mut candidate = self.base.clone();
        let mut suffix = 1u32;
        while bound.contains(&candidate) || taken.contains(&candidate) {
            suffix += 1;
            candidate = format!("{}{}", self.base, suffix);
        }
        taken.insert(candidate.clone());
        debug!(%script, %stylesheet, identifier = %candidate, "allocated import identifier");

        self.bindings.push(Binding {
            script,
            stylesheet,
            identifier: candidate,
        });
        self.index
            .insert((script, stylesheet), self.bindings.len() - 1);
        &self.bindings[self.bindings.len() - 1].identifier
    }

    /// The identifier for a pair, if one was allocated.
    pub fn get(&self, script: ScriptId, stylesheet: StylesheetId) -> Option<&str> {
        self.index
            .get(&(script, stylesheet))
            .map(|idx| self.bindings[*idx].identifier.as_str())
    }

    /// All bindings in allocation order.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Bindings of one script in allocation order.
    pub fn for_script(&self, script: ScriptId) -> impl Iterator<Item = &Binding> {
        self.bindings.iter().filter(move |b| b.script == script)
    }
}
