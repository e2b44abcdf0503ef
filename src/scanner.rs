//! Usage scanning.
//!
//! Every candidate literal of every script is split on single spaces and each
//! word is looked up in the convertible view. A match renames the class (on
//! its first use anywhere) and allocates the import identifier for the
//! (script, stylesheet) pair. The result is the explicit list of matches the
//! script rewriter works from.

use std::collections::BTreeMap;

use tracing::debug;

use crate::allocator::IdentifierAllocator;
use crate::corpus::{Corpus, ScriptId, StylesheetId};
use crate::migrate::MigrateError;
use crate::registry::{ClassRegistry, Classification};
use crate::rewrite::stylesheet::ClassRenames;

/// One word of a literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    /// The stylesheet owning the class this word names, if it matched.
    pub owner: Option<StylesheetId>,
}

impl Word {
    pub fn is_match(&self) -> bool {
        self.owner.is_some()
    }
}

/// A literal with at least one matched word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralMatch {
    /// Index into the script's literal list.
    pub literal: usize,
    pub words: Vec<Word>,
}

/// The matched literals of one script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptMatches {
    pub script: ScriptId,
    pub literals: Vec<LiteralMatch>,
}

/// A place where a convertible class is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageSite {
    pub script: ScriptId,
    pub stylesheet: StylesheetId,
}

/// Everything the scan found.
#[derive(Debug, Clone, Default)]
pub struct UsageScan {
    /// Scripts with at least one match, in corpus order.
    pub scripts: Vec<ScriptMatches>,
    /// Usage sites per class name.
    pub usage: BTreeMap<String, Vec<UsageSite>>,
}

impl UsageScan {
    pub fn usage_count(&self, class: &str) -> usize {
        self.usage.get(class).map_or(0, Vec::len)
    }
}

/// Split literal text into words on single spaces.
///
/// Runs of spaces yield empty words so that joining with `' '` restores the
/// original text exactly.
pub fn split_words(text: &str) -> impl Iterator<Item = &str> {
    text.split(' ')
}

/// Scans scripts against the convertible view.
pub struct UsageScanner<'a> {
    corpus: &'a Corpus,
    registry: &'a ClassRegistry,
    classes: &'a Classification,
}

impl<'a> UsageScanner<'a> {
    pub fn new(corpus: &'a Corpus, registry: &'a ClassRegistry, classes: &'a Classification) -> Self {
        UsageScanner {
            corpus,
            registry,
            classes,
        }
    }

    /// Scan every script in corpus order.
    pub fn scan(
        &self,
        renames: &mut ClassRenames,
        identifiers: &mut IdentifierAllocator,
    ) -> Result<UsageScan, MigrateError> {
        let mut result = UsageScan::default();

        for script in self.corpus.script_ids() {
            let doc = &self.corpus.script(script).doc;
            let mut literals = Vec::new();

            for (idx, literal) in doc.literals.iter().enumerate() {
                let mut words = Vec::new();
                let mut matched = false;
                for text in split_words(&literal.text) {
                    let owner = self.match_word(text, script, renames, identifiers, &mut result)?;
                    matched |= owner.is_some();
                    words.push(Word {
                        text: text.to_string(),
                        owner,
                    });
                }
                if matched {
                    literals.push(LiteralMatch {
                        literal: idx,
                        words,
                    });
                }
            }

            if !literals.is_empty() {
                debug!(path = %doc.path, literals = literals.len(), "matched class usages");
                result.scripts.push(ScriptMatches { script, literals });
            }
        }

        Ok(result)
    }

    fn match_word(
        &self,
        word: &str,
        script: ScriptId,
        renames: &mut ClassRenames,
        identifiers: &mut IdentifierAllocator,
        result: &mut UsageScan,
    ) -> Result<Option<StylesheetId>, MigrateError> {
        let Some(owner) = self.classes.owner(word) else {
            return Ok(None);
        };
        self.check_single_owner(word)?;

        renames.rename(word, owner);
        identifiers.allocate(script, owner, &self.corpus.script(script).doc.bindings);
        result
            .usage
            .entry(word.to_string())
            .or_default()
            .push(UsageSite {
                script,
                stylesheet: owner,
            });
        Ok(Some(owner))
    }

    fn check_single_owner(&self, class: &str) -> Result<(), MigrateError> {
        let Some(record) = self.registry.get(class) else {
            return Ok(());
        };
        if record.occurrences.len() > 1 {
            return Err(MigrateError::SharedClass {
                class: class.to_string(),
                paths: record
                    .owners()
                    .map(|id| self.corpus.stylesheet(id).path().to_string())
                    .collect(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modulize_core::files::SourceFile;

    fn file(path: &str, content: &str) -> SourceFile {
        SourceFile {
            path: path.to_string(),
            content: content.to_string(),
        }
    }

    struct Fixture {
        corpus: Corpus,
        registry: ClassRegistry,
        classes: Classification,
    }

    impl Fixture {
        fn new(sheets: &[(&str, &str)], scripts: &[(&str, &str)]) -> Self {
            let sheets: Vec<_> = sheets.iter().map(|(p, c)| file(p, c)).collect();
            let scripts: Vec<_> = scripts.iter().map(|(p, c)| file(p, c)).collect();
            let corpus = Corpus::parse(&sheets, &scripts).unwrap();
            let registry = ClassRegistry::build(&corpus);
            let classes = Classification::classify(&registry);
            Fixture {
                corpus,
                registry,
                classes,
            }
        }

        fn scan(&self) -> (UsageScan, ClassRenames, IdentifierAllocator) {
            let mut renames = ClassRenames::new(&self.registry, &self.classes);
            let mut identifiers = IdentifierAllocator::new("styles");
            let scan = UsageScanner::new(&self.corpus, &self.registry, &self.classes)
                .scan(&mut renames, &mut identifiers)
                .unwrap();
            (scan, renames, identifiers)
        }
    }

    #[test]
    fn split_preserves_spacing() {
        let words: Vec<_> = split_words(" a  b ").collect();
        assert_eq!(words, vec!["", "a", "", "b", ""]);
        assert_eq!(words.join(" "), " a  b ");
    }

    #[test]
    fn matches_words_against_convertible_classes() {
        let fx = Fixture::new(
            &[("a.css", ".foo {}")],
            &[("a.jsx", r#"const x = <div className="foo bar-baz" />;"#)],
        );
        let (scan, renames, identifiers) = fx.scan();
        assert_eq!(scan.scripts.len(), 1);
        let words = &scan.scripts[0].literals[0].words;
        assert!(words[0].is_match());
        assert!(!words[1].is_match());
        assert_eq!(renames.new_name("foo"), Some("foo"));
        assert_eq!(identifiers.get(ScriptId(0), StylesheetId(0)), Some("styles"));
        assert_eq!(scan.usage_count("foo"), 1);
    }

    #[test]
    fn shared_classes_never_match() {
        let fx = Fixture::new(
            &[("a.css", ".foo {}"), ("b.css", ".foo {}")],
            &[("a.js", r#"const x = "foo";"#)],
        );
        let (scan, renames, identifiers) = fx.scan();
        assert!(scan.scripts.is_empty());
        assert!(renames.touched().is_empty());
        assert!(identifiers.bindings().is_empty());
    }

    #[test]
    fn usage_sites_accumulate_per_match() {
        let fx = Fixture::new(
            &[("a.css", ".foo {}")],
            &[
                ("a.js", r#"const x = "foo"; const y = `foo ${x}`;"#),
                ("b.js", r#"const z = "foo";"#),
            ],
        );
        let (scan, _, identifiers) = fx.scan();
        assert_eq!(scan.usage_count("foo"), 3);
        assert_eq!(scan.scripts.len(), 2);
        assert_eq!(identifiers.bindings().len(), 2);
    }

    #[test]
    fn member_access_strings_are_not_scanned() {
        let fx = Fixture::new(&[("a.css", ".foo {}")], &[("a.js", r#"const x = y["foo"];"#)]);
        let (scan, renames, _) = fx.scan();
        assert!(scan.scripts.is_empty());
        assert!(renames.touched().is_empty());
    }

    #[test]
    fn shared_class_at_rename_time_is_fatal() {
        let fx = Fixture::new(
            &[("a.css", ".foo {}"), ("b.css", ".foo {}")],
            &[("a.js", r#"const x = "foo";"#)],
        );
        // A stale convertible view that still believes `foo` is unique.
        let mut stale = ClassRegistry::new();
        stale.record(StylesheetId(0), "foo", true, true, false);
        let classes = Classification::classify(&stale);

        let mut renames = ClassRenames::new(&fx.registry, &classes);
        let mut identifiers = IdentifierAllocator::new("styles");
        let err = UsageScanner::new(&fx.corpus, &fx.registry, &classes)
            .scan(&mut renames, &mut identifiers)
            .unwrap_err();
        match err {
            MigrateError::SharedClass { class, paths } => {
                assert_eq!(class, "foo");
                assert_eq!(paths, vec!["a.css".to_string(), "b.css".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
