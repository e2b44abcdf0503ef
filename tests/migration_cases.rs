//! End-to-end migration cases.
//!
//! Each case builds a throwaway workspace, runs the migration through the CLI
//! helpers and compares the files on disk afterwards.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use modulize::cli::{run_migrate, MigrateRequest};
use modulize::error::{ModulizeError, OutputErrorCode};
use modulize::migrate::{MigrateOptions, QuoteStyle};

// ============================================================================
// Helpers
// ============================================================================

fn workspace(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (path, content) in files {
        let full = dir.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }
    dir
}

fn request(root: &Path, css: &str, js: &str) -> MigrateRequest {
    MigrateRequest {
        root: root.to_path_buf(),
        css: css.to_string(),
        js: js.to_string(),
        dry_run: false,
        options: MigrateOptions {
            quotes: QuoteStyle::Single,
            ..MigrateOptions::default()
        },
    }
}

fn read(root: &Path, path: &str) -> String {
    fs::read_to_string(root.join(path)).unwrap()
}

// ============================================================================
// Fixture cases
// ============================================================================

mod fixtures {
    use super::*;

    #[test]
    fn class_name_prop() {
        let dir = workspace(&[
            ("css.css", ".test-class-name {\n  color: red;\n}\n"),
            (
                "js.js",
                "const Component1 = () => {\n  return <div className=\"test-class-name\"></div>;\n};\n\nconst Component2 = () => {\n  return <div className=\"other-class test-class-name other-class\"></div>;\n};\n",
            ),
        ]);
        run_migrate(&request(dir.path(), "*.css", "*.js")).unwrap();

        assert_eq!(
            read(dir.path(), "js.js"),
            "import styles from './css.module.css';\n\nconst Component1 = () => {\n  return <div className={styles.testClassName}></div>;\n};\n\nconst Component2 = () => {\n  return <div className={`other-class ${styles.testClassName} other-class`}></div>;\n};\n"
        );
        assert_eq!(
            read(dir.path(), "css.module.css"),
            ".testClassName {\n  color: red;\n}\n"
        );
        assert!(!dir.path().join("css.css").exists());
    }

    #[test]
    fn string_with_several_classes() {
        let dir = workspace(&[
            (
                "css.css",
                ".test-class-name {\n  color: red;\n}\n\n.test-class-name-2 {\n  color: blue;\n}\n",
            ),
            (
                "js.js",
                "const Component1 = () => {\n  return <div className=\"test some-other foo-bar test-class-name test-class-name-2 one-more\"></div>;\n};\n\nconst Component2 = () => {\n  return <div className=\"test-class-name test-class-name-2 one-more\"></div>;\n};\n\nconst Component3 = () => {\n  return <div className=\"foo bar test-class-name test-class-name-2\"></div>;\n};\n",
            ),
        ]);
        run_migrate(&request(dir.path(), "*.css", "*.js")).unwrap();

        assert_eq!(
            read(dir.path(), "js.js"),
            "import styles from './css.module.css';\n\nconst Component1 = () => {\n  return <div className={`test some-other foo-bar ${styles.testClassName} ${styles.testClassName2} one-more`}></div>;\n};\n\nconst Component2 = () => {\n  return <div className={`${styles.testClassName} ${styles.testClassName2} one-more`}></div>;\n};\n\nconst Component3 = () => {\n  return <div className={`foo bar ${styles.testClassName} ${styles.testClassName2}`}></div>;\n};\n"
        );
        assert_eq!(
            read(dir.path(), "css.module.css"),
            ".testClassName {\n  color: red;\n}\n\n.testClassName2 {\n  color: blue;\n}\n"
        );
    }
}

// ============================================================================
// Scenarios
// ============================================================================

mod scenarios {
    use super::*;

    #[test]
    fn already_camel_class_keeps_its_name() {
        let dir = workspace(&[
            ("a.css", ".foo {}"),
            ("a.js", "const A = <div className=\"foo\" />;\n"),
        ]);
        let report = run_migrate(&request(dir.path(), "*.css", "*.js")).unwrap();

        assert_eq!(report.renames[0].to, "a.module.css");
        assert_eq!(read(dir.path(), "a.module.css"), ".foo {}");
        assert_eq!(
            read(dir.path(), "a.js"),
            "import styles from './a.module.css';\n\nconst A = <div className={styles.foo} />;\n"
        );
    }

    #[test]
    fn shared_class_leaves_everything_alone() {
        let script = "const A = <div className=\"foo\" />;\n";
        let dir = workspace(&[("a.css", ".foo {}"), ("b.css", ".foo {}"), ("a.js", script)]);
        let report = run_migrate(&request(dir.path(), "*.css", "*.js")).unwrap();

        assert!(report.renames.is_empty());
        assert_eq!(report.files_written, Some(Vec::new()));
        assert_eq!(read(dir.path(), "a.js"), script);
        assert_eq!(read(dir.path(), "a.css"), ".foo {}");
        assert_eq!(read(dir.path(), "b.css"), ".foo {}");
    }

    #[test]
    fn undefined_words_stay_as_text() {
        let dir = workspace(&[
            ("a.css", ".foo {}"),
            ("a.js", "const x = \"foo bar-baz\";\n"),
        ]);
        run_migrate(&request(dir.path(), "*.css", "*.js")).unwrap();

        assert_eq!(
            read(dir.path(), "a.js"),
            "import styles from './a.module.css';\n\nconst x = `${styles.foo} bar-baz`;\n"
        );
    }

    #[test]
    fn unreferenced_classes_in_touched_stylesheet_become_global() {
        let dir = workspace(&[
            ("a.css", ".used-one, .unused {}\n.unused .used-one:hover {}\n"),
            ("a.js", "const x = 'used-one';\n"),
        ]);
        run_migrate(&request(dir.path(), "*.css", "*.js")).unwrap();

        assert_eq!(
            read(dir.path(), "a.module.css"),
            ".usedOne, :global(.unused) {}\n:global(.unused) .usedOne:hover {}\n"
        );
    }

    #[test]
    fn interpolated_selectors_are_left_as_written() {
        let dir = workspace(&[
            ("a.scss", ".foo {}\n.btn-#{$size} { x: y }\n"),
            ("a.js", "const x = 'foo';\n"),
        ]);
        run_migrate(&request(dir.path(), "*.scss", "*.js")).unwrap();

        assert_eq!(
            read(dir.path(), "a.module.scss"),
            ".foo {}\n.btn-#{$size} { x: y }\n"
        );
    }

    #[test]
    fn global_only_classes_stay_text() {
        let dir = workspace(&[
            ("a.css", ".foo {}\n:global(.legacy) { color: red; }\n"),
            ("a.js", "const x = 'foo legacy';\n"),
        ]);
        let report = run_migrate(&request(dir.path(), "*.css", "*.js")).unwrap();

        let legacy = report.classes.iter().find(|c| c.name == "legacy").unwrap();
        assert!(!legacy.convertible);
        assert!(legacy.owners[0].global);
        assert_eq!(
            read(dir.path(), "a.js"),
            "import styles from './a.module.css';\n\nconst x = `${styles.foo} legacy`;\n"
        );
        assert_eq!(
            read(dir.path(), "a.module.css"),
            ".foo {}\n:global(.legacy) { color: red; }\n"
        );
    }

    #[test]
    fn untouched_stylesheets_are_not_renamed() {
        let dir = workspace(&[
            ("a.css", ".foo {}"),
            ("b.css", ".bar {}"),
            ("a.js", "const x = 'foo';\n"),
        ]);
        let report = run_migrate(&request(dir.path(), "*.css", "*.js")).unwrap();

        assert_eq!(report.renames.len(), 1);
        assert_eq!(read(dir.path(), "b.css"), ".bar {}");
        assert!(!dir.path().join("b.module.css").exists());
    }
}

// ============================================================================
// Layout and options
// ============================================================================

mod layout {
    use super::*;

    #[test]
    fn nested_directories_use_relative_imports() {
        let dir = workspace(&[
            ("src/styles/card.scss", ".card-title {\n  &:hover { color: red; }\n}\n"),
            (
                "src/components/Card.tsx",
                "export const Card = () => <h2 className=\"card-title\" />;\n",
            ),
        ]);
        let report =
            run_migrate(&request(dir.path(), "src/**/*.scss", "src/**/*.tsx")).unwrap();

        assert_eq!(
            report.files_written,
            Some(vec![
                "src/components/Card.tsx".to_string(),
                "src/styles/card.module.scss".to_string(),
            ])
        );
        assert_eq!(
            read(dir.path(), "src/components/Card.tsx"),
            "import styles from '../styles/card.module.scss';\n\nexport const Card = () => <h2 className={styles.cardTitle} />;\n"
        );
        assert_eq!(
            read(dir.path(), "src/styles/card.module.scss"),
            ".cardTitle {\n  &:hover { color: red; }\n}\n"
        );
    }

    #[test]
    fn custom_identifier_and_marker() {
        let dir = workspace(&[
            ("a.css", ".foo-bar {}"),
            ("a.js", "import './a.css';\nconst x = 'foo-bar';\n"),
        ]);
        let mut req = request(dir.path(), "*.css", "*.js");
        req.options.import_identifier = "css".to_string();
        req.options.module_marker = "m".to_string();
        run_migrate(&req).unwrap();

        assert_eq!(
            read(dir.path(), "a.js"),
            "import css from './a.m.css';\nconst x = css.fooBar;\n"
        );
        assert!(dir.path().join("a.m.css").exists());
    }

    #[test]
    fn node_modules_is_never_scanned() {
        let dir = workspace(&[
            ("a.css", ".foo {}"),
            ("a.js", "const x = 'foo';\n"),
            ("node_modules/lib/index.js", "const y = 'foo';\n"),
        ]);
        run_migrate(&request(dir.path(), "**/*.css", "**/*.js")).unwrap();

        assert_eq!(
            read(dir.path(), "node_modules/lib/index.js"),
            "const y = 'foo';\n"
        );
    }

    #[test]
    fn dry_run_leaves_disk_untouched() {
        let dir = workspace(&[("a.css", ".foo-x {}"), ("a.js", "const x = 'foo-x';\n")]);
        let mut req = request(dir.path(), "*.css", "*.js");
        req.dry_run = true;
        let report = run_migrate(&req).unwrap();

        assert_eq!(report.scripts.len(), 1);
        assert_eq!(report.stylesheets[0].content, ".fooX {}");
        assert_eq!(read(dir.path(), "a.js"), "const x = 'foo-x';\n");
        assert!(dir.path().join("a.css").exists());
    }
}

// ============================================================================
// Failures
// ============================================================================

mod failures {
    use super::*;

    #[test]
    fn rename_target_exists() {
        let dir = workspace(&[
            ("a.css", ".foo {}"),
            ("a.module.css", ".other {}"),
            ("a.js", "const x = 'foo';\n"),
        ]);
        // Only the plain stylesheet is selected; the module file is in the way.
        let err = run_migrate(&request(dir.path(), "a.css", "*.js")).unwrap_err();

        assert_eq!(err.error_code(), OutputErrorCode::ApplyError);
        assert_eq!(read(dir.path(), "a.js"), "const x = 'foo';\n");
    }

    #[test]
    fn parse_error_reports_location() {
        let dir = workspace(&[("a.css", ".foo {\n  color: red;\n"), ("a.js", "const x = 1;\n")]);
        let err = run_migrate(&request(dir.path(), "*.css", "*.js")).unwrap_err();

        assert_eq!(err.error_code().code(), 6);
        assert!(matches!(err, ModulizeError::ParseError { ref file, .. } if file == "a.css"));
    }

    #[test]
    fn missing_root_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = run_migrate(&request(&dir.path().join("nope"), "*.css", "*.js")).unwrap_err();

        assert_eq!(err.error_code(), OutputErrorCode::ResolutionError);
    }

    #[test]
    fn reserved_identifier_is_invalid() {
        let dir = workspace(&[("a.css", ".foo {}"), ("a.js", "const x = 'foo';\n")]);
        let mut req = request(dir.path(), "*.css", "*.js");
        req.options.import_identifier = "default".to_string();
        let err = run_migrate(&req).unwrap_err();

        assert_eq!(err.error_code(), OutputErrorCode::InvalidArguments);
    }
}
