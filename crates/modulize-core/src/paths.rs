//! Path utilities over root-relative `/`-separated document paths.
//!
//! Document paths are kept as the strings discovery produced them so that
//! import sources, rename records and report output all agree on one form.

/// The final path segment.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// The directory part of a path, without a trailing `/`. Empty for a bare name.
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => &path[..i],
        None => "",
    }
}

/// Insert `.{marker}` before the final extension of the file name.
///
/// `a.css` becomes `a.module.css`, `theme.dark.scss` becomes
/// `theme.dark.module.scss`. A name without extension gets the marker
/// appended.
pub fn module_path(path: &str, marker: &str) -> String {
    let dir_len = path.len() - file_name(path).len();
    let name = &path[dir_len..];
    match name.rfind('.') {
        Some(dot) if dot > 0 => format!(
            "{}{}.{}{}",
            &path[..dir_len],
            &name[..dot],
            marker,
            &name[dot..]
        ),
        _ => format!("{}.{}", path, marker),
    }
}

/// Split a path into normal segments, resolving `.` and `..`.
///
/// Returns `None` if `..` climbs above the start.
fn normalize_segments<'a>(parts: impl Iterator<Item = &'a str>) -> Option<Vec<&'a str>> {
    let mut out: Vec<&str> = Vec::new();
    for part in parts {
        match part {
            "" | "." => {}
            ".." => {
                out.pop()?;
            }
            other => out.push(other),
        }
    }
    Some(out)
}

/// Resolve a relative import source against the importing script's path.
///
/// Only `./` and `../` sources are resolvable; bare specifiers and sources
/// that climb above the root return `None`.
pub fn resolve_import_source(script_path: &str, source: &str) -> Option<String> {
    if !(source.starts_with("./") || source.starts_with("../")) {
        return None;
    }
    let base = parent_dir(script_path);
    let joined = base.split('/').chain(source.split('/'));
    normalize_segments(joined).map(|segments| segments.join("/"))
}

/// Relative path from the directory of `from_file` to `to_file`.
///
/// The result always starts with `./` or `../`, so it is usable as an
/// import source.
pub fn relative_import_path(from_file: &str, to_file: &str) -> String {
    let from: Vec<&str> = parent_dir(from_file)
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    let to: Vec<&str> = to_file.split('/').filter(|s| !s.is_empty()).collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();
    // The file name itself is never a shared directory
    let common = common.min(to.len().saturating_sub(1));

    let mut parts: Vec<&str> = Vec::new();
    parts.extend(std::iter::repeat_n("..", from.len() - common));
    parts.extend(&to[common..]);
    let rel = parts.join("/");

    if rel.starts_with("../") {
        rel
    } else {
        format!("./{}", rel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod module_path_tests {
        use super::*;

        #[test]
        fn inserts_marker_before_extension() {
            assert_eq!(module_path("a.css", "module"), "a.module.css");
            assert_eq!(module_path("src/x/b.scss", "module"), "src/x/b.module.scss");
        }

        #[test]
        fn only_final_extension_counts() {
            assert_eq!(
                module_path("theme.dark.css", "mod"),
                "theme.dark.mod.css"
            );
            assert_eq!(module_path("css.v2/a.css", "module"), "css.v2/a.module.css");
        }

        #[test]
        fn no_extension_appends_marker() {
            assert_eq!(module_path("dir/styles", "module"), "dir/styles.module");
            assert_eq!(module_path(".hidden", "module"), ".hidden.module");
        }
    }

    mod relative_tests {
        use super::*;

        #[test]
        fn same_directory() {
            assert_eq!(relative_import_path("a.js", "a.css"), "./a.css");
            assert_eq!(
                relative_import_path("src/a.js", "src/a.css"),
                "./a.css"
            );
        }

        #[test]
        fn child_directory() {
            assert_eq!(
                relative_import_path("src/a.js", "src/styles/a.css"),
                "./styles/a.css"
            );
        }

        #[test]
        fn parent_directory_keeps_dot_dot() {
            assert_eq!(
                relative_import_path("src/components/a.js", "src/styles/a.css"),
                "../styles/a.css"
            );
            assert_eq!(relative_import_path("src/a.js", "a.css"), "../a.css");
        }

        #[test]
        fn same_name_directory_and_file() {
            assert_eq!(relative_import_path("x/x.js", "x"), "../x");
        }
    }

    mod resolve_tests {
        use super::*;

        #[test]
        fn resolves_relative_sources() {
            assert_eq!(
                resolve_import_source("src/a.js", "./a.css").as_deref(),
                Some("src/a.css")
            );
            assert_eq!(
                resolve_import_source("src/c/a.js", "../s/a.css").as_deref(),
                Some("src/s/a.css")
            );
        }

        #[test]
        fn bare_and_escaping_sources_do_not_resolve() {
            assert_eq!(resolve_import_source("a.js", "pkg/a.css"), None);
            assert_eq!(resolve_import_source("a.js", "../a.css"), None);
        }
    }

    #[test]
    fn file_name_and_parent() {
        assert_eq!(file_name("a/b/c.css"), "c.css");
        assert_eq!(file_name("c.css"), "c.css");
        assert_eq!(parent_dir("a/b/c.css"), "a/b");
        assert_eq!(parent_dir("c.css"), "");
    }
}
