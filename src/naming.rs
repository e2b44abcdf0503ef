//! Class-name normalization and JavaScript identifier rules.
//!
//! New class names are derived with [`camel_case`], a lower camel case built
//! on `heck`. Identifier checks decide whether a name can be used after a
//! `.` or needs bracket access.

use heck::ToLowerCamelCase;
use thiserror::Error;

/// Error for validation failures.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Invalid identifier or segment.
    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Reserved words that cannot be used as a binding name.
pub const JS_RESERVED_WORDS: &[&str] = &[
    "await",
    "break",
    "case",
    "catch",
    "class",
    "const",
    "continue",
    "debugger",
    "default",
    "delete",
    "do",
    "else",
    "enum",
    "export",
    "extends",
    "false",
    "finally",
    "for",
    "function",
    "if",
    "implements",
    "import",
    "in",
    "instanceof",
    "interface",
    "let",
    "new",
    "null",
    "package",
    "private",
    "protected",
    "public",
    "return",
    "static",
    "super",
    "switch",
    "this",
    "throw",
    "true",
    "try",
    "typeof",
    "var",
    "void",
    "while",
    "with",
    "yield",
];

/// Check if a name is a reserved word.
pub fn is_reserved_word(name: &str) -> bool {
    JS_RESERVED_WORDS.contains(&name)
}

fn is_id_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_id_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '\u{200c}' || c == '\u{200d}'
}

/// Check if `name` may follow a `.` in a member expression.
///
/// Reserved words are allowed here (`styles.default` is valid).
pub fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_id_start(first) => chars.all(is_id_continue),
        _ => false,
    }
}

/// Validate that a string can bind the imported style module.
///
/// # Examples
///
/// ```
/// use modulize::naming::validate_js_identifier;
///
/// assert!(validate_js_identifier("styles").is_ok());
/// assert!(validate_js_identifier("$css").is_ok());
/// assert!(validate_js_identifier("").is_err());
/// assert!(validate_js_identifier("1styles").is_err());
/// assert!(validate_js_identifier("class").is_err());
/// ```
pub fn validate_js_identifier(name: &str) -> ValidationResult<()> {
    let invalid = |reason: String| ValidationError::InvalidName {
        name: name.to_string(),
        reason,
    };

    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(invalid("name cannot be empty".to_string()));
    };
    if !is_id_start(first) {
        return Err(invalid(
            "must start with a letter, underscore or dollar sign".to_string(),
        ));
    }
    if let Some(ch) = chars.find(|c| !is_id_continue(*c)) {
        return Err(invalid(format!("invalid character: '{}'", ch)));
    }
    if is_reserved_word(name) {
        return Err(invalid(
            "cannot use a reserved word as identifier".to_string(),
        ));
    }
    Ok(())
}

/// Validate the segment inserted into stylesheet file names.
pub fn validate_module_marker(marker: &str) -> ValidationResult<()> {
    let invalid = |reason: &str| ValidationError::InvalidName {
        name: marker.to_string(),
        reason: reason.to_string(),
    };
    if marker.is_empty() {
        return Err(invalid("segment cannot be empty"));
    }
    if marker.contains(['.', '/', '\\']) {
        return Err(invalid("segment cannot contain '.' or path separators"));
    }
    if marker.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid("segment cannot contain whitespace"));
    }
    Ok(())
}

// ============================================================================
// camelCase
// ============================================================================

fn is_separator(c: char) -> bool {
    matches!(c, '_' | '.' | '-' | ' ')
}

/// Convert a class name to its camel-case normal form.
///
/// Names holding punctuation other than word separators are returned
/// unchanged.
///
/// # Examples
///
/// ```
/// use modulize::naming::camel_case;
///
/// assert_eq!(camel_case("test-class-name"), "testClassName");
/// assert_eq!(camel_case("test-class-name-2"), "testClassName2");
/// assert_eq!(camel_case("FooBar"), "fooBar");
/// assert_eq!(camel_case("md:flex"), "md:flex");
/// ```
pub fn camel_case(input: &str) -> String {
    if input
        .chars()
        .any(|c| !c.is_alphanumeric() && !is_separator(c))
    {
        return input.to_string();
    }
    input.to_lower_camel_case()
}

/// A name is in normal form when normalizing it leaves it unchanged.
pub fn is_normal_form(name: &str) -> bool {
    camel_case(name) == name
}

// ============================================================================
// Tests
// ============================================================================
