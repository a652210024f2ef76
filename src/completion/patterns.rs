//! Compiled regular expressions for the lexical heuristics
//!
//! Nothing here parses Java. Each pattern recognizes one shape of source text
//! that is common enough to be worth guessing from: a declaration
//! `Type name =`, a cast `(Type) name`, a class header `class Name`, an import.

use once_cell::sync::Lazy;
use regex::Regex;

/// A Java identifier as the engine understands it
pub static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("valid regex"));

/// A plain or qualified type name: `String`, `java.util.List`, `Map.Entry`
pub static TYPE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$").expect("valid regex")
});

/// `class Foo`, `interface Foo`, `enum Foo`, `record Foo`
pub static ENCLOSING_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:class|interface|enum|record)\s+([A-Za-z_$][\w$]*)").expect("valid regex")
});

/// Group 1: `static ` if present. Group 2: imported name, `.*` included
pub static IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*import\s+(static\s+)?([\w$]+(?:\.[\w$]+)*(?:\.\*)?)\s*;")
        .expect("valid regex")
});

/// Group 1: package name
pub static PACKAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*package\s+([\w$]+(?:\.[\w$]+)*)\s*;").expect("valid regex")
});

/// Words that can precede a name without being its type
pub const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "assert", "break", "case", "catch", "class", "const", "continue", "default",
    "do", "else", "enum", "extends", "final", "finally", "for", "goto", "if", "implements",
    "import", "instanceof", "interface", "native", "new", "package", "private", "protected",
    "public", "return", "static", "strictfp", "super", "switch", "synchronized", "this",
    "throw", "throws", "transient", "try", "volatile", "while", "yield",
];

pub fn is_keyword(word: &str) -> bool {
    JAVA_KEYWORDS.contains(&word)
}

pub fn is_identifier(text: &str) -> bool {
    IDENTIFIER.is_match(text)
}

/// Syntactically valid type name whose last segment starts upper-case
pub fn looks_like_type_name(text: &str) -> bool {
    TYPE_NAME.is_match(text)
        && text
            .rsplit('.')
            .next()
            .and_then(|last| last.chars().next())
            .is_some_and(char::is_uppercase)
}

/// `Map<String, List<Integer>>` -> `Map`
pub fn strip_generics(type_text: &str) -> &str {
    match type_text.find('<') {
        Some(open) => type_text[..open].trim_end(),
        None => type_text.trim(),
    }
}

/// Declarations of `name`: `Type name` followed by `,` `;` `=` `)` or `:`.
///
/// Group 1 is the declared type, which may carry generic arguments and array
/// brackets. `var name = new Type(` is matched separately by group 2.
pub fn declaration_pattern(name: &str) -> Option<Regex> {
    let name = regex::escape(name);
    let pattern = format!(
        r"(?:([A-Za-z_$][\w$.]*(?:\s*<[\w$.,?\s<>\[\]]*>)?(?:\s*\[\s*\])*)\s+{name}\s*[,;=):])|(?:\bvar\s+{name}\s*=\s*new\s+([A-Za-z_$][\w$.]*))"
    );
    Regex::new(&pattern).ok()
}

/// Cast of `name`: `(Type) name`; group 1 is the type
pub fn cast_pattern(name: &str) -> Option<Regex> {
    let name = regex::escape(name);
    Regex::new(&format!(r"\(\s*([A-Za-z_$][\w$.]*)\s*\)\s*{name}\b")).ok()
}

/// Capitalized word directly before `name`; group 1 is the word
pub fn preceding_type_pattern(name: &str) -> Option<Regex> {
    let name = regex::escape(name);
    Regex::new(&format!(r"\b([A-Z][\w$]*)\s*(?:<[^;{{}}]*?>)?\s+{name}\b")).ok()
}
