//! Text edits for accepted suggestions
//!
//! Both operations are idempotent: repeating an identical call leaves the
//! document unchanged, so an editor that delivers an accept event twice does
//! not end up with `StringString` or a duplicated import.

use tracing::debug;

use super::{is_word_char, EditableDocument};
use crate::completion::patterns::{IMPORT, PACKAGE};
use crate::model::Imports;

/// Where the cursor goes after an insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorTarget {
    /// After the inserted text
    #[default]
    End,
    /// Char offset within the inserted text
    Offset(usize),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EditApplier;

impl EditApplier {
    pub fn new() -> Self {
        Self
    }

    /// Replace the identifier being typed before the cursor with `text`.
    ///
    /// Returns false when `text` was already in place around the cursor and
    /// nothing changed.
    pub fn apply_insertion(
        &self,
        editor: &mut dyn EditableDocument,
        text: &str,
        target: CursorTarget,
    ) -> bool {
        let cursor = editor.cursor();
        let inserted_len = text.chars().count();
        if inserted_len == 0 {
            return false;
        }

        if already_inserted(editor, text, cursor) {
            debug!("'{}' already inserted at {}", text, cursor);
            return false;
        }

        let token = editor.word_at(cursor);
        let typed = token.rsplit('.').next().unwrap_or("").chars().count();
        let start = cursor - typed;
        editor.remove(start..cursor);
        editor.insert(start, text);
        let within = match target {
            CursorTarget::End => inserted_len,
            CursorTarget::Offset(n) => n.min(inserted_len),
        };
        editor.set_cursor(start + within);
        true
    }

    /// Add `import fqcn;` unless the class is already visible.
    ///
    /// The import goes after the last existing import, else after the package
    /// declaration, else at the top. Returns true if an import was added.
    pub fn ensure_import(&self, editor: &mut dyn EditableDocument, fqcn: &str) -> bool {
        let text = editor.text();
        if Imports::scan(&text).covers(fqcn) {
            return false;
        }

        let (byte_offset, line) = if let Some(last) = IMPORT.find_iter(&text).last() {
            (line_end(&text, last.end()), format!("import {fqcn};\n"))
        } else if let Some(package) = PACKAGE.find(&text) {
            (line_end(&text, package.end()), format!("\nimport {fqcn};\n"))
        } else {
            (0, format!("import {fqcn};\n\n"))
        };

        let at = text[..byte_offset].chars().count();
        let cursor = editor.cursor();
        editor.insert(at, &line);
        if at <= cursor {
            editor.set_cursor(cursor + line.chars().count());
        }
        debug!("Added import {}", fqcn);
        true
    }
}

/// Byte offset just past the newline ending the line that contains `from`
fn line_end(text: &str, from: usize) -> usize {
    match text[from..].find('\n') {
        Some(newline) => from + newline + 1,
        None => text.len(),
    }
}

/// True if `text` occupies a span that starts at a word boundary and
/// contains the cursor
fn already_inserted(editor: &dyn EditableDocument, text: &str, cursor: usize) -> bool {
    let len = text.chars().count();
    let first = cursor.saturating_sub(len);
    let last = cursor.min(editor.len_chars().saturating_sub(len));
    if first > last {
        return false;
    }

    // window[k] is the char at document offset `from + k`
    let from = first.saturating_sub(1);
    let window: Vec<char> = editor.text_window(last + len, last + len - from).chars().collect();
    let needle: Vec<char> = text.chars().collect();

    (first..=last).any(|start| {
        let k = start - from;
        let at_boundary = start == 0 || !is_word_char(window[k - 1]);
        at_boundary && window[k..k + len] == needle[..]
    })
}
