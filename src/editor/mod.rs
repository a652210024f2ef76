//! Editor collaborator contracts
//!
//! The engine never owns an editor. It reads text through
//! [`EditorTextSource`] and writes through [`EditableDocument`]; every offset
//! is a char index. [`EditorBuffer`] is a rope-backed implementation used by
//! the probe CLI, `get_suggestions` and the tests.

pub mod edit;

use std::ops::Range;

use ropey::Rope;

pub use edit::{CursorTarget, EditApplier};

/// Letters, digits, `_` and `$`
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Word characters plus `.`, so `list.get` is one token
pub fn is_token_char(c: char) -> bool {
    is_word_char(c) || c == '.'
}

/// Read access to the text around the cursor.
///
/// Out-of-range offsets are clamped; nothing here fails at a document
/// boundary.
pub trait EditorTextSource {
    fn len_chars(&self) -> usize;

    /// Up to `max_back` chars ending at `offset`
    fn text_window(&self, offset: usize, max_back: usize) -> String;

    /// Token (word chars and dots) ending at `offset`; a leading `@` is never
    /// part of it
    fn word_at(&self, offset: usize) -> String;

    /// Nearest word before the token at `offset`, skipping whitespace; empty
    /// if anything other than whitespace separates them
    fn word_before(&self, offset: usize) -> String;

    /// Char immediately before the token at `offset`
    fn char_before(&self, offset: usize) -> Option<char>;
}

/// Write access for applying accepted suggestions
pub trait EditableDocument: EditorTextSource {
    fn text(&self) -> String;

    fn cursor(&self) -> usize;

    fn set_cursor(&mut self, offset: usize);

    /// Insert at a char offset; the cursor does not move
    fn insert(&mut self, offset: usize, text: &str);

    /// Remove a char range; the cursor does not move
    fn remove(&mut self, range: Range<usize>);
}

/// In-memory document with a cursor
#[derive(Debug, Clone, Default)]
pub struct EditorBuffer {
    rope: Rope,
    cursor: usize,
}

impl EditorBuffer {
    /// Buffer with the cursor at the end
    pub fn new(text: &str) -> Self {
        let rope = Rope::from_str(text);
        let cursor = rope.len_chars();
        Self { rope, cursor }
    }

    pub fn with_cursor(text: &str, cursor: usize) -> Self {
        let mut buffer = Self::new(text);
        buffer.set_cursor(cursor);
        buffer
    }

    fn clamp(&self, offset: usize) -> usize {
        offset.min(self.rope.len_chars())
    }

    /// Start of the token run ending at `offset`
    fn token_start(&self, offset: usize) -> usize {
        let offset = self.clamp(offset);
        let mut chars = self.rope.chars_at(offset);
        let mut start = offset;
        while let Some(c) = chars.prev() {
            if !is_token_char(c) {
                break;
            }
            start -= 1;
        }
        start
    }
}

impl EditorTextSource for EditorBuffer {
    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn text_window(&self, offset: usize, max_back: usize) -> String {
        let end = self.clamp(offset);
        let start = end.saturating_sub(max_back);
        self.rope.slice(start..end).to_string()
    }

    fn word_at(&self, offset: usize) -> String {
        let end = self.clamp(offset);
        self.rope.slice(self.token_start(end)..end).to_string()
    }

    fn word_before(&self, offset: usize) -> String {
        let mut chars = self.rope.chars_at(self.token_start(offset));
        let mut word = Vec::new();
        let mut in_word = false;
        while let Some(c) = chars.prev() {
            if is_word_char(c) {
                in_word = true;
                word.push(c);
            } else if in_word || !c.is_whitespace() {
                break;
            }
        }
        word.iter().rev().collect()
    }

    fn char_before(&self, offset: usize) -> Option<char> {
        self.rope.chars_at(self.token_start(offset)).prev()
    }
}

impl EditableDocument for EditorBuffer {
    fn text(&self) -> String {
        self.rope.to_string()
    }

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn set_cursor(&mut self, offset: usize) {
        self.cursor = self.clamp(offset);
    }

    fn insert(&mut self, offset: usize, text: &str) {
        let offset = self.clamp(offset);
        self.rope.insert(offset, text);
    }

    fn remove(&mut self, range: Range<usize>) {
        let end = self.clamp(range.end);
        let start = range.start.min(end);
        self.rope.remove(start..end);
        self.cursor = self.clamp(self.cursor);
    }
}
