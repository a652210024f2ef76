//! Context detection for code completion
//!
//! Looks only at the characters before the cursor. The token being typed is
//! split at its last `.` into a receiver `prefix` and a member `suffix`, and
//! the situation is classified as one of:
//!
//! 1. Constructor (`new Str|`)
//! 2. Class reference (`Str|`, `java.util.Arr|`)
//! 3. Member access (`list.si|`, `this.|`, `compute().|`)

use tracing::debug;

use super::patterns::is_identifier;
use crate::classpath::ClassIndex;
use crate::editor::EditorTextSource;
use crate::model::Imports;

/// Lexical facts about the cursor position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionContext {
    /// Token ending at the cursor (`list.si`)
    pub token: String,
    /// Word before the token (`new` in `new Str`)
    pub previous_token: String,
    /// Token text before its last `.`; empty without a dot
    pub prefix: String,
    /// Token text after its last `.`
    pub suffix: String,
    /// A `)` directly precedes the token, as in `compute().`
    pub receiver_is_call: bool,
    /// Bounded text before the cursor, used by every backward scan
    pub window: String,
    pub imports: Imports,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Situation {
    /// After `new`: constructors of classes whose simple name starts with
    /// `class_prefix`
    Constructor { class_prefix: String },

    /// A class name is being typed, optionally qualified by a package
    ClassReference {
        package: Option<String>,
        name_prefix: String,
    },

    /// Members of whatever `receiver` denotes, starting with `member_prefix`
    MemberAccess {
        receiver: String,
        member_prefix: String,
    },
}

impl CompletionContext {
    /// Gather the token, the previous word and the scan window at `offset`
    pub fn analyze(source: &dyn EditorTextSource, offset: usize, scan_window: usize) -> Self {
        let offset = offset.min(source.len_chars());
        let token = source.word_at(offset);
        let (prefix, suffix) = match token.rsplit_once('.') {
            Some((prefix, suffix)) => (prefix.to_string(), suffix.to_string()),
            None => (String::new(), token.clone()),
        };
        // Imports sit at the top of the file, usually outside the scan window
        let imports = Imports::scan(&source.text_window(offset, offset));

        Self {
            previous_token: source.word_before(offset),
            receiver_is_call: source.char_before(offset) == Some(')'),
            window: source.text_window(offset, scan_window),
            token,
            prefix,
            suffix,
            imports,
        }
    }

    /// Decide what kind of completion applies.
    ///
    /// A class reference is only chosen when the prefix is empty or names an
    /// indexed package; the engine falls back to [`Self::member_access`] when
    /// it yields nothing.
    pub fn classify(&self, index: &ClassIndex) -> Situation {
        let situation = if self.previous_token == "new" && !self.token.is_empty() {
            Situation::Constructor {
                class_prefix: self.token.clone(),
            }
        } else if is_identifier(&self.suffix) && !self.receiver_is_call && self.prefix.is_empty() {
            Situation::ClassReference {
                package: None,
                name_prefix: self.suffix.clone(),
            }
        } else if is_identifier(&self.suffix) && index.has_package(&self.prefix) {
            Situation::ClassReference {
                package: Some(self.prefix.clone()),
                name_prefix: self.suffix.clone(),
            }
        } else {
            self.member_access()
        };
        debug!(
            "Completion context: token={:?} previous={:?} -> {:?}",
            self.token, self.previous_token, situation
        );
        situation
    }

    pub fn member_access(&self) -> Situation {
        Situation::MemberAccess {
            receiver: self.prefix.clone(),
            member_prefix: self.suffix.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompletionConfig;
    use crate::editor::EditorBuffer;

    fn context(text: &str) -> CompletionContext {
        let buffer = EditorBuffer::new(text);
        CompletionContext::analyze(&buffer, buffer.len_chars(), 2500)
    }

    #[test]
    fn test_split_prefix_and_suffix() {
        let ctx = context("ArrayList<String> list = new ArrayList<>(); list.si");
        assert_eq!(ctx.token, "list.si");
        assert_eq!(ctx.prefix, "list");
        assert_eq!(ctx.suffix, "si");
        assert!(!ctx.receiver_is_call);

        let ctx = context("Str");
        assert_eq!(ctx.prefix, "");
        assert_eq!(ctx.suffix, "Str");

        let ctx = context("a.b.c.");
        assert_eq!(ctx.prefix, "a.b.c");
        assert_eq!(ctx.suffix, "");
    }

    #[test]
    fn test_classification_without_index() {
        let index = ClassIndex::new(&CompletionConfig::default());

        assert_eq!(
            context("Object o = new Str").classify(&index),
            Situation::Constructor {
                class_prefix: "Str".into()
            }
        );
        assert_eq!(
            context("Str").classify(&index),
            Situation::ClassReference {
                package: None,
                name_prefix: "Str".into()
            }
        );
        assert_eq!(
            context("list.si").classify(&index),
            Situation::MemberAccess {
                receiver: "list".into(),
                member_prefix: "si".into()
            }
        );
        assert_eq!(
            context("this.").classify(&index),
            Situation::MemberAccess {
                receiver: "this".into(),
                member_prefix: "".into()
            }
        );
    }

    #[test]
    fn test_chained_call_is_member_access() {
        let index = ClassIndex::new(&CompletionConfig::default());
        let ctx = context("int n = compute().");
        assert!(ctx.receiver_is_call);
        assert_eq!(ctx.member_access(), ctx.classify(&index));
    }

    #[test]
    fn test_window_is_bounded() {
        let text = format!("{}tail", "x".repeat(5000));
        let buffer = EditorBuffer::new(&text);
        let ctx = CompletionContext::analyze(&buffer, buffer.len_chars(), 100);
        assert_eq!(ctx.window.chars().count(), 100);
        assert!(ctx.window.ends_with("tail"));
    }

    #[test]
    fn test_imports_come_from_whole_prefix() {
        let text = format!("import java.util.List;\n{}\nLi", "// filler\n".repeat(400));
        let buffer = EditorBuffer::new(&text);
        let ctx = CompletionContext::analyze(&buffer, buffer.len_chars(), 50);
        assert_eq!(ctx.imports.single_type, vec!["java.util.List"]);
    }
}
