pub mod classpath;
pub mod completion;
pub mod config;
pub mod editor;
pub mod logging;
pub mod metrics;
pub mod model;

pub use classpath::{ArchiveEnumerator, ClassIndex, FsArchiveEnumerator, LoadOutcome, ProjectDescriptor};
pub use completion::{CompletionProvider, EmptyReason, Suggestion, SuggestionKind, SuggestionOutcome};
pub use config::CompletionConfig;
pub use editor::{EditableDocument, EditorBuffer, EditorTextSource};
