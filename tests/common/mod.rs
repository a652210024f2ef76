#![allow(dead_code)]

use std::path::PathBuf;

use java_completion::classpath::{ArchiveEnumerator, ProjectDescriptor};
use java_completion::{CompletionConfig, CompletionProvider, LoadOutcome};
use tempfile::TempDir;

/// Hands out a fixed archive list regardless of the project
pub struct FixedArchives(pub Vec<PathBuf>);

impl ArchiveEnumerator for FixedArchives {
    fn archives(&self, _project: &ProjectDescriptor) -> Vec<PathBuf> {
        self.0.clone()
    }
}

/// Provider loaded with the runtime fixture; keep the TempDir alive
pub fn loaded_provider() -> (TempDir, CompletionProvider) {
    let dir = tempfile::tempdir().unwrap();
    let jar = test_utils::write_jdk_fixture(dir.path()).unwrap();
    let provider = CompletionProvider::new(CompletionConfig::default());
    let outcome = provider.load_blocking(&ProjectDescriptor::new("demo"), &FixedArchives(vec![jar]));
    assert!(matches!(outcome, LoadOutcome::Loaded(_)), "fixture load failed: {outcome:?}");
    (dir, provider)
}

/// Suggestion names for `text` with the cursor at its end
pub fn names_at_end(provider: &CompletionProvider, text: &str) -> Vec<String> {
    provider
        .get_suggestions(text, text.chars().count())
        .into_suggestions()
        .into_iter()
        .map(|s| s.simple_name)
        .collect()
}
