//! Engine configuration

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::classpath::descriptor_cache::DEFAULT_CAPACITY;

/// Tunables for indexing and completion.
///
/// Every field has a default, so a JSON file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// How many characters before the cursor the declaration scans may look at
    pub scan_window: usize,
    pub descriptor_cache_capacity: usize,
    pub max_results: usize,
    /// Extension (without the dot) that marks a library archive
    pub archive_extension: String,
    /// Class-name prefixes hidden from non-platform projects
    pub platform_prefixes: Vec<String>,
    /// Bound on the supertype walk when collecting inherited members
    pub max_inheritance_depth: usize,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            scan_window: 2500,
            descriptor_cache_capacity: DEFAULT_CAPACITY,
            max_results: 200,
            archive_extension: "jar".to_string(),
            platform_prefixes: vec!["android.".to_string()],
            max_inheritance_depth: 16,
        }
    }
}

impl CompletionConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Invalid completion config")
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("In config file {}", path.display()))
    }
}
