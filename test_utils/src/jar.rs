//! Archive writers for synthesized classes

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::classfile::ClassFileBuilder;

/// Collects entries and writes them as one jar
#[derive(Debug, Default, Clone)]
pub struct JarBuilder {
    entries: Vec<(String, Vec<u8>)>,
}

impl JarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `<internal name>.class`
    pub fn class(mut self, class: &ClassFileBuilder) -> Self {
        self.entries
            .push((format!("{}.class", class.internal_name()), class.build()));
        self
    }

    pub fn classes<'a>(self, classes: impl IntoIterator<Item = &'a ClassFileBuilder>) -> Self {
        classes.into_iter().fold(self, |jar, class| jar.class(class))
    }

    /// Add an arbitrary entry, e.g. a manifest or a broken class file
    pub fn entry(mut self, name: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.entries.push((name.to_string(), bytes.into()));
        self
    }

    pub fn write(&self, path: &Path) -> Result<PathBuf> {
        write_jar(path, &self.entries)?;
        Ok(path.to_path_buf())
    }
}

/// Write `entries` (name, bytes) into a zip archive at `path`
pub fn write_jar(path: &Path, entries: &[(String, Vec<u8>)]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, bytes) in entries {
        writer
            .start_file(name.as_str(), options)
            .with_context(|| format!("starting entry {name}"))?;
        writer.write_all(bytes)?;
    }
    writer.finish().context("finishing jar")?;
    Ok(())
}

/// Write classes as a class-file directory tree rooted at `root`
pub fn write_class_dir(root: &Path, classes: &[ClassFileBuilder]) -> Result<PathBuf> {
    for class in classes {
        let path = root.join(format!("{}.class", class.internal_name()));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, class.build()).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(root.to_path_buf())
}
