//! Classpath archives: which ones to read, and reading them
//!
//! An archive is either a zip/jar file or a directory tree of `.class` files.
//! Scanning an archive only decodes class headers; member tables stay in the
//! stored bytes until a descriptor is requested.

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace, warn};
use walkdir::WalkDir;
use zip::ZipArchive;
use zip::result::ZipError;

use super::classfile::{read_class_header, ClassHeader, ClassParseError};
use super::index::ClassEntry;
use crate::model::type_name::{package_of_internal, simple_name_of_internal, source_name};
use crate::model::ClassSummary;

/// Upper bound on the buffer reserved up front for one archive entry
const MAX_RESERVED_ENTRY_BYTES: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("zip error reading {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: ZipError,
    },

    #[error("malformed class file {path}: {source}")]
    ClassFile {
        path: PathBuf,
        #[source]
        source: ClassParseError,
    },

    #[error("archive scan cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    /// Plain Java project; platform classes on its classpath are hidden
    #[default]
    Java,
    /// Project built against the platform SDK; platform classes are visible
    Platform,
}

/// What the class index needs to know about a project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    pub name: String,
    #[serde(default)]
    pub kind: ProjectKind,
    /// Compiled output of the project itself (jar or class directory)
    pub output: Option<PathBuf>,
    /// Directory whose archives are all libraries
    pub library_dir: Option<PathBuf>,
    /// Explicit library archives, in classpath order
    #[serde(default)]
    pub libraries: Vec<PathBuf>,
}

impl ProjectDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn filters_platform_classes(&self) -> bool {
        self.kind != ProjectKind::Platform
    }
}

/// Yields the archives to index for a project, own output first
pub trait ArchiveEnumerator: Send + Sync {
    fn archives(&self, project: &ProjectDescriptor) -> Vec<PathBuf>;
}

/// Enumerates archives from the paths in a [`ProjectDescriptor`]
#[derive(Debug, Clone)]
pub struct FsArchiveEnumerator {
    archive_extension: String,
}

impl FsArchiveEnumerator {
    pub fn new(archive_extension: impl Into<String>) -> Self {
        Self {
            archive_extension: archive_extension.into(),
        }
    }

    fn has_archive_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.archive_extension))
    }
}

impl Default for FsArchiveEnumerator {
    fn default() -> Self {
        Self::new("jar")
    }
}

impl ArchiveEnumerator for FsArchiveEnumerator {
    fn archives(&self, project: &ProjectDescriptor) -> Vec<PathBuf> {
        let mut archives = Vec::new();
        let mut push = |path: PathBuf| {
            if !archives.contains(&path) {
                archives.push(path);
            }
        };

        if let Some(output) = &project.output {
            push(output.clone());
        }

        for library in &project.libraries {
            if self.has_archive_extension(library) {
                push(library.clone());
            } else {
                debug!(
                    "Ignoring library without .{} extension: {}",
                    self.archive_extension,
                    library.display()
                );
            }
        }

        if let Some(dir) = &project.library_dir {
            let mut found: Vec<PathBuf> = WalkDir::new(dir)
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.into_path())
                .filter(|path| path.is_file() && self.has_archive_extension(path))
                .collect();
            found.sort();
            for path in found {
                push(path);
            }
        }

        archives
    }
}

/// Hides platform classes (`android.*` by default) from non-platform projects
#[derive(Debug, Clone, Default)]
pub struct PlatformFilter {
    prefixes: Vec<String>,
}

impl PlatformFilter {
    pub fn new(prefixes: Vec<String>) -> Self {
        Self { prefixes }
    }

    /// A filter that admits everything
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn for_project(project: &ProjectDescriptor, prefixes: &[String]) -> Self {
        if project.filters_platform_classes() {
            Self::new(prefixes.to_vec())
        } else {
            Self::disabled()
        }
    }

    pub fn admits(&self, fqcn: &str) -> bool {
        !self.prefixes.iter().any(|p| fqcn.starts_with(p.as_str()))
    }
}

/// Result of scanning one archive
#[derive(Debug, Default)]
pub struct ArchiveScan {
    pub entries: Vec<ClassEntry>,
    pub skipped_entries: usize,
}

/// Scan a jar file or class directory into class entries.
///
/// Unreadable class entries are logged and counted; only failure to open
/// the archive itself is an error.
pub fn scan_archive(
    path: &Path,
    filter: &PlatformFilter,
    cancel: &AtomicBool,
) -> Result<ArchiveScan, IndexError> {
    if path.is_dir() {
        scan_class_directory(path, filter, cancel)
    } else {
        scan_zip(path, filter, cancel)
    }
}

fn scan_zip(
    path: &Path,
    filter: &PlatformFilter,
    cancel: &AtomicBool,
) -> Result<ArchiveScan, IndexError> {
    let file = File::open(path).map_err(|source| IndexError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(|source| IndexError::Zip {
        path: path.to_path_buf(),
        source,
    })?;

    let mut scan = ArchiveScan::default();
    for idx in 0..archive.len() {
        if cancel.load(Ordering::Relaxed) {
            return Err(IndexError::Cancelled);
        }
        let mut entry = match archive.by_index(idx) {
            Ok(entry) => entry,
            Err(source) => {
                warn!(
                    "{}",
                    IndexError::Zip {
                        path: path.to_path_buf(),
                        source
                    }
                );
                scan.skipped_entries += 1;
                continue;
            }
        };
        if !entry.is_file() || should_skip_entry(entry.name()) {
            continue;
        }
        let name = entry.name().to_string();
        // The header size is untrusted; reserve at most a typical class size
        let mut bytes = Vec::with_capacity((entry.size() as usize).min(MAX_RESERVED_ENTRY_BYTES));
        if let Err(source) = entry.read_to_end(&mut bytes) {
            warn!(
                "{}",
                IndexError::Io {
                    path: path.join(&name),
                    source
                }
            );
            scan.skipped_entries += 1;
            continue;
        }
        scan.admit(&path.join(&name), path, bytes, filter);
    }
    Ok(scan)
}

fn scan_class_directory(
    root: &Path,
    filter: &PlatformFilter,
    cancel: &AtomicBool,
) -> Result<ArchiveScan, IndexError> {
    let mut scan = ArchiveScan::default();
    for entry in WalkDir::new(root).sort_by_file_name() {
        if cancel.load(Ordering::Relaxed) {
            return Err(IndexError::Cancelled);
        }
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable path under {}: {}", root.display(), err);
                scan.skipped_entries += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        if should_skip_entry(&relative) {
            continue;
        }
        match fs::read(entry.path()) {
            Ok(bytes) => scan.admit(entry.path(), root, bytes, filter),
            Err(source) => {
                warn!(
                    "{}",
                    IndexError::Io {
                        path: entry.path().to_path_buf(),
                        source
                    }
                );
                scan.skipped_entries += 1;
            }
        }
    }
    Ok(scan)
}

impl ArchiveScan {
    fn admit(&mut self, entry_path: &Path, origin: &Path, bytes: Vec<u8>, filter: &PlatformFilter) {
        let header = match read_class_header(&bytes) {
            Ok(header) => header,
            Err(source) => {
                warn!(
                    "{}",
                    IndexError::ClassFile {
                        path: entry_path.to_path_buf(),
                        source
                    }
                );
                self.skipped_entries += 1;
                return;
            }
        };
        let Some(summary) = summarize(&header, origin) else {
            trace!("Skipping anonymous or local class {}", header.this_class);
            return;
        };
        if !filter.admits(&summary.fqcn) {
            return;
        }
        self.entries.push(ClassEntry::new(summary, bytes));
    }
}

/// Build an index header; `None` for anonymous and local classes
pub fn summarize(header: &ClassHeader, origin: &Path) -> Option<ClassSummary> {
    let simple_name = simple_name_of_internal(&header.this_class);
    if simple_name.is_empty() || simple_name.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Some(ClassSummary {
        fqcn: source_name(&header.this_class),
        internal_name: header.this_class.clone(),
        simple_name: simple_name.to_string(),
        package: package_of_internal(&header.this_class),
        superclass: header
            .super_class
            .as_deref()
            .map(source_name)
            .unwrap_or_default(),
        interfaces: header.interfaces.iter().map(|i| source_name(i)).collect(),
        access_flags: header.access_flags,
        origin: origin.to_path_buf(),
    })
}

fn should_skip_entry(name: &str) -> bool {
    if name.starts_with("META-INF/") {
        return true;
    }
    let file_name = name.rsplit('/').next().unwrap_or(name);
    !file_name.ends_with(".class")
        || file_name == "module-info.class"
        || file_name == "package-info.class"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_skip_entry() {
        assert!(should_skip_entry("META-INF/MANIFEST.MF"));
        assert!(should_skip_entry("META-INF/versions/9/module-info.class"));
        assert!(should_skip_entry("module-info.class"));
        assert!(should_skip_entry("java/util/package-info.class"));
        assert!(should_skip_entry("java/util/readme.txt"));
        assert!(!should_skip_entry("java/util/ArrayList.class"));
        assert!(!should_skip_entry("java/util/Map$Entry.class"));
    }

    #[test]
    fn test_summarize_skips_anonymous_classes() {
        let header = ClassHeader {
            access_flags: 0,
            this_class: "demo/Outer$1".into(),
            super_class: Some("java/lang/Object".into()),
            interfaces: vec![],
        };
        assert!(summarize(&header, Path::new("a.jar")).is_none());

        let header = ClassHeader {
            access_flags: 1,
            this_class: "java/util/Map$Entry".into(),
            super_class: None,
            interfaces: vec!["java/lang/Comparable".into()],
        };
        let summary = summarize(&header, Path::new("a.jar")).unwrap();
        assert_eq!(summary.fqcn, "java.util.Map.Entry");
        assert_eq!(summary.simple_name, "Entry");
        assert_eq!(summary.package, "java.util");
        assert_eq!(summary.superclass, "");
        assert_eq!(summary.interfaces, vec!["java.lang.Comparable"]);
    }

    #[test]
    fn test_entry_larger_than_reservation_is_read_whole() {
        let mut class = test_utils::ClassFileBuilder::new("demo/Huge");
        for i in 0..4000 {
            class = class.method(test_utils::access::ACC_PUBLIC, &format!("method{i:04}"), "()V");
        }
        assert!(class.build().len() > MAX_RESERVED_ENTRY_BYTES);

        let dir = tempfile::tempdir().unwrap();
        let jar = test_utils::JarBuilder::new()
            .class(&class)
            .write(&dir.path().join("huge.jar"))
            .unwrap();
        let scan = scan_archive(&jar, &PlatformFilter::disabled(), &AtomicBool::new(false)).unwrap();
        assert_eq!(scan.skipped_entries, 0);
        assert_eq!(scan.entries.len(), 1);
        assert_eq!(scan.entries[0].fqcn(), "demo.Huge");
    }

    #[test]
    fn test_platform_filter() {
        let prefixes = vec!["android.".to_string()];
        let java = ProjectDescriptor::new("app");
        let platform = ProjectDescriptor {
            kind: ProjectKind::Platform,
            ..ProjectDescriptor::new("app")
        };
        assert!(!PlatformFilter::for_project(&java, &prefixes).admits("android.app.Activity"));
        assert!(PlatformFilter::for_project(&java, &prefixes).admits("java.lang.String"));
        assert!(PlatformFilter::for_project(&platform, &prefixes).admits("android.app.Activity"));
    }

    #[test]
    fn test_enumerator_orders_output_first() {
        let dir = tempfile::tempdir().unwrap();
        let libs = dir.path().join("libs");
        fs::create_dir(&libs).unwrap();
        fs::write(libs.join("b.jar"), b"").unwrap();
        fs::write(libs.join("a.jar"), b"").unwrap();
        fs::write(libs.join("notes.txt"), b"").unwrap();

        let project = ProjectDescriptor {
            output: Some(dir.path().join("classes")),
            library_dir: Some(libs.clone()),
            libraries: vec![libs.join("b.jar"), dir.path().join("extra.zip")],
            ..ProjectDescriptor::new("app")
        };
        let archives = FsArchiveEnumerator::default().archives(&project);
        assert_eq!(
            archives,
            vec![dir.path().join("classes"), libs.join("b.jar"), libs.join("a.jar")]
        );
    }
}
