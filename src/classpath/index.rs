//! The class index
//!
//! # Architecture
//!
//! ```text
//! load(project)
//!     ↓
//! ArchiveEnumerator → [output, lib1.jar, lib2.jar, ...]
//!     ↓  (rayon, one task per archive)
//! scan_archive → class headers + raw bytes
//!     ↓  (merged in enumeration order, last write wins)
//! IndexSnapshot published atomically
//!
//! describe(fqcn)
//!     ├─ DescriptorCache hit → Arc<ClassDescriptor>
//!     └─ miss → parse stored bytes + walk supertypes → cache
//! ```
//!
//! Only one load pass runs per index. The pass builds a private snapshot and
//! swaps it in when done, so queries during a load see the previous (empty)
//! snapshot, never a half-built one.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, warn};

use super::archive::{
    scan_archive, ArchiveEnumerator, ArchiveScan, IndexError, PlatformFilter, ProjectDescriptor,
};
use super::classfile::{
    parse_field_descriptor, parse_method_descriptor, read_class, ClassParseError,
};
use super::descriptor_cache::{CacheStats, DescriptorCache};
use crate::config::CompletionConfig;
use crate::metrics::{metrics, TimingGuard};
use crate::model::access::{ACC_BRIDGE, ACC_SYNTHETIC};
use crate::model::{
    ClassDescriptor, ClassDescriptorBuilder, ClassSummary, ConstructorDescriptor, FieldDescriptor,
    Imports, MethodDescriptor,
};

/// One indexed class: its header and the raw class-file bytes
#[derive(Debug, Clone)]
pub struct ClassEntry {
    summary: Arc<ClassSummary>,
    bytes: Arc<[u8]>,
}

impl ClassEntry {
    pub fn new(summary: ClassSummary, bytes: Vec<u8>) -> Self {
        Self {
            summary: Arc::new(summary),
            bytes: Arc::from(bytes),
        }
    }

    pub fn summary(&self) -> &Arc<ClassSummary> {
        &self.summary
    }

    pub fn fqcn(&self) -> &str {
        &self.summary.fqcn
    }
}

/// Statistics for a completed load pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub archives_scanned: usize,
    pub skipped_archives: usize,
    pub classes_indexed: usize,
    pub skipped_entries: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The index was already loaded; nothing was done
    AlreadyLoaded,
    /// Another pass is in flight; this request was coalesced into it
    AlreadyLoading,
    /// The index was disposed and will not load again
    Disposed,
    /// The pass was cancelled; partial results were discarded
    Cancelled,
    Loaded(LoadReport),
}

#[derive(Debug)]
enum LoadState {
    Unloaded,
    Loading {
        generation: u64,
        cancel: Arc<AtomicBool>,
    },
    Loaded,
    Disposed,
}

#[derive(Debug, Default)]
struct IndexSnapshot {
    classes: FxHashMap<String, ClassEntry>,
    /// Every package and every parent package of an indexed class
    packages: FxHashSet<String>,
}

impl IndexSnapshot {
    fn from_entries(classes: FxHashMap<String, ClassEntry>) -> Self {
        let mut packages = FxHashSet::default();
        for entry in classes.values() {
            let mut package = entry.summary.package.as_str();
            while !package.is_empty() && packages.insert(package.to_string()) {
                package = package.rsplit_once('.').map(|(parent, _)| parent).unwrap_or("");
            }
        }
        Self { classes, packages }
    }
}

/// Fully-qualified name → class entry, with a descriptor cache on top
#[derive(Debug)]
pub struct ClassIndex {
    platform_prefixes: Vec<String>,
    max_inheritance_depth: usize,
    state: Mutex<LoadState>,
    generations: AtomicU64,
    snapshot: RwLock<Arc<IndexSnapshot>>,
    descriptors: DescriptorCache,
}

impl ClassIndex {
    pub fn new(config: &CompletionConfig) -> Self {
        Self {
            platform_prefixes: config.platform_prefixes.clone(),
            max_inheritance_depth: config.max_inheritance_depth,
            state: Mutex::new(LoadState::Unloaded),
            generations: AtomicU64::new(0),
            snapshot: RwLock::new(Arc::default()),
            descriptors: DescriptorCache::with_capacity(config.descriptor_cache_capacity),
        }
    }

    /// Index every archive of `project`.
    ///
    /// Blocking and potentially slow; callers on an async runtime should go
    /// through `CompletionProvider::load`, which moves this onto the blocking
    /// pool.
    pub fn load(
        &self,
        project: &ProjectDescriptor,
        enumerator: &dyn ArchiveEnumerator,
    ) -> LoadOutcome {
        let (generation, cancel) = {
            let mut state = self.state.lock();
            match &*state {
                LoadState::Loaded => return LoadOutcome::AlreadyLoaded,
                LoadState::Loading { .. } => return LoadOutcome::AlreadyLoading,
                LoadState::Disposed => return LoadOutcome::Disposed,
                LoadState::Unloaded => {}
            }
            let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
            let cancel = Arc::new(AtomicBool::new(false));
            *state = LoadState::Loading {
                generation,
                cancel: Arc::clone(&cancel),
            };
            (generation, cancel)
        };

        // Whatever happens below (cancellation, panic in a scan), a pass that
        // did not publish must not leave the index stuck in `Loading`.
        let _restore = scopeguard::guard((), |_| {
            let mut state = self.state.lock();
            if matches!(&*state, LoadState::Loading { generation: g, .. } if *g == generation) {
                *state = LoadState::Unloaded;
            }
        });

        self.clear_entries();
        let _timing = TimingGuard::new("class_index_load");
        let started = Instant::now();

        let archives = enumerator.archives(project);
        let filter = PlatformFilter::for_project(project, &self.platform_prefixes);
        debug!(
            "Loading project '{}' from {} archives (platform filter: {})",
            project.name,
            archives.len(),
            project.filters_platform_classes()
        );

        let scans: Vec<(&PathBuf, Result<ArchiveScan, IndexError>)> = archives
            .par_iter()
            .map(|path| (path, scan_archive(path, &filter, &cancel)))
            .collect();

        let mut report = LoadReport::default();
        let mut classes: FxHashMap<String, ClassEntry> = FxHashMap::default();
        for (path, scan) in scans {
            match scan {
                Ok(scan) => {
                    report.archives_scanned += 1;
                    report.skipped_entries += scan.skipped_entries;
                    for entry in scan.entries {
                        if let Some(previous) = classes.insert(entry.fqcn().to_string(), entry) {
                            debug!(
                                "{} from {} shadowed by a later archive",
                                previous.fqcn(),
                                previous.summary.origin.display()
                            );
                        }
                    }
                }
                Err(IndexError::Cancelled) => {
                    info!("Load of project '{}' cancelled", project.name);
                    return LoadOutcome::Cancelled;
                }
                Err(err) => {
                    warn!("Skipping archive {}: {}", path.display(), err);
                    report.skipped_archives += 1;
                }
            }
        }

        report.classes_indexed = classes.len();
        report.elapsed = started.elapsed();
        let snapshot = Arc::new(IndexSnapshot::from_entries(classes));

        {
            let mut state = self.state.lock();
            let current =
                matches!(&*state, LoadState::Loading { generation: g, .. } if *g == generation);
            if !current || cancel.load(Ordering::Relaxed) {
                info!("Load of project '{}' cancelled", project.name);
                return LoadOutcome::Cancelled;
            }
            self.publish(snapshot);
            *state = LoadState::Loaded;
        }

        metrics().record_load(
            report.archives_scanned,
            report.skipped_archives,
            report.classes_indexed,
        );
        info!(
            "Indexed {} classes from {} archives in {:?} ({} archives and {} entries skipped)",
            report.classes_indexed,
            report.archives_scanned,
            report.elapsed,
            report.skipped_archives,
            report.skipped_entries
        );
        LoadOutcome::Loaded(report)
    }

    /// Ask an in-flight load to stop; returns false when nothing was loading
    pub fn cancel_load(&self) -> bool {
        match &*self.state.lock() {
            LoadState::Loading { cancel, .. } => {
                cancel.store(true, Ordering::Relaxed);
                true
            }
            _ => false,
        }
    }

    /// Cancel any load, drop everything, and refuse further loads
    pub fn dispose(&self) {
        self.transition_and_clear(LoadState::Disposed);
        debug!("Class index disposed");
    }

    /// Cancel any load and drop everything; a later `load` starts fresh
    pub fn reset(&self) {
        self.transition_and_clear(LoadState::Unloaded);
    }

    fn transition_and_clear(&self, next: LoadState) {
        let mut state = self.state.lock();
        if let LoadState::Loading { cancel, .. } = &*state {
            cancel.store(true, Ordering::Relaxed);
        }
        *state = next;
        self.clear_entries();
    }

    fn clear_entries(&self) {
        self.publish(Arc::default());
    }

    /// Swap in `snapshot` and drop every descriptor built from the old one.
    ///
    /// The cache is cleared while the snapshot write lock is held; `describe`
    /// inserts under the read lock, so no descriptor outlives its snapshot.
    fn publish(&self, snapshot: Arc<IndexSnapshot>) {
        let mut current = self.snapshot.write();
        *current = snapshot;
        self.descriptors.clear();
    }

    pub fn is_loaded(&self) -> bool {
        matches!(*self.state.lock(), LoadState::Loaded)
    }

    pub fn is_loading(&self) -> bool {
        matches!(*self.state.lock(), LoadState::Loading { .. })
    }

    pub fn is_disposed(&self) -> bool {
        matches!(*self.state.lock(), LoadState::Disposed)
    }

    fn snapshot(&self) -> Arc<IndexSnapshot> {
        Arc::clone(&self.snapshot.read())
    }

    pub fn len(&self) -> usize {
        self.snapshot().classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, fqcn: &str) -> bool {
        self.snapshot().classes.contains_key(fqcn)
    }

    pub fn summary(&self, fqcn: &str) -> Option<Arc<ClassSummary>> {
        self.snapshot()
            .classes
            .get(fqcn)
            .map(|entry| Arc::clone(&entry.summary))
    }

    pub fn has_package(&self, package: &str) -> bool {
        self.snapshot().packages.contains(package)
    }

    /// Every class whose simple name starts with `prefix` (case-sensitive),
    /// ordered by simple name then fully-qualified name
    pub fn find_by_simple_name_prefix(&self, prefix: &str) -> Vec<Arc<ClassSummary>> {
        let snapshot = self.snapshot();
        let mut found: Vec<_> = snapshot
            .classes
            .values()
            .filter(|entry| entry.summary.simple_name.starts_with(prefix))
            .map(|entry| Arc::clone(&entry.summary))
            .collect();
        sort_summaries(&mut found);
        found
    }

    /// Classes directly in `package` whose simple name starts with `prefix`
    pub fn classes_in_package(&self, package: &str, prefix: &str) -> Vec<Arc<ClassSummary>> {
        let snapshot = self.snapshot();
        let mut found: Vec<_> = snapshot
            .classes
            .values()
            .map(|entry| &entry.summary)
            .filter(|s| s.package == package && s.simple_name.starts_with(prefix))
            .map(Arc::clone)
            .collect();
        sort_summaries(&mut found);
        found
    }

    /// Fully-qualified candidates for a type name written in source.
    ///
    /// Simple names are ordered single-type import, own package, on-demand
    /// import, `java.lang`, then the rest. Qualified names (`java.util.List`,
    /// `Map.Entry`) match by suffix.
    pub fn resolve_simple_name(&self, name: &str, imports: &Imports) -> Vec<String> {
        let snapshot = self.snapshot();
        if snapshot.classes.contains_key(name) {
            return vec![name.to_string()];
        }

        let dotted_suffix = format!(".{name}");
        let qualified = name.contains('.');
        let mut candidates: Vec<&ClassSummary> = snapshot
            .classes
            .values()
            .map(|entry| entry.summary.as_ref())
            .filter(|s| {
                if qualified {
                    s.fqcn.ends_with(&dotted_suffix)
                } else {
                    s.simple_name == name
                }
            })
            .collect();

        let rank = |s: &ClassSummary| {
            if imports.single_type.iter().any(|i| *i == s.fqcn) {
                0
            } else if s.package == imports.package {
                1
            } else if imports.on_demand.iter().any(|p| *p == s.package) {
                2
            } else if s.package == "java.lang" {
                3
            } else {
                4
            }
        };
        candidates.sort_by(|a, b| rank(*a).cmp(&rank(*b)).then_with(|| a.fqcn.cmp(&b.fqcn)));
        candidates.into_iter().map(|s| s.fqcn.clone()).collect()
    }

    /// Public API of `fqcn`, including inherited public fields and methods.
    ///
    /// Unknown names and unreadable class bytes yield `None`.
    pub fn describe(&self, fqcn: &str) -> Option<Arc<ClassDescriptor>> {
        if let Some(descriptor) = self.descriptors.get(fqcn) {
            return Some(descriptor);
        }

        let snapshot = self.snapshot();
        let entry = snapshot.classes.get(fqcn)?;
        let descriptor = match self.materialize(&snapshot, entry) {
            Ok(descriptor) => Arc::new(descriptor),
            Err(err) => {
                warn!("Cannot describe {}: {}", fqcn, err);
                return None;
            }
        };
        let current = self.snapshot.read();
        // Built from a snapshot that a reset or reload has since replaced
        if Arc::ptr_eq(&*current, &snapshot) {
            self.descriptors.insert(Arc::clone(&descriptor));
        } else {
            debug!("Not caching {}: index changed while describing", fqcn);
        }
        Some(descriptor)
    }

    /// Read declared members, then append inherited ones breadth-first:
    /// each type's superclass before its interfaces
    fn materialize(
        &self,
        snapshot: &IndexSnapshot,
        entry: &ClassEntry,
    ) -> Result<ClassDescriptor, ClassParseError> {
        let mut builder = declared_members(entry)?;

        let mut visited: FxHashSet<&str> = FxHashSet::default();
        visited.insert(entry.fqcn());
        let mut queue: VecDeque<(&ClassSummary, usize)> = VecDeque::new();
        queue.push_back((entry.summary.as_ref(), 0));

        while let Some((summary, depth)) = queue.pop_front() {
            if depth >= self.max_inheritance_depth {
                continue;
            }
            let supertypes = std::iter::once(summary.superclass.as_str())
                .filter(|s| !s.is_empty())
                .chain(summary.interfaces.iter().map(String::as_str));
            for supertype in supertypes {
                if !visited.insert(supertype) {
                    continue;
                }
                let Some(parent) = snapshot.classes.get(supertype) else {
                    debug!("Supertype {} of {} is not indexed", supertype, summary.fqcn);
                    continue;
                };
                match declared_members(parent) {
                    Ok(parent_builder) => builder.inherit_from(&parent_builder.build()),
                    Err(err) => warn!("Skipping members of {}: {}", supertype, err),
                }
                queue.push_back((parent.summary.as_ref(), depth + 1));
            }
        }

        Ok(builder.build())
    }

    /// Drop materialized descriptors; results are unchanged, only slower
    pub fn clear_descriptor_cache(&self) {
        self.descriptors.clear();
    }

    pub fn descriptor_cache_stats(&self) -> CacheStats {
        self.descriptors.stats()
    }
}

fn sort_summaries(summaries: &mut [Arc<ClassSummary>]) {
    summaries.sort_by(|a, b| {
        a.simple_name
            .cmp(&b.simple_name)
            .then_with(|| a.fqcn.cmp(&b.fqcn))
    });
}

/// Public members declared by the class itself, in class-file order
fn declared_members(entry: &ClassEntry) -> Result<ClassDescriptorBuilder, ClassParseError> {
    let parsed = read_class(&entry.bytes)?;
    let summary = &entry.summary;
    let mut builder = ClassDescriptorBuilder::new(Arc::clone(summary));

    for field in parsed.fields {
        if field.access_flags & ACC_SYNTHETIC != 0 {
            continue;
        }
        match parse_field_descriptor(&field.descriptor) {
            Ok(field_type) => builder.add_field(FieldDescriptor {
                name: field.name,
                declaring_class: summary.fqcn.clone(),
                field_type,
                access_flags: field.access_flags,
            }),
            Err(err) => debug!("{}.{}: {}", summary.fqcn, field.name, err),
        }
    }

    for method in parsed.methods {
        if method.access_flags & (ACC_SYNTHETIC | ACC_BRIDGE) != 0 || method.name == "<clinit>" {
            continue;
        }
        let signature = match parse_method_descriptor(&method.descriptor) {
            Ok(signature) => signature,
            Err(err) => {
                debug!("{}.{}: {}", summary.fqcn, method.name, err);
                continue;
            }
        };
        if method.name == "<init>" {
            builder.add_constructor(ConstructorDescriptor {
                name: summary.simple_name.clone(),
                declaring_class: summary.fqcn.clone(),
                parameters: signature.parameters,
                access_flags: method.access_flags,
            });
        } else {
            builder.add_method(MethodDescriptor {
                name: method.name,
                declaring_class: summary.fqcn.clone(),
                parameters: signature.parameters,
                return_type: signature.return_type,
                access_flags: method.access_flags,
            });
        }
    }

    Ok(builder)
}
