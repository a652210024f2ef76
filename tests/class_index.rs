/// Integration tests for loading the class index
///
/// Tests verify:
/// - Load idempotence and coalescing of concurrent loads
/// - Cancellation, reset and dispose
/// - Partial success when an archive is unreadable
/// - Platform filtering, last-write-wins and class directories
/// - Prefix search properties over random class sets
mod common;

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use quickcheck::{QuickCheck, TestResult};

use common::FixedArchives;
use java_completion::classpath::{
    ArchiveEnumerator, ClassIndex, FsArchiveEnumerator, ProjectDescriptor, ProjectKind,
};
use java_completion::{CompletionConfig, LoadOutcome};
use test_utils::access::{ACC_PRIVATE, ACC_PUBLIC, ACC_STATIC};
use test_utils::generator::ClassSet;
use test_utils::{write_class_dir, ClassFileBuilder, JarBuilder};

fn new_index() -> ClassIndex {
    ClassIndex::new(&CompletionConfig::default())
}

fn fqcns(index: &ClassIndex, prefix: &str) -> Vec<String> {
    index
        .find_by_simple_name_prefix(prefix)
        .iter()
        .map(|s| s.fqcn.clone())
        .collect()
}

#[test]
fn test_loading_twice_keeps_identical_content() {
    let dir = tempfile::tempdir().unwrap();
    let jar = test_utils::write_jdk_fixture(dir.path()).unwrap();
    // The same archive listed twice must not duplicate entries
    let archives = FixedArchives(vec![jar.clone(), jar]);
    let index = new_index();
    let project = ProjectDescriptor::new("demo");

    assert!(matches!(index.load(&project, &archives), LoadOutcome::Loaded(_)));
    let first = fqcns(&index, "");
    let unique: BTreeSet<_> = first.iter().cloned().collect();
    assert_eq!(first.len(), unique.len());

    assert_eq!(index.load(&project, &archives), LoadOutcome::AlreadyLoaded);
    assert_eq!(fqcns(&index, ""), first);
}

#[test]
fn test_concurrent_loads_run_one_pass() {
    let dir = tempfile::tempdir().unwrap();
    let jar = test_utils::write_jdk_fixture(dir.path()).unwrap();
    let index = Arc::new(new_index());
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let index = Arc::clone(&index);
            let barrier = Arc::clone(&barrier);
            let archives = FixedArchives(vec![jar.clone()]);
            thread::spawn(move || {
                barrier.wait();
                index.load(&ProjectDescriptor::new("demo"), &archives)
            })
        })
        .collect();
    let outcomes: Vec<LoadOutcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let passes = outcomes
        .iter()
        .filter(|o| matches!(o, LoadOutcome::Loaded(_)))
        .count();
    assert_eq!(passes, 1, "outcomes: {outcomes:?}");
    assert!(outcomes.iter().all(|o| matches!(
        o,
        LoadOutcome::Loaded(_) | LoadOutcome::AlreadyLoading | LoadOutcome::AlreadyLoaded
    )));
    assert!(index.is_loaded());
}

/// Cancels the load that is enumerating it
struct CancellingArchives {
    index: Arc<ClassIndex>,
    archives: Vec<PathBuf>,
}

impl ArchiveEnumerator for CancellingArchives {
    fn archives(&self, _project: &ProjectDescriptor) -> Vec<PathBuf> {
        assert!(self.index.cancel_load());
        self.archives.clone()
    }
}

#[test]
fn test_cancelled_load_leaves_index_empty_and_reloadable() {
    let dir = tempfile::tempdir().unwrap();
    let jar = test_utils::write_jdk_fixture(dir.path()).unwrap();
    let index = Arc::new(new_index());
    let project = ProjectDescriptor::new("demo");

    let cancelling = CancellingArchives {
        index: Arc::clone(&index),
        archives: vec![jar.clone()],
    };
    assert_eq!(index.load(&project, &cancelling), LoadOutcome::Cancelled);
    assert!(index.is_empty());
    assert!(!index.is_loading());
    assert!(!index.is_loaded());

    index.reset();
    assert!(matches!(
        index.load(&project, &FixedArchives(vec![jar])),
        LoadOutcome::Loaded(_)
    ));
    assert!(index.contains("java.lang.String"));
    assert!(!index.cancel_load(), "nothing left to cancel");
}

#[test]
fn test_unreadable_archive_between_good_ones() {
    let dir = tempfile::tempdir().unwrap();
    let first = JarBuilder::new()
        .class(&ClassFileBuilder::new("com/acme/First").constructor(""))
        .write(&dir.path().join("first.jar"))
        .unwrap();
    let broken = dir.path().join("broken.jar");
    fs::write(&broken, b"this is not a zip archive").unwrap();
    let last = JarBuilder::new()
        .class(&ClassFileBuilder::new("com/acme/Last").constructor(""))
        .entry("com/acme/Garbage.class", b"\xCA\xFE\xBA\xBE\x00".to_vec())
        .write(&dir.path().join("last.jar"))
        .unwrap();

    let index = new_index();
    let LoadOutcome::Loaded(report) = index.load(
        &ProjectDescriptor::new("demo"),
        &FixedArchives(vec![first, broken, last]),
    ) else {
        panic!("load should succeed partially");
    };

    assert_eq!(report.archives_scanned, 2);
    assert_eq!(report.skipped_archives, 1);
    assert_eq!(report.skipped_entries, 1);
    assert!(index.contains("com.acme.First"));
    assert!(index.contains("com.acme.Last"));
    assert!(!index.contains("com.acme.Garbage"));
}

#[test]
fn test_platform_filter_depends_on_project_kind() {
    let dir = tempfile::tempdir().unwrap();
    let jar = test_utils::write_jdk_fixture(dir.path()).unwrap();

    let plain = new_index();
    plain.load(&ProjectDescriptor::new("demo"), &FixedArchives(vec![jar.clone()]));
    assert!(plain.find_by_simple_name_prefix("Activity").is_empty());

    let platform = new_index();
    let project = ProjectDescriptor {
        kind: ProjectKind::Platform,
        ..ProjectDescriptor::new("app")
    };
    platform.load(&project, &FixedArchives(vec![jar]));
    assert_eq!(fqcns(&platform, "Activity"), vec!["android.app.Activity"]);
}

#[test]
fn test_later_archive_wins_on_duplicate_names() {
    let dir = tempfile::tempdir().unwrap();
    let old = JarBuilder::new()
        .class(&ClassFileBuilder::new("com/acme/Widget").method(ACC_PUBLIC, "oldApi", "()V"))
        .write(&dir.path().join("widget-1.0.jar"))
        .unwrap();
    let new = JarBuilder::new()
        .class(&ClassFileBuilder::new("com/acme/Widget").method(ACC_PUBLIC, "newApi", "()V"))
        .write(&dir.path().join("widget-2.0.jar"))
        .unwrap();

    let index = new_index();
    index.load(&ProjectDescriptor::new("demo"), &FixedArchives(vec![old, new.clone()]));

    assert_eq!(fqcns(&index, "Widget"), vec!["com.acme.Widget"]);
    let summary = index.summary("com.acme.Widget").unwrap();
    assert_eq!(summary.origin, new);
    let widget = index.describe("com.acme.Widget").unwrap();
    let methods: Vec<_> = widget.methods().iter().map(|m| m.name.as_str()).collect();
    assert!(methods.contains(&"newApi"));
    assert!(!methods.contains(&"oldApi"));
}

#[test]
fn test_describe_racing_reset_never_caches_previous_load() {
    let dir = tempfile::tempdir().unwrap();
    let mut widget = ClassFileBuilder::new("com/acme/Widget");
    for i in 0..400 {
        widget = widget.method(ACC_PUBLIC, &format!("oldApi{i}"), "()V");
    }
    let old = JarBuilder::new()
        .class(&widget)
        .write(&dir.path().join("widget-1.0.jar"))
        .unwrap();
    let new = JarBuilder::new()
        .class(&ClassFileBuilder::new("com/acme/Widget").method(ACC_PUBLIC, "newApi", "()V"))
        .write(&dir.path().join("widget-2.0.jar"))
        .unwrap();
    let project = ProjectDescriptor::new("demo");

    for _ in 0..50 {
        let index = new_index();
        index.load(&project, &FixedArchives(vec![old.clone()]));
        let reloaded = AtomicBool::new(false);

        thread::scope(|scope| {
            scope.spawn(|| {
                while !reloaded.load(Ordering::Acquire) {
                    index.clear_descriptor_cache();
                    index.describe("com.acme.Widget");
                }
            });
            index.reset();
            index.load(&project, &FixedArchives(vec![new.clone()]));
            reloaded.store(true, Ordering::Release);
        });

        let widget = index.describe("com.acme.Widget").unwrap();
        let methods: Vec<_> = widget.methods().iter().map(|m| m.name.as_str()).collect();
        assert!(methods.contains(&"newApi"), "methods: {methods:?}");
        assert!(!methods.iter().any(|m| m.starts_with("oldApi")));
    }
}

#[test]
fn test_output_directory_and_library_dir() {
    let dir = tempfile::tempdir().unwrap();
    let output = write_class_dir(
        &dir.path().join("classes"),
        &[ClassFileBuilder::new("demo/Main")
            .method(ACC_PUBLIC | ACC_STATIC, "main", "([Ljava/lang/String;)V")
            .method(ACC_PRIVATE, "helper", "()V")],
    )
    .unwrap();
    let libs = dir.path().join("libs");
    fs::create_dir_all(&libs).unwrap();
    test_utils::write_jdk_fixture(&libs).unwrap();
    fs::write(libs.join("README.txt"), "not an archive").unwrap();

    let project = ProjectDescriptor {
        output: Some(output),
        library_dir: Some(libs),
        ..ProjectDescriptor::new("demo")
    };
    let index = new_index();
    let LoadOutcome::Loaded(report) = index.load(&project, &FsArchiveEnumerator::default()) else {
        panic!("load failed");
    };
    assert_eq!(report.archives_scanned, 2);
    assert!(index.contains("demo.Main"));
    assert!(index.contains("java.util.ArrayList"));

    let main = index.describe("demo.Main").unwrap();
    let methods: Vec<_> = main.methods().iter().map(|m| m.name.as_str()).collect();
    assert_eq!(methods[0], "main");
    assert!(!methods.contains(&"helper"));
}

fn prefix_search_properties(set: ClassSet) -> TestResult {
    let dir = tempfile::tempdir().unwrap();
    let jar = JarBuilder::new()
        .classes(&set.builders())
        .write(&dir.path().join("random.jar"))
        .unwrap();
    let index = new_index();
    if !matches!(
        index.load(&ProjectDescriptor::new("prop"), &FixedArchives(vec![jar])),
        LoadOutcome::Loaded(_)
    ) {
        return TestResult::failed();
    }

    // Empty prefix: every class exactly once
    let all = fqcns(&index, "");
    let expected: BTreeSet<String> = set
        .internal_names
        .iter()
        .map(|name| name.replace('/', "."))
        .collect();
    if all.len() != expected.len() || all.iter().cloned().collect::<BTreeSet<_>>() != expected {
        return TestResult::failed();
    }

    // Prefix: exactly the classes whose simple name starts with it
    let found = index.find_by_simple_name_prefix(&set.prefix);
    let wanted = set
        .simple_names()
        .iter()
        .filter(|name| name.starts_with(set.prefix.as_str()))
        .count();
    TestResult::from_bool(
        found.len() == wanted && found.iter().all(|s| s.simple_name.starts_with(&set.prefix)),
    )
}

#[test]
fn test_prefix_search_properties() {
    QuickCheck::new()
        .tests(30)
        .quickcheck(prefix_search_properties as fn(ClassSet) -> TestResult);
}
