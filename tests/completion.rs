/// Integration tests for code completion
///
/// Tests verify:
/// - Context detection: constructors, class references, member access
/// - Receiver type recovery from declarations, field chains and accepted members
/// - Public-only members with inherited members after declared ones
/// - Accept bookkeeping: imports, insertion, the last inferred type
/// - Not-ready and disposed states are distinguishable from "no matches"
mod common;

use std::sync::Arc;

use indoc::indoc;

use common::{loaded_provider, names_at_end, FixedArchives};
use java_completion::classpath::ProjectDescriptor;
use java_completion::model::{Primitive, TypeName};
use java_completion::{
    CompletionConfig, CompletionProvider, EditableDocument, EditorBuffer, EditorTextSource,
    EmptyReason, LoadOutcome, SuggestionKind, SuggestionOutcome,
};

#[test]
fn test_members_of_local_variable_with_generics() {
    let (_dir, provider) = loaded_provider();
    let code = indoc! {"
        import java.util.ArrayList;

        public class Main {
            public static void main(String[] args) {
                ArrayList<String> list = new ArrayList<>();
                list.si"};

    let outcome = provider.get_suggestions(code, code.chars().count());
    let suggestions = outcome.suggestions();
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].simple_name, "size");
    assert_eq!(suggestions[0].kind, SuggestionKind::Method);
    assert_eq!(suggestions[0].signature.as_deref(), Some("size(): int"));
}

#[test]
fn test_members_with_empty_suffix_and_no_import() {
    let (_dir, provider) = loaded_provider();
    let code = "ArrayList<String> list = new ArrayList<>(); list.";

    let outcome = provider.get_suggestions(code, code.chars().count());
    let suggestions = outcome.suggestions();
    assert_eq!(
        suggestions[0].fully_qualified_name.as_deref(),
        Some("java.util.ArrayList")
    );
    let names: Vec<_> = suggestions.iter().map(|s| s.simple_name.as_str()).collect();
    for expected in ["add", "size", "get", "isEmpty", "toString"] {
        assert!(names.contains(&expected), "missing {expected} in {names:?}");
    }
    assert!(suggestions.iter().all(|s| s.kind.is_member()));
}

#[test]
fn test_only_public_members_are_offered() {
    let (_dir, provider) = loaded_provider();

    let names = names_at_end(&provider, "Object o = new Object(); o.");
    for expected in ["toString", "hashCode", "equals"] {
        assert!(names.iter().any(|n| n == expected), "missing {expected} in {names:?}");
    }
    assert!(!names.iter().any(|n| n == "clone"), "protected member offered");

    let names = names_at_end(&provider, "String s = \"\"; s.");
    assert!(!names.iter().any(|n| n == "value"), "private field offered");
    assert!(names.iter().any(|n| n == "length"));
}

#[test]
fn test_inherited_members_follow_declared_ones() {
    let (_dir, provider) = loaded_provider();
    let names = names_at_end(
        &provider,
        "java.util.ArrayList<String> items = null; items.",
    );
    let position = |name: &str| names.iter().position(|n| n == name).unwrap();
    assert!(position("add") < position("toString"));
    assert!(position("get") < position("isEmpty"));
    assert_eq!(names.iter().filter(|n| *n == "size").count(), 1);
    assert!(!names.iter().any(|n| n == "grow" || n == "access$000"));
}

#[test]
fn test_constructor_completion() {
    let (_dir, provider) = loaded_provider();
    let code = "Object text = new Str";
    let outcome = provider.get_suggestions(code, code.len());
    let suggestions = outcome.suggestions();
    assert!(!suggestions.is_empty());
    assert!(suggestions.iter().all(|s| s.kind == SuggestionKind::Constructor));
    assert!(suggestions.iter().any(|s| s.simple_name == "String"
        && s.fully_qualified_name.as_deref() == Some("java.lang.String")));

    // System has no public constructor
    let code = "Object o = new Sys";
    assert_eq!(
        provider.get_suggestions(code, code.len()),
        SuggestionOutcome::Empty(EmptyReason::NoMatches)
    );
}

#[test]
fn test_class_references() {
    let (_dir, provider) = loaded_provider();
    assert_eq!(names_at_end(&provider, "Str"), vec!["String", "StringBuilder"]);
    assert_eq!(names_at_end(&provider, "java.util.Arr"), vec!["ArrayList"]);
    assert!(names_at_end(&provider, "Zzz").is_empty());
}

#[test]
fn test_field_chain_and_static_type_receivers() {
    let (_dir, provider) = loaded_provider();
    assert_eq!(names_at_end(&provider, "System.out.pr"), vec!["println", "println"]);

    let names = names_at_end(&provider, "Math.");
    assert!(names.iter().any(|n| n == "abs"));
    assert!(names.iter().any(|n| n == "PI"));
}

#[test]
fn test_chained_call_on_primitive_return_type() {
    let (_dir, provider) = loaded_provider();
    let code = indoc! {"
        class Main {
            int compute() { return 42; }
            void run() {
                compute()."};

    // Nothing remembered yet: the receiver is unresolved, not a random guess
    assert_eq!(
        provider.get_suggestions(code, code.chars().count()),
        SuggestionOutcome::Empty(EmptyReason::UnresolvedType)
    );

    provider.session().remember(TypeName::Primitive(Primitive::Int));
    assert_eq!(
        provider.get_suggestions(code, code.chars().count()),
        SuggestionOutcome::Empty(EmptyReason::NoMatches)
    );
}

#[test]
fn test_chained_call_after_accepting_member() {
    let (_dir, provider) = loaded_provider();
    let mut editor = EditorBuffer::new("StringBuilder sb = new StringBuilder(); sb.app");
    let append = provider
        .suggest(provider.session(), &editor, editor.cursor())
        .into_suggestions()
        .into_iter()
        .find(|s| s.simple_name == "append")
        .unwrap();

    provider.on_accept(&mut editor, &append);
    assert!(editor.text().ends_with("sb.append()"));

    let cursor = editor.cursor();
    editor.insert(cursor, ".toStr");
    editor.set_cursor(cursor + ".toStr".len());
    let outcome = provider.suggest(provider.session(), &editor, editor.cursor());
    let first = &outcome.suggestions()[0];
    assert_eq!(first.simple_name, "toString");
    assert_eq!(first.fully_qualified_name.as_deref(), Some("java.lang.StringBuilder"));
}

#[test]
fn test_accepting_class_twice_adds_one_import() {
    let (_dir, provider) = loaded_provider();
    let code = indoc! {"
        package demo;

        public class Main {
            HashM"};
    let mut editor = EditorBuffer::new(code);
    let hash_map = provider
        .suggest(provider.session(), &editor, editor.cursor())
        .into_suggestions()
        .into_iter()
        .find(|s| s.kind == SuggestionKind::Class)
        .unwrap();
    assert_eq!(hash_map.fully_qualified_name.as_deref(), Some("java.util.HashMap"));

    provider.on_accept(&mut editor, &hash_map);
    provider.on_accept(&mut editor, &hash_map);

    let text = editor.text();
    assert_eq!(text.matches("import java.util.HashMap;").count(), 1);
    assert!(text.starts_with("package demo;\n\nimport java.util.HashMap;\n"));
    assert!(text.ends_with("    HashMap"));
    assert_eq!(editor.cursor(), editor.len_chars());
}

#[test]
fn test_constructor_with_arguments_puts_cursor_inside_parens() {
    let (_dir, provider) = loaded_provider();
    let mut editor = EditorBuffer::new("import java.io.PrintStream;\nObject p = new PrintS");
    let constructor = provider
        .suggest(provider.session(), &editor, editor.cursor())
        .into_suggestions()
        .remove(0);
    assert!(constructor.takes_arguments);

    provider.on_accept(&mut editor, &constructor);
    let text = editor.text();
    assert!(text.ends_with("new PrintStream()"));
    assert_eq!(text.matches("import java.io.PrintStream;").count(), 1);
    assert_eq!(editor.cursor(), editor.len_chars() - 1);
}

#[test]
fn test_not_ready_then_disposed() {
    let provider = CompletionProvider::new(CompletionConfig::default());
    assert!(provider.get_suggestions("Str", 3).is_not_ready());

    provider.dispose();
    assert_eq!(
        provider.get_suggestions("Str", 3),
        SuggestionOutcome::Empty(EmptyReason::Disposed)
    );
    let dir = tempfile::tempdir().unwrap();
    let jar = test_utils::write_jdk_fixture(dir.path()).unwrap();
    assert_eq!(
        provider.load_blocking(&ProjectDescriptor::new("demo"), &FixedArchives(vec![jar])),
        LoadOutcome::Disposed
    );
}

#[test]
fn test_dispose_after_load() {
    let (_dir, provider) = loaded_provider();
    assert!(provider.is_ready());
    provider.session().remember(TypeName::Reference("java.lang.String".into()));

    provider.dispose();
    assert!(!provider.is_ready());
    assert!(provider.index().is_empty());
    assert!(provider.session().last_inferred_type().is_none());
    assert_eq!(
        provider.get_suggestions("list.", 5),
        SuggestionOutcome::Empty(EmptyReason::Disposed)
    );
}

#[tokio::test]
async fn test_async_load_on_blocking_pool() {
    let dir = tempfile::tempdir().unwrap();
    let jar = test_utils::write_jdk_fixture(dir.path()).unwrap();
    let provider = CompletionProvider::new(CompletionConfig::default());

    let outcome = provider
        .load(ProjectDescriptor::new("demo"), Arc::new(FixedArchives(vec![jar.clone()])))
        .await;
    let LoadOutcome::Loaded(report) = outcome else {
        panic!("expected a load pass, got {outcome:?}");
    };
    assert!(report.classes_indexed > 10);
    assert!(provider.is_ready());

    let again = provider
        .load(ProjectDescriptor::new("demo"), Arc::new(FixedArchives(vec![jar])))
        .await;
    assert_eq!(again, LoadOutcome::AlreadyLoaded);
    assert_eq!(names_at_end(&provider, "Str"), vec!["String", "StringBuilder"]);
}

#[test]
fn test_results_are_capped() {
    let dir = tempfile::tempdir().unwrap();
    let jar = test_utils::write_jdk_fixture(dir.path()).unwrap();
    let config = CompletionConfig {
        max_results: 2,
        ..CompletionConfig::default()
    };
    let provider = CompletionProvider::new(config);
    provider.load_blocking(&ProjectDescriptor::new("demo"), &FixedArchives(vec![jar]));
    let code = "Object o = null; o.";
    assert_eq!(provider.get_suggestions(code, code.len()).suggestions().len(), 2);
}
