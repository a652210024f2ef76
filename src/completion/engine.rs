//! Completion provider: the entry point an editor talks to

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::context::{CompletionContext, Situation};
use super::ranking::{rank_suggestions, RankingContext, RankingCriteria};
use super::resolution::{ResolutionInput, TypeResolver};
use super::session::CompletionSession;
use super::suggestion::{EmptyReason, Suggestion, SuggestionKind, SuggestionOutcome};
use crate::classpath::{ArchiveEnumerator, ClassIndex, LoadOutcome, ProjectDescriptor};
use crate::config::CompletionConfig;
use crate::editor::{CursorTarget, EditApplier, EditableDocument, EditorBuffer, EditorTextSource};
use crate::metrics::{metrics, QueryResult, TimingGuard};
use crate::model::{ClassSummary, TypeName};

/// Candidates gathered for one query, before ranking
struct Candidates {
    suggestions: Vec<Suggestion>,
    instance_receiver: bool,
}

impl Candidates {
    fn classes(suggestions: Vec<Suggestion>) -> Self {
        Self {
            suggestions,
            instance_receiver: false,
        }
    }
}

/// Owns the class index and the default session for one project
pub struct CompletionProvider {
    config: CompletionConfig,
    index: Arc<ClassIndex>,
    session: Arc<CompletionSession>,
    resolver: TypeResolver,
    applier: EditApplier,
    criteria: RankingCriteria,
    disposed: AtomicBool,
}

impl CompletionProvider {
    pub fn new(config: CompletionConfig) -> Self {
        Self {
            index: Arc::new(ClassIndex::new(&config)),
            session: Arc::new(CompletionSession::new()),
            resolver: TypeResolver::default(),
            applier: EditApplier::new(),
            criteria: RankingCriteria::with_max_results(config.max_results),
            disposed: AtomicBool::new(false),
            config,
        }
    }

    /// Use a custom strategy list
    pub fn with_resolver(mut self, resolver: TypeResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    pub fn index(&self) -> &Arc<ClassIndex> {
        &self.index
    }

    pub fn session(&self) -> &Arc<CompletionSession> {
        &self.session
    }

    pub fn resolver(&self) -> &TypeResolver {
        &self.resolver
    }

    /// Index the project's archives on the blocking pool.
    ///
    /// Queries issued meanwhile return [`SuggestionOutcome::NotReady`].
    pub async fn load(
        &self,
        project: ProjectDescriptor,
        enumerator: Arc<dyn ArchiveEnumerator>,
    ) -> LoadOutcome {
        let index = Arc::clone(&self.index);
        let task = tokio::task::spawn_blocking(move || index.load(&project, enumerator.as_ref()));
        match task.await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("Class index load task failed: {}", err);
                self.index.reset();
                LoadOutcome::Cancelled
            }
        }
    }

    pub fn load_blocking(
        &self,
        project: &ProjectDescriptor,
        enumerator: &dyn ArchiveEnumerator,
    ) -> LoadOutcome {
        self.index.load(project, enumerator)
    }

    pub fn is_ready(&self) -> bool {
        !self.disposed.load(Ordering::Acquire) && self.index.is_loaded()
    }

    /// Drop the index and the session; every later query is
    /// `Empty(Disposed)`
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.index.dispose();
        self.session.clear();
        info!("Completion provider disposed");
    }

    /// Suggestions for raw text with the cursor at `offset` (char index),
    /// using the provider's own session
    pub fn get_suggestions(&self, text: &str, offset: usize) -> SuggestionOutcome {
        let buffer = EditorBuffer::with_cursor(text, offset);
        self.suggest(&self.session, &buffer, offset)
    }

    pub fn suggest(
        &self,
        session: &CompletionSession,
        source: &dyn EditorTextSource,
        offset: usize,
    ) -> SuggestionOutcome {
        let _timing = TimingGuard::new("suggest");

        if self.disposed.load(Ordering::Acquire) || self.index.is_disposed() {
            debug!("Query after dispose");
            metrics().record_query(QueryResult::Disposed);
            return SuggestionOutcome::Empty(EmptyReason::Disposed);
        }
        if !self.index.is_loaded() {
            debug!("Query before the class index is loaded");
            metrics().record_query(QueryResult::NotReady);
            return SuggestionOutcome::NotReady;
        }

        let context = CompletionContext::analyze(source, offset, self.config.scan_window);
        let gathered = match context.classify(&self.index) {
            Situation::Constructor { class_prefix } => Ok(self.constructors(&class_prefix)),
            Situation::ClassReference {
                package,
                name_prefix,
            } => {
                let classes = self.class_references(package.as_deref(), &name_prefix);
                if classes.suggestions.is_empty() {
                    self.members(session, &context, &context.prefix, &context.suffix)
                } else {
                    Ok(classes)
                }
            }
            Situation::MemberAccess {
                receiver,
                member_prefix,
            } => self.members(session, &context, &receiver, &member_prefix),
        };

        let outcome = match gathered {
            Err(reason) => SuggestionOutcome::Empty(reason),
            Ok(candidates) if candidates.suggestions.is_empty() => {
                SuggestionOutcome::Empty(EmptyReason::NoMatches)
            }
            Ok(candidates) => SuggestionOutcome::Matches(rank_suggestions(
                candidates.suggestions,
                &self.criteria,
                RankingContext {
                    imports: &context.imports,
                    instance_receiver: candidates.instance_receiver,
                },
            )),
        };

        metrics().record_query(match &outcome {
            SuggestionOutcome::Matches(_) => QueryResult::Matches,
            SuggestionOutcome::Empty(EmptyReason::UnresolvedType) => QueryResult::Unresolved,
            SuggestionOutcome::Empty(EmptyReason::Disposed) => QueryResult::Disposed,
            SuggestionOutcome::Empty(EmptyReason::NoMatches) => QueryResult::NoMatches,
            SuggestionOutcome::NotReady => QueryResult::NotReady,
        });
        outcome
    }

    /// Classes matching a possibly qualified prefix
    fn matching_classes(&self, prefix: &str) -> Vec<Arc<ClassSummary>> {
        match prefix.rsplit_once('.') {
            Some((package, name)) => self.index.classes_in_package(package, name),
            None => self.index.find_by_simple_name_prefix(prefix),
        }
    }

    fn constructors(&self, class_prefix: &str) -> Candidates {
        let mut suggestions = Vec::new();
        for summary in self.matching_classes(class_prefix) {
            if let Some(descriptor) = self.index.describe(&summary.fqcn) {
                suggestions.extend(descriptor.constructors().iter().map(Suggestion::constructor));
            }
        }
        Candidates::classes(suggestions)
    }

    fn class_references(&self, package: Option<&str>, name_prefix: &str) -> Candidates {
        let classes = match package {
            Some(package) => self.index.classes_in_package(package, name_prefix),
            None => self.index.find_by_simple_name_prefix(name_prefix),
        };
        let suggestions = classes
            .iter()
            .filter(|summary| summary.simple_name != name_prefix)
            .map(|summary| Suggestion::class(summary))
            .collect();
        Candidates::classes(suggestions)
    }

    fn members(
        &self,
        session: &CompletionSession,
        context: &CompletionContext,
        receiver: &str,
        member_prefix: &str,
    ) -> Result<Candidates, EmptyReason> {
        let input = ResolutionInput {
            receiver,
            window: &context.window,
            imports: &context.imports,
            receiver_is_call: context.receiver_is_call,
            index: &self.index,
            session,
        };
        let Some(resolved) = self.resolver.resolve(&input) else {
            return Err(EmptyReason::UnresolvedType);
        };

        let fqcn = match &resolved.type_name {
            TypeName::Reference(fqcn) => fqcn,
            other => {
                debug!("Receiver type {} has no members", other);
                return Err(EmptyReason::NoMatches);
            }
        };
        let Some(descriptor) = self.index.describe(fqcn) else {
            debug!("Resolved type {} is not described", fqcn);
            return Err(EmptyReason::UnresolvedType);
        };

        let suggestions = descriptor
            .fields_with_prefix(member_prefix)
            .map(Suggestion::field)
            .chain(descriptor.methods_with_prefix(member_prefix).map(Suggestion::method))
            .collect();
        Ok(Candidates {
            suggestions,
            instance_receiver: resolved.instance,
        })
    }

    /// Apply an accepted suggestion to the editor using the provider's session
    pub fn on_accept(&self, editor: &mut dyn EditableDocument, suggestion: &Suggestion) {
        self.accept(&self.session, editor, suggestion);
    }

    pub fn accept(
        &self,
        session: &CompletionSession,
        editor: &mut dyn EditableDocument,
        suggestion: &Suggestion,
    ) {
        if self.disposed.load(Ordering::Acquire) {
            debug!("Ignoring accept after dispose");
            return;
        }
        metrics().record_accept();

        match suggestion.kind {
            SuggestionKind::Class | SuggestionKind::Constructor => {
                if let Some(fqcn) = suggestion.fully_qualified_name.as_deref() {
                    self.applier.ensure_import(editor, fqcn);
                }
                let target = if suggestion.kind == SuggestionKind::Constructor
                    && suggestion.takes_arguments
                {
                    CursorTarget::Offset(suggestion.simple_name.chars().count() + 1)
                } else {
                    CursorTarget::End
                };
                self.applier
                    .apply_insertion(editor, &suggestion.insert_text(), target);
                session.clear();
            }
            SuggestionKind::Field | SuggestionKind::Method => {
                if let Some(type_name) = &suggestion.type_name {
                    session.remember(type_name.clone());
                }
                self.applier
                    .apply_insertion(editor, &suggestion.insert_text(), CursorTarget::End);
            }
        }
    }
}

impl std::fmt::Debug for CompletionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionProvider")
            .field("config", &self.config)
            .field("index", &self.index)
            .field("resolver", &self.resolver)
            .field("disposed", &self.disposed)
            .finish()
    }
}
