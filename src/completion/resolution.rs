//! Receiver type resolution
//!
//! Recovering the type of `prefix` in `prefix.member` is a sequence of
//! guesses. Each guess is a named [`ResolutionStrategy`]; the resolver tries
//! them in a fixed order and the first definite answer wins. When every
//! strategy passes, the receiver is unresolved and the query comes back
//! empty instead of guessing at random.
//!
//! Default order:
//! 1. `chained_return_type` - `compute().` uses the last accepted member's type
//! 2. `enclosing_class` - empty prefix or `this`
//! 3. `direct_type` - the prefix is itself a type name (`Math.`, `java.util.List.`)
//! 4. `local_declaration` - nearest `Type prefix =` before the cursor
//! 5. `field_chain` - `a.b.c` walks public field types from `a`
//! 6. `nearby_class_name` - a cast `(Type) prefix` or `Type prefix` nearby
//! 7. `last_return_type` - the last accepted member's type as a final fallback

use tracing::{debug, trace};

use super::patterns::{
    cast_pattern, declaration_pattern, is_identifier, is_keyword, looks_like_type_name,
    preceding_type_pattern, strip_generics, ENCLOSING_TYPE, TYPE_NAME,
};
use super::session::CompletionSession;
use crate::classpath::ClassIndex;
use crate::model::{Imports, Primitive, TypeName};

/// Everything a strategy may look at
#[derive(Clone, Copy)]
pub struct ResolutionInput<'a> {
    /// Receiver text before the last `.`
    pub receiver: &'a str,
    pub window: &'a str,
    pub imports: &'a Imports,
    pub receiver_is_call: bool,
    pub index: &'a ClassIndex,
    pub session: &'a CompletionSession,
}

impl<'a> ResolutionInput<'a> {
    fn with_receiver(self, receiver: &'a str) -> Self {
        Self { receiver, ..self }
    }

    /// Turn source type text into an indexed type.
    ///
    /// Generic arguments are stripped, arrays are rejected, primitives pass
    /// through, and reference types must be known to the index.
    fn resolve_type_text(&self, text: &str) -> Option<TypeName> {
        let raw = strip_generics(text);
        if raw.contains('[') {
            return None;
        }
        if let Some(primitive) = Primitive::from_keyword(raw) {
            return Some(TypeName::Primitive(primitive));
        }
        if !TYPE_NAME.is_match(raw) || is_keyword(raw) {
            return None;
        }
        self.index
            .resolve_simple_name(raw, self.imports)
            .into_iter()
            .next()
            .map(TypeName::Reference)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReceiver {
    pub type_name: TypeName,
    /// The receiver is an expression rather than a type
    pub instance: bool,
    /// Name of the strategy that produced this
    pub strategy: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyResult {
    Resolved(ResolvedReceiver),
    NoMatch,
}

pub trait ResolutionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve(&self, input: &ResolutionInput<'_>) -> StrategyResult;

    fn resolved(&self, type_name: TypeName, instance: bool) -> StrategyResult {
        StrategyResult::Resolved(ResolvedReceiver {
            type_name,
            instance,
            strategy: self.name(),
        })
    }
}

/// `compute().`: the type remembered from the last accepted member
pub struct ChainedReturnType;

impl ResolutionStrategy for ChainedReturnType {
    fn name(&self) -> &'static str {
        "chained_return_type"
    }

    fn resolve(&self, input: &ResolutionInput<'_>) -> StrategyResult {
        if !input.receiver_is_call {
            return StrategyResult::NoMatch;
        }
        match input.session.last_inferred_type() {
            Some(type_name) => self.resolved(type_name, true),
            None => StrategyResult::NoMatch,
        }
    }
}

/// Empty prefix or `this`: the nearest `class Name` before the cursor
pub struct EnclosingClass;

impl ResolutionStrategy for EnclosingClass {
    fn name(&self) -> &'static str {
        "enclosing_class"
    }

    fn resolve(&self, input: &ResolutionInput<'_>) -> StrategyResult {
        if input.receiver_is_call || !(input.receiver.is_empty() || input.receiver == "this") {
            return StrategyResult::NoMatch;
        }
        let Some(caps) = ENCLOSING_TYPE.captures_iter(input.window).last() else {
            return StrategyResult::NoMatch;
        };
        let name = &caps[1];
        // Prefer the class in the file's own package over a same-named library class
        let local = if input.imports.package.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", input.imports.package, name)
        };
        if input.index.contains(&local) {
            return self.resolved(TypeName::Reference(local), true);
        }
        match input.resolve_type_text(name) {
            Some(type_name) => self.resolved(type_name, true),
            None => StrategyResult::NoMatch,
        }
    }
}

/// The prefix already is a type name
pub struct DirectType;

impl ResolutionStrategy for DirectType {
    fn name(&self) -> &'static str {
        "direct_type"
    }

    fn resolve(&self, input: &ResolutionInput<'_>) -> StrategyResult {
        if input.receiver_is_call || !looks_like_type_name(input.receiver) {
            return StrategyResult::NoMatch;
        }
        match input.resolve_type_text(input.receiver) {
            Some(type_name) => self.resolved(type_name, true),
            None => StrategyResult::NoMatch,
        }
    }
}

/// The most recent `Type prefix [,;=):]` in the scan window
pub struct LocalDeclaration;

impl ResolutionStrategy for LocalDeclaration {
    fn name(&self) -> &'static str {
        "local_declaration"
    }

    fn resolve(&self, input: &ResolutionInput<'_>) -> StrategyResult {
        if input.receiver_is_call || !is_identifier(input.receiver) || input.receiver == "this" {
            return StrategyResult::NoMatch;
        }
        let Some(pattern) = declaration_pattern(input.receiver) else {
            return StrategyResult::NoMatch;
        };
        let declared = pattern
            .captures_iter(input.window)
            .filter_map(|caps| {
                caps.get(1)
                    .filter(|ty| !is_keyword(strip_generics(ty.as_str())))
                    .or_else(|| caps.get(2))
                    .map(|ty| ty.as_str().to_string())
            })
            .last();
        let Some(declared) = declared else {
            return StrategyResult::NoMatch;
        };
        trace!("Declaration of {} has type text {:?}", input.receiver, declared);
        match input.resolve_type_text(&declared) {
            Some(type_name) => self.resolved(type_name, true),
            None => StrategyResult::NoMatch,
        }
    }
}

/// `a.b.c`: resolve `a`, then follow public field types
pub struct FieldChain {
    head: Vec<Box<dyn ResolutionStrategy>>,
}

impl Default for FieldChain {
    fn default() -> Self {
        Self {
            head: vec![
                Box::new(EnclosingClass),
                Box::new(DirectType),
                Box::new(LocalDeclaration),
            ],
        }
    }
}

impl ResolutionStrategy for FieldChain {
    fn name(&self) -> &'static str {
        "field_chain"
    }

    fn resolve(&self, input: &ResolutionInput<'_>) -> StrategyResult {
        if input.receiver_is_call {
            return StrategyResult::NoMatch;
        }
        let mut segments = input.receiver.split('.');
        let Some(head) = segments.next() else {
            return StrategyResult::NoMatch;
        };
        let rest: Vec<&str> = segments.collect();
        if rest.is_empty() || !is_identifier(head) {
            return StrategyResult::NoMatch;
        }

        let head_input = input.with_receiver(head);
        let Some(mut current) = self.head.iter().find_map(|s| match s.resolve(&head_input) {
            StrategyResult::Resolved(resolved) => Some(resolved.type_name),
            StrategyResult::NoMatch => None,
        }) else {
            return StrategyResult::NoMatch;
        };

        for segment in rest {
            let Some(fqcn) = current.as_reference() else {
                return StrategyResult::NoMatch;
            };
            let Some(descriptor) = input.index.describe(fqcn) else {
                return StrategyResult::NoMatch;
            };
            let Some(field) = descriptor.field(segment) else {
                return StrategyResult::NoMatch;
            };
            current = field.field_type.clone();
        }
        self.resolved(current, true)
    }
}

/// Best-effort guess from a cast or a capitalized word next to the prefix
pub struct NearbyClassName;

impl ResolutionStrategy for NearbyClassName {
    fn name(&self) -> &'static str {
        "nearby_class_name"
    }

    fn resolve(&self, input: &ResolutionInput<'_>) -> StrategyResult {
        if input.receiver_is_call || !is_identifier(input.receiver) || input.receiver == "this" {
            return StrategyResult::NoMatch;
        }
        let patterns = [
            cast_pattern(input.receiver),
            preceding_type_pattern(input.receiver),
        ];
        for pattern in patterns.iter().flatten() {
            let guess = pattern
                .captures_iter(input.window)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str())
                .filter(|ty| !is_keyword(ty))
                .last();
            if let Some(type_name) = guess.and_then(|ty| input.resolve_type_text(ty)) {
                return self.resolved(type_name, true);
            }
        }
        StrategyResult::NoMatch
    }
}

/// The last accepted member's type, when nothing else worked
pub struct LastReturnType;

impl ResolutionStrategy for LastReturnType {
    fn name(&self) -> &'static str {
        "last_return_type"
    }

    fn resolve(&self, input: &ResolutionInput<'_>) -> StrategyResult {
        match input.session.last_inferred_type() {
            Some(type_name) => self.resolved(type_name, true),
            None => StrategyResult::NoMatch,
        }
    }
}

/// Ordered list of strategies; the first to resolve wins
pub struct TypeResolver {
    strategies: Vec<Box<dyn ResolutionStrategy>>,
}

impl TypeResolver {
    pub fn new(strategies: Vec<Box<dyn ResolutionStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn resolve(&self, input: &ResolutionInput<'_>) -> Option<ResolvedReceiver> {
        for strategy in &self.strategies {
            if let StrategyResult::Resolved(resolved) = strategy.resolve(input) {
                debug!(
                    "Receiver {:?} resolved to {} by {}",
                    input.receiver, resolved.type_name, resolved.strategy
                );
                return Some(resolved);
            }
        }
        debug!("Receiver {:?} unresolved", input.receiver);
        None
    }
}

impl Default for TypeResolver {
    fn default() -> Self {
        Self::new(vec![
            Box::new(ChainedReturnType),
            Box::new(EnclosingClass),
            Box::new(DirectType),
            Box::new(LocalDeclaration),
            Box::new(FieldChain::default()),
            Box::new(NearbyClassName),
            Box::new(LastReturnType),
        ])
    }
}

impl std::fmt::Debug for TypeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeResolver")
            .field("strategies", &self.strategy_names())
            .finish()
    }
}
