//! Heuristic code completion
//!
//! A query flows through four stages:
//!
//! 1. [`context`] reads the characters before the cursor and classifies the
//!    situation (constructor, class reference, member access)
//! 2. [`resolution`] recovers the receiver type for member access
//! 3. the class index supplies matching classes or members
//! 4. [`ranking`] deduplicates, orders and caps the candidates
//!
//! [`engine::CompletionProvider`] ties the stages together and applies
//! accepted suggestions.

pub mod context;
pub mod engine;
pub mod patterns;
pub mod ranking;
pub mod resolution;
pub mod session;
pub mod suggestion;

pub use context::{CompletionContext, Situation};
pub use engine::CompletionProvider;
pub use ranking::{rank_suggestions, RankingContext, RankingCriteria};
pub use resolution::{
    ResolutionInput, ResolutionStrategy, ResolvedReceiver, StrategyResult, TypeResolver,
};
pub use session::CompletionSession;
pub use suggestion::{EmptyReason, Suggestion, SuggestionKind, SuggestionOutcome};
