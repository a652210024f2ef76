//! Ranking and deduplication of suggestions
//!
//! Ranking algorithm (lower score first):
//! 1. Proximity of the class (imported or same package, then `java.lang` or
//!    on-demand imports, then everything else)
//! 2. Static members after instance members when completing on an instance
//! 3. Length of class names (shorter names preferred)
//!
//! The sort is stable, so ties keep the order they arrived in: simple name
//! order for classes, declared before inherited for members.

use std::cmp::Ordering;

use rustc_hash::FxHashSet;

use super::suggestion::Suggestion;
use crate::model::Imports;

#[derive(Debug, Clone)]
pub struct RankingCriteria {
    /// Weight for class proximity (default: 10.0)
    pub proximity_weight: f64,

    /// Weight for static members on an instance receiver (default: 1.0)
    pub static_weight: f64,

    /// Weight for class name length (default: 0.01)
    pub length_weight: f64,

    /// Maximum results to return (default: 200)
    pub max_results: usize,
}

impl Default for RankingCriteria {
    fn default() -> Self {
        Self {
            proximity_weight: 10.0,
            static_weight: 1.0,
            length_weight: 0.01,
            max_results: 200,
        }
    }
}

impl RankingCriteria {
    pub fn with_max_results(max_results: usize) -> Self {
        Self {
            max_results,
            ..Self::default()
        }
    }
}

/// What the ranking needs to know about the query
#[derive(Debug, Clone, Copy)]
pub struct RankingContext<'a> {
    pub imports: &'a Imports,
    /// The receiver is an expression, not a type name
    pub instance_receiver: bool,
}

/// Drop duplicates, sort best-first, and cap at `max_results`
pub fn rank_suggestions(
    mut suggestions: Vec<Suggestion>,
    criteria: &RankingCriteria,
    context: RankingContext<'_>,
) -> Vec<Suggestion> {
    let mut seen = FxHashSet::default();
    suggestions.retain(|s| {
        seen.insert((
            s.kind,
            s.simple_name.clone(),
            s.fully_qualified_name.clone(),
            s.signature.clone(),
        ))
    });

    let mut scored: Vec<(f64, Suggestion)> = suggestions
        .into_iter()
        .map(|s| (calculate_score(&s, criteria, context), s))
        .collect();
    scored.sort_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    scored
        .into_iter()
        .take(criteria.max_results)
        .map(|(_, s)| s)
        .collect()
}

fn calculate_score(
    suggestion: &Suggestion,
    criteria: &RankingCriteria,
    context: RankingContext<'_>,
) -> f64 {
    if suggestion.kind.is_member() {
        return if context.instance_receiver && suggestion.is_static {
            criteria.static_weight
        } else {
            0.0
        };
    }

    let proximity = suggestion
        .fully_qualified_name
        .as_deref()
        .map_or(2.0, |fqcn| proximity(fqcn, context.imports));

    let length_score = suggestion.simple_name.chars().count() as f64 * criteria.length_weight;

    proximity * criteria.proximity_weight + length_score
}

fn proximity(fqcn: &str, imports: &Imports) -> f64 {
    let package = fqcn.rsplit_once('.').map(|(p, _)| p).unwrap_or("");
    if imports.single_type.iter().any(|i| i == fqcn) || package == imports.package {
        0.0
    } else if package == "java.lang" || imports.on_demand.iter().any(|p| p == package) {
        1.0
    } else {
        2.0
    }
}
