//! Completion results

use serde::{Deserialize, Serialize};

use crate::model::{
    ClassSummary, ConstructorDescriptor, FieldDescriptor, MemberDescriptor, MethodDescriptor,
    TypeName,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SuggestionKind {
    Class,
    Constructor,
    Field,
    Method,
}

impl SuggestionKind {
    pub fn is_member(self) -> bool {
        matches!(self, SuggestionKind::Field | SuggestionKind::Method)
    }
}

/// One completion candidate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub simple_name: String,
    /// Class or declaring class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fully_qualified_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Field type or method return type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<TypeName>,
    /// Constructors and methods with parameters
    #[serde(default)]
    pub takes_arguments: bool,
    #[serde(default)]
    pub is_static: bool,
}

impl Suggestion {
    pub fn class(summary: &ClassSummary) -> Self {
        Self {
            kind: SuggestionKind::Class,
            simple_name: summary.simple_name.clone(),
            fully_qualified_name: Some(summary.fqcn.clone()),
            signature: Some(format!("{} {}", summary.kind_label(), summary.fqcn)),
            type_name: None,
            takes_arguments: false,
            is_static: false,
        }
    }

    pub fn constructor(constructor: &ConstructorDescriptor) -> Self {
        Self {
            kind: SuggestionKind::Constructor,
            simple_name: constructor.name.clone(),
            fully_qualified_name: Some(constructor.declaring_class.clone()),
            signature: Some(constructor.signature()),
            type_name: Some(TypeName::Reference(constructor.declaring_class.clone())),
            takes_arguments: !constructor.parameters.is_empty(),
            is_static: false,
        }
    }

    pub fn field(field: &FieldDescriptor) -> Self {
        Self {
            kind: SuggestionKind::Field,
            simple_name: field.name.clone(),
            fully_qualified_name: Some(field.declaring_class.clone()),
            signature: Some(field.signature()),
            type_name: Some(field.field_type.clone()),
            takes_arguments: false,
            is_static: field.is_static(),
        }
    }

    pub fn method(method: &MethodDescriptor) -> Self {
        Self {
            kind: SuggestionKind::Method,
            simple_name: method.name.clone(),
            fully_qualified_name: Some(method.declaring_class.clone()),
            signature: Some(method.signature()),
            type_name: Some(method.return_type.clone()),
            takes_arguments: !method.parameters.is_empty(),
            is_static: method.is_static(),
        }
    }

    /// Text inserted when the suggestion is accepted
    pub fn insert_text(&self) -> String {
        match self.kind {
            SuggestionKind::Class | SuggestionKind::Field => self.simple_name.clone(),
            SuggestionKind::Constructor | SuggestionKind::Method => {
                format!("{}()", self.simple_name)
            }
        }
    }
}

/// Why a query produced no suggestions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    /// The context was understood and nothing matched
    NoMatches,
    /// The receiver's type could not be recovered
    UnresolvedType,
    /// The provider was disposed
    Disposed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "suggestions", rename_all = "snake_case")]
pub enum SuggestionOutcome {
    /// The class index is not loaded yet; say nothing rather than "no matches"
    NotReady,
    Matches(Vec<Suggestion>),
    Empty(EmptyReason),
}

impl SuggestionOutcome {
    /// Suggestions, empty for every non-matching outcome
    pub fn suggestions(&self) -> &[Suggestion] {
        match self {
            SuggestionOutcome::Matches(suggestions) => suggestions,
            _ => &[],
        }
    }

    pub fn into_suggestions(self) -> Vec<Suggestion> {
        match self {
            SuggestionOutcome::Matches(suggestions) => suggestions,
            _ => Vec::new(),
        }
    }

    pub fn is_not_ready(&self) -> bool {
        matches!(self, SuggestionOutcome::NotReady)
    }
}
