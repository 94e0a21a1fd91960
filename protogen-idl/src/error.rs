//! Error types for loading and normalizing a protocol

use crate::search::Suggestion;
use std::fmt;
use thiserror::Error;

/// Failure to load the input model.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read protocol file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse protocol JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolveTypes,
    PropagateMetadata,
    NormalizeMethods,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::ResolveTypes => "type resolution",
            Stage::PropagateMetadata => "metadata propagation",
            Stage::NormalizeMethods => "method normalization",
        })
    }
}

/// One problem found while normalizing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("cyclic type alias: {}", .cycle.join(" -> "))]
    CyclicTypeAlias { cycle: Vec<String> },

    #[error("type alias `{name}` is declared more than once")]
    DuplicateTypeAlias { name: String },

    #[error("type alias `{name}` shadows a built-in primitive")]
    AliasShadowsPrimitive { name: String },

    #[error("{kind} `{name}` is declared more than once")]
    DuplicateDeclaration { kind: &'static str, name: String },

    #[error("method `{category}.{method}` has no server assignment")]
    MissingServerAssignment { category: String, method: String },

    #[error("method `{category}.{method}` references unknown server `{server}`{}", did_you_mean(.suggestions))]
    UnknownServer {
        category: String,
        method: String,
        server: String,
        suggestions: Vec<Suggestion>,
    },

    #[error("field `{category}.{method}.{field}` has unresolved type `{type_name}`{}", did_you_mean(.suggestions))]
    UnresolvedFieldType {
        category: String,
        method: String,
        field: String,
        type_name: String,
        suggestions: Vec<Suggestion>,
    },

    #[error("field `{field}` appears more than once in the {group} group of `{category}.{method}`")]
    DuplicateField {
        category: String,
        method: String,
        group: &'static str,
        field: String,
    },

    #[error("method `{category}.{method}` is marked `{attribute}` but names no result class")]
    MissingResultClass {
        category: String,
        method: String,
        attribute: String,
    },

    #[error("{entity} ordinal {ordinal} does not fit in {bits} bits")]
    OrdinalOverflow {
        entity: String,
        ordinal: usize,
        bits: u32,
    },

    #[error("invalid protocol config: {reason}")]
    InvalidConfig { reason: String },

    #[error("{count} servers declared but a server mask holds at most 64")]
    TooManyServers { count: usize },

    #[error("method `{category}.{method}` has non-boolean `{key}` value `{value}`")]
    InvalidPropertyValue {
        category: String,
        method: String,
        key: String,
        value: String,
    },
}

fn did_you_mean(suggestions: &[Suggestion]) -> String {
    match suggestions.first() {
        Some(s) => format!(" (did you mean `{}`?)", s.candidate),
        None => String::new(),
    }
}

/// Every error a stage found. The pipeline stops at the first failing stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: Stage,
    pub errors: Vec<NormalizeError>,
}

impl StageFailure {
    pub fn new(stage: Stage, errors: Vec<NormalizeError>) -> Self {
        Self { stage, errors }
    }

    /// `Ok(())` when `errors` is empty.
    pub fn check(stage: Stage, errors: Vec<NormalizeError>) -> Result<(), StageFailure> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(StageFailure::new(stage, errors))
        }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed with {} error{}",
            self.stage,
            self.errors.len(),
            if self.errors.len() == 1 { "" } else { "s" }
        )?;
        for error in &self.errors {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for StageFailure {}
