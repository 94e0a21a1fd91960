//! The normalized, render-ready model.
//!
//! Everything a projector needs is decided here; nothing in this module
//! depends on a target language.

use crate::error::NormalizeError;
use crate::type_ref::TypeRef;
use crate::types::{PropertyValue, ProtoConfig, TypeAlias};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct NormalizedModel {
    pub name: String,
    pub config: ProtoConfig,
    /// Alias table after resolution.
    pub types: Vec<TypeAlias>,
    pub servers: Vec<OrdinalDecl>,
    pub notifications: Vec<OrdinalDecl>,
    pub response_codes: Vec<OrdinalDecl>,
    pub categories: Vec<NormalizedCategory>,
    /// Non-fatal findings, such as field types that resolved to neither a
    /// primitive nor a declared extern type.
    #[serde(skip)]
    pub diagnostics: Vec<NormalizeError>,
}

impl NormalizedModel {
    pub fn methods(&self) -> impl Iterator<Item = (&NormalizedCategory, &NormalizedMethod)> {
        self.categories
            .iter()
            .flat_map(|c| c.methods.iter().map(move |m| (c, m)))
    }

    pub fn find_method(&self, category: &str, method: &str) -> Option<&NormalizedMethod> {
        self.categories
            .iter()
            .find(|c| c.name == category)
            .and_then(|c| c.methods.iter().find(|m| m.name == method))
    }
}

/// A declaration with its position in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrdinalDecl {
    pub name: String,
    pub ordinal: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NormalizedCategory {
    pub name: String,
    pub ordinal: usize,
    pub methods: Vec<NormalizedMethod>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerRef {
    pub name: String,
    pub ordinal: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct NormalizedMethod {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Position within the category.
    pub ordinal: usize,
    pub category_ordinal: usize,
    pub message_id: u64,
    /// Rendered attribute text, list attribute excluded.
    pub attributes: Vec<String>,
    pub servers: Vec<ServerRef>,
    /// OR of `1 << ordinal` over the method's servers.
    pub server_mask: u64,
    pub auth: bool,
    /// Inherited metadata other than servers.
    pub meta: BTreeMap<String, PropertyValue>,
    pub base: BaseKind,
    pub inputs: Vec<FieldDescriptor>,
    /// Empty for collection methods; their outputs live on `result`.
    pub outputs: Vec<FieldDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultType>,
}

impl NormalizedMethod {
    pub fn is_collection(&self) -> bool {
        matches!(self.base, BaseKind::ListQuery { .. })
    }
}

/// Base capability a method's generated type binds to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BaseKind {
    MessageHandler,
    ListQuery { method: String, result: String },
}

/// Nested result type of a collection method.
#[derive(Debug, Clone, Serialize)]
pub struct ResultType {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: TypeRef,
    pub attributes: Vec<String>,
    pub index: WireIndex,
}

/// Wire index of a field within its group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WireIndex {
    /// Counted from zero.
    Absolute { position: usize },
    /// Counted from a named per-method constant.
    Offset { symbol: String, position: usize },
}

impl WireIndex {
    pub fn position(&self) -> usize {
        match self {
            WireIndex::Absolute { position } | WireIndex::Offset { position, .. } => *position,
        }
    }

    /// `3` or `InputStartIndex + 3`.
    pub fn expr(&self) -> String {
        match self {
            WireIndex::Absolute { position } => position.to_string(),
            WireIndex::Offset { symbol, position } => format!("{} + {}", symbol, position),
        }
    }
}
