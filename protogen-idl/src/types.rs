//! Input model: the protocol as handed over by the parser.

use crate::attribute::Attribute;
use crate::type_ref::TypeRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProtocolSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub config: ProtoConfig,
    #[serde(default)]
    pub types: Vec<TypeAlias>,
    #[serde(default)]
    pub servers: Vec<Declaration>,
    #[serde(default)]
    pub notifications: Vec<Declaration>,
    #[serde(default)]
    pub response_codes: Vec<Declaration>,
    pub categories: Vec<Category>,
}

impl ProtocolSpec {
    pub fn get_name(&self) -> &str {
        self.name.as_deref().unwrap_or("protocol")
    }

    pub fn find_category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }
}

/// Wire layout limits for generated identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProtoConfig {
    pub message_id_bits: u32,
    pub category_bits: u32,
    pub method_bits: u32,
    pub array_length_bits: u32,
}

impl Default for ProtoConfig {
    fn default() -> Self {
        Self {
            message_id_bits: 16,
            category_bits: 8,
            method_bits: 8,
            array_length_bits: 16,
        }
    }
}

impl ProtoConfig {
    /// Largest ordinal representable in `bits`.
    pub fn max_ordinal(bits: u32) -> u64 {
        if bits >= 64 {
            u64::MAX
        } else {
            (1u64 << bits) - 1
        }
    }

    /// `(category << method_bits) | method`, or `None` when the category
    /// ordinal does not survive the shift.
    pub fn message_id(&self, category: usize, method: usize) -> Option<u64> {
        let category = category as u64;
        let shifted = if category == 0 {
            0
        } else {
            let shifted = category.checked_shl(self.method_bits)?;
            if shifted >> self.method_bits != category {
                return None;
            }
            shifted
        };
        Some(shifted | method as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TypeAlias {
    pub name: String,
    #[serde(rename = "type")]
    pub underlying: TypeRef,
}

impl TypeAlias {
    pub fn new(name: impl Into<String>, underlying: TypeRef) -> Self {
        Self {
            name: name.into(),
            underlying,
        }
    }
}

/// A server, notification, or response code declaration.
///
/// Accepts either a bare name or `{"name": ..., "comment": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "DeclarationRepr")]
pub struct Declaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Declaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DeclarationRepr {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        comment: Option<String>,
    },
}

impl From<DeclarationRepr> for Declaration {
    fn from(repr: DeclarationRepr) -> Self {
        match repr {
            DeclarationRepr::Name(name) => Declaration::new(name),
            DeclarationRepr::Full { name, comment } => Declaration { name, comment },
        }
    }
}

/// A scalar property value (`server = Global`, `auth = true`, `timeout = 30`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl PropertyValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            PropertyValue::Text(s) if s.eq_ignore_ascii_case("true") => Some(true),
            PropertyValue::Text(s) if s.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Int(i) => write!(f, "{}", i),
            PropertyValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Text(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Int(i)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Property {
    pub key: String,
    pub value: PropertyValue,
}

impl Property {
    pub fn new(key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Category {
    pub name: String,
    /// Inheritable defaults, applied in declaration order.
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Method {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    /// Key/value properties declared on the method itself.
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(rename = "in", default)]
    pub inputs: Vec<Field>,
    #[serde(rename = "out", default)]
    pub outputs: Vec<Field>,
    /// Populated by metadata propagation.
    #[serde(skip)]
    pub meta: MethodMeta,
}

impl Method {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: None,
            attributes: Vec::new(),
            properties: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            meta: MethodMeta::default(),
        }
    }
}

/// Method metadata after inheritance.
///
/// Server exposure accumulates into an ordered list; every other key is
/// set at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MethodMeta {
    pub servers: Vec<String>,
    pub values: BTreeMap<String, PropertyValue>,
}

impl MethodMeta {
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.values.get(key)
    }

    /// Record `value` for `key` unless the key is already present.
    /// Returns whether the value was recorded.
    pub fn set_once(&mut self, key: &str, value: &PropertyValue) -> bool {
        if self.values.contains_key(key) {
            return false;
        }
        self.values.insert(key.to_string(), value.clone());
        true
    }

    /// Append a server unless already listed. Returns whether it was added.
    pub fn add_server(&mut self, server: &str) -> bool {
        if self.servers.iter().any(|s| s == server) {
            return false;
        }
        self.servers.push(server.to_string());
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: TypeRef,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl Field {
    pub fn new(name: impl Into<String>, type_: TypeRef) -> Self {
        Self {
            name: name.into(),
            type_,
            attributes: Vec::new(),
        }
    }
}
