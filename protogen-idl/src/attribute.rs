//! Attribute decorations on methods and fields.

use crate::types::PropertyValue;
use serde::{Deserialize, Serialize};

/// A language-agnostic decoration.
///
/// In the input model an attribute is a bare string (a literal), an object
/// with `name` and `args` (a call), an object with `name` and `value` (a
/// named argument), or `null` (a placeholder left behind by the parser).
/// Objects with any other keys are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged, deny_unknown_fields)]
pub enum Attribute {
    Literal(String),
    Named {
        name: String,
        value: PropertyValue,
    },
    Call {
        name: String,
        #[serde(default)]
        args: Vec<Attribute>,
    },
    Placeholder,
}

impl Attribute {
    pub fn literal(text: impl Into<String>) -> Self {
        Attribute::Literal(text.into())
    }

    pub fn call(name: impl Into<String>, args: Vec<Attribute>) -> Self {
        Attribute::Call {
            name: name.into(),
            args,
        }
    }

    pub fn named(name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Attribute::Named {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Name of a call or named argument, or the text of a literal.
    pub fn name(&self) -> Option<&str> {
        match self {
            Attribute::Literal(text) => Some(text),
            Attribute::Named { name, .. } | Attribute::Call { name, .. } => Some(name),
            Attribute::Placeholder => None,
        }
    }

    pub fn args(&self) -> &[Attribute] {
        match self {
            Attribute::Call { args, .. } => args,
            _ => &[],
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Attribute::Placeholder => true,
            Attribute::Literal(text) => text.trim().is_empty(),
            Attribute::Named { name, .. } | Attribute::Call { name, .. } => name.trim().is_empty(),
        }
    }

    /// Flatten to attribute text. Returns `None` for empty or placeholder nodes.
    pub fn render(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(match self {
            Attribute::Literal(text) => text.clone(),
            Attribute::Named { name, value } => format!("{} = {}", name, value),
            Attribute::Call { name, args } => {
                let rendered: Vec<String> = args.iter().filter_map(Attribute::render).collect();
                if rendered.is_empty() {
                    name.clone()
                } else {
                    format!("{}({})", name, rendered.join(", "))
                }
            }
            Attribute::Placeholder => unreachable!("placeholders are filtered above"),
        })
    }
}

/// Render a list of attributes, skipping empty nodes.
pub fn render_all(attributes: &[Attribute]) -> Vec<String> {
    attributes.iter().filter_map(Attribute::render).collect()
}
