//! Type references as written in the protocol model.
//!
//! A type reference is either a built-in primitive, a name (an alias or an
//! externally defined type), or a composite of those:
//!
//! ```text
//! u32
//! UserId
//! array<UserId>
//! map<string, array<u8>>
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Built-in primitive tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Bool,
    String,
    Bytes,
}

impl Primitive {
    pub const ALL: &'static [Primitive] = &[
        Primitive::I8,
        Primitive::U8,
        Primitive::I16,
        Primitive::U16,
        Primitive::I32,
        Primitive::U32,
        Primitive::I64,
        Primitive::U64,
        Primitive::F32,
        Primitive::F64,
        Primitive::Bool,
        Primitive::String,
        Primitive::Bytes,
    ];

    pub fn from_tag(tag: &str) -> Option<Primitive> {
        match tag {
            "i8" => Some(Primitive::I8),
            "u8" => Some(Primitive::U8),
            "i16" => Some(Primitive::I16),
            "u16" => Some(Primitive::U16),
            "i32" => Some(Primitive::I32),
            "u32" => Some(Primitive::U32),
            "i64" => Some(Primitive::I64),
            "u64" => Some(Primitive::U64),
            "f32" => Some(Primitive::F32),
            "f64" => Some(Primitive::F64),
            "bool" => Some(Primitive::Bool),
            "string" => Some(Primitive::String),
            "bytes" => Some(Primitive::Bytes),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Primitive::I8 => "i8",
            Primitive::U8 => "u8",
            Primitive::I16 => "i16",
            Primitive::U16 => "u16",
            Primitive::I32 => "i32",
            Primitive::U32 => "u32",
            Primitive::I64 => "i64",
            Primitive::U64 => "u64",
            Primitive::F32 => "f32",
            Primitive::F64 => "f64",
            Primitive::Bool => "bool",
            Primitive::String => "string",
            Primitive::Bytes => "bytes",
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A possibly composite type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeRef {
    Primitive(Primitive),
    Named(String),
    Array(Box<TypeRef>),
    Map(Box<TypeRef>, Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    /// Every name referenced anywhere inside this type, in reading order.
    pub fn named_refs(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TypeRef::Primitive(_) => {}
            TypeRef::Named(name) => out.push(name),
            TypeRef::Array(inner) => inner.collect_names(out),
            TypeRef::Map(key, value) => {
                key.collect_names(out);
                value.collect_names(out);
            }
        }
    }

    /// Rebuild this type with every name replaced by `f(name)`.
    pub fn map_names<F>(&self, f: &mut F) -> TypeRef
    where
        F: FnMut(&str) -> TypeRef,
    {
        match self {
            TypeRef::Primitive(p) => TypeRef::Primitive(*p),
            TypeRef::Named(name) => f(name),
            TypeRef::Array(inner) => TypeRef::Array(Box::new(inner.map_names(f))),
            TypeRef::Map(key, value) => {
                TypeRef::Map(Box::new(key.map_names(f)), Box::new(value.map_names(f)))
            }
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive(p) => write!(f, "{}", p),
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::Array(inner) => write!(f, "array<{}>", inner),
            TypeRef::Map(key, value) => write!(f, "map<{}, {}>", key, value),
        }
    }
}

impl From<TypeRef> for String {
    fn from(ty: TypeRef) -> Self {
        ty.to_string()
    }
}

impl TryFrom<String> for TypeRef {
    type Error = TypeRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid type reference `{input}`: {reason}")]
pub struct TypeRefError {
    pub input: String,
    pub reason: String,
}

impl FromStr for TypeRef {
    type Err = TypeRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = TypeRefParser { input: s, pos: 0 };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != s.len() {
            return Err(parser.error("trailing characters"));
        }
        Ok(ty)
    }
}

struct TypeRefParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> TypeRefParser<'a> {
    fn error(&self, reason: &str) -> TypeRefError {
        TypeRefError {
            input: self.input.to_string(),
            reason: format!("{} at offset {}", reason, self.pos),
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn expect(&mut self, c: char) -> Result<(), TypeRefError> {
        self.skip_ws();
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            Ok(())
        } else {
            Err(self.error(&format!("expected `{}`", c)))
        }
    }

    fn ident(&mut self) -> Result<&'a str, TypeRefError> {
        self.skip_ws();
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_' || *c == '.'))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        if len == 0 || rest.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(self.error("expected a type name"));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn parse_type(&mut self) -> Result<TypeRef, TypeRefError> {
        let name = self.ident()?;
        match name {
            "array" => {
                self.expect('<')?;
                let inner = self.parse_type()?;
                self.expect('>')?;
                Ok(TypeRef::Array(Box::new(inner)))
            }
            "map" => {
                self.expect('<')?;
                let key = self.parse_type()?;
                self.expect(',')?;
                let value = self.parse_type()?;
                self.expect('>')?;
                Ok(TypeRef::Map(Box::new(key), Box::new(value)))
            }
            other => Ok(match Primitive::from_tag(other) {
                Some(p) => TypeRef::Primitive(p),
                None => TypeRef::Named(other.to_string()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primitive_and_named() {
        assert_eq!(
            "u32".parse::<TypeRef>().unwrap(),
            TypeRef::Primitive(Primitive::U32)
        );
        assert_eq!(
            "UserId".parse::<TypeRef>().unwrap(),
            TypeRef::named("UserId")
        );
    }

    #[test]
    fn test_parse_nested_composites() {
        let ty: TypeRef = "map<string, array< UserId >>".parse().unwrap();
        assert_eq!(
            ty,
            TypeRef::Map(
                Box::new(TypeRef::Primitive(Primitive::String)),
                Box::new(TypeRef::Array(Box::new(TypeRef::named("UserId")))),
            )
        );
        assert_eq!(ty.to_string(), "map<string, array<UserId>>");
        assert_eq!(ty.named_refs(), vec!["UserId"]);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("array<u8".parse::<TypeRef>().is_err());
        assert!("map<u8>".parse::<TypeRef>().is_err());
        assert!("".parse::<TypeRef>().is_err());
        assert!("u8 u16".parse::<TypeRef>().is_err());
        assert!("9lives".parse::<TypeRef>().is_err());
    }

    #[test]
    fn test_primitive_tags_round_trip() {
        for p in Primitive::ALL {
            assert_eq!(Primitive::from_tag(p.tag()), Some(*p));
        }
    }
}
