//! Mapping from protocol type references to target type names

use protogen_idl::{Primitive, TypeRef};
use std::collections::BTreeMap;

/// Target spelling of every primitive plus composite formats.
///
/// Composite formats use `{T}` for the element type and `{K}` / `{V}` for
/// map keys and values. Named types render as their name unless overridden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMap {
    primitives: BTreeMap<Primitive, String>,
    named: BTreeMap<String, String>,
    array: String,
    map: String,
}

impl TypeMap {
    pub fn new(
        primitives: &[(Primitive, &str)],
        array: impl Into<String>,
        map: impl Into<String>,
    ) -> Self {
        Self {
            primitives: primitives
                .iter()
                .map(|(p, name)| (*p, name.to_string()))
                .collect(),
            named: BTreeMap::new(),
            array: array.into(),
            map: map.into(),
        }
    }

    /// Protocol spelling: primitive tags, `array<T>` and `map<K, V>`.
    pub fn canonical() -> Self {
        Self::new(&[], "array<{T}>", "map<{K}, {V}>")
    }

    /// Apply user overrides on top of the built-in names.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, String>) -> Self {
        for (key, name) in overrides {
            match key.as_str() {
                "array" => self.array = name.clone(),
                "map" => self.map = name.clone(),
                other => match Primitive::from_tag(other) {
                    Some(p) => {
                        self.primitives.insert(p, name.clone());
                    }
                    None => {
                        self.named.insert(other.to_string(), name.clone());
                    }
                },
            }
        }
        self
    }

    pub fn render(&self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::Primitive(p) => self
                .primitives
                .get(p)
                .cloned()
                .unwrap_or_else(|| p.tag().to_string()),
            TypeRef::Named(name) => self.named.get(name).cloned().unwrap_or_else(|| name.clone()),
            TypeRef::Array(inner) => self.array.replace("{T}", &self.render(inner)),
            TypeRef::Map(key, value) => self
                .map
                .replace("{K}", &self.render(key))
                .replace("{V}", &self.render(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> TypeMap {
        TypeMap::new(
            &[(Primitive::U64, "ulong"), (Primitive::String, "string")],
            "List<{T}>",
            "Dictionary<{K}, {V}>",
        )
    }

    #[test]
    fn test_render_nested() {
        let ty: TypeRef = "map<string, array<u64>>".parse().unwrap();
        assert_eq!(map().render(&ty), "Dictionary<string, List<ulong>>");
    }

    #[test]
    fn test_canonical_round_trips_protocol_spelling() {
        let ty: TypeRef = "map<string, array<Vector3>>".parse().unwrap();
        assert_eq!(TypeMap::canonical().render(&ty), ty.to_string());
    }

    #[test]
    fn test_unmapped_primitive_falls_back_to_tag() {
        assert_eq!(map().render(&TypeRef::Primitive(Primitive::F32)), "f32");
    }

    #[test]
    fn test_overrides() {
        let overrides = BTreeMap::from([
            ("u64".to_string(), "UInt64".to_string()),
            ("array".to_string(), "{T}[]".to_string()),
            ("Vector3".to_string(), "UnityEngine.Vector3".to_string()),
        ]);
        let types = map().with_overrides(&overrides);

        let ty: TypeRef = "array<u64>".parse().unwrap();
        assert_eq!(types.render(&ty), "UInt64[]");
        assert_eq!(
            types.render(&TypeRef::named("Vector3")),
            "UnityEngine.Vector3"
        );
        assert_eq!(types.render(&TypeRef::named("Other")), "Other");
    }
}
