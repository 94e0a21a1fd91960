//! Protocol model loading

use crate::error::ParseError;
use crate::types::ProtocolSpec;
use std::fs;
use std::path::Path;

pub fn parse_protocol_file<P: AsRef<Path>>(path: P) -> Result<ProtocolSpec, ParseError> {
    let content = fs::read_to_string(&path).map_err(|source| ParseError::Io {
        path: path.as_ref().display().to_string(),
        source,
    })?;

    parse_protocol_content(&content)
}

pub fn parse_protocol_content(content: &str) -> Result<ProtocolSpec, ParseError> {
    Ok(serde_json::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Attribute;
    use crate::type_ref::{Primitive, TypeRef};
    use crate::types::PropertyValue;

    #[test]
    fn test_minimal_protocol_parses_with_defaults() {
        let json = r#"{ "categories": [] }"#;
        let spec = parse_protocol_content(json).expect("minimal protocol should parse");

        assert_eq!(spec.get_name(), "protocol");
        assert_eq!(spec.config.message_id_bits, 16);
        assert_eq!(spec.config.category_bits, 8);
        assert!(spec.types.is_empty());
        assert!(spec.servers.is_empty());
    }

    #[test]
    fn test_method_shape() {
        let json = r#"{
            "name": "starfall",
            "config": { "method_bits": 6 },
            "types": [ { "name": "UserId", "type": "u64" } ],
            "servers": ["Global"],
            "categories": [
                {
                    "name": "Account",
                    "properties": [ { "key": "server", "value": "Global" } ],
                    "methods": [
                        {
                            "name": "Login",
                            "comment": "Authenticate a user.",
                            "attributes": ["Anonymous"],
                            "properties": [ { "key": "auth", "value": false } ],
                            "in": [
                                { "name": "Email", "type": "string", "attributes": ["Required"] }
                            ],
                            "out": [
                                { "name": "UserId", "type": "UserId" }
                            ]
                        }
                    ]
                }
            ]
        }"#;
        let spec = parse_protocol_content(json).unwrap();

        assert_eq!(spec.config.method_bits, 6);
        assert_eq!(spec.config.category_bits, 8, "unset config keys keep defaults");
        assert_eq!(spec.types[0].underlying, TypeRef::Primitive(Primitive::U64));

        let account = spec.find_category("Account").unwrap();
        let login = &account.methods[0];
        assert_eq!(login.comment.as_deref(), Some("Authenticate a user."));
        assert_eq!(login.attributes, vec![Attribute::literal("Anonymous")]);
        assert_eq!(login.properties[0].value, PropertyValue::Bool(false));
        assert_eq!(login.inputs[0].type_, TypeRef::Primitive(Primitive::String));
        assert_eq!(login.outputs[0].type_, TypeRef::named("UserId"));
        assert!(login.meta.servers.is_empty(), "meta is never read from input");
    }

    #[test]
    fn test_malformed_type_is_a_parse_error() {
        let json = r#"{
            "categories": [
                { "name": "A", "methods": [ { "name": "M", "in": [ { "name": "x", "type": "array<u8" } ] } ] }
            ]
        }"#;
        let err = parse_protocol_content(json).unwrap_err();
        assert!(err.to_string().contains("invalid type reference"));
    }

    #[test]
    fn test_missing_file() {
        let err = parse_protocol_file("/nonexistent/protocol.json").unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }
}
