//! Template context built from a normalized model.
//!
//! Every value a template prints is computed here, already in target
//! spelling, so templates only iterate and substitute.

use crate::error::ProjectError;
use crate::options::TargetOptions;
use crate::type_map::TypeMap;
use protogen_idl::utils::to_pascal_case;
use protogen_idl::{
    BaseKind, FieldDescriptor, NormalizedCategory, NormalizedMethod, NormalizedModel, OrdinalDecl,
    WireIndex,
};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ProtocolView {
    pub name: String,
    pub namespace: String,
    pub fingerprint: String,
    pub server_encoding: String,
    pub message_id_bits: u32,
    pub category_bits: u32,
    pub method_bits: u32,
    pub array_length_bits: u32,
    pub servers: Vec<EnumEntry>,
    pub notifications: Vec<EnumEntry>,
    pub response_codes: Vec<EnumEntry>,
    pub categories: Vec<CategoryView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnumEntry {
    pub name: String,
    pub ordinal: usize,
    /// Value the generated identifier is assigned.
    pub id: u64,
    pub comment_lines: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub name: String,
    pub ordinal: usize,
    pub methods: Vec<MethodView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodView {
    pub name: String,
    pub comment_lines: Vec<String>,
    pub ordinal: usize,
    pub category_ordinal: usize,
    pub message_id: u64,
    pub attributes: Vec<String>,
    /// Server names in routing order.
    pub servers: Vec<String>,
    pub server_mask: u64,
    pub auth: bool,
    pub meta: Vec<MetaEntry>,
    pub is_collection: bool,
    pub base: BaseView,
    pub inputs: Vec<FieldView>,
    pub outputs: Vec<FieldView>,
    pub result: Option<ResultView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetaEntry {
    pub key: String,
    /// JSON literal of the value.
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BaseView {
    /// `message_handler` or `list_query`.
    pub kind: &'static str,
    pub result: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultView {
    pub name: String,
    pub fields: Vec<FieldView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    pub name: String,
    /// Type in target spelling.
    pub type_name: String,
    /// Canonical protocol type, e.g. `array<u64>`.
    pub protocol_type: String,
    pub attributes: Vec<String>,
    pub position: usize,
    /// `3` or `InputStartIndex + 3`.
    pub index: String,
    pub offset_symbol: Option<String>,
}

impl ProtocolView {
    pub fn build(
        model: &NormalizedModel,
        options: &TargetOptions,
        types: &TypeMap,
    ) -> Result<Self, ProjectError> {
        let servers = model
            .servers
            .iter()
            .map(|decl| {
                let id = options.server_encoding.id(decl.ordinal).ok_or_else(|| {
                    ProjectError::ServerIdOverflow {
                        server: decl.name.clone(),
                        ordinal: decl.ordinal,
                    }
                })?;
                Ok(EnumEntry::new(decl, id))
            })
            .collect::<Result<Vec<_>, ProjectError>>()?;

        let response_codes = model
            .response_codes
            .iter()
            .map(|decl| {
                let id = options
                    .response_code_base
                    .checked_add(decl.ordinal as u64)
                    .ok_or_else(|| ProjectError::ResponseCodeOverflow {
                        code: decl.name.clone(),
                        base: options.response_code_base,
                    })?;
                Ok(EnumEntry::new(decl, id))
            })
            .collect::<Result<Vec<_>, ProjectError>>()?;

        Ok(Self {
            name: model.name.clone(),
            namespace: options
                .namespace
                .clone()
                .unwrap_or_else(|| to_pascal_case(&model.name)),
            fingerprint: model.fingerprint()?,
            server_encoding: options.server_encoding.to_string(),
            message_id_bits: model.config.message_id_bits,
            category_bits: model.config.category_bits,
            method_bits: model.config.method_bits,
            array_length_bits: model.config.array_length_bits,
            servers,
            notifications: model
                .notifications
                .iter()
                .map(|decl| EnumEntry::new(decl, decl.ordinal as u64))
                .collect(),
            response_codes,
            categories: model
                .categories
                .iter()
                .map(|category| CategoryView::build(category, types))
                .collect(),
        })
    }
}

fn comment_lines(comment: Option<&str>) -> Vec<String> {
    comment
        .map(|c| c.lines().map(|l| l.trim_end().to_string()).collect())
        .unwrap_or_default()
}

impl EnumEntry {
    fn new(decl: &OrdinalDecl, id: u64) -> Self {
        Self {
            name: decl.name.clone(),
            ordinal: decl.ordinal,
            id,
            comment_lines: comment_lines(decl.comment.as_deref()),
        }
    }
}

impl CategoryView {
    fn build(category: &NormalizedCategory, types: &TypeMap) -> Self {
        Self {
            name: category.name.clone(),
            ordinal: category.ordinal,
            methods: category
                .methods
                .iter()
                .map(|method| MethodView::build(method, types))
                .collect(),
        }
    }
}

impl MethodView {
    fn build(method: &NormalizedMethod, types: &TypeMap) -> Self {
        let base = match &method.base {
            BaseKind::MessageHandler => BaseView {
                kind: "message_handler",
                result: None,
            },
            BaseKind::ListQuery { result, .. } => BaseView {
                kind: "list_query",
                result: Some(result.clone()),
            },
        };

        Self {
            name: method.name.clone(),
            comment_lines: comment_lines(method.comment.as_deref()),
            ordinal: method.ordinal,
            category_ordinal: method.category_ordinal,
            message_id: method.message_id,
            attributes: method.attributes.clone(),
            servers: method.servers.iter().map(|s| s.name.clone()).collect(),
            server_mask: method.server_mask,
            auth: method.auth,
            meta: method
                .meta
                .iter()
                .map(|(key, value)| MetaEntry {
                    key: key.clone(),
                    value: serde_json::to_string(value).unwrap_or_else(|_| value.to_string()),
                })
                .collect(),
            is_collection: method.is_collection(),
            base,
            inputs: field_views(&method.inputs, types),
            outputs: field_views(&method.outputs, types),
            result: method.result.as_ref().map(|r| ResultView {
                name: r.name.clone(),
                fields: field_views(&r.fields, types),
            }),
        }
    }
}

fn field_views(fields: &[FieldDescriptor], types: &TypeMap) -> Vec<FieldView> {
    fields.iter().map(|f| FieldView::build(f, types)).collect()
}

impl FieldView {
    fn build(field: &FieldDescriptor, types: &TypeMap) -> Self {
        let offset_symbol = match &field.index {
            WireIndex::Absolute { .. } => None,
            WireIndex::Offset { symbol, .. } => Some(symbol.clone()),
        };
        Self {
            name: field.name.clone(),
            type_name: types.render(&field.type_),
            protocol_type: field.type_.to_string(),
            attributes: field.attributes.clone(),
            position: field.index.position(),
            index: field.index.expr(),
            offset_symbol,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ServerEncoding;
    use protogen_idl::{normalize, parse_protocol_content, NormalizeOptions, Primitive};

    const PROTOCOL: &str = r#"{
        "name": "mini_chat",
        "types": [ { "name": "UserId", "type": "u64" } ],
        "servers": ["Global", "Chat"],
        "response_codes": ["Success", "Denied"],
        "categories": [
            {
                "name": "Chat",
                "properties": [ { "key": "server", "value": "Chat" }, { "key": "level", "value": 3 } ],
                "methods": [
                    {
                        "name": "Who",
                        "comment": "List members.\nPaged.",
                        "attributes": [ { "name": "List", "args": ["Member"] } ],
                        "in": [ { "name": "Room", "type": "u32" } ],
                        "out": [ { "name": "Id", "type": "array<UserId>" } ]
                    }
                ]
            }
        ]
    }"#;

    fn view(options: &TargetOptions) -> ProtocolView {
        let model = normalize(
            parse_protocol_content(PROTOCOL).unwrap(),
            &NormalizeOptions::default(),
        )
        .unwrap();
        let types = TypeMap::new(&[(Primitive::U64, "ulong")], "{T}[]", "Map<{K}, {V}>");
        ProtocolView::build(&model, options, &types).unwrap()
    }

    #[test]
    fn test_enumeration_ids() {
        let ordinal = view(&TargetOptions::default());
        assert_eq!(ordinal.namespace, "MiniChat");
        assert_eq!(ordinal.servers[1].id, 1);
        assert_eq!(ordinal.response_codes[0].id, 100);
        assert_eq!(ordinal.response_codes[1].id, 101);

        let flags = view(&TargetOptions {
            server_encoding: ServerEncoding::BitFlag,
            response_code_base: 200,
            namespace: Some("Game.Api".into()),
            ..Default::default()
        });
        assert_eq!(flags.namespace, "Game.Api");
        assert_eq!(flags.server_encoding, "bit_flag");
        let ids: Vec<_> = flags.servers.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(flags.response_codes[1].id, 201);
    }

    #[test]
    fn test_method_view() {
        let protocol = view(&TargetOptions::default());
        let who = &protocol.categories[0].methods[0];

        assert_eq!(who.comment_lines, vec!["List members.", "Paged."]);
        assert!(who.is_collection);
        assert_eq!(who.base.kind, "list_query");
        assert_eq!(who.base.result.as_deref(), Some("Member"));
        assert_eq!(who.meta[0].key, "level");
        assert_eq!(who.meta[0].value, "3");

        assert_eq!(who.inputs[0].index, "InputStartIndex + 0");
        assert_eq!(who.inputs[0].offset_symbol.as_deref(), Some("InputStartIndex"));

        let result = who.result.as_ref().unwrap();
        assert_eq!(result.fields[0].type_name, "ulong[]");
        assert_eq!(result.fields[0].protocol_type, "array<u64>");
        assert_eq!(result.fields[0].index, "0");
    }

    #[test]
    fn test_response_code_base_overflow() {
        let model = normalize(
            parse_protocol_content(PROTOCOL).unwrap(),
            &NormalizeOptions::default(),
        )
        .unwrap();
        let types = TypeMap::canonical();

        let options = TargetOptions {
            response_code_base: u64::MAX,
            ..Default::default()
        };
        let err = ProtocolView::build(&model, &options, &types).unwrap_err();

        assert!(matches!(
            err,
            ProjectError::ResponseCodeOverflow { ref code, .. } if code == "Denied"
        ));
    }
}
