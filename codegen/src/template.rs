//! Tera-backed projector

use crate::context::ProtocolView;
use crate::error::ProjectError;
use crate::options::TargetOptions;
use crate::projector::Projector;
use crate::type_map::TypeMap;
use protogen_idl::utils::{to_camel_case, to_pascal_case, to_snake_case};
use protogen_idl::NormalizedModel;
use std::collections::HashMap;
use std::path::Path;
use tera::{Context, Tera, Value};

/// Renders one compiled template against a [`ProtocolView`].
pub struct TemplateProjector {
    target: String,
    tera: Tera,
    types: TypeMap,
    options: TargetOptions,
}

impl TemplateProjector {
    /// Compile `source` for `target`. Syntax errors surface here, before
    /// any model is rendered.
    pub fn new(
        target: impl Into<String>,
        source: &str,
        types: TypeMap,
        options: TargetOptions,
    ) -> Result<Self, ProjectError> {
        let target = target.into();
        let mut tera = Tera::default();
        // generated code is not HTML
        tera.autoescape_on(vec![]);
        register_filters(&mut tera);
        tera.add_raw_template(&target, source)
            .map_err(|err| ProjectError::syntax(&target, err))?;

        let types = types.with_overrides(&options.types);
        Ok(Self {
            target,
            tera,
            types,
            options,
        })
    }

    pub fn from_file<P: AsRef<Path>>(
        target: impl Into<String>,
        path: P,
        types: TypeMap,
        options: TargetOptions,
    ) -> Result<Self, ProjectError> {
        let source =
            std::fs::read_to_string(&path).map_err(|source| ProjectError::TemplateIo {
                path: path.as_ref().display().to_string(),
                source,
            })?;
        Self::new(target, &source, types, options)
    }

    pub fn options(&self) -> &TargetOptions {
        &self.options
    }
}

impl Projector for TemplateProjector {
    fn target(&self) -> &str {
        &self.target
    }

    fn project(&self, model: &NormalizedModel) -> Result<String, ProjectError> {
        let view = ProtocolView::build(model, &self.options, &self.types)?;
        let context =
            Context::from_serialize(&view).map_err(|err| ProjectError::binding(&self.target, err))?;
        let text = self
            .tera
            .render(&self.target, &context)
            .map_err(|err| ProjectError::binding(&self.target, err))?;
        tracing::debug!(target_name = %self.target, bytes = text.len(), "rendered target");
        Ok(text)
    }
}

fn register_filters(tera: &mut Tera) {
    tera.register_filter("pascal_case", case_filter("pascal_case", to_pascal_case));
    tera.register_filter("snake_case", case_filter("snake_case", to_snake_case));
    tera.register_filter("camel_case", case_filter("camel_case", to_camel_case));
}

fn case_filter(
    name: &'static str,
    convert: fn(&str) -> String,
) -> impl Fn(&Value, &HashMap<String, Value>) -> tera::Result<Value> + Send + Sync {
    move |value: &Value, _args: &HashMap<String, Value>| match value.as_str() {
        Some(text) => Ok(Value::String(convert(text))),
        None => Err(tera::Error::msg(format!(
            "filter `{}` expects a string, got {}",
            name, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protogen_idl::{normalize, parse_protocol_content, NormalizeOptions, Primitive};

    fn model() -> NormalizedModel {
        let spec = parse_protocol_content(
            r#"{
                "name": "echo",
                "servers": ["Global"],
                "categories": [
                    {
                        "name": "Misc",
                        "properties": [ { "key": "server", "value": "Global" } ],
                        "methods": [
                            { "name": "PingPong", "in": [ { "name": "seq_no", "type": "u32" } ] }
                        ]
                    }
                ]
            }"#,
        )
        .unwrap();
        normalize(spec, &NormalizeOptions::default()).unwrap()
    }

    fn types() -> TypeMap {
        TypeMap::new(&[(Primitive::U32, "uint")], "{T}[]", "Map<{K}, {V}>")
    }

    #[test]
    fn test_render_with_filters() {
        let template = "{% for c in categories %}{% for m in c.methods %}\
            {{ m.name | snake_case }} {{ m.inputs.0.name | camel_case }}:{{ m.inputs.0.type_name }} \
            {{ c.name | pascal_case }}#{{ m.message_id }}{% endfor %}{% endfor %}";
        let projector =
            TemplateProjector::new("test", template, types(), TargetOptions::default()).unwrap();

        let text = projector.project(&model()).unwrap();

        assert_eq!(text, "ping_pong seqNo:uint Misc#0");
    }

    #[test]
    fn test_no_html_escaping() {
        let projector = TemplateProjector::new(
            "test",
            "{{ categories.0.methods.0.inputs.0.type_name }}",
            TypeMap::new(&[(Primitive::U32, "List<uint>")], "{T}[]", "{K}{V}"),
            TargetOptions::default(),
        )
        .unwrap();

        assert_eq!(projector.project(&model()).unwrap(), "List<uint>");
    }

    #[test]
    fn test_syntax_error_at_construction() {
        let err = TemplateProjector::new("broken", "{% for x in %}", types(), TargetOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, ProjectError::TemplateSyntax { ref target, .. } if target == "broken"));
    }

    #[test]
    fn test_unbound_variable_is_binding_failure() {
        let projector =
            TemplateProjector::new("test", "{{ no_such_value }}", types(), TargetOptions::default())
                .unwrap();

        let err = projector.project(&model()).unwrap_err();

        match err {
            ProjectError::TemplateBinding { target, message } => {
                assert_eq!(target, "test");
                assert!(message.contains("no_such_value"), "{}", message);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_type_overrides_from_options() {
        let options = TargetOptions {
            types: [("u32".to_string(), "UInt32".to_string())].into_iter().collect(),
            ..Default::default()
        };
        let projector = TemplateProjector::new(
            "test",
            "{{ categories.0.methods.0.inputs.0.type_name }}",
            types(),
            options,
        )
        .unwrap();

        assert_eq!(projector.project(&model()).unwrap(), "UInt32");
    }

    #[test]
    fn test_missing_template_file() {
        let err = TemplateProjector::from_file(
            "custom",
            "/nonexistent/custom.tera",
            types(),
            TargetOptions::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ProjectError::TemplateIo { .. }));
    }
}
