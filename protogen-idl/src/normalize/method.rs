//! Method shape normalization.

use super::model::{
    BaseKind, FieldDescriptor, NormalizedCategory, NormalizedMethod, NormalizedModel, OrdinalDecl,
    ResultType, ServerRef, WireIndex,
};
use super::resolve::TypeResolver;
use super::NormalizeOptions;
use crate::attribute::{Attribute, render_all};
use crate::error::{NormalizeError, Stage, StageFailure};
use crate::search::{suggest_similar, DEFAULT_MAX_DISTANCE};
use crate::type_ref::Primitive;
use crate::types::{
    Category, Declaration, Field, Method, PropertyValue, ProtoConfig, ProtocolSpec,
};
use std::collections::{BTreeMap, HashSet};

/// Collects errors and warnings for one normalization pass.
struct Normalizer<'a> {
    resolver: &'a TypeResolver,
    options: &'a NormalizeOptions,
    servers: BTreeMap<&'a str, usize>,
    errors: Vec<NormalizeError>,
    warnings: Vec<NormalizeError>,
}

/// Where the method's nested result type name comes from, if it has one.
enum Shape<'a> {
    Scalar,
    Collection { list_attribute: &'a Attribute },
}

/// Stage 3: derive render-ready method descriptors.
pub fn normalize_methods(
    spec: &ProtocolSpec,
    resolver: &TypeResolver,
    options: &NormalizeOptions,
) -> Result<NormalizedModel, StageFailure> {
    let mut normalizer = Normalizer {
        resolver,
        options,
        servers: spec
            .servers
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name.as_str(), i))
            .collect(),
        errors: Vec::new(),
        warnings: Vec::new(),
    };

    let config_ok = normalizer.check_config(&spec.config);
    if spec.servers.len() > 64 {
        normalizer.errors.push(NormalizeError::TooManyServers {
            count: spec.servers.len(),
        });
    }

    let notifications = normalizer.ordinals("notification", &spec.notifications);
    let response_codes = normalizer.ordinals("response code", &spec.response_codes);
    let servers = normalizer.ordinals("server", &spec.servers);

    let mut category_names = HashSet::new();
    let mut categories = Vec::with_capacity(spec.categories.len());
    for (ordinal, category) in spec.categories.iter().enumerate() {
        if !category_names.insert(category.name.as_str()) {
            normalizer.errors.push(NormalizeError::DuplicateDeclaration {
                kind: "category",
                name: category.name.clone(),
            });
        }
        // no descriptors without a usable bit layout
        if !config_ok {
            continue;
        }
        normalizer.check_ordinal(
            || format!("category `{}`", category.name),
            ordinal,
            spec.config.category_bits,
        );
        categories.push(normalizer.category(&spec.config, ordinal, category));
    }

    let Normalizer {
        errors, warnings, ..
    } = normalizer;

    for warning in &warnings {
        tracing::warn!("{}", warning);
    }
    StageFailure::check(Stage::NormalizeMethods, errors)?;

    Ok(NormalizedModel {
        name: spec.get_name().to_string(),
        config: spec.config,
        types: spec.types.clone(),
        servers,
        notifications,
        response_codes,
        categories,
        diagnostics: warnings,
    })
}

impl<'a> Normalizer<'a> {
    /// Returns `false` when the bit layout cannot pack message ids.
    fn check_config(&mut self, config: &ProtoConfig) -> bool {
        let before = self.errors.len();
        if config.message_id_bits > 64 {
            self.errors.push(NormalizeError::InvalidConfig {
                reason: format!(
                    "message_id_bits is {} but message ids are at most 64 bits",
                    config.message_id_bits
                ),
            });
        }
        let packed = config.category_bits.checked_add(config.method_bits);
        if packed.map_or(true, |bits| bits > config.message_id_bits) {
            self.errors.push(NormalizeError::InvalidConfig {
                reason: format!(
                    "category_bits ({}) + method_bits ({}) exceed message_id_bits ({})",
                    config.category_bits, config.method_bits, config.message_id_bits
                ),
            });
        }
        self.errors.len() == before
    }

    fn check_ordinal(&mut self, entity: impl FnOnce() -> String, ordinal: usize, bits: u32) {
        if ordinal as u64 > ProtoConfig::max_ordinal(bits) {
            self.errors.push(NormalizeError::OrdinalOverflow {
                entity: entity(),
                ordinal,
                bits,
            });
        }
    }

    fn ordinals(&mut self, kind: &'static str, decls: &[Declaration]) -> Vec<OrdinalDecl> {
        let mut seen = HashSet::new();
        decls
            .iter()
            .enumerate()
            .map(|(ordinal, decl)| {
                // duplicate servers were already reported during propagation
                if !seen.insert(decl.name.as_str()) && kind != "server" {
                    self.errors.push(NormalizeError::DuplicateDeclaration {
                        kind,
                        name: decl.name.clone(),
                    });
                }
                OrdinalDecl {
                    name: decl.name.clone(),
                    ordinal,
                    comment: decl.comment.clone(),
                }
            })
            .collect()
    }

    fn category(
        &mut self,
        config: &ProtoConfig,
        ordinal: usize,
        category: &Category,
    ) -> NormalizedCategory {
        let mut method_names = HashSet::new();
        let mut methods = Vec::with_capacity(category.methods.len());
        for (method_ordinal, method) in category.methods.iter().enumerate() {
            if !method_names.insert(method.name.as_str()) {
                self.errors.push(NormalizeError::DuplicateDeclaration {
                    kind: "method",
                    name: format!("{}.{}", category.name, method.name),
                });
            }
            self.check_ordinal(
                || format!("method `{}.{}`", category.name, method.name),
                method_ordinal,
                config.method_bits,
            );
            if let Some(normalized) = self.method(config, category, ordinal, method_ordinal, method)
            {
                methods.push(normalized);
            }
        }
        NormalizedCategory {
            name: category.name.clone(),
            ordinal,
            methods,
        }
    }

    fn shape<'m>(&self, method: &'m Method) -> Shape<'m> {
        match method
            .attributes
            .iter()
            .find(|a| a.name() == Some(self.options.list_attribute.as_str()))
        {
            Some(list_attribute) => Shape::Collection { list_attribute },
            None => Shape::Scalar,
        }
    }

    /// Class name from `List(class = Entry)` or `List(Entry)`.
    fn result_class<'m>(&self, list_attribute: &'m Attribute) -> Option<&'m str> {
        let args = list_attribute.args();
        args.iter()
            .find_map(|arg| match arg {
                Attribute::Named {
                    name,
                    value: PropertyValue::Text(value),
                } if *name == self.options.result_class_arg => Some(value.as_str()),
                _ => None,
            })
            .or_else(|| {
                args.iter().find_map(|arg| match arg {
                    Attribute::Literal(text) if !text.trim().is_empty() => Some(text.as_str()),
                    _ => None,
                })
            })
            .map(|name| name.trim_matches('"'))
    }

    fn method(
        &mut self,
        config: &ProtoConfig,
        category: &Category,
        category_ordinal: usize,
        ordinal: usize,
        method: &Method,
    ) -> Option<NormalizedMethod> {
        let shape = self.shape(method);

        let attributes = match &shape {
            Shape::Collection { list_attribute } => {
                let kept: Vec<Attribute> = method
                    .attributes
                    .iter()
                    .filter(|a| !std::ptr::eq(*a, *list_attribute))
                    .cloned()
                    .collect();
                render_all(&kept)
            }
            Shape::Scalar => render_all(&method.attributes),
        };

        let (base, inputs, outputs, result) = match shape {
            Shape::Scalar => {
                let inputs = self.fields(category, method, "in", &method.inputs, |position| {
                    WireIndex::Absolute { position }
                });
                let outputs = self.fields(category, method, "out", &method.outputs, |position| {
                    WireIndex::Absolute { position }
                });
                (BaseKind::MessageHandler, inputs, outputs, None)
            }
            Shape::Collection { list_attribute } => {
                let Some(result_name) = self.result_class(list_attribute) else {
                    self.errors.push(NormalizeError::MissingResultClass {
                        category: category.name.clone(),
                        method: method.name.clone(),
                        attribute: self.options.list_attribute.clone(),
                    });
                    return None;
                };
                let symbol = self.options.input_offset_symbol.clone();
                let inputs = self.fields(category, method, "in", &method.inputs, |position| {
                    WireIndex::Offset {
                        symbol: symbol.clone(),
                        position,
                    }
                });
                let fields = self.fields(category, method, "out", &method.outputs, |position| {
                    WireIndex::Absolute { position }
                });
                let base = BaseKind::ListQuery {
                    method: method.name.clone(),
                    result: result_name.to_string(),
                };
                let result = ResultType {
                    name: result_name.to_string(),
                    fields,
                };
                (base, inputs, Vec::new(), Some(result))
            }
        };

        let servers: Vec<ServerRef> = method
            .meta
            .servers
            .iter()
            .filter_map(|name| {
                self.servers.get(name.as_str()).map(|&ordinal| ServerRef {
                    name: name.clone(),
                    ordinal,
                })
            })
            .collect();
        let server_mask = servers
            .iter()
            .filter(|s| s.ordinal < 64)
            .fold(0u64, |mask, s| mask | (1u64 << s.ordinal));

        let auth = match method.meta.get(&self.options.auth_key) {
            None => false,
            Some(value) => match value.as_bool() {
                Some(auth) => auth,
                None => {
                    self.errors.push(NormalizeError::InvalidPropertyValue {
                        category: category.name.clone(),
                        method: method.name.clone(),
                        key: self.options.auth_key.clone(),
                        value: value.to_string(),
                    });
                    false
                }
            },
        };

        let meta = method
            .meta
            .values
            .iter()
            .filter(|(key, _)| **key != self.options.auth_key)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Some(NormalizedMethod {
            name: method.name.clone(),
            comment: method.comment.clone(),
            ordinal,
            category_ordinal,
            // an ordinal that does not fit was reported by check_ordinal
            message_id: config
                .message_id(category_ordinal, ordinal)
                .unwrap_or_default(),
            attributes,
            servers,
            server_mask,
            auth,
            meta,
            base,
            inputs,
            outputs,
            result,
        })
    }

    fn fields<F>(
        &mut self,
        category: &Category,
        method: &Method,
        group: &'static str,
        fields: &[Field],
        index: F,
    ) -> Vec<FieldDescriptor>
    where
        F: Fn(usize) -> WireIndex,
    {
        let mut seen = HashSet::new();
        fields
            .iter()
            .enumerate()
            .map(|(position, field)| {
                if !seen.insert(field.name.as_str()) {
                    self.errors.push(NormalizeError::DuplicateField {
                        category: category.name.clone(),
                        method: method.name.clone(),
                        group,
                        field: field.name.clone(),
                    });
                }
                let type_ = self.resolver.resolve(&field.type_);
                for name in type_.named_refs() {
                    self.check_opaque(category, method, field, name);
                }
                FieldDescriptor {
                    name: field.name.clone(),
                    type_,
                    attributes: render_all(&field.attributes),
                    index: index(position),
                }
            })
            .collect()
    }

    /// A resolved type may still name something that is not a primitive.
    /// Declared extern types are fine; anything else is reported.
    fn check_opaque(&mut self, category: &Category, method: &Method, field: &Field, name: &str) {
        if self.options.extern_types.iter().any(|t| t == name) {
            return;
        }
        let mut candidates: Vec<&str> = self.resolver.alias_names().collect();
        candidates.extend(self.options.extern_types.iter().map(String::as_str));
        candidates.extend(Primitive::ALL.iter().map(|p| p.tag()));

        let error = NormalizeError::UnresolvedFieldType {
            category: category.name.clone(),
            method: method.name.clone(),
            field: field.name.clone(),
            type_name: name.to_string(),
            suggestions: suggest_similar(name, &candidates, DEFAULT_MAX_DISTANCE),
        };
        if self.options.strict_types {
            self.errors.push(error);
        } else {
            self.warnings.push(error);
        }
    }
}
