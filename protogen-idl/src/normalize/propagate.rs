//! Category-to-method metadata inheritance.
//!
//! Two mechanisms, applied in category property declaration order:
//!
//! - the server key accumulates: every matching property appends one more
//!   server to the method's ordered server list;
//! - every other key is override-once: a method that already holds the key,
//!   from its own declaration or an earlier category property, keeps it.
//!
//! A method's own properties are recorded before any category property.

use super::NormalizeOptions;
use crate::error::{NormalizeError, Stage, StageFailure};
use crate::search::{suggest_similar, DEFAULT_MAX_DISTANCE};
use crate::types::{Method, Property, ProtocolSpec};
use std::collections::HashSet;

fn inherit(method: &mut Method, property: &Property, options: &NormalizeOptions) -> bool {
    if property.key == options.server_key {
        method.meta.add_server(&property.value.to_string())
    } else {
        method.meta.set_once(&property.key, &property.value)
    }
}

/// Stage 2: push category properties down onto their methods.
pub fn propagate_metadata(
    spec: &mut ProtocolSpec,
    options: &NormalizeOptions,
) -> Result<(), StageFailure> {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    for server in &spec.servers {
        if !seen.insert(server.name.as_str()) {
            errors.push(NormalizeError::DuplicateDeclaration {
                kind: "server",
                name: server.name.clone(),
            });
        }
    }
    let server_names: Vec<&str> = spec.servers.iter().map(|s| s.name.as_str()).collect();

    for category in &mut spec.categories {
        for method in &mut category.methods {
            let own = method.properties.clone();
            for property in &own {
                inherit(method, property, options);
            }
        }

        for property in &category.properties {
            for method in &mut category.methods {
                if inherit(method, property, options) {
                    tracing::debug!(
                        category = %category.name,
                        method = %method.name,
                        key = %property.key,
                        value = %property.value,
                        "inherited category property"
                    );
                }
            }
        }

        for method in &category.methods {
            if method.meta.servers.is_empty() {
                errors.push(NormalizeError::MissingServerAssignment {
                    category: category.name.clone(),
                    method: method.name.clone(),
                });
                continue;
            }
            for server in &method.meta.servers {
                if !server_names.contains(&server.as_str()) {
                    errors.push(NormalizeError::UnknownServer {
                        category: category.name.clone(),
                        method: method.name.clone(),
                        server: server.clone(),
                        suggestions: suggest_similar(server, &server_names, DEFAULT_MAX_DISTANCE),
                    });
                }
            }
        }
    }

    StageFailure::check(Stage::PropagateMetadata, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Declaration, PropertyValue};

    fn spec_with(category: Category, servers: &[&str]) -> ProtocolSpec {
        ProtocolSpec {
            name: None,
            config: Default::default(),
            types: vec![],
            servers: servers.iter().map(|s| Declaration::new(*s)).collect(),
            notifications: vec![],
            response_codes: vec![],
            categories: vec![category],
        }
    }

    fn category(properties: Vec<Property>, methods: Vec<Method>) -> Category {
        Category {
            name: "Account".into(),
            properties,
            methods,
        }
    }

    #[test]
    fn test_servers_accumulate_in_declaration_order() {
        let mut spec = spec_with(
            category(
                vec![
                    Property::new("server", "Global"),
                    Property::new("server", "Auth"),
                ],
                vec![Method::new("Login")],
            ),
            &["Auth", "Global"],
        );

        propagate_metadata(&mut spec, &NormalizeOptions::default()).unwrap();

        let login = &spec.categories[0].methods[0];
        assert_eq!(login.meta.servers, vec!["Global", "Auth"]);
    }

    #[test]
    fn test_own_value_wins_over_category() {
        let mut login = Method::new("Login");
        login.properties.push(Property::new("auth", false));
        let mut spec = spec_with(
            category(
                vec![
                    Property::new("server", "Global"),
                    Property::new("auth", true),
                ],
                vec![login, Method::new("Logout")],
            ),
            &["Global"],
        );

        propagate_metadata(&mut spec, &NormalizeOptions::default()).unwrap();

        let methods = &spec.categories[0].methods;
        assert_eq!(methods[0].meta.get("auth"), Some(&PropertyValue::Bool(false)));
        assert_eq!(methods[1].meta.get("auth"), Some(&PropertyValue::Bool(true)));
    }

    #[test]
    fn test_first_category_property_wins() {
        let mut spec = spec_with(
            category(
                vec![
                    Property::new("server", "Global"),
                    Property::new("timeout", "short"),
                    Property::new("timeout", "long"),
                ],
                vec![Method::new("Ping")],
            ),
            &["Global"],
        );

        propagate_metadata(&mut spec, &NormalizeOptions::default()).unwrap();

        let ping = &spec.categories[0].methods[0];
        assert_eq!(ping.meta.get("timeout"), Some(&PropertyValue::from("short")));
    }

    #[test]
    fn test_own_server_still_accumulates_category_servers() {
        let mut chat = Method::new("Send");
        chat.properties.push(Property::new("server", "Chat"));
        let mut spec = spec_with(
            category(
                vec![
                    Property::new("server", "Global"),
                    Property::new("server", "Chat"),
                ],
                vec![chat],
            ),
            &["Global", "Chat"],
        );

        propagate_metadata(&mut spec, &NormalizeOptions::default()).unwrap();

        assert_eq!(
            spec.categories[0].methods[0].meta.servers,
            vec!["Chat", "Global"],
            "duplicates are ignored, own server first"
        );
    }

    #[test]
    fn test_missing_server_is_fatal() {
        let mut spec = spec_with(
            category(vec![Property::new("auth", true)], vec![Method::new("Login")]),
            &["Global"],
        );

        let failure = propagate_metadata(&mut spec, &NormalizeOptions::default()).unwrap_err();

        assert_eq!(failure.stage, Stage::PropagateMetadata);
        assert_eq!(
            failure.errors,
            vec![NormalizeError::MissingServerAssignment {
                category: "Account".into(),
                method: "Login".into()
            }]
        );
    }

    #[test]
    fn test_unknown_server_suggests_declared_one() {
        let mut spec = spec_with(
            category(
                vec![Property::new("server", "Globl")],
                vec![Method::new("Login")],
            ),
            &["Global", "Auth"],
        );

        let failure = propagate_metadata(&mut spec, &NormalizeOptions::default()).unwrap_err();

        match &failure.errors[0] {
            NormalizeError::UnknownServer {
                server,
                suggestions,
                ..
            } => {
                assert_eq!(server, "Globl");
                assert_eq!(suggestions[0].candidate, "Global");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_custom_server_key() {
        let options = NormalizeOptions {
            server_key: "exposed_on".into(),
            ..Default::default()
        };
        let mut spec = spec_with(
            category(
                vec![Property::new("exposed_on", "Global")],
                vec![Method::new("Login")],
            ),
            &["Global"],
        );

        propagate_metadata(&mut spec, &options).unwrap();

        assert_eq!(spec.categories[0].methods[0].meta.servers, vec!["Global"]);
    }
}
