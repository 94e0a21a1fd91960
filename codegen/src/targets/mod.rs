//! Built-in targets

pub mod csharp;
pub mod typescript;

use crate::error::ProjectError;
use crate::options::TargetOptions;
use crate::template::TemplateProjector;
use crate::type_map::TypeMap;
use protogen_idl::{suggest_similar, DEFAULT_MAX_DISTANCE};

/// A target shipped with protogen: a template plus its type spelling.
pub struct BuiltinTarget {
    pub name: &'static str,
    pub description: &'static str,
    /// Default output file extension, without the dot.
    pub extension: &'static str,
    pub template: &'static str,
    type_map: fn() -> TypeMap,
}

impl BuiltinTarget {
    pub fn type_map(&self) -> TypeMap {
        (self.type_map)()
    }

    pub fn projector(&self, options: TargetOptions) -> Result<TemplateProjector, ProjectError> {
        TemplateProjector::new(self.name, self.template, self.type_map(), options)
    }
}

pub const BUILTIN_TARGETS: &[BuiltinTarget] = &[
    BuiltinTarget {
        name: "csharp",
        description: "C# partial classes with routing attributes",
        extension: "cs",
        template: include_str!("../../templates/csharp.tera"),
        type_map: csharp::type_map,
    },
    BuiltinTarget {
        name: "typescript",
        description: "TypeScript const enums, descriptors and interfaces",
        extension: "ts",
        template: include_str!("../../templates/typescript.tera"),
        type_map: typescript::type_map,
    },
];

pub fn builtin_target(name: &str) -> Result<&'static BuiltinTarget, ProjectError> {
    BUILTIN_TARGETS
        .iter()
        .find(|t| t.name == name)
        .ok_or_else(|| {
            let names: Vec<&str> = BUILTIN_TARGETS.iter().map(|t| t.name).collect();
            ProjectError::UnknownTarget {
                name: name.to_string(),
                suggestions: suggest_similar(name, &names, DEFAULT_MAX_DISTANCE),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(builtin_target("csharp").unwrap().extension, "cs");
        assert_eq!(builtin_target("typescript").unwrap().extension, "ts");
    }

    #[test]
    fn test_unknown_target_suggests() {
        let err = builtin_target("typescrpt").err().unwrap();
        assert_eq!(
            err.to_string(),
            "unknown target `typescrpt` (did you mean `typescript`?)"
        );
    }

    #[test]
    fn test_builtin_templates_compile() {
        for target in BUILTIN_TARGETS {
            assert!(
                target.projector(TargetOptions::default()).is_ok(),
                "{} template should compile",
                target.name
            );
        }
    }
}
