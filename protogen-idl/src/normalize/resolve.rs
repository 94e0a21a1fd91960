//! Type alias resolution.
//!
//! Aliases form a directed graph (`alias -> names in its underlying type`).
//! Each alias is resolved once, after everything it depends on, by a
//! depth-first walk that marks nodes in progress so a back edge is reported
//! as a cycle instead of recursing forever.
//!
//! A name that is neither a primitive nor an alias is left untouched. Such
//! names denote structured or externally defined types; whether they are
//! acceptable is decided when fields are normalized.

use crate::error::{NormalizeError, Stage, StageFailure};
use crate::type_ref::{Primitive, TypeRef};
use crate::types::{ProtocolSpec, TypeAlias};
use std::collections::{BTreeMap, HashMap};

/// Resolved alias table.
#[derive(Debug, Clone, Default)]
pub struct TypeResolver {
    resolved: BTreeMap<String, TypeRef>,
}

impl TypeResolver {
    pub fn build(aliases: &[TypeAlias]) -> Result<Self, Vec<NormalizeError>> {
        let mut errors = Vec::new();
        let mut graph: HashMap<&str, &TypeRef> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();

        for alias in aliases {
            if Primitive::from_tag(&alias.name).is_some() {
                errors.push(NormalizeError::AliasShadowsPrimitive {
                    name: alias.name.clone(),
                });
                continue;
            }
            if graph.insert(&alias.name, &alias.underlying).is_some() {
                errors.push(NormalizeError::DuplicateTypeAlias {
                    name: alias.name.clone(),
                });
                continue;
            }
            order.push(&alias.name);
        }

        let mut walk = AliasWalk {
            graph,
            marks: HashMap::new(),
            path: Vec::new(),
            resolved: BTreeMap::new(),
            errors,
        };
        for name in order {
            walk.visit(name);
        }

        if walk.errors.is_empty() {
            Ok(Self {
                resolved: walk.resolved,
            })
        } else {
            Err(walk.errors)
        }
    }

    pub fn is_alias(&self, name: &str) -> bool {
        self.resolved.contains_key(name)
    }

    pub fn alias_names(&self) -> impl Iterator<Item = &str> {
        self.resolved.keys().map(String::as_str)
    }

    /// Resolve a single name: primitives map to themselves, aliases to their
    /// fully resolved type, anything else passes through unchanged.
    pub fn resolve_name(&self, name: &str) -> TypeRef {
        if let Some(p) = Primitive::from_tag(name) {
            return TypeRef::Primitive(p);
        }
        lookup(&self.resolved, name)
    }

    pub fn resolve(&self, ty: &TypeRef) -> TypeRef {
        ty.map_names(&mut |name| self.resolve_name(name))
    }

    /// Rewrite the alias table and every field type in place.
    pub fn apply(&self, spec: &mut ProtocolSpec) {
        for alias in &mut spec.types {
            if let Some(resolved) = self.resolved.get(&alias.name) {
                alias.underlying = resolved.clone();
            }
        }
        for category in &mut spec.categories {
            for method in &mut category.methods {
                for field in method.inputs.iter_mut().chain(method.outputs.iter_mut()) {
                    field.type_ = self.resolve(&field.type_);
                }
            }
        }
    }
}

fn lookup(resolved: &BTreeMap<String, TypeRef>, name: &str) -> TypeRef {
    resolved
        .get(name)
        .cloned()
        .unwrap_or_else(|| TypeRef::named(name))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
    Failed,
}

struct AliasWalk<'a> {
    graph: HashMap<&'a str, &'a TypeRef>,
    marks: HashMap<&'a str, Mark>,
    path: Vec<&'a str>,
    resolved: BTreeMap<String, TypeRef>,
    errors: Vec<NormalizeError>,
}

impl<'a> AliasWalk<'a> {
    /// Returns false if `name` (or something it depends on) sits on a cycle.
    fn visit(&mut self, name: &'a str) -> bool {
        match self.marks.get(name).copied() {
            Some(Mark::Done) => return true,
            Some(Mark::Failed) => return false,
            Some(Mark::InProgress) => {
                let start = self.path.iter().position(|n| *n == name).unwrap_or(0);
                let mut cycle: Vec<String> =
                    self.path[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(name.to_string());
                for member in &self.path[start..] {
                    self.marks.insert(*member, Mark::Failed);
                }
                self.errors.push(NormalizeError::CyclicTypeAlias { cycle });
                return false;
            }
            None => {}
        }

        let Some(&underlying) = self.graph.get(name) else {
            return true;
        };

        self.marks.insert(name, Mark::InProgress);
        self.path.push(name);

        let mut ok = true;
        for dep in underlying.named_refs() {
            if self.graph.contains_key(dep) && !self.visit(dep) {
                ok = false;
            }
        }

        self.path.pop();

        if !ok || self.marks.get(name) == Some(&Mark::Failed) {
            self.marks.insert(name, Mark::Failed);
            return false;
        }

        let resolved = underlying.map_names(&mut |n| lookup(&self.resolved, n));
        tracing::debug!(alias = name, resolved = %resolved, "resolved type alias");
        self.resolved.insert(name.to_string(), resolved);
        self.marks.insert(name, Mark::Done);
        true
    }
}

/// Stage 1: resolve every alias and rewrite field types.
pub fn resolve_types(spec: &mut ProtocolSpec) -> Result<TypeResolver, StageFailure> {
    let resolver = TypeResolver::build(&spec.types)
        .map_err(|errors| StageFailure::new(Stage::ResolveTypes, errors))?;
    resolver.apply(spec);
    Ok(resolver)
}
