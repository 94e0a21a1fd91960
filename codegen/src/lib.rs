//! Source projection for protogen.
//!
//! A [`Projector`] turns a [`protogen_idl::NormalizedModel`] into source
//! text for one target. The built-in targets and custom templates are both
//! [`TemplateProjector`]s: a tera template rendered against a
//! [`ProtocolView`] whose values are already in target spelling.

pub mod context;
pub mod error;
pub mod options;
pub mod projector;
pub mod targets;
pub mod template;
pub mod type_map;

pub use context::ProtocolView;
pub use error::ProjectError;
pub use options::{ServerEncoding, TargetOptions, DEFAULT_RESPONSE_CODE_BASE};
pub use projector::{project_all, Projector};
pub use targets::{builtin_target, BuiltinTarget, BUILTIN_TARGETS};
pub use template::TemplateProjector;
pub use type_map::TypeMap;
