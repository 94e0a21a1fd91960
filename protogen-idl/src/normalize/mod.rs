//! The three-stage normalization pipeline.
//!
//! ```text
//! ProtocolSpec -> resolve_types -> propagate_metadata -> normalize_methods -> NormalizedModel
//! ```
//!
//! Each stage collects every error it can find before failing; the pipeline
//! stops at the first stage that reports one.

pub mod method;
pub mod model;
pub mod propagate;
pub mod resolve;

pub use method::normalize_methods;
pub use model::*;
pub use propagate::propagate_metadata;
pub use resolve::{resolve_types, TypeResolver};

use crate::error::StageFailure;
use crate::types::ProtocolSpec;
use serde::{Deserialize, Serialize};

/// Names and switches the pipeline keys its decisions on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    /// Property key that accumulates servers instead of overriding.
    pub server_key: String,
    /// Property key read as the method's auth flag.
    pub auth_key: String,
    /// Method attribute that marks a collection method.
    pub list_attribute: String,
    /// Named argument of the list attribute that holds the result class.
    pub result_class_arg: String,
    /// Per-method constant that collection inputs are numbered from.
    pub input_offset_symbol: String,
    /// Fail instead of warn on field types that resolve to nothing known.
    pub strict_types: bool,
    /// Structured types defined outside the protocol.
    pub extern_types: Vec<String>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            server_key: "server".to_string(),
            auth_key: "auth".to_string(),
            list_attribute: "List".to_string(),
            result_class_arg: "class".to_string(),
            input_offset_symbol: "InputStartIndex".to_string(),
            strict_types: false,
            extern_types: Vec::new(),
        }
    }
}

/// Run the full pipeline. The input model is consumed; nothing is produced
/// unless every stage succeeds.
pub fn normalize(
    mut spec: ProtocolSpec,
    options: &NormalizeOptions,
) -> Result<NormalizedModel, StageFailure> {
    let protocol = spec.get_name().to_string();

    let resolver = {
        let _span = tracing::info_span!("resolve_types", %protocol, aliases = spec.types.len())
            .entered();
        resolve_types(&mut spec)?
    };

    {
        let _span = tracing::info_span!(
            "propagate_metadata",
            %protocol,
            categories = spec.categories.len()
        )
        .entered();
        propagate_metadata(&mut spec, options)?;
    }

    let _span = tracing::info_span!("normalize_methods", %protocol).entered();
    let model = normalize_methods(&spec, &resolver, options)?;
    tracing::info!(
        methods = model.methods().count(),
        warnings = model.diagnostics.len(),
        "normalized protocol"
    );
    Ok(model)
}
