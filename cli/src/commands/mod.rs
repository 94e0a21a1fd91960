pub mod check;
pub mod generate;
pub mod targets;

use anyhow::{Context, Result};
use clap::Args;
use protogen_idl::{normalize, parse_protocol_file, NormalizeOptions, NormalizedModel};
use std::path::{Path, PathBuf};

use crate::config::ProtogenConfig;

/// Input and normalization flags shared by `generate` and `check`.
#[derive(Debug, Clone, Default, Args)]
pub struct NormalizeArgs {
    /// Protocol JSON file (defaults to `project.input` in protogen.toml)
    pub input: Option<PathBuf>,

    /// Treat field types that resolve to nothing known as errors
    #[arg(long)]
    pub strict: bool,

    /// Declare an externally defined type (repeatable)
    #[arg(long = "extern-type", value_name = "NAME")]
    pub extern_types: Vec<String>,
}

impl NormalizeArgs {
    pub fn input_path(&self, config: Option<&ProtogenConfig>) -> Result<PathBuf> {
        self.input
            .clone()
            .or_else(|| config.and_then(ProtogenConfig::input_path))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No protocol input. Pass a file or set `project.input` in protogen.toml"
                )
            })
    }

    /// Config-file options with command-line flags applied on top.
    pub fn options(&self, config: Option<&ProtogenConfig>) -> NormalizeOptions {
        let mut options = config.map(|c| c.normalize.clone()).unwrap_or_default();
        if self.strict {
            options.strict_types = true;
        }
        for name in &self.extern_types {
            if !options.extern_types.contains(name) {
                options.extern_types.push(name.clone());
            }
        }
        options
    }
}

/// Parse and normalize one protocol file.
pub fn load_model(input: &Path, options: &NormalizeOptions) -> Result<NormalizedModel> {
    let spec = parse_protocol_file(input)
        .with_context(|| format!("Failed to load protocol: {}", input.display()))?;
    let model = normalize(spec, options)?;
    Ok(model)
}

#[cfg(test)]
pub(crate) fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../protogen-idl/tests/fixtures")
        .join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_extend_config_options() {
        let mut config = ProtogenConfig::default();
        config.normalize.extern_types = vec!["Vector3".into()];
        let args = NormalizeArgs {
            input: None,
            strict: true,
            extern_types: vec!["Vector3".into(), "Quaternion".into()],
        };

        let options = args.options(Some(&config));

        assert!(options.strict_types);
        assert_eq!(options.extern_types, vec!["Vector3", "Quaternion"]);
    }

    #[test]
    fn test_input_falls_back_to_config() {
        let mut config = ProtogenConfig::default();
        config.base_dir = PathBuf::from("/work");
        config.project.input = Some("protocol.json".into());

        let args = NormalizeArgs::default();

        assert_eq!(
            args.input_path(Some(&config)).unwrap(),
            PathBuf::from("/work/protocol.json")
        );
        assert!(args.input_path(None).is_err());
    }

    #[test]
    fn test_load_model_reports_stage() {
        let err = load_model(&fixture("cyclic.json"), &NormalizeOptions::default()).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("type resolution failed"), "{}", message);
        assert!(message.contains("Handle -> Ref -> Handle"));
    }
}
