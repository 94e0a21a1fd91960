use anyhow::{Context, Result};
use protogen_codegen::{builtin_target, BuiltinTarget, TargetOptions};
use protogen_idl::NormalizeOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Contents of protogen.toml. The file is optional; every setting can also
/// come from the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProtogenConfig {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub normalize: NormalizeOptions,

    #[serde(default)]
    pub targets: Vec<TargetConfig>,

    /// Directory the config was loaded from; relative paths resolve here.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Protocol JSON to read when no input is given on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: None,
            input: None,
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    "./generated".to_string()
}

/// One `[[targets]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub name: String,

    /// Built-in target whose template and type names are used. Defaults to
    /// `name` when that is a built-in target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Custom tera template. Type names still come from `language` if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    #[serde(flatten)]
    pub options: TargetOptions,
}

impl TargetConfig {
    /// A built-in target with default options.
    pub fn builtin(name: &str) -> Self {
        Self {
            name: name.to_string(),
            language: None,
            template: None,
            output: None,
            options: TargetOptions::default(),
        }
    }

    /// The built-in target this entry draws on, if any.
    pub fn language(&self) -> Result<Option<&'static BuiltinTarget>> {
        match (&self.language, &self.template) {
            (Some(language), _) => Ok(Some(builtin_target(language)?)),
            (None, Some(_)) => Ok(None),
            (None, None) => Ok(Some(builtin_target(&self.name).with_context(|| {
                format!(
                    "Target '{}' names no language or template and is not a built-in target",
                    self.name
                )
            })?)),
        }
    }
}

impl ProtogenConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: ProtogenConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        config.validate()?;
        Ok(config)
    }

    /// Try to load config, returning None if file doesn't exist
    pub fn load_optional<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.project.name {
            if name.trim().is_empty() {
                anyhow::bail!("Project name cannot be empty");
            }
        }

        let mut names = HashSet::new();
        for target in &self.targets {
            if target.name.trim().is_empty() {
                anyhow::bail!("Target name cannot be empty");
            }
            if !names.insert(target.name.as_str()) {
                anyhow::bail!("Duplicate target name: {}", target.name);
            }
            target.language()?;
            if target.template.is_some() && target.output.is_none() {
                anyhow::bail!(
                    "Target '{}' uses a custom template and must set `output`",
                    target.name
                );
            }
        }

        Ok(())
    }

    pub fn find_target(&self, name: &str) -> Option<&TargetConfig> {
        self.targets.iter().find(|t| t.name == name)
    }

    /// Resolve a path from the config file relative to its directory.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_relative() {
            self.base_dir.join(path)
        } else {
            path.to_path_buf()
        }
    }

    pub fn input_path(&self) -> Option<PathBuf> {
        self.project.input.as_deref().map(|p| self.resolve(p))
    }

    /// Where a target's output goes when no override is given:
    /// `output` if set, otherwise `<output_dir>/<protocol>.<extension>`.
    pub fn output_path(&self, target: &TargetConfig, protocol: &str, extension: &str) -> PathBuf {
        match &target.output {
            Some(output) => self.resolve(output),
            None => self
                .resolve(&self.project.output_dir)
                .join(format!("{}.{}", protocol, extension)),
        }
    }
}
