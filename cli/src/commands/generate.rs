use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use protogen_codegen::{
    builtin_target, project_all, BuiltinTarget, Projector, ServerEncoding, TargetOptions,
    TemplateProjector, TypeMap,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::{load_model, NormalizeArgs};
use crate::config::{ProtogenConfig, TargetConfig};
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EncodingArg {
    Ordinal,
    BitFlag,
}

impl From<EncodingArg> for ServerEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Ordinal => ServerEncoding::Ordinal,
            EncodingArg::BitFlag => ServerEncoding::BitFlag,
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub normalize: NormalizeArgs,

    /// Target to generate: a built-in name or a [[targets]] entry (repeatable).
    /// Defaults to every target in protogen.toml
    #[arg(short, long = "target", value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Output file (only with a single target)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Render a custom tera template instead of a built-in target
    #[arg(long, value_name = "PATH", conflicts_with = "targets")]
    pub template: Option<PathBuf>,

    /// Built-in target whose type names the custom template uses
    #[arg(long, value_name = "TARGET", requires = "template")]
    pub language: Option<String>,

    /// Namespace or module name for generated code
    #[arg(long)]
    pub namespace: Option<String>,

    /// How server ids are numbered
    #[arg(long, value_enum)]
    pub server_encoding: Option<EncodingArg>,

    /// Value added to every response code ordinal
    #[arg(long)]
    pub response_code_base: Option<u64>,

    /// Render everything but write nothing
    #[arg(long)]
    pub dry_run: bool,
}

/// One target to render, with paths already resolved.
struct Job {
    target: TargetConfig,
    builtin: Option<&'static BuiltinTarget>,
    template: Option<PathBuf>,
    /// Set from the command line; otherwise the config decides.
    output: Option<PathBuf>,
}

impl Job {
    fn projector(&self) -> Result<TemplateProjector> {
        let name = self.target.name.as_str();
        let options = self.target.options.clone();
        let types = self
            .builtin
            .map(BuiltinTarget::type_map)
            .unwrap_or_else(TypeMap::canonical);
        let projector = match (&self.template, self.builtin) {
            (Some(path), _) => TemplateProjector::from_file(name, path, types, options)?,
            (None, Some(builtin)) => TemplateProjector::new(name, builtin.template, types, options)?,
            (None, None) => anyhow::bail!("Target '{}' has no template", name),
        };
        Ok(projector)
    }

    fn output_path(&self, config: Option<&ProtogenConfig>, protocol: &str) -> PathBuf {
        let extension = self.builtin.map(|b| b.extension).unwrap_or("txt");
        match (&self.output, config) {
            (Some(output), _) => output.clone(),
            (None, Some(cfg)) => cfg.output_path(&self.target, protocol, extension),
            (None, None) => PathBuf::from("./generated").join(format!("{}.{}", protocol, extension)),
        }
    }
}

fn plan(config: Option<&ProtogenConfig>, args: &GenerateArgs) -> Result<Vec<Job>> {
    let mut jobs = Vec::new();

    if let Some(template) = &args.template {
        let output = args
            .output
            .clone()
            .context("A custom --template needs an --output path")?;
        let name = template
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "custom".to_string());
        jobs.push(Job {
            target: TargetConfig::builtin(&name),
            builtin: args.language.as_deref().map(builtin_target).transpose()?,
            template: Some(template.clone()),
            output: Some(output),
        });
    } else if args.targets.is_empty() {
        let configured = config.map(|c| c.targets.as_slice()).unwrap_or_default();
        if configured.is_empty() {
            anyhow::bail!(
                "No targets to generate. Pass --target <name> or add [[targets]] to protogen.toml"
            );
        }
        for target in configured {
            jobs.push(configured_job(config, &target.name)?);
        }
    } else {
        for name in &args.targets {
            jobs.push(configured_job(config, name)?);
        }
    }

    if let Some(output) = &args.output {
        if jobs.len() != 1 {
            anyhow::bail!("--output can only be used with a single target");
        }
        jobs[0].output = Some(output.clone());
    }

    for job in &mut jobs {
        let options = &mut job.target.options;
        if let Some(namespace) = &args.namespace {
            options.namespace = Some(namespace.clone());
        }
        if let Some(encoding) = args.server_encoding {
            options.server_encoding = encoding.into();
        }
        if let Some(base) = args.response_code_base {
            options.response_code_base = base;
        }
        tracing::debug!(
            target_name = %job.target.name,
            template = ?job.template,
            output = ?job.output,
            "planned target"
        );
    }

    Ok(jobs)
}

/// A [[targets]] entry by that name, or else the built-in target.
fn configured_job(config: Option<&ProtogenConfig>, name: &str) -> Result<Job> {
    if let Some((cfg, target)) = config.and_then(|c| c.find_target(name).map(|t| (c, t))) {
        return Ok(Job {
            target: target.clone(),
            builtin: target.language()?,
            template: target.template.as_deref().map(|p| cfg.resolve(p)),
            output: None,
        });
    }
    Ok(Job {
        target: TargetConfig::builtin(name),
        builtin: Some(builtin_target(name)?),
        template: None,
        output: None,
    })
}

/// Output path per job, refusing two jobs that would write the same file.
fn output_paths(
    jobs: &[Job],
    config: Option<&ProtogenConfig>,
    protocol: &str,
) -> Result<Vec<PathBuf>> {
    let mut seen: HashMap<PathBuf, &str> = HashMap::new();
    let mut paths = Vec::with_capacity(jobs.len());
    for job in jobs {
        let path = job.output_path(config, protocol);
        if let Some(other) = seen.insert(path.clone(), &job.target.name) {
            anyhow::bail!(
                "Targets '{}' and '{}' both write {}",
                other,
                job.target.name,
                path.display()
            );
        }
        paths.push(path);
    }
    Ok(paths)
}

/// `<file>.tmp` next to `output`.
fn staging_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    output.with_file_name(name)
}

/// Write every file to a staging path first, then rename them into place.
/// A failed write removes what was staged and leaves the outputs untouched.
fn write_all(files: &[(PathBuf, String)]) -> Result<()> {
    let mut staged = Vec::with_capacity(files.len());
    for (output, text) in files {
        let temp = staging_path(output);
        let result = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or(Ok(()), fs::create_dir_all)
            .with_context(|| format!("Failed to create output directory for {}", output.display()))
            .and_then(|_| {
                fs::write(&temp, text).with_context(|| format!("Failed to write {}", output.display()))
            });
        if let Err(err) = result {
            for temp in &staged {
                let _ = fs::remove_file(temp);
            }
            return Err(err);
        }
        staged.push(temp);
    }

    for ((output, _), temp) in files.iter().zip(&staged) {
        tracing::debug!(path = %output.display(), "moving staged output into place");
        fs::rename(temp, output)
            .with_context(|| format!("Failed to move {} into place", output.display()))?;
    }
    Ok(())
}

/// Normalize once, render every target, and write the outputs.
///
/// Nothing is written unless every target renders and every output can be
/// staged. Returns the output paths in target order.
pub fn generate(config_path: &Path, args: &GenerateArgs) -> Result<Vec<PathBuf>> {
    let config = ProtogenConfig::load_optional(config_path)?;
    let config = config.as_ref();

    let jobs = plan(config, args)?;
    let input = args.normalize.input_path(config)?;
    let options = args.normalize.options(config);

    ui::print_step(&format!("Normalizing {}", input.display()));
    let model = load_model(&input, &options)?;
    let fingerprint = model.fingerprint()?;
    ui::print_info(&format!(
        "{} categories, {} methods, fingerprint {}",
        model.categories.len(),
        model.methods().count(),
        fingerprint
    ));
    if !model.diagnostics.is_empty() {
        ui::print_warning(&format!("{} warning(s)", model.diagnostics.len()));
    }
    let outputs = output_paths(&jobs, config, &model.name)?;

    let projectors = jobs
        .iter()
        .map(Job::projector)
        .collect::<Result<Vec<_>>>()?;
    let refs: Vec<&dyn Projector> = projectors.iter().map(|p| p as &dyn Projector).collect();

    ui::print_step(&format!("Rendering {} target(s)", jobs.len()));
    let results = project_all(&model, &refs);

    let mut rendered = Vec::with_capacity(jobs.len());
    let mut failures = 0;
    for (output, result) in outputs.iter().zip(results) {
        match result {
            Ok(text) => rendered.push((output.clone(), text)),
            Err(err) => {
                failures += 1;
                ui::print_error(&err.to_string());
            }
        }
    }
    if failures > 0 {
        anyhow::bail!(
            "{} of {} target(s) failed to render; nothing was written",
            failures,
            jobs.len()
        );
    }

    if args.dry_run {
        for (job, (output, text)) in jobs.iter().zip(&rendered) {
            ui::print_info(&format!(
                "{} -> {} ({} bytes, not written)",
                job.target.name,
                output.display(),
                text.len()
            ));
        }
    } else {
        write_all(&rendered)?;
        for (job, output) in jobs.iter().zip(&outputs) {
            ui::print_success(&format!("{} -> {}", job.target.name.bold(), output.display()));
        }
    }

    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixture;

    fn args(input: &str, targets: &[&str]) -> GenerateArgs {
        GenerateArgs {
            normalize: NormalizeArgs {
                input: Some(fixture(input)),
                strict: false,
                extern_types: vec!["Vector3".into()],
            },
            targets: targets.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    fn config_in(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("protogen.toml");
        fs::write(&path, contents).unwrap();
        path
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_generates_every_configured_target() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(
            dir.path(),
            "[project]\noutput_dir = \"out\"\n\n[[targets]]\nname = \"csharp\"\n\n[[targets]]\nname = \"typescript\"\n",
        );

        let written = generate(&config, &args("starfall.json", &[])).unwrap();

        assert_eq!(
            written,
            vec![
                dir.path().join("out/starfall.cs"),
                dir.path().join("out/starfall.ts")
            ]
        );
        let csharp = fs::read_to_string(&written[0]).unwrap();
        assert!(csharp.contains("namespace Starfall {"));
        let typescript = fs::read_to_string(&written[1]).unwrap();
        assert!(typescript.contains("export namespace Social {"));
    }

    #[test]
    fn test_output_override_and_flags() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("Api.cs");
        let mut args = args("starfall.json", &["csharp"]);
        args.output = Some(output.clone());
        args.namespace = Some("Game.Api".into());
        args.server_encoding = Some(EncodingArg::BitFlag);

        generate(&dir.path().join("protogen.toml"), &args).unwrap();

        let text = fs::read_to_string(output).unwrap();
        assert!(text.contains("namespace Game.Api {"));
        assert!(text.contains("public const ulong Chat = 4;"));
    }

    #[test]
    fn test_normalization_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(
            dir.path(),
            "[project]\noutput_dir = \"out\"\n\n[[targets]]\nname = \"csharp\"\n",
        );

        let err = generate(&config, &args("missing_server.json", &[])).unwrap_err();

        assert!(err.to_string().contains("metadata propagation failed"));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_one_failing_target_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.tera"), "{{ no_such_value }}").unwrap();
        let config = config_in(
            dir.path(),
            r#"
[project]
output_dir = "out"

[[targets]]
name = "csharp"

[[targets]]
name = "broken"
template = "broken.tera"
output = "out/broken.txt"
"#,
        );

        let err = generate(&config, &args("starfall.json", &[])).unwrap_err();

        assert!(err.to_string().contains("1 of 2 target(s) failed"));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_custom_template_with_language_types() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("fields.tera");
        fs::write(
            &template,
            "{% for c in categories %}{% for m in c.methods %}{% for f in m.inputs %}{{ m.name }}.{{ f.name }}: {{ f.type_name }}\n{% endfor %}{% endfor %}{% endfor %}",
        )
        .unwrap();
        let output = dir.path().join("fields.txt");
        let mut args = args("starfall.json", &[]);
        args.template = Some(template);
        args.language = Some("typescript".into());
        args.output = Some(output.clone());

        generate(&dir.path().join("protogen.toml"), &args).unwrap();

        let text = fs::read_to_string(output).unwrap();
        assert!(text.contains("SendMessage.Room: number\n"));
        assert!(text.contains("SetTags.Tags: Map<string, string>\n"));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), "[[targets]]\nname = \"typescript\"\n");
        let mut args = args("starfall.json", &[]);
        args.dry_run = true;

        let planned = generate(&config, &args).unwrap();

        assert_eq!(planned.len(), 1);
        assert_eq!(files_in(dir.path()), vec!["protogen.toml"]);
    }

    #[test]
    fn test_output_needs_single_target() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args("starfall.json", &["csharp", "typescript"]);
        args.output = Some(dir.path().join("out.txt"));

        let err = generate(&dir.path().join("protogen.toml"), &args).unwrap_err();

        assert!(err.to_string().contains("single target"));
    }

    #[test]
    fn test_unknown_target() {
        let dir = tempfile::tempdir().unwrap();
        let err = generate(
            &dir.path().join("protogen.toml"),
            &args("starfall.json", &["csharpp"]),
        )
        .unwrap_err();

        assert!(err.to_string().contains("did you mean `csharp`?"));
    }

    #[test]
    fn test_no_targets() {
        let dir = tempfile::tempdir().unwrap();
        let err = generate(&dir.path().join("protogen.toml"), &args("starfall.json", &[]))
            .unwrap_err();

        assert!(err.to_string().contains("No targets to generate"));
    }

    #[test]
    fn test_targets_sharing_an_output_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(
            dir.path(),
            r#"
[[targets]]
name = "csharp"
output = "out/api.txt"

[[targets]]
name = "typescript"
output = "out/api.txt"
"#,
        );

        let err = generate(&config, &args("starfall.json", &[])).unwrap_err();

        assert!(err.to_string().contains("both write"));
        assert_eq!(files_in(dir.path()), vec!["protogen.toml"]);
    }

    #[test]
    fn test_failed_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        // a file where the second target's directory should be
        fs::write(dir.path().join("blocked"), "").unwrap();
        let files = vec![
            (dir.path().join("out/first.cs"), "first".to_string()),
            (dir.path().join("blocked/second.ts"), "second".to_string()),
        ];

        assert!(write_all(&files).is_err());

        assert!(!dir.path().join("out/first.cs").exists());
        assert!(!dir.path().join("out/first.cs.tmp").exists());
    }

    #[test]
    fn test_write_all_replaces_existing_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("api.ts");
        fs::write(&output, "old").unwrap();

        write_all(&[(output.clone(), "new".to_string())]).unwrap();

        assert_eq!(fs::read_to_string(&output).unwrap(), "new");
        assert_eq!(files_in(dir.path()), vec!["api.ts"]);
    }
}
