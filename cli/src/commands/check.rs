use anyhow::Result;
use clap::Args;
use colored::Colorize;
use protogen_idl::NormalizedModel;
use std::path::Path;

use super::{load_model, NormalizeArgs};
use crate::config::ProtogenConfig;
use crate::ui;

#[derive(Debug, Clone, Default, Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub normalize: NormalizeArgs,

    /// Print the normalized model as JSON
    #[arg(long)]
    pub json: bool,
}

/// Normalize a protocol without rendering anything.
pub fn check(config_path: &Path, args: &CheckArgs) -> Result<NormalizedModel> {
    let config = ProtogenConfig::load_optional(config_path)?;
    let config = config.as_ref();
    let input = args.normalize.input_path(config)?;
    let options = args.normalize.options(config);

    let model = load_model(&input, &options)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&model)?);
        return Ok(model);
    }

    ui::print_section(&format!("Protocol {}", model.name.bold()));
    ui::print_item(&format!("servers: {}", model.servers.len()));
    ui::print_item(&format!("notifications: {}", model.notifications.len()));
    ui::print_item(&format!("response codes: {}", model.response_codes.len()));
    for category in &model.categories {
        ui::print_item(&format!(
            "{} (category {}): {} method(s)",
            category.name,
            category.ordinal,
            category.methods.len()
        ));
    }
    ui::print_item(&format!("fingerprint: {}", model.fingerprint()?));

    if model.diagnostics.is_empty() {
        ui::print_success(&format!("{} is valid", input.display()));
    } else {
        ui::print_warning(&format!(
            "{} is valid with {} warning(s)",
            input.display(),
            model.diagnostics.len()
        ));
    }
    Ok(model)
}
