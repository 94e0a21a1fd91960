use anyhow::Result;
use colored::Colorize;
use protogen_codegen::BUILTIN_TARGETS;
use std::path::Path;

use crate::config::ProtogenConfig;
use crate::ui;

pub fn list(config_path: &Path) -> Result<()> {
    ui::print_section("Built-in targets");
    for target in BUILTIN_TARGETS {
        ui::print_item(&format!(
            "{} (.{}) {}",
            target.name.bold(),
            target.extension,
            target.description.dimmed()
        ));
    }

    let Some(config) = ProtogenConfig::load_optional(config_path)? else {
        println!();
        ui::print_info(&format!("No {} found", config_path.display()));
        return Ok(());
    };

    println!();
    ui::print_section(&format!("Targets in {}", config_path.display()));
    if config.targets.is_empty() {
        ui::print_info("none");
    }
    for target in &config.targets {
        let source = match (&target.template, &target.language) {
            (Some(template), _) => format!("template {}", template),
            (None, Some(language)) => format!("language {}", language),
            (None, None) => "built-in".to_string(),
        };
        ui::print_item(&format!(
            "{} ({}, {} servers)",
            target.name.bold(),
            source,
            target.options.server_encoding
        ));
    }
    Ok(())
}
