//! # protogen
//!
//! Command-line front end for the protocol compiler: normalizes a protocol
//! JSON description and renders it into client and server source files.
//!
//! ## Commands
//!
//! - `protogen generate [input]` - Render every configured target
//! - `protogen generate -t csharp -o Api.cs` - Render one built-in target
//! - `protogen check [input]` - Validate a protocol without rendering
//! - `protogen targets` - List built-in and configured targets
//!
//! See `protogen --help` for the full command reference.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use std::io;
use std::path::PathBuf;
use std::process;

mod commands;
mod config;
mod telemetry;
mod ui;

use commands::check::CheckArgs;
use commands::generate::GenerateArgs;
use telemetry::TelemetryConfig;

#[derive(Parser)]
#[command(name = "protogen")]
#[command(about = "Protogen - compile protocol descriptions into source code", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to protogen.toml configuration file
    #[arg(short, long, global = true, default_value = "protogen.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true, env = "PROTOGEN_JSON_LOGS")]
    json_logs: bool,

    /// Generate shell completions
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a protocol and render it for one or more targets
    Generate(GenerateArgs),

    /// Normalize a protocol and report what it contains
    Check(CheckArgs),

    /// List built-in targets and the targets in protogen.toml
    Targets,
}

fn main() {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "protogen", &mut io::stdout());
        return;
    }

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    telemetry::init(
        TelemetryConfig::default()
            .with_verbose(cli.verbose)
            .with_json_logs(cli.json_logs),
    )?;

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Generate(args) => commands::generate::generate(&cli.config, &args).map(|_| ()),
        Commands::Check(args) => commands::check::check(&cli.config, &args).map(|_| ()),
        Commands::Targets => commands::targets::list(&cli.config),
    }
}
