// ObjPack - Self-contained OBJ asset packer
// Copyright (C) 2025 ObjPack Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

mod commands;
mod output;
mod progress;
mod sink;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use commands::{InspectCmd, PackCmd};
use objpack_config::{Config, ConfigLoader};
use objpack_observability::{init_tracing_with_config, LogConfig, LogFormat};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "objpack")]
#[command(version, about = "Pack OBJ models, materials and textures into one self-contained asset")]
#[command(
    long_about = "ObjPack merges Wavefront OBJ geometry, resolves its MTL material library and
embeds every texture as a base64 data URI, producing a single portable asset manifest."
)]
#[command(propagate_version = true)]
#[command(author = "ObjPack Contributors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Colored output (always|auto|never)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Configuration file (toml, yaml or json)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge geometry, resolve materials and embed textures
    Pack(PackCmd),

    /// Show what a model directory contains without transcoding
    Inspect(InspectCmd),

    /// Show version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.color.as_str() {
        "never" => console::set_colors_enabled(false),
        "always" => console::set_colors_enabled(true),
        "auto" => {}
        _ => {
            output::error(&format!("Invalid color option: {}", cli.color));
            std::process::exit(2);
        }
    }

    let result = run(cli).await;

    if let Err(e) = result {
        output::error(&format!("Error: {:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Version => {
            print_version();
            return Ok(());
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
            return Ok(());
        }
        _ => {}
    }

    let config = ConfigLoader::new()
        .load_optional(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?;
    init_logging(&config, cli.verbose, cli.quiet)?;

    match cli.command {
        Commands::Pack(cmd) => cmd.execute(config, cli.quiet).await,
        Commands::Inspect(cmd) => cmd.execute(config).await,
        Commands::Version | Commands::Completions { .. } => Ok(()),
    }
}

/// Command-line flags win over the configured level
fn init_logging(config: &Config, verbose: bool, quiet: bool) -> Result<()> {
    let format: LogFormat = config.observability.log_format.parse()?;
    let log_config = LogConfig::for_verbosity(verbose, quiet)
        .or_level(config.observability.log_level.to_lowercase())
        .with_format(format)
        .with_color(console::colors_enabled_stderr());
    init_tracing_with_config(log_config)?;
    Ok(())
}

fn print_version() {
    println!("objpack {}", env!("CARGO_PKG_VERSION"));
    println!("rust-version: {}", env!("CARGO_PKG_RUST_VERSION"));
    println!("license: {}", env!("CARGO_PKG_LICENSE"));
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "objpack", &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["objpack", "inspect", "model", "--quiet", "--json"]);
        assert!(matches!(
            cli,
            Ok(Cli { quiet: true, command: Commands::Inspect(_), .. })
        ));
    }
}
