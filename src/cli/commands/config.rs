use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::Path;
use std::process::ExitCode;

use crate::config::{ConfigFormat, ConfigOverrides, RunnerConfig};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Display current merged configuration
    Show {
        /// Output format
        #[arg(short, long, value_enum, default_value = "toml")]
        format: ConfigFormat,
    },
    /// Check that the merged configuration resolves against the workspace
    Validate,
}

/// Print the merged configuration or check that it resolves
pub fn execute(
    args: ConfigArgs,
    custom_config: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<ExitCode> {
    let config = RunnerConfig::load(custom_config, overrides)?;

    match args.command {
        ConfigCommand::Show { format } => {
            println!("{}", config.export(format)?.trim_end());
        }
        ConfigCommand::Validate => {
            let settings = config.resolve()?;
            println!("Configuration OK (root: {})", settings.root.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}
