use anyhow::Result;
use clap::Args;
use std::path::Path;
use std::process::ExitCode;

use super::{discover_files, load_settings};
use crate::cli::Output;
use crate::config::ConfigOverrides;

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Print paths relative to the workspace root
    #[arg(long)]
    pub relative: bool,
}

/// Print the discovered files, one per line
pub fn execute(
    args: ListArgs,
    custom_config: Option<&Path>,
    overrides: &ConfigOverrides,
    output: &Output,
) -> Result<ExitCode> {
    let settings = load_settings(custom_config, overrides)?;
    let files = discover_files(&settings)?;

    for file in &files {
        let shown = if args.relative {
            file.strip_prefix(&settings.root).unwrap_or(file)
        } else {
            file.as_path()
        };
        println!("{}", shown.display());
    }

    output.verbose(&format!("{} candidate files", files.len()));
    Ok(ExitCode::SUCCESS)
}
