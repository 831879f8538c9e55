use anyhow::Result;
use clap::Args;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use super::{discover_files, load_settings};
use crate::cli::Output;
use crate::config::ConfigOverrides;
use crate::parallel::ExecutionStrategy;
use crate::runner::Runner;
use crate::tool::InvocationStatus;

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Print the command that would run for each file, without running anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Discover files, analyse each one and map the outcome to an exit code
pub fn execute(
    args: RunArgs,
    custom_config: Option<&Path>,
    overrides: &ConfigOverrides,
    output: &Output,
) -> Result<ExitCode> {
    let settings = load_settings(custom_config, overrides)?;
    let files = discover_files(&settings)?;
    output.verbose(&format!(
        "Found {} candidate files under {}",
        files.len(),
        settings.root.display()
    ));

    if args.dry_run {
        for file in &files {
            println!("{}", shell_join(&settings.tool.command_line(file, &settings.build_dir)));
        }
        return Ok(ExitCode::SUCCESS);
    }

    if !files.is_empty() && settings.tool.resolve().is_none() {
        output.warning(&format!(
            "'{}' was not found on PATH; every file will be reported as failed",
            settings.tool.program()
        ));
    }

    let strategy = ExecutionStrategy::for_jobs(settings.jobs);
    let reporter = *output;
    let runner = Runner::new(Arc::new(settings.tool.clone()), &settings.build_dir, strategy)
        .with_failure_callback(Arc::new(move |file: &Path, status: &InvocationStatus| {
            reporter.file_failure(file, status)
        }));

    let report = runner.run_all(files)?;
    tracing::info!(
        "{} of {} files failed",
        report.failure_count(),
        report.total_files()
    );

    println!("{}", report.summary_line());
    Ok(ExitCode::from(report.exit_code()))
}

/// Render an argv for display, quoting anything the shell would split or expand
fn shell_join(argv: &[String]) -> String {
    argv.iter()
        .map(|arg| {
            let plain = !arg.is_empty()
                && arg
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
            if plain {
                arg.clone()
            } else {
                format!("'{}'", arg.replace('\'', r"'\''"))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_join_quotes_when_needed() {
        let argv = vec![
            "clang-tidy".to_string(),
            "--checks=-*,modernize-*".to_string(),
            "-p=/ws/build".to_string(),
            "/ws/my file.cc".to_string(),
            "it's".to_string(),
        ];
        assert_eq!(
            shell_join(&argv),
            r"clang-tidy '--checks=-*,modernize-*' -p=/ws/build '/ws/my file.cc' 'it'\''s'"
        );
    }
}
