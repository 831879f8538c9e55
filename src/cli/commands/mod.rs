use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::cli::Output;
use crate::config::{
    ConfigOverrides, ExecutionOverrides, PathsOverrides, ResolvedSettings, RunnerConfig,
    ToolOverrides,
};
use crate::discover::Discoverer;

pub mod config;
pub mod list;
pub mod run;

#[derive(Parser)]
#[command(
    name = "tidy-runner",
    version = env!("CARGO_PKG_VERSION"),
    about = "Run a per-file static analyzer over every source file in a workspace",
    long_about = "Discovers source files under the workspace root, skips the build directory \
                  and other ignored subtrees, and runs the analysis tool (clang-tidy by default) \
                  on each remaining file in parallel. Exits 1 if any file fails."
)]
pub struct Cli {
    /// Run as if started in <DIR> instead of current working directory
    #[arg(short = 'C', long = "directory", global = true)]
    pub directory: Option<PathBuf>,

    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use custom configuration file instead of tidy-runner.{toml,json,yaml,yml}
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub selection: SelectionArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Flags shared by every subcommand; each overrides the matching config key
#[derive(Args, Debug, Default, Clone)]
pub struct SelectionArgs {
    /// Build directory holding the compilation database, relative to the root
    #[arg(long, global = true, value_name = "DIR")]
    pub build_dir: Option<PathBuf>,

    /// Extra directories to skip, relative to the root (replaces the configured list)
    #[arg(long, global = true, value_delimiter = ',', value_name = "DIR")]
    pub ignore: Vec<PathBuf>,

    /// File suffixes to analyse (replaces the configured list)
    #[arg(long = "ext", global = true, value_delimiter = ',', value_name = "SUFFIX")]
    pub extensions: Vec<String>,

    /// Match ignore prefixes on whole directory names only
    #[arg(long, global = true)]
    pub segment_aware_ignore: bool,

    /// Follow symbolic links while discovering files
    #[arg(long, global = true)]
    pub follow_symlinks: bool,

    /// Number of parallel workers (0 = one per CPU)
    #[arg(short, long, global = true)]
    pub jobs: Option<usize>,

    /// Per-file time limit in seconds (0 = unlimited)
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Analysis executable
    #[arg(long, global = true, value_name = "PROGRAM")]
    pub tool: Option<String>,

    /// Fixed argument for the analysis executable (repeatable, replaces the configured list)
    #[arg(long = "tool-arg", global = true, allow_hyphen_values = true, value_name = "ARG")]
    pub tool_args: Vec<String>,
}

impl SelectionArgs {
    /// Only flags the user actually passed become overrides
    pub fn to_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            tool: ToolOverrides {
                program: self.tool.clone(),
                args: non_empty(&self.tool_args),
                timeout_secs: self.timeout,
            },
            paths: PathsOverrides {
                build_dir: self.build_dir.clone(),
                ignore: non_empty(&self.ignore),
                extensions: non_empty(&self.extensions),
                segment_aware_ignore: self.segment_aware_ignore.then_some(true),
                follow_symlinks: self.follow_symlinks.then_some(true),
            },
            execution: ExecutionOverrides { jobs: self.jobs },
        }
    }
}

/// Load, merge and resolve the configuration for a command
pub(crate) fn load_settings(
    custom_config: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<ResolvedSettings> {
    RunnerConfig::load(custom_config, overrides)?.resolve()
}

/// Discover candidate files for resolved settings
pub(crate) fn discover_files(settings: &ResolvedSettings) -> Result<Vec<PathBuf>> {
    Discoverer::new(settings.follow_symlinks).discover(
        &settings.root,
        &settings.ignore,
        &settings.extensions,
    )
}

fn non_empty<T: Clone>(values: &[T]) -> Option<Vec<T>> {
    (!values.is_empty()).then(|| values.to_vec())
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyse every candidate file (default)
    Run(run::RunArgs),
    /// Print the candidate files without analysing them
    List(list::ListArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Dispatch the selected subcommand
    pub fn run(self) -> Result<ExitCode> {
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        setup_logging(self.verbose, self.quiet);

        let output = Output::new(self.verbose > 0, self.quiet);
        let overrides = self.selection.to_overrides();
        let custom_config = self.config.as_deref();

        match self.command {
            Some(Commands::Run(args)) => run::execute(args, custom_config, &overrides, &output),
            Some(Commands::List(args)) => list::execute(args, custom_config, &overrides, &output),
            Some(Commands::Config(args)) => config::execute(args, custom_config, &overrides),
            None => run::execute(run::RunArgs::default(), custom_config, &overrides, &output),
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info,ignore=warn"),
            2 => tracing_subscriber::EnvFilter::new("debug,ignore=warn"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    // try_init: a subscriber may already be installed when driven as a library
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "tidy-runner",
            "--ext",
            ".cpp,.hpp",
            "--ignore",
            "third_party",
            "-j",
            "4",
            "--tool",
            "clang-tidy-18",
            "--tool-arg=--quiet",
            "--tool-arg=--warnings-as-errors=*",
            "run",
            "--dry-run",
        ])
        .unwrap();

        let overrides = cli.selection.to_overrides();
        assert_eq!(overrides.paths.extensions, Some(vec![".cpp".into(), ".hpp".into()]));
        assert_eq!(overrides.paths.ignore, Some(vec![PathBuf::from("third_party")]));
        assert_eq!(overrides.execution.jobs, Some(4));
        assert_eq!(overrides.tool.program.as_deref(), Some("clang-tidy-18"));
        assert_eq!(
            overrides.tool.args,
            Some(vec!["--quiet".into(), "--warnings-as-errors=*".into()])
        );
        assert!(matches!(cli.command, Some(Commands::Run(run::RunArgs { dry_run: true }))));
    }

    #[test]
    fn test_unset_flags_leave_config_alone() {
        let cli = Cli::try_parse_from(["tidy-runner"]).unwrap();
        let overrides = cli.selection.to_overrides();
        assert!(overrides.paths.extensions.is_none());
        assert!(overrides.paths.segment_aware_ignore.is_none());
        assert!(overrides.tool.args.is_none());
        assert!(cli.command.is_none());
    }
}
