//! Command-line interface for tidy-runner
//!
//! clap argument parsing plus one module per subcommand. Running without a subcommand
//! is the same as `tidy-runner run`.

pub mod commands;
pub mod output;

pub use commands::Cli;
pub use output::Output;
