//! # tidy-runner - run a per-file static analyzer across a whole workspace
//!
//! Tools like clang-tidy analyse one file at a time and have no notion of "skip this
//! subtree". tidy-runner fills that gap:
//!
//! 1. **Discover** every source file under the workspace root, dropping anything under an
//!    ignored prefix (the build directory, vendored code) and anything without an allowed suffix
//! 2. **Run** the analyzer once per file on a bounded worker pool
//! 3. **Aggregate** failures into a single exit status and a one-line summary
//!
//! ## Quick Start
//!
//! ```bash
//! # Analyse every .h/.cc file with clang-tidy, using build/ as the compilation database
//! tidy-runner
//!
//! # Show what would run
//! tidy-runner run --dry-run
//!
//! # Different tool, suffixes and job count
//! tidy-runner --tool clang-tidy-18 --ext .cpp,.hpp -j 8
//! ```
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use tidy_runner::discover::{Discoverer, ExtensionAllowlist, IgnoreSet};
//! use tidy_runner::parallel::ExecutionStrategy;
//! use tidy_runner::runner::Runner;
//! use tidy_runner::tool::CommandTool;
//!
//! let root = Path::new("/src/project");
//! let ignore = IgnoreSet::from_prefixes([root.join("build"), root.join("submodules")], false);
//! let exts = ExtensionAllowlist::new([".h", ".cc"]);
//! let files = Discoverer::default().discover(root, &ignore, &exts)?;
//!
//! let runner = Runner::new(
//!     Arc::new(CommandTool::default()),
//!     root.join("build"),
//!     ExecutionStrategy::for_jobs(0),
//! );
//! let report = runner.run_all(files)?;
//! println!("{}", report.summary_line());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod discover;
pub mod parallel;
pub mod runner;
pub mod tool;

pub use cli::{Cli, Output};
pub use config::RunnerConfig;
