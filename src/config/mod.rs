//! Configuration management for tidy-runner
//!
//! Settings are layered with figment, lowest priority first:
//! 1. Built-in defaults (`default-config.toml`, embedded at compile time)
//! 2. `tidy-runner.{toml,json,yaml,yml}` in the working directory, or only the file given with
//!    `--config`
//! 3. `TIDY_RUNNER_*` environment variables, `__` separating nested keys
//!    (`TIDY_RUNNER_EXECUTION__JOBS=4`)
//! 4. Command-line flags
//!
//! [`RunnerConfig::resolve`] turns the merged values into absolute paths and filter sets.

mod core;

pub use self::core::{
    ConfigFormat, ConfigOverrides, ExecutionOverrides, PathsOverrides, ToolOverrides,
};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::discover::{ExtensionAllowlist, IgnoreSet};
use crate::tool::CommandTool;

/// Merged configuration, as read from all layers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunnerConfig {
    pub tool: ToolConfig,
    pub paths: PathsConfig,
    pub execution: ExecutionConfig,
}

/// The external analysis executable
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolConfig {
    /// Executable name or path
    pub program: String,

    /// Fixed flags placed before `-p=<build_dir> <file>`
    #[serde(default)]
    pub args: Vec<String>,

    /// Per-file time limit in seconds (0 = unlimited)
    #[serde(default)]
    pub timeout_secs: u64,
}

/// What to scan and what to leave out
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathsConfig {
    /// Workspace root
    pub root: PathBuf,

    /// Directory holding the compilation database, relative to root. Always ignored.
    pub build_dir: PathBuf,

    /// Further ignored directories, relative to root
    #[serde(default)]
    pub ignore: Vec<PathBuf>,

    /// Filename suffixes to analyse
    pub extensions: Vec<String>,

    /// Terminate ignore prefixes with a separator so `build` does not also hide `build2`
    #[serde(default)]
    pub segment_aware_ignore: bool,

    #[serde(default)]
    pub follow_symlinks: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// Worker count (0 = one per CPU)
    #[serde(default)]
    pub jobs: usize,
}

/// Everything a run needs, with paths made absolute
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub root: PathBuf,
    pub build_dir: PathBuf,
    pub ignore: IgnoreSet,
    pub extensions: ExtensionAllowlist,
    pub follow_symlinks: bool,
    pub jobs: usize,
    pub tool: CommandTool,
}

impl RunnerConfig {
    /// Check the merged values and anchor them on the canonical workspace root.
    ///
    /// Relative roots are taken from the current working directory.
    pub fn resolve(&self) -> Result<ResolvedSettings> {
        self.validate()?;

        let root = std::fs::canonicalize(&self.paths.root).with_context(|| {
            format!("Workspace root {} does not exist", self.paths.root.display())
        })?;
        if !root.is_dir() {
            bail!("Workspace root {} is not a directory", root.display());
        }

        let build_dir = anchor(&root, &self.paths.build_dir);
        let ignore_dirs = std::iter::once(build_dir.clone())
            .chain(self.paths.ignore.iter().map(|dir| anchor(&root, dir)));
        let ignore = IgnoreSet::from_prefixes(ignore_dirs, self.paths.segment_aware_ignore);

        let timeout = match self.tool.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        tracing::debug!("Workspace root: {}", root.display());
        tracing::debug!("Build directory: {}", build_dir.display());
        tracing::debug!("Ignore prefixes: {:?}", ignore.prefixes());

        Ok(ResolvedSettings {
            root,
            build_dir,
            ignore,
            extensions: ExtensionAllowlist::new(self.paths.extensions.iter().cloned()),
            follow_symlinks: self.paths.follow_symlinks,
            jobs: self.execution.jobs,
            tool: CommandTool::new(self.tool.program.clone(), self.tool.args.clone(), timeout),
        })
    }

    fn validate(&self) -> Result<()> {
        if self.tool.program.trim().is_empty() {
            bail!("tool.program must not be empty");
        }
        if self.paths.extensions.is_empty() {
            bail!("paths.extensions must list at least one suffix");
        }
        if let Some(empty) = self.paths.extensions.iter().position(|e| e.is_empty()) {
            bail!("paths.extensions[{empty}] is an empty string, which would match every file");
        }
        Ok(())
    }
}

/// Join `path` onto `root` unless it is already absolute
fn anchor(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
