//! File discovery for the runner
//!
//! Walks a workspace root and collects every regular file that survives two filters:
//! - **Ignore prefixes**: absolute path strings; a file whose path starts with any of them is
//!   dropped
//! - **Extension allowlist**: filename suffixes; a file must end with one of them to be kept
//!
//! Both checks run against the same full path string. The prefix check is a plain string
//! comparison, not a path-segment comparison, so an ignore prefix of `/ws/build` also drops
//! `/ws/build2/x.cc`. [`IgnoreSet::from_prefixes`] can append a separator to every prefix
//! when that behaviour is unwanted.
//!
//! Discovery is all-or-nothing: any walk error aborts the run, since a partial file set would
//! silently understate the number of failures.

use anyhow::{Context, Result, bail};
use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::path::{MAIN_SEPARATOR_STR, Path, PathBuf};

/// Absolute path prefixes excluded from analysis
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    prefixes: Vec<String>,
}

impl IgnoreSet {
    /// Build an ignore set from path prefixes.
    ///
    /// With `segment_aware` set, each prefix is terminated with the platform separator so it
    /// only matches whole directory names.
    pub fn from_prefixes<I, P>(prefixes: I, segment_aware: bool) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let prefixes = prefixes
            .into_iter()
            .map(|p| {
                let mut prefix = p.as_ref().to_string_lossy().into_owned();
                if segment_aware && !prefix.ends_with(MAIN_SEPARATOR_STR) {
                    prefix.push_str(MAIN_SEPARATOR_STR);
                }
                prefix
            })
            .collect();
        Self { prefixes }
    }

    /// True when `path` starts with any ignore prefix (plain string comparison)
    pub fn is_ignored(&self, path: &str) -> bool {
        self.prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// True when every file below the directory `dir` would be ignored.
    ///
    /// Files under `dir` all start with `dir` plus a separator, so checking that string
    /// gives exactly the same answer as checking each file, for raw and segment-aware
    /// prefixes alike.
    pub fn covers_dir(&self, dir: &str) -> bool {
        if self.is_ignored(dir) {
            return true;
        }
        let mut with_separator = String::with_capacity(dir.len() + 1);
        with_separator.push_str(dir);
        with_separator.push_str(MAIN_SEPARATOR_STR);
        self.is_ignored(&with_separator)
    }

    /// The prefixes, including any separator appended for segment-aware matching
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

/// Filename suffixes that qualify a file for analysis
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionAllowlist {
    suffixes: Vec<String>,
}

impl ExtensionAllowlist {
    /// Allowlist of filename suffixes such as `.cc`; the dot is part of the suffix
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suffixes: suffixes.into_iter().map(Into::into).collect(),
        }
    }

    /// True when `path` ends with one of the allowed suffixes
    pub fn matches(&self, path: &str) -> bool {
        self.suffixes.iter().any(|suffix| path.ends_with(suffix.as_str()))
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }
}

/// Walks a workspace root and produces the candidate file list
#[derive(Debug, Clone, Default)]
pub struct Discoverer {
    /// Follow symbolic links while walking. When off, symlinked files and directories are skipped.
    pub follow_symlinks: bool,
}

impl Discoverer {
    /// `follow_symlinks` controls whether linked directories and files are visited
    pub fn new(follow_symlinks: bool) -> Self {
        Self { follow_symlinks }
    }

    /// Collect candidate files under `root`, sorted and free of duplicates.
    ///
    /// Ignored directories are pruned during the walk and never read, so broken links or
    /// unreadable entries inside them cannot fail discovery.
    pub fn discover(
        &self,
        root: &Path,
        ignore: &IgnoreSet,
        extensions: &ExtensionAllowlist,
    ) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            bail!("Workspace root {} is not an existing directory", root.display());
        }
        let root = std::fs::canonicalize(root)
            .with_context(|| format!("Failed to resolve workspace root {}", root.display()))?;

        tracing::debug!(
            "Walking {} ({} ignore prefixes, {} extensions)",
            root.display(),
            ignore.prefixes().len(),
            extensions.suffixes().len()
        );

        let mut candidates = BTreeSet::new();
        let mut skipped = 0usize;

        for entry in self.build_walker(&root, ignore) {
            let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.into_path();
            let path_str = path.to_string_lossy();
            if ignore.is_ignored(&path_str) || !extensions.matches(&path_str) {
                skipped += 1;
                continue;
            }
            candidates.insert(path);
        }

        tracing::info!(
            "Discovered {} candidate files ({} skipped)",
            candidates.len(),
            skipped
        );
        Ok(candidates.into_iter().collect())
    }

    /// Walker with every gitignore/hidden-file filter turned off; only our own filters apply.
    fn build_walker(&self, root: &Path, ignored: &IgnoreSet) -> ignore::Walk {
        let mut builder = WalkBuilder::new(root);
        builder
            .standard_filters(false)
            .follow_links(self.follow_symlinks);

        // Skip ignored subtrees without descending into them
        let ignored = ignored.clone();
        builder.filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            !(is_dir && ignored.covers_dir(&entry.path().to_string_lossy()))
        });

        builder.build()
    }
}
