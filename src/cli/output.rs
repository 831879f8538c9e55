//! Styled status output
//!
//! Everything here goes to stderr. Stdout is reserved for a command's actual result
//! (the run summary line, file lists, rendered config) so it stays machine-readable.

use console::style;
use std::path::Path;

use crate::tool::InvocationStatus;

/// Output handler for consistent CLI formatting
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Errors are always shown, even in quiet mode
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✖").red(), message);
    }

    pub fn warning(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("⚠").yellow(), message);
        }
    }

    /// Printed only with `--verbose`
    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            eprintln!("{} {}", style("ℹ").dim(), style(message).dim());
        }
    }

    /// One line per failing file, printed as soon as its analysis finishes
    pub fn file_failure(&self, file: &Path, status: &InvocationStatus) {
        if !self.quiet {
            eprintln!(
                "{} {} {}",
                style("✗").red().bold(),
                style(file.display()).underlined(),
                style(format!("({status})")).dim()
            );
        }
    }
}
