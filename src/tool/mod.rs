//! External analysis tool integration
//!
//! The analyzer (clang-tidy by default) is an opaque collaborator: it is spawned once per file
//! as `<program> <args...> -p=<build_dir> <file>`, writes its diagnostics straight to the
//! inherited standard streams and reports pass/fail through its exit status only.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

/// How often a child with a deadline is polled for completion
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Outcome of analysing one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationStatus {
    Passed,
    /// Nonzero exit, or `None` when the process was terminated by a signal
    Failed { code: Option<i32> },
    TimedOut,
    SpawnError(String),
}

impl InvocationStatus {
    /// Only a clean zero exit counts as success
    pub fn is_success(&self) -> bool {
        matches!(self, InvocationStatus::Passed)
    }

    fn from_exit(status: ExitStatus) -> Self {
        if status.success() {
            InvocationStatus::Passed
        } else {
            InvocationStatus::Failed {
                code: status.code(),
            }
        }
    }
}

impl fmt::Display for InvocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationStatus::Passed => write!(f, "passed"),
            InvocationStatus::Failed { code: Some(code) } => write!(f, "exit code {code}"),
            InvocationStatus::Failed { code: None } => write!(f, "terminated by signal"),
            InvocationStatus::TimedOut => write!(f, "timed out"),
            InvocationStatus::SpawnError(e) => write!(f, "failed to start: {e}"),
        }
    }
}

/// Anything that can analyse a single file against a build directory
pub trait AnalysisTool: Send + Sync {
    fn invoke(&self, file: &Path, build_dir: &Path) -> InvocationStatus;
}

/// Runs a real executable per file
#[derive(Debug, Clone)]
pub struct CommandTool {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandTool {
    /// A tool that runs `program` with `args`, then `-p=<build_dir>` and the file.
    ///
    /// `timeout` of `None` waits for the child indefinitely.
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// Program name or path as configured
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Look the program up on PATH.
    ///
    /// A missing program is not fatal: every invocation will then be recorded as a failure.
    pub fn resolve(&self) -> Option<PathBuf> {
        match which::which(&self.program) {
            Ok(path) => {
                tracing::debug!("Resolved {} to {}", self.program, path.display());
                Some(path)
            }
            Err(e) => {
                tracing::warn!("Analysis tool '{}' not found on PATH: {}", self.program, e);
                None
            }
        }
    }

    /// The argv this tool runs for `file`
    pub fn command_line(&self, file: &Path, build_dir: &Path) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 3);
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        argv.push(format!("-p={}", build_dir.display()));
        argv.push(file.display().to_string());
        argv
    }

    fn build_command(&self, file: &Path, build_dir: &Path) -> Command {
        let mut build_flag = std::ffi::OsString::from("-p=");
        build_flag.push(build_dir.as_os_str());

        let mut command = Command::new(&self.program);
        command.args(&self.args).arg(build_flag).arg(file);
        command
    }

    fn wait_with_deadline(
        mut child: Child,
        timeout: Duration,
    ) -> std::io::Result<InvocationStatus> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(InvocationStatus::from_exit(status));
            }
            if Instant::now() >= deadline {
                // kill fails if the child exited in the meantime; reaping below covers both
                let _ = child.kill();
                child.wait()?;
                return Ok(InvocationStatus::TimedOut);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Default for CommandTool {
    fn default() -> Self {
        Self::new("clang-tidy", vec!["--quiet".to_string()], None)
    }
}

impl AnalysisTool for CommandTool {
    fn invoke(&self, file: &Path, build_dir: &Path) -> InvocationStatus {
        tracing::trace!("Running {:?}", self.command_line(file, build_dir));

        let child = match self.build_command(file, build_dir).spawn() {
            Ok(child) => child,
            Err(e) => return InvocationStatus::SpawnError(e.to_string()),
        };

        let waited = match self.timeout {
            Some(timeout) => Self::wait_with_deadline(child, timeout),
            None => {
                let mut child = child;
                child.wait().map(InvocationStatus::from_exit)
            }
        };

        waited.unwrap_or_else(|e| InvocationStatus::SpawnError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_layout() {
        let tool = CommandTool::default();
        let argv = tool.command_line(Path::new("/ws/a.cc"), Path::new("/ws/build"));
        assert_eq!(argv, vec!["clang-tidy", "--quiet", "-p=/ws/build", "/ws/a.cc"]);
    }

    #[test]
    fn test_missing_program_is_a_spawn_error() {
        let tool = CommandTool::new("tidy-runner-no-such-tool", vec![], None);
        assert!(tool.resolve().is_none());

        let status = tool.invoke(Path::new("a.cc"), Path::new("build"));
        assert!(matches!(status, InvocationStatus::SpawnError(_)));
        assert!(!status.is_success());
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status_decides_outcome() {
        let pass = CommandTool::new("sh", vec!["-c".into(), "exit 0".into()], None);
        assert_eq!(pass.invoke(Path::new("a.cc"), Path::new("build")), InvocationStatus::Passed);

        let fail = CommandTool::new("sh", vec!["-c".into(), "exit 3".into()], None);
        assert_eq!(
            fail.invoke(Path::new("a.cc"), Path::new("build")),
            InvocationStatus::Failed { code: Some(3) }
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_slow_tool() {
        let slow = CommandTool::new(
            "sh",
            vec!["-c".into(), "sleep 5".into()],
            Some(Duration::from_millis(100)),
        );
        let started = Instant::now();
        assert_eq!(slow.invoke(Path::new("a.cc"), Path::new("build")), InvocationStatus::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(InvocationStatus::Failed { code: Some(2) }.to_string(), "exit code 2");
        assert_eq!(InvocationStatus::TimedOut.to_string(), "timed out");
    }
}
