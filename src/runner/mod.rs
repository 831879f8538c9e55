//! Runner/Aggregator
//!
//! Fans candidate files out to the worker pool, runs the analysis tool once per file and
//! reduces the outcomes into a [`RunReport`]. Every file is always attempted; a failing file
//! never stops the run.

pub mod report;

pub use report::{FailureReport, RunReport};

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::parallel::ExecutionStrategy;
use crate::tool::{AnalysisTool, InvocationStatus};

/// Called with each failing file as soon as its invocation completes
pub type FailureCallback = Arc<dyn Fn(&Path, &InvocationStatus) + Send + Sync>;

/// Fans files out to an [`AnalysisTool`] and aggregates the outcome
pub struct Runner {
    tool: Arc<dyn AnalysisTool>,
    build_dir: PathBuf,
    strategy: ExecutionStrategy,
    on_failure: Option<FailureCallback>,
}

impl Runner {
    /// `build_dir` is handed to the tool on every invocation
    pub fn new(
        tool: Arc<dyn AnalysisTool>,
        build_dir: impl Into<PathBuf>,
        strategy: ExecutionStrategy,
    ) -> Self {
        Self {
            tool,
            build_dir: build_dir.into(),
            strategy,
            on_failure: None,
        }
    }

    /// Report failing files as they happen instead of only in the final summary
    pub fn with_failure_callback(mut self, callback: FailureCallback) -> Self {
        self.on_failure = Some(callback);
        self
    }

    /// Analyse every file and wait for all of them before returning.
    pub fn run_all(&self, files: Vec<PathBuf>) -> Result<RunReport> {
        let total_files = files.len();
        let failures = FailureReport::new();

        tracing::info!(
            "Analysing {} files with {} worker(s)",
            total_files,
            self.strategy.workers()
        );

        let processor = {
            let tool = self.tool.clone();
            let build_dir = self.build_dir.clone();
            let failures = failures.clone();
            let on_failure = self.on_failure.clone();
            move |file: &PathBuf, worker_id: usize| {
                let status = tool.invoke(file, &build_dir);
                if status.is_success() {
                    tracing::debug!("[worker-{}] {} passed", worker_id, file.display());
                } else {
                    tracing::info!("{} failed: {}", file.display(), status);
                    if let Some(callback) = &on_failure {
                        callback(file.as_path(), &status);
                    }
                    failures.record(file.clone());
                }
            }
        };

        let progress = |current: usize, total: usize, worker_id: usize| {
            tracing::trace!("[worker-{}] {}/{} files done", worker_id, current, total);
        };

        let completed = self.strategy.execute(files, processor, Some(progress))?;
        debug_assert_eq!(completed.len(), total_files);

        Ok(RunReport::new(total_files, failures.into_sorted()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails every file whose name is in `failing`, and counts invocations
    struct StubTool {
        failing: HashSet<PathBuf>,
        calls: AtomicUsize,
        build_dirs: Mutex<Vec<PathBuf>>,
    }

    impl StubTool {
        fn failing<I: IntoIterator<Item = PathBuf>>(failing: I) -> Arc<Self> {
            Arc::new(Self {
                failing: failing.into_iter().collect(),
                calls: AtomicUsize::new(0),
                build_dirs: Mutex::new(Vec::new()),
            })
        }
    }

    impl AnalysisTool for StubTool {
        fn invoke(&self, file: &Path, build_dir: &Path) -> InvocationStatus {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.build_dirs.lock().unwrap().push(build_dir.to_path_buf());
            if self.failing.contains(file) {
                InvocationStatus::Failed { code: Some(1) }
            } else {
                InvocationStatus::Passed
            }
        }
    }

    fn files(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("/ws/src/file{i:03}.cc"))).collect()
    }

    #[test]
    fn test_failure_count_independent_of_pool_size() {
        let all = files(40);
        let failing: Vec<PathBuf> = all.iter().step_by(3).cloned().collect();

        for strategy in [
            ExecutionStrategy::Sequential,
            ExecutionStrategy::Parallel { workers: 4 },
            ExecutionStrategy::Parallel { workers: all.len() },
        ] {
            let tool = StubTool::failing(failing.clone());
            let runner = Runner::new(tool.clone(), "/ws/build", strategy.clone());
            let report = runner.run_all(all.clone()).unwrap();

            assert_eq!(report.failure_count(), failing.len(), "{strategy:?}");
            assert_eq!(report.failed_paths(), failing.as_slice(), "{strategy:?}");
            assert_eq!(report.total_files(), 40);
            assert_eq!(tool.calls.load(Ordering::SeqCst), 40);
        }
    }

    #[test]
    fn test_reference_scenario() {
        let a = PathBuf::from("/ws/a.cc");
        let b = PathBuf::from("/ws/b.h");
        let tool = StubTool::failing([b.clone()]);
        let runner = Runner::new(tool, "/ws/build", ExecutionStrategy::Parallel { workers: 2 });

        let report = runner.run_all(vec![a, b.clone()]).unwrap();
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.failed_paths(), &[b]);
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.summary_line(), "Errors in 1 files.");
    }

    #[test]
    fn test_empty_input_has_no_errors() {
        let tool = StubTool::failing([]);
        let runner = Runner::new(tool.clone(), "/ws/build", ExecutionStrategy::for_jobs(0));

        let report = runner.run_all(Vec::new()).unwrap();
        assert!(report.is_success());
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.summary_line(), "No errors found.");
        assert_eq!(tool.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_build_dir_passed_to_every_invocation() {
        let tool = StubTool::failing([]);
        let strategy = ExecutionStrategy::Parallel { workers: 3 };
        let runner = Runner::new(tool.clone(), "/ws/out", strategy);

        runner.run_all(files(5)).unwrap();
        let dirs = tool.build_dirs.lock().unwrap();
        assert_eq!(dirs.len(), 5);
        assert!(dirs.iter().all(|d| d == Path::new("/ws/out")));
    }

    #[test]
    fn test_failure_callback_sees_each_failure_once() {
        let all = files(12);
        let failing: Vec<PathBuf> = all[..5].to_vec();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let runner = Runner::new(
            StubTool::failing(failing.clone()),
            "/ws/build",
            ExecutionStrategy::Parallel { workers: 4 },
        )
        .with_failure_callback(Arc::new(move |path: &Path, _status: &InvocationStatus| {
            sink.lock().unwrap().push(path.to_path_buf());
        }));

        runner.run_all(all).unwrap();
        let mut seen = seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, failing);
    }
}
