use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

/// Failing file paths, appended to concurrently by workers
///
/// Cloning shares the underlying collection.
#[derive(Debug, Clone, Default)]
pub struct FailureReport {
    failed: Arc<Mutex<Vec<PathBuf>>>,
}

impl FailureReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Safe to call from any worker thread
    pub fn record(&self, path: PathBuf) {
        // A worker that panicked mid-push cannot leave a half-written Vec behind
        self.failed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path);
    }

    pub fn len(&self) -> usize {
        self.failed.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Final, sorted list of failures. Call once all workers have been joined.
    pub fn into_sorted(self) -> Vec<PathBuf> {
        let mut failed = match Arc::try_unwrap(self.failed) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(PoisonError::into_inner),
            Err(shared) => shared.lock().unwrap_or_else(PoisonError::into_inner).clone(),
        };
        failed.sort();
        failed
    }
}

/// Aggregate outcome of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    total_files: usize,
    failed_paths: Vec<PathBuf>,
}

impl RunReport {
    /// `failed_paths` is kept in the order given; [`FailureReport::into_sorted`] sorts it
    pub fn new(total_files: usize, failed_paths: Vec<PathBuf>) -> Self {
        Self {
            total_files,
            failed_paths,
        }
    }

    pub fn total_files(&self) -> usize {
        self.total_files
    }

    pub fn failure_count(&self) -> usize {
        self.failed_paths.len()
    }

    pub fn failed_paths(&self) -> &[PathBuf] {
        &self.failed_paths
    }

    pub fn is_success(&self) -> bool {
        self.failed_paths.is_empty()
    }

    /// The one line printed to stdout at the end of a run
    pub fn summary_line(&self) -> String {
        if self.is_success() {
            "No errors found.".to_string()
        } else {
            format!("Errors in {} files.", self.failure_count())
        }
    }

    /// Process exit code: 0 when every file passed, 1 otherwise
    pub fn exit_code(&self) -> u8 {
        if self.is_success() { 0 } else { 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_concurrent_records_are_not_lost() {
        let report = FailureReport::new();
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let report = report.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        report.record(PathBuf::from(format!("/ws/t{t}/f{i}.cc")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(report.len(), 2000);
        let sorted = report.into_sorted();
        assert_eq!(sorted.len(), 2000);
        assert!(sorted.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_summary_lines() {
        assert_eq!(RunReport::new(3, vec![]).summary_line(), "No errors found.");
        let report = RunReport::new(3, vec![PathBuf::from("a.cc"), PathBuf::from("b.h")]);
        assert_eq!(report.summary_line(), "Errors in 2 files.");
        assert_eq!(report.exit_code(), 1);
        assert!(!report.is_success());
    }
}
