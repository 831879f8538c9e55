use anyhow::Result;
use crossbeam::channel::{Receiver, Sender, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fixed-size worker pool fed through bounded channels
pub struct ParallelExecutor<T, R> {
    max_workers: usize,
    _phantom: std::marker::PhantomData<(T, R)>,
}

/// Everything a worker thread needs, bundled to keep the signature short
struct WorkerContext<T, R, F, P> {
    worker_id: usize,
    work_rx: Receiver<T>,
    result_tx: Sender<R>,
    progress_counter: Arc<AtomicUsize>,
    total_items: usize,
    processor: Arc<F>,
    progress_reporter: Option<Arc<P>>,
}

impl<T, R> ParallelExecutor<T, R>
where
    T: Send + Sync + 'static,
    R: Send + Sync + 'static,
{
    /// Executor capped at `max_workers` threads (at least one)
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            _phantom: std::marker::PhantomData,
        }
    }

    /// Run `processor` over every item and return once all of them have completed.
    ///
    /// Results arrive in completion order, not input order. The work channel holds at most
    /// one pending item per worker, so nothing is queued beyond what the pool can take.
    pub fn execute<F, P>(
        &self,
        work_items: Vec<T>,
        processor: F,
        progress_reporter: Option<P>,
    ) -> Result<Vec<R>>
    where
        F: Fn(&T, usize) -> R + Send + Sync + 'static,
        P: Fn(usize, usize, usize) + Send + Sync + 'static,
    {
        if work_items.is_empty() {
            return Ok(Vec::new());
        }

        let total_items = work_items.len();
        let actual_workers = std::cmp::min(self.max_workers, total_items);
        let (work_tx, work_rx): (Sender<T>, Receiver<T>) = bounded(actual_workers);
        let (result_tx, result_rx): (Sender<R>, Receiver<R>) = bounded(actual_workers);

        let progress_counter = Arc::new(AtomicUsize::new(0));
        let processor = Arc::new(processor);
        let progress_reporter = progress_reporter.map(Arc::new);

        tracing::debug!("Dispatching {} items to {} workers", total_items, actual_workers);

        crossbeam::thread::scope(|s| -> Vec<R> {
            for worker_id in 0..actual_workers {
                let ctx = WorkerContext {
                    worker_id,
                    work_rx: work_rx.clone(),
                    result_tx: result_tx.clone(),
                    progress_counter: progress_counter.clone(),
                    total_items,
                    processor: processor.clone(),
                    progress_reporter: progress_reporter.clone(),
                };

                s.spawn(move |_| Self::worker_thread(ctx));
            }

            // Producer: stops early only if every worker has gone away
            s.spawn(move |_| {
                for work_item in work_items {
                    if work_tx.send(work_item).is_err() {
                        break;
                    }
                }
            });

            // Only workers and the producer may hold channel ends from here on, so a dead pool
            // unblocks the producer and the collector instead of hanging them
            drop(work_rx);
            drop(result_tx);

            Self::collect_results(result_rx, total_items)
        })
        .map_err(|_| anyhow::anyhow!("Thread panic occurred during parallel execution"))
    }

    fn worker_thread<F, P>(ctx: WorkerContext<T, R, F, P>)
    where
        F: Fn(&T, usize) -> R,
        P: Fn(usize, usize, usize),
    {
        while let Ok(work_item) = ctx.work_rx.recv() {
            let result = (ctx.processor)(&work_item, ctx.worker_id);

            if ctx.result_tx.send(result).is_err() {
                break;
            }

            let current = ctx.progress_counter.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref reporter) = ctx.progress_reporter {
                reporter(current, ctx.total_items, ctx.worker_id);
            }
        }
    }

    fn collect_results(result_rx: Receiver<R>, total_items: usize) -> Vec<R> {
        let mut results = Vec::with_capacity(total_items);
        while let Ok(result) = result_rx.recv() {
            results.push(result);
            if results.len() >= total_items {
                break;
            }
        }
        results
    }
}

/// Single-threaded fallback, used when only one worker is requested
pub struct SequentialExecutor;

impl SequentialExecutor {
    /// Process items one at a time on the calling thread, preserving input order
    pub fn execute<T, R, F, P>(
        work_items: Vec<T>,
        processor: F,
        progress_reporter: Option<P>,
    ) -> Vec<R>
    where
        F: Fn(&T, usize) -> R,
        P: Fn(usize, usize, usize),
    {
        let total_items = work_items.len();
        let mut results = Vec::with_capacity(total_items);

        for (index, work_item) in work_items.iter().enumerate() {
            results.push(processor(work_item, 0));
            if let Some(reporter) = &progress_reporter {
                reporter(index + 1, total_items, 0);
            }
        }

        results
    }
}

/// Sequential or parallel execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStrategy {
    Sequential,
    Parallel { workers: usize },
}

impl ExecutionStrategy {
    pub fn execute<T, R, F, P>(
        &self,
        work_items: Vec<T>,
        processor: F,
        progress_reporter: Option<P>,
    ) -> Result<Vec<R>>
    where
        T: Send + Sync + 'static,
        R: Send + Sync + 'static,
        F: Fn(&T, usize) -> R + Send + Sync + 'static,
        P: Fn(usize, usize, usize) + Send + Sync + 'static,
    {
        match self {
            ExecutionStrategy::Sequential => Ok(SequentialExecutor::execute(
                work_items,
                processor,
                progress_reporter,
            )),
            ExecutionStrategy::Parallel { workers } => {
                ParallelExecutor::new(*workers).execute(work_items, processor, progress_reporter)
            }
        }
    }

    /// Strategy for a requested job count (0 = hardware parallelism)
    pub fn for_jobs(jobs: usize) -> Self {
        match Self::calculate_optimal_workers(jobs) {
            1 => ExecutionStrategy::Sequential,
            workers => ExecutionStrategy::Parallel { workers },
        }
    }

    /// Worker count for a requested job count.
    ///
    /// ```text
    /// jobs > 0  → jobs
    /// jobs == 0 → num_cpus::get()
    /// ```
    /// Never returns less than 1.
    pub fn calculate_optimal_workers(jobs: usize) -> usize {
        if jobs > 0 { jobs } else { num_cpus::get().max(1) }
    }

    /// Number of worker threads this strategy runs
    pub fn workers(&self) -> usize {
        match self {
            ExecutionStrategy::Sequential => 1,
            ExecutionStrategy::Parallel { workers } => *workers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    #[test]
    fn test_sequential_executor() {
        let results = SequentialExecutor::execute(
            vec![1, 2, 3, 4, 5],
            |x, _worker_id| x * 2,
            None::<fn(usize, usize, usize)>,
        );
        assert_eq!(results, vec![2, 4, 6, 8, 10]);
    }

    #[test]
    fn test_parallel_executor() {
        let executor = ParallelExecutor::new(2);
        let mut results = executor
            .execute(vec![1, 2, 3, 4, 5], |x, _worker_id| x * 2, None::<fn(usize, usize, usize)>)
            .unwrap();

        results.sort();
        assert_eq!(results, vec![2, 4, 6, 8, 10]);
    }

    #[test]
    fn test_parallel_executor_uses_bounded_pool() {
        let seen_workers = Arc::new(Mutex::new(std::collections::BTreeSet::new()));
        let seen = seen_workers.clone();
        let executor = ParallelExecutor::new(3);

        let results = executor
            .execute(
                (0..30).collect::<Vec<_>>(),
                move |x, worker_id| {
                    seen.lock().unwrap().insert(worker_id);
                    std::thread::sleep(Duration::from_millis(1));
                    *x
                },
                None::<fn(usize, usize, usize)>,
            )
            .unwrap();

        assert_eq!(results.len(), 30);
        assert!(seen_workers.lock().unwrap().iter().all(|id| *id < 3));
    }

    #[test]
    fn test_progress_reports_every_item() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        ExecutionStrategy::Parallel { workers: 4 }
            .execute(
                (0..17).collect::<Vec<_>>(),
                |x, _| *x,
                Some(move |_current: usize, total: usize, _worker: usize| {
                    assert_eq!(total, 17);
                    counter.fetch_add(1, Ordering::Relaxed);
                }),
            )
            .unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 17);
    }

    #[test]
    fn test_worker_panic_is_an_error() {
        let result = ExecutionStrategy::Parallel { workers: 2 }.execute(
            vec![1, 2, 3, 4],
            |x, _| {
                if *x == 3 {
                    panic!("boom");
                }
                *x
            },
            None::<fn(usize, usize, usize)>,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_input() {
        let results = ExecutionStrategy::Parallel { workers: 8 }
            .execute(Vec::<u32>::new(), |x, _| *x, None::<fn(usize, usize, usize)>)
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_for_jobs() {
        assert_eq!(ExecutionStrategy::for_jobs(1), ExecutionStrategy::Sequential);
        assert_eq!(
            ExecutionStrategy::for_jobs(6),
            ExecutionStrategy::Parallel { workers: 6 }
        );
        assert!(ExecutionStrategy::for_jobs(0).workers() >= 1);
        assert_eq!(ExecutionStrategy::calculate_optimal_workers(0), num_cpus::get().max(1));
    }
}
