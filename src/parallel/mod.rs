//! Generic parallel execution framework
//!
//! Resource management and execution strategy only: this module knows how many workers the
//! host can run and how to fan work out and results back in. It knows nothing about files or
//! analysis tools.
//!
//! ```rust
//! use tidy_runner::parallel::ExecutionStrategy;
//!
//! // 0 = one worker per available CPU
//! let workers = ExecutionStrategy::calculate_optimal_workers(0);
//! assert!(workers >= 1);
//!
//! let strategy = ExecutionStrategy::for_jobs(4);
//! let doubled = strategy
//!     .execute(vec![1, 2, 3], |x, _worker_id| x * 2, None::<fn(usize, usize, usize)>)
//!     .unwrap();
//! assert_eq!(doubled.len(), 3);
//! ```

pub mod core;

pub use self::core::{ExecutionStrategy, ParallelExecutor, SequentialExecutor};
