use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use qpbench_types::{BenchError, Result};

/// Bounded worker pool built once per run
pub struct WorkerPool {
    pool: ThreadPool,
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Result<Self> {
        let size = size.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(size)
            .thread_name(|i| format!("qpbench-worker-{}", i))
            .build()
            .map_err(|e| BenchError::Config(format!("failed to build worker pool: {}", e)))?;
        debug!(workers = size, "worker pool ready");
        Ok(WorkerPool { pool, size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Apply `f` to every item and return results in item order
    ///
    /// With `parallel` false the items run one after another on the calling
    /// thread. Either way the call returns only once every item is done.
    pub fn map<T, R, F>(&self, items: &[T], parallel: bool, f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        if parallel && self.size > 1 && items.len() > 1 {
            self.pool.install(|| items.par_iter().map(&f).collect())
        } else {
            items.iter().map(f).collect()
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool").field("size", &self.size).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_results_in_item_order() {
        let pool = WorkerPool::new(4).unwrap();
        let items: Vec<u64> = (0..8).collect();

        // Early items finish last
        let out = pool.map(&items, true, |&i| {
            std::thread::sleep(Duration::from_millis(5 * (8 - i)));
            i * 10
        });
        assert_eq!(out, vec![0, 10, 20, 30, 40, 50, 60, 70]);
    }

    #[test]
    fn test_serial_runs_on_caller() {
        let pool = WorkerPool::new(4).unwrap();
        let caller = std::thread::current().id();
        let out = pool.map(&[1, 2, 3], false, |_| std::thread::current().id() == caller);
        assert_eq!(out, vec![true, true, true]);
    }

    #[test]
    fn test_zero_size_is_one() {
        assert_eq!(WorkerPool::new(0).unwrap().size(), 1);
    }
}
