//! Fork-join loop executors used by the solver passes.

use std::sync::Arc;

/// Runs `body` once for every index in `start..end` and returns only after all
/// of them have completed.
///
/// Implementations may spread the indices across threads in any order. The
/// solver issues exactly two such calls per step and relies on the barrier
/// between them.
pub trait ParallelLooper: Send + Sync {
    fn for_loop(&self, start: usize, end: usize, body: &(dyn Fn(usize) + Sync));

    /// Number of threads the looper dispatches to.
    fn thread_count(&self) -> usize;
}

/// Runs every loop on the calling thread in index order.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialLooper;

impl ParallelLooper for SequentialLooper {
    fn for_loop(&self, start: usize, end: usize, body: &(dyn Fn(usize) + Sync)) {
        for i in start..end {
            body(i);
        }
    }

    fn thread_count(&self) -> usize {
        1
    }
}

/// Fork-join looper backed by a dedicated rayon thread pool.
#[cfg(feature = "parallel")]
pub struct RayonLooper {
    pool: rayon::ThreadPool,
}

#[cfg(feature = "parallel")]
impl RayonLooper {
    /// Build a looper with `thread_count` workers (`0` lets rayon decide).
    pub fn new(thread_count: usize) -> Result<Self, crate::SolverError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(thread_count)
            .thread_name(|i| format!("rein-solver-{i}"))
            .build()?;
        tracing::debug!(threads = pool.current_num_threads(), "solver thread pool ready");
        Ok(Self { pool })
    }
}

#[cfg(feature = "parallel")]
impl ParallelLooper for RayonLooper {
    fn for_loop(&self, start: usize, end: usize, body: &(dyn Fn(usize) + Sync)) {
        use rayon::prelude::*;

        self.pool
            .install(|| (start..end).into_par_iter().for_each(|i| body(i)));
    }

    fn thread_count(&self) -> usize {
        self.pool.current_num_threads()
    }
}

/// Looper for `thread_count` workers: sequential for `1`, rayon otherwise
/// (`0` lets rayon pick).
#[cfg(feature = "parallel")]
pub fn create_looper(thread_count: usize) -> Result<Arc<dyn ParallelLooper>, crate::SolverError> {
    if thread_count == 1 {
        return Ok(Arc::new(SequentialLooper));
    }
    Ok(Arc::new(RayonLooper::new(thread_count)?))
}

/// Without the `parallel` feature every looper is sequential.
#[cfg(not(feature = "parallel"))]
pub fn create_looper(thread_count: usize) -> Result<Arc<dyn ParallelLooper>, crate::SolverError> {
    if thread_count > 1 {
        tracing::warn!(thread_count, "parallel feature disabled, running sequentially");
    }
    Ok(Arc::new(SequentialLooper))
}
