//! Process-wide worker pool for transform execution.
//!
//! The transform engine's thread state is global: the first handle
//! initialises it, later handles reuse it, and the last handle to drop
//! tears it down. Plans keep their own `Arc` to the pool they were created
//! with, so tearing down the registry never pulls a pool out from under a
//! live plan.

use crate::error::Result;
use log::debug;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct Registry {
    handles: usize,
    pool: Option<Arc<ThreadPool>>,
}

static REGISTRY: Mutex<Registry> = Mutex::new(Registry {
    handles: 0,
    pool: None,
});

fn registry() -> MutexGuard<'static, Registry> {
    REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Reference-counted handle on the global transform thread state.
pub struct TransformThreads {
    pool: Arc<ThreadPool>,
}

impl TransformThreads {
    /// Initialises (or joins) the global thread state with `threads` workers.
    ///
    /// A request for a different worker count than the current pool has
    /// replaces the registry's pool for future plans; existing handles keep
    /// the pool they already hold.
    pub fn acquire(threads: usize) -> Result<Self> {
        let threads = threads.max(1);
        let mut registry = registry();

        let pool = match &registry.pool {
            Some(pool) if pool.current_num_threads() == threads => Arc::clone(pool),
            _ => {
                let pool = Arc::new(
                    ThreadPoolBuilder::new()
                        .num_threads(threads)
                        .thread_name(|i| format!("fct-worker-{i}"))
                        .build()?,
                );
                debug!("transform thread pool initialised with {} workers", threads);
                registry.pool = Some(Arc::clone(&pool));
                pool
            }
        };

        registry.handles += 1;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Arc<ThreadPool> {
        &self.pool
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Number of live handles across the process.
    pub fn active_handles() -> usize {
        registry().handles
    }
}

impl Drop for TransformThreads {
    fn drop(&mut self) {
        let mut registry = registry();
        registry.handles = registry.handles.saturating_sub(1);
        if registry.handles == 0 && registry.pool.take().is_some() {
            debug!("transform thread pool torn down");
        }
    }
}
