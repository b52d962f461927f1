//! Bounded worker pool for sprite casting.

use std::{num::NonZeroUsize, thread};

use rayon::{Scope, ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use tracing::debug;

/// At most `capacity` sprite casts run at once, however many sprites are
/// queued; the rest wait for a free worker.
pub struct SpritePool {
    pool: ThreadPool,
    capacity: usize,
}

impl SpritePool {
    /// Pool for `capacity` concurrent casts.  The thread count is further
    /// capped at the machine's parallelism; extra threads would only queue
    /// on the same cores.
    pub fn new(capacity: usize) -> Result<Self, ThreadPoolBuildError> {
        let capacity = capacity.max(1);
        let cores = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        let threads = capacity.min(cores);

        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("sprite-cast-{i}"))
            .build()?;
        debug!(capacity, threads, "sprite pool ready");

        Ok(Self { pool, capacity })
    }

    /// Requested concurrency bound.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Worker threads actually running.
    #[inline]
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `op` inside the pool; returns once every task it spawned has
    /// finished.
    pub fn scope<'scope, OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce(&Scope<'scope>) -> R + Send,
        R: Send,
    {
        self.pool.scope(op)
    }
}

impl std::fmt::Debug for SpritePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpritePool")
            .field("capacity", &self.capacity)
            .field("threads", &self.threads())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn never_exceeds_capacity() {
        let pool = SpritePool::new(2).unwrap();
        assert_eq!(pool.capacity(), 2);
        assert!(pool.threads() <= 2);

        let running = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let done = AtomicUsize::new(0);
        pool.scope(|s| {
            for _ in 0..32 {
                s.spawn(|_| {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(std::time::Duration::from_millis(1));
                    running.fetch_sub(1, Ordering::SeqCst);
                    done.fetch_add(1, Ordering::SeqCst);
                });
            }
        });

        assert_eq!(done.load(Ordering::SeqCst), 32);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn zero_capacity_is_bumped_to_one() {
        let pool = SpritePool::new(0).unwrap();
        assert_eq!(pool.capacity(), 1);
        assert_eq!(pool.threads(), 1);
    }
}
