//! Bounded pool of reusable resources.
//!
//! The pool keeps at most `max_free_count` idle items in a lock-free queue.
//! Borrowing never blocks: when no idle item is available a fresh one is
//! created, so `max_free_count` caps idle capacity, not concurrency.
//! Returning an item to a full pool hands it to the manager for cleanup.
//!
//! Item creation and cleanup are supplied by a `PoolManager`, which lets
//! one pool implementation serve any resource type.

use crossbeam_queue::ArrayQueue;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace, warn};

use crate::config::{validate_sizes, ConfigError};

/// Creation and cleanup hooks for pooled items.
pub trait PoolManager: Send + Sync {
    /// Type of item managed by the pool.
    type Item: Send;

    /// Build a new item.
    fn create(&self) -> Self::Item;

    /// Release an item's underlying resources. The item is not used again.
    fn cleanup(&self, item: Self::Item) -> io::Result<()>;
}

/// Point-in-time pool statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Idle items currently held.
    pub free: usize,
    /// Items built by the manager, including the initial batch.
    pub created: u64,
    /// Acquisitions served from the free list.
    pub reused: u64,
    /// Releases admitted back into the free list.
    pub recycled: u64,
    /// Releases rejected and handed to cleanup.
    pub disposed: u64,
}

/// Bounded, lock-free pool of reusable items.
pub struct ResourcePool<M: PoolManager> {
    manager: M,
    /// Idle items. Capacity is `max_free_count`.
    free: ArrayQueue<M::Item>,
    batch_size: usize,
    created: AtomicU64,
    reused: AtomicU64,
    recycled: AtomicU64,
    disposed: AtomicU64,
}

impl<M: PoolManager> ResourcePool<M> {
    /// Create a pool and pre-populate it with `batch_size` items.
    ///
    /// Both counts must be positive. A `batch_size` above `max_free_count`
    /// is clamped down to `max_free_count`.
    pub fn new(manager: M, batch_size: usize, max_free_count: usize) -> Result<Self, ConfigError> {
        let batch_size = validate_sizes(batch_size, max_free_count)?;
        let free = ArrayQueue::new(max_free_count);

        for _ in 0..batch_size {
            if free.push(manager.create()).is_err() {
                unreachable!("batch size is clamped to the free list capacity");
            }
        }

        debug!(batch_size, max_free_count, "Created resource pool");

        Ok(Self {
            manager,
            free,
            batch_size,
            created: AtomicU64::new(batch_size as u64),
            reused: AtomicU64::new(0),
            recycled: AtomicU64::new(0),
            disposed: AtomicU64::new(0),
        })
    }

    /// Borrow an item, creating one if the free list is empty.
    pub fn acquire(&self) -> M::Item {
        if let Some(item) = self.free.pop() {
            self.reused.fetch_add(1, Ordering::Relaxed);
            return item;
        }

        self.created.fetch_add(1, Ordering::Relaxed);
        trace!("Free list empty, creating item");
        self.manager.create()
    }

    /// Return an item to the pool.
    ///
    /// Returns `Ok(true)` if the item was kept for reuse. If the pool
    /// already holds `max_free_count` idle items, the item is cleaned up
    /// and `Ok(false)` is returned; a cleanup failure is returned as the
    /// error.
    pub fn release(&self, item: M::Item) -> io::Result<bool> {
        match self.free.push(item) {
            Ok(()) => {
                self.recycled.fetch_add(1, Ordering::Relaxed);
                Ok(true)
            }
            Err(item) => {
                self.disposed.fetch_add(1, Ordering::Relaxed);
                debug!(
                    max_free_count = self.free.capacity(),
                    "Pool at idle capacity, cleaning up item"
                );
                self.manager.cleanup(item)?;
                Ok(false)
            }
        }
    }

    /// Number of idle items.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Number of items created at construction, after clamping.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Maximum number of idle items.
    pub fn max_free_count(&self) -> usize {
        self.free.capacity()
    }

    pub fn manager(&self) -> &M {
        &self.manager
    }

    /// Snapshot of the pool counters.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            free: self.free.len(),
            created: self.created.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            recycled: self.recycled.load(Ordering::Relaxed),
            disposed: self.disposed.load(Ordering::Relaxed),
        }
    }
}

impl<M: PoolManager> Drop for ResourcePool<M> {
    fn drop(&mut self) {
        while let Some(item) = self.free.pop() {
            if let Err(e) = self.manager.cleanup(item) {
                warn!(error = %e, "Failed to clean up idle item");
            }
        }
    }
}
