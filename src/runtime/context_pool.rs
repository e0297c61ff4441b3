//! Pool of reusable async-I/O contexts.
//!
//! Wires `ResourcePool` to `AsyncContext`: contexts are built by a
//! caller-supplied creator, optionally scrubbed by a cleaner every time
//! they are returned, and disposed when the pool has no room for them.
//! Disposal defaults to `AsyncContext::dispose` and can be replaced with a
//! disposer hook.

use std::fmt;
use std::io;
use std::sync::Arc;

use super::context::AsyncContext;
use super::pool::{PoolManager, PoolStats, ResourcePool};
use crate::config::{validate_sizes, ConfigError, PoolConfig};

type Creator = Arc<dyn Fn() -> AsyncContext + Send + Sync>;
type Cleaner = Arc<dyn Fn(&mut AsyncContext) + Send + Sync>;
type Disposer = Arc<dyn Fn(AsyncContext) -> io::Result<()> + Send + Sync>;

/// `PoolManager` that builds contexts with a creator and disposes them.
struct ContextManager {
    creator: Creator,
    disposer: Option<Disposer>,
}

impl PoolManager for ContextManager {
    type Item = AsyncContext;

    fn create(&self) -> AsyncContext {
        (self.creator)()
    }

    fn cleanup(&self, item: AsyncContext) -> io::Result<()> {
        match &self.disposer {
            Some(disposer) => disposer(item),
            None => item.dispose(),
        }
    }
}

/// Bounded pool of `AsyncContext`s.
///
/// # Example
///
/// ```
/// use wirepool::runtime::{AsyncContext, AsyncContextPool};
///
/// let pool = AsyncContextPool::builder()
///     .batch_size(4)
///     .max_free_count(16)
///     .creator(|| AsyncContext::new(4096))
///     .cleaner(AsyncContext::reset)
///     .build()
///     .unwrap();
///
/// let ctx = pool.acquire();
/// assert!(pool.release(ctx).unwrap());
/// ```
pub struct AsyncContextPool {
    pool: ResourcePool<ContextManager>,
    cleaner: Option<Cleaner>,
}

impl AsyncContextPool {
    pub fn builder() -> AsyncContextPoolBuilder {
        AsyncContextPoolBuilder::default()
    }

    /// Build a pool from configuration, using `AsyncContext::new` with the
    /// configured buffer size as creator and `AsyncContext::reset` as cleaner.
    pub fn from_config(config: &PoolConfig) -> Result<Self, ConfigError> {
        let buffer_size = config.buffer_size;
        Self::builder()
            .batch_size(config.batch_size)
            .max_free_count(config.max_free_count)
            .creator(move || AsyncContext::new(buffer_size))
            .cleaner(AsyncContext::reset)
            .build()
    }

    /// Borrow a context.
    pub fn acquire(&self) -> AsyncContext {
        self.pool.acquire()
    }

    /// Return a context.
    ///
    /// The cleaner always runs first. Returns `Ok(true)` if the context was
    /// kept for reuse; `Ok(false)` if the pool was full and the context has
    /// been disposed. A disposal failure is returned as `Err`.
    pub fn release(&self, mut ctx: AsyncContext) -> io::Result<bool> {
        if let Some(cleaner) = &self.cleaner {
            cleaner(&mut ctx);
        }
        self.pool.release(ctx)
    }

    pub fn free_count(&self) -> usize {
        self.pool.free_count()
    }

    pub fn batch_size(&self) -> usize {
        self.pool.batch_size()
    }

    pub fn max_free_count(&self) -> usize {
        self.pool.max_free_count()
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }
}

impl fmt::Debug for AsyncContextPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncContextPool")
            .field("stats", &self.stats())
            .field("max_free_count", &self.max_free_count())
            .field("has_cleaner", &self.cleaner.is_some())
            .finish()
    }
}

/// Builder for `AsyncContextPool`.
///
/// Sizes default to `PoolConfig::default()`. A creator is required.
pub struct AsyncContextPoolBuilder {
    batch_size: usize,
    max_free_count: usize,
    creator: Option<Creator>,
    cleaner: Option<Cleaner>,
    disposer: Option<Disposer>,
}

impl Default for AsyncContextPoolBuilder {
    fn default() -> Self {
        let defaults = PoolConfig::default();
        Self {
            batch_size: defaults.batch_size,
            max_free_count: defaults.max_free_count,
            creator: None,
            cleaner: None,
            disposer: None,
        }
    }
}

impl AsyncContextPoolBuilder {
    /// Contexts created up front.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Cap on idle contexts.
    pub fn max_free_count(mut self, max_free_count: usize) -> Self {
        self.max_free_count = max_free_count;
        self
    }

    pub fn creator<F>(mut self, creator: F) -> Self
    where
        F: Fn() -> AsyncContext + Send + Sync + 'static,
    {
        self.creator = Some(Arc::new(creator));
        self
    }

    /// Hook run on every returned context before it is pooled or disposed.
    pub fn cleaner<F>(mut self, cleaner: F) -> Self
    where
        F: Fn(&mut AsyncContext) + Send + Sync + 'static,
    {
        self.cleaner = Some(Arc::new(cleaner));
        self
    }

    /// Hook that takes over contexts the pool has no room for, in place of
    /// `AsyncContext::dispose`. Its error is returned from `release`.
    pub fn disposer<F>(mut self, disposer: F) -> Self
    where
        F: Fn(AsyncContext) -> io::Result<()> + Send + Sync + 'static,
    {
        self.disposer = Some(Arc::new(disposer));
        self
    }

    pub fn build(self) -> Result<AsyncContextPool, ConfigError> {
        validate_sizes(self.batch_size, self.max_free_count)?;
        let creator = self.creator.ok_or(ConfigError::MissingCreator)?;

        let manager = ContextManager {
            creator,
            disposer: self.disposer,
        };
        let pool = ResourcePool::new(manager, self.batch_size, self.max_free_count)?;

        Ok(AsyncContextPool {
            pool,
            cleaner: self.cleaner,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::token::{Completion, OpType};
    use bytes::BufMut;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn counting_pool(
        batch_size: usize,
        max_free_count: usize,
    ) -> (AsyncContextPool, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let creates = Arc::new(AtomicUsize::new(0));
        let cleans = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&creates);
        let k = Arc::clone(&cleans);
        let pool = AsyncContextPool::builder()
            .batch_size(batch_size)
            .max_free_count(max_free_count)
            .creator(move || {
                c.fetch_add(1, Ordering::SeqCst);
                AsyncContext::new(256)
            })
            .cleaner(move |ctx| {
                k.fetch_add(1, Ordering::SeqCst);
                ctx.reset();
            })
            .build()
            .unwrap();

        (pool, creates, cleans)
    }

    #[test]
    fn test_builder_validation() {
        let err = AsyncContextPool::builder()
            .batch_size(0)
            .creator(|| AsyncContext::new(16))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBatchSize(0)));

        let err = AsyncContextPool::builder()
            .max_free_count(0)
            .creator(|| AsyncContext::new(16))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMaxFreeCount(0)));

        let err = AsyncContextPool::builder()
            .batch_size(1)
            .max_free_count(1)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCreator));
    }

    #[test]
    fn test_cleaner_is_optional() {
        let pool = AsyncContextPool::builder()
            .batch_size(1)
            .max_free_count(1)
            .creator(|| AsyncContext::new(16))
            .build()
            .unwrap();

        let mut ctx = pool.acquire();
        ctx.buffer_mut().put_slice(b"left over");
        assert!(pool.release(ctx).unwrap());

        // Without a cleaner the context comes back as it was returned.
        assert_eq!(pool.acquire().buffer(), b"left over");
    }

    #[test]
    fn test_drain_batch_then_create() {
        let (pool, creates, _) = counting_pool(2, 2);
        assert_eq!(creates.load(Ordering::SeqCst), 2);

        let _a = pool.acquire();
        let _b = pool.acquire();
        assert_eq!(creates.load(Ordering::SeqCst), 2);

        let _c = pool.acquire();
        assert_eq!(creates.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_release_resets_and_recycles() {
        let (pool, creates, cleans) = counting_pool(1, 2);

        let mut ctx = pool.acquire();
        ctx.start(OpType::Receive);
        ctx.buffer_mut().put_slice(b"PINGREQ");
        ctx.complete(Ok(7));
        ctx.set_user_token(99);

        assert!(pool.release(ctx).unwrap());
        assert_eq!(cleans.load(Ordering::SeqCst), 1);

        let ctx = pool.acquire();
        assert_eq!(creates.load(Ordering::SeqCst), 1);
        assert!(ctx.buffer().is_empty());
        assert_eq!(ctx.completion(), Completion::Idle);
        assert!(ctx.user_token().is_none());
    }

    #[test]
    fn test_release_when_full_disposes() {
        let (pool, _, cleans) = counting_pool(1, 1);

        let a = pool.acquire();
        let b = pool.acquire();
        assert!(pool.release(a).unwrap());
        assert!(!pool.release(b).unwrap());

        // Cleaner runs whether or not the context is re-admitted.
        assert_eq!(cleans.load(Ordering::SeqCst), 2);
        assert_eq!(pool.free_count(), 1);
        assert_eq!(pool.stats().disposed, 1);
    }

    #[test]
    fn test_release_propagates_dispose_error() {
        let events = Arc::new(Mutex::new(Vec::new()));

        let cleaned = Arc::clone(&events);
        let disposed = Arc::clone(&events);
        let pool = AsyncContextPool::builder()
            .batch_size(1)
            .max_free_count(1)
            .creator(|| AsyncContext::new(16))
            .cleaner(move |ctx| {
                cleaned.lock().unwrap().push("clean");
                ctx.reset();
            })
            .disposer(move |ctx| {
                assert!(ctx.buffer().is_empty());
                disposed.lock().unwrap().push("dispose");
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "shutdown failed"))
            })
            .build()
            .unwrap();

        let a = pool.acquire();
        let mut b = pool.acquire();
        b.buffer_mut().put_slice(b"unsent");
        assert!(pool.release(a).unwrap());

        let err = pool.release(b).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);

        // The cleaner ran on `b` before the failing dispose.
        assert_eq!(*events.lock().unwrap(), ["clean", "clean", "dispose"]);
        assert_eq!(pool.free_count(), 1);
        assert_eq!(pool.stats().disposed, 1);
    }

    #[test]
    fn test_disposer_not_called_for_recycled_contexts() {
        let disposals = Arc::new(AtomicUsize::new(0));

        let d = Arc::clone(&disposals);
        let pool = AsyncContextPool::builder()
            .batch_size(2)
            .max_free_count(2)
            .creator(|| AsyncContext::new(16))
            .disposer(move |ctx| {
                d.fetch_add(1, Ordering::SeqCst);
                ctx.dispose()
            })
            .build()
            .unwrap();

        let a = pool.acquire();
        let b = pool.acquire();
        assert!(pool.release(a).unwrap());
        assert!(pool.release(b).unwrap());
        assert_eq!(disposals.load(Ordering::SeqCst), 0);

        let extra = AsyncContext::new(16);
        assert!(!pool.release(extra).unwrap());
        assert_eq!(disposals.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_from_config() {
        let config = PoolConfig {
            batch_size: 8,
            max_free_count: 4,
            buffer_size: 512,
        };
        let pool = AsyncContextPool::from_config(&config).unwrap();

        assert_eq!(pool.batch_size(), 4);
        assert_eq!(pool.free_count(), 4);
        assert_eq!(pool.acquire().buffer_size(), 512);
    }

    #[test]
    fn test_pool_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AsyncContextPool>();
    }
}
