//! Resource management for high-throughput socket servers.
//!
//! The server's event loop borrows an `AsyncContext` for each socket
//! operation and returns it afterwards, so steady-state traffic reuses a
//! fixed set of buffers instead of allocating per operation.
//!
//! - `ResourcePool`: Bounded lock-free free list over any `PoolManager`
//! - `AsyncContextPool`: The pool specialised for `AsyncContext`
//! - `AsyncContext`: Buffer, operation state, and endpoint for one operation

mod context;
mod context_pool;
mod pool;
mod token;

pub use context::AsyncContext;
pub use context_pool::{AsyncContextPool, AsyncContextPoolBuilder};
pub use pool::{PoolManager, PoolStats, ResourcePool};
pub use token::{Completion, OpType};
