//! Core execution module
//!
//! This module contains the concurrent execution components:
//! - `traits` - Submission abstraction shared by the pool and inline execution
//! - `registry` - Concurrent registry owning every account
//! - `worker_pool` - Fixed-size thread pool executing queued transactions

pub mod registry;
pub mod traits;
pub mod worker_pool;

pub use registry::AccountRegistry;
pub use traits::{ImmediateExecutor, TransactionSink};
pub use worker_pool::{PoolConfig, PoolState, PoolStats, Receipt, WorkerPool};
