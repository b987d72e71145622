//! Rust Bank Engine Library
//! # Overview
//!
//! This library provides a concurrent bank transaction engine: accounts with
//! their own locks, transactions that move money between them, and a worker
//! pool that executes submitted transactions on a fixed set of threads.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Account, Transaction, errors)
//! - [`core`] - Execution components:
//!   - [`core::registry`] - Concurrent registry owning every account
//!   - [`core::worker_pool`] - Worker threads fed by a shared FIFO queue
//!   - [`core::traits`] - Submission abstraction
//! - [`io`] - JSON persistence, CSV input and balance output
//! - [`menu`] - Command table and prompt state machine
//! - [`session`] - Interactive and batch front ends
//! - [`cli`] - CLI arguments parsing
//!
//! # Transaction Types
//!
//! - **Deposit**: Credit funds to an account
//! - **Withdraw**: Debit funds from an account (requires sufficient balance)
//! - **Transfer**: Move funds between two distinct accounts atomically
//!
//! # Locking
//!
//! Each balance sits behind its account's own mutex. A transfer locks both
//! accounts in ascending id order, so two transfers over the same pair of
//! accounts can never wait on each other in a cycle.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod menu;
pub mod session;
pub mod types;

pub use core::{AccountRegistry, PoolConfig, TransactionSink, WorkerPool};
pub use io::write_accounts_csv;
pub use types::{
    Account, AccountId, BankError, Transaction, TransactionId, TransactionKind,
};
