//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Lock-protected account and its guard
//! - `transaction`: Deposit, withdraw and transfer transactions
//! - `error`: Error types for the bank engine

pub mod account;
pub mod error;
pub mod transaction;

pub use account::{Account, AccountGuard, AccountId};
pub use error::{BankError, Result};
pub use transaction::{Deposit, Transaction, TransactionId, TransactionKind, Transfer, Withdraw};
