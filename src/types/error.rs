//! Error types for the bank engine
//!
//! This module defines every error that can occur while constructing,
//! submitting or executing transactions, plus the I/O errors of the
//! persistence and batch layers.
//!
//! # Error Categories
//!
//! - **Business-rule errors**: Invalid amount, insufficient funds, same-account transfer
//! - **Reference errors**: Unknown account id or menu index at the data boundary
//! - **Pool errors**: Submission after shutdown, illegal lifecycle transitions
//! - **Fatal errors**: Poisoned account lock, panicked worker, work stranded by lost workers
//! - **I/O errors**: File not found, CSV and JSON parsing failures

use crate::types::account::AccountId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, BankError>;

/// Main error type for the bank engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BankError {
    /// Negative amount passed to a deposit, withdraw or transaction constructor
    ///
    /// Raised synchronously at construction time, or by the account itself
    /// if a negative amount reaches it.
    #[error("Invalid amount {amount}: amounts cannot be negative")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// Withdraw or transfer exceeds the account balance
    ///
    /// This is a recoverable error - the account state remains unchanged.
    #[error("Insufficient funds in account {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Account that would have gone negative
        account: AccountId,
        /// Balance at the time of the attempt
        balance: Decimal,
        /// Requested amount
        requested: Decimal,
    },

    /// Transfer whose source and destination are the same account
    #[error("Cannot transfer from account {account} to itself")]
    SameAccount {
        /// The account used on both sides
        account: AccountId,
    },

    /// Reference to an account that does not exist
    ///
    /// Only reachable where external data names an account: a batch file
    /// row, an imported document or a menu index.
    #[error("Invalid account reference: {reference}")]
    InvalidAccountReference {
        /// The unresolved reference as given by the caller
        reference: String,
    },

    /// Submission after the worker pool was stopped
    #[error("Worker pool is stopped and no longer accepts transactions")]
    PoolStopped,

    /// Lifecycle operation invoked in a state that does not allow it
    #[error("Cannot {operation} worker pool while it is {state}")]
    InvalidPoolState {
        /// The attempted operation (start, submit, stop)
        operation: String,
        /// The state the pool was in
        state: String,
    },

    /// An account lock was poisoned by a panic inside a critical section
    ///
    /// This is fatal: the balance invariant of the account can no longer be
    /// trusted, and the worker that observes it terminates.
    #[error("Lock on account {account} is poisoned")]
    LockPoisoned {
        /// Account whose lock is poisoned
        account: AccountId,
    },

    /// A worker thread panicked and could not be joined cleanly
    #[error("Worker {worker} panicked")]
    WorkerPanicked {
        /// Thread name of the worker
        worker: String,
    },

    /// Every worker exited on a fatal error while transactions were still queued
    ///
    /// The queued transactions were never executed. They are reported to
    /// their receipts with this error and counted as failed.
    #[error("Worker pool lost its workers with {abandoned} transactions unexecuted")]
    WorkersLost {
        /// Number of transactions left in the queue
        abandoned: u64,
    },

    /// Arithmetic overflow would occur
    ///
    /// The operation is rejected to maintain account integrity.
    #[error("Arithmetic overflow in {operation} for account {account}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Account id
        account: AccountId,
    },

    /// User input that could not be interpreted
    #[error("Invalid input '{input}': {reason}")]
    InvalidInput {
        /// The raw input
        input: String,
        /// Why it was rejected
        reason: String,
    },

    /// Menu command that is not registered
    #[error("Unknown command '{command}'")]
    UnknownCommand {
        /// The command as typed
        command: String,
    },

    /// File not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading or writing
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error occurred
    ///
    /// Recoverable in batch mode: the malformed row is skipped.
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// Account document could not be serialized or deserialized
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Description of the serialization error
        message: String,
    },
}

impl From<std::io::Error> for BankError {
    fn from(error: std::io::Error) -> Self {
        BankError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for BankError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        BankError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for BankError {
    fn from(error: serde_json::Error) -> Self {
        BankError::SerializationError {
            message: error.to_string(),
        }
    }
}

impl BankError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: Decimal) -> Self {
        BankError::InvalidAmount { amount }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(account: AccountId, balance: Decimal, requested: Decimal) -> Self {
        BankError::InsufficientFunds {
            account,
            balance,
            requested,
        }
    }

    /// Create an InvalidAccountReference error
    pub fn invalid_reference(reference: impl ToString) -> Self {
        BankError::InvalidAccountReference {
            reference: reference.to_string(),
        }
    }

    /// Create an InvalidPoolState error
    pub fn invalid_pool_state(operation: &str, state: impl ToString) -> Self {
        BankError::InvalidPoolState {
            operation: operation.to_string(),
            state: state.to_string(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account: AccountId) -> Self {
        BankError::ArithmeticOverflow {
            operation: operation.to_string(),
            account,
        }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(input: &str, reason: &str) -> Self {
        BankError::InvalidInput {
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error leaves shared state untrustworthy
    ///
    /// Business-rule failures are recovered from locally; a fatal error
    /// terminates the worker that observed it.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BankError::LockPoisoned { .. }
                | BankError::WorkerPanicked { .. }
                | BankError::WorkersLost { .. }
        )
    }
}
