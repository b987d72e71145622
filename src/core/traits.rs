//! Core traits for transaction submission
//!
//! The interactive menu and the batch runner hand transactions to a
//! `TransactionSink` without knowing whether they run on a worker pool or
//! inline on the caller's thread.

use crate::types::{Result, Transaction};

/// Destination for constructed transactions
pub trait TransactionSink {
    /// Hand over a transaction for execution
    ///
    /// Implementations must not block beyond enqueueing. Whether the
    /// transaction has already been executed when this returns is up to the
    /// implementation.
    fn submit(&self, transaction: Transaction) -> Result<()>;
}

/// Sink that executes each transaction immediately on the caller's thread
///
/// Execution errors are returned to the submitter instead of being logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateExecutor;

impl TransactionSink for ImmediateExecutor {
    fn submit(&self, transaction: Transaction) -> Result<()> {
        transaction.execute()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Account, BankError};
    use rust_decimal::Decimal;
    use std::sync::Arc;

    #[test]
    fn test_immediate_executor_runs_transaction() {
        let account = Arc::new(Account::open(1));
        let tx = Transaction::deposit(Decimal::new(25, 0), Arc::clone(&account)).unwrap();

        ImmediateExecutor.submit(tx).unwrap();

        assert_eq!(account.balance().unwrap(), Decimal::new(25, 0));
    }

    #[test]
    fn test_immediate_executor_returns_execution_error() {
        let account = Arc::new(Account::open(1));
        let tx = Transaction::withdraw(Decimal::ONE, account).unwrap();

        let result = ImmediateExecutor.submit(tx);

        assert!(matches!(result, Err(BankError::InsufficientFunds { .. })));
    }
}
