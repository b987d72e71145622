//! Batch execution of a CSV transaction file
//!
//! # Design
//!
//! Rows are read and resolved on the calling thread and submitted to the
//! worker pool as they arrive, so reading overlaps with execution. Rows that
//! cannot be parsed or that reference unknown accounts are skipped with a
//! warning. Once the input is exhausted the pool is stopped, which drains
//! the queue, and the final balances are written as CSV.

use crate::core::{AccountRegistry, WorkerPool};
use crate::io::{write_accounts_csv, TransactionRequest};
use crate::types::Result;
use log::{info, warn};
use std::io::Write;

/// Counts for one batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Rows handed to the pool
    pub submitted: u64,
    /// Rows skipped before submission
    pub skipped: u64,
    /// Transactions that executed successfully
    pub executed: u64,
    /// Transactions rejected during execution
    pub failed: u64,
}

/// Run every request through `pool` and write the resulting balances
///
/// The pool must not have been started yet; it is started here and stopped
/// before balances are written.
///
/// # Errors
///
/// Pool lifecycle errors, fatal worker errors and output errors. Row-level
/// errors are logged and counted, not returned.
pub fn run_batch<I>(
    registry: &AccountRegistry,
    pool: &WorkerPool,
    requests: I,
    output: &mut dyn Write,
) -> Result<BatchSummary>
where
    I: IntoIterator<Item = Result<TransactionRequest>>,
{
    let mut summary = BatchSummary::default();
    pool.start()?;

    for request in requests {
        match request.and_then(|request| request.resolve(registry)) {
            Ok(transaction) => {
                pool.submit(transaction)?;
                summary.submitted += 1;
            }
            Err(e) => {
                warn!("Skipping row: {}", e);
                summary.skipped += 1;
            }
        }
    }

    pool.stop()?;

    let stats = pool.stats();
    summary.executed = stats.executed;
    summary.failed = stats.failed;
    info!(
        "Batch finished: {} submitted, {} skipped, {} executed, {} failed",
        summary.submitted, summary.skipped, summary.executed, summary.failed
    );

    write_accounts_csv(&registry.accounts(), output)?;
    Ok(summary)
}
