//! Fixed-size worker pool for concurrent transaction execution
//!
//! This module provides the `WorkerPool` struct, which runs submitted
//! transactions on a fixed set of OS threads fed by a single shared queue.
//!
//! # Architecture
//!
//! ```text
//! submit() ──► unbounded FIFO channel ──► worker-0 ─┐
//!                                     ├──► worker-1 ─┼─► Transaction::execute()
//!                                     └──► worker-N ─┘
//! ```
//!
//! # Lifecycle
//!
//! `Created → Running → Stopping → Stopped`
//!
//! - `start` spawns exactly `workers` threads. It is only legal on a
//!   freshly created pool.
//! - `submit` enqueues without blocking. It is only accepted while the pool
//!   is `Running`: before `start` it fails with `InvalidPoolState`, from
//!   `stop` on with `PoolStopped`.
//! - `stop` enqueues one stop sentinel per worker behind all pending
//!   transactions, joins every worker and moves to `Stopped`. Every
//!   transaction submitted before `stop` has therefore been executed when it
//!   returns. Later submissions fail with `PoolStopped`.
//!
//! # Failure handling
//!
//! A transaction that fails with a business-rule error is logged and the
//! worker moves on to the next task. A fatal error (poisoned account lock)
//! terminates the worker that observed it. If every worker has terminated
//! this way, `stop` fails each transaction still queued with `WorkersLost`,
//! counts it as failed and returns `WorkersLost` itself.

use crate::core::traits::TransactionSink;
use crate::types::{BankError, Result, Transaction, TransactionId};
use crossbeam_channel::{Receiver, Sender};
use log::{debug, error, info, warn};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

/// Configuration for the worker pool
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of worker threads
    pub workers: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
        }
    }
}

impl PoolConfig {
    /// Create a PoolConfig, falling back to the default for a zero worker count
    pub fn new(workers: usize) -> Self {
        if workers == 0 {
            let default = Self::default();
            warn!(
                "Invalid worker count ({}), using default ({})",
                workers, default.workers
            );
            return default;
        }

        Self { workers }
    }
}

/// Lifecycle state of a worker pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    Created,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PoolState::Created => "created",
            PoolState::Running => "running",
            PoolState::Stopping => "stopping",
            PoolState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Execution counters, readable while the pool runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Transactions that executed successfully
    pub executed: u64,
    /// Transactions whose execution returned an error
    pub failed: u64,
}

impl PoolStats {
    /// Number of transactions that have been dequeued and run
    pub fn completed(&self) -> u64 {
        self.executed + self.failed
    }
}

#[derive(Debug, Default)]
struct Counters {
    executed: AtomicU64,
    failed: AtomicU64,
}

/// Handle to the outcome of one tracked submission
#[derive(Debug)]
pub struct Receipt {
    transaction: TransactionId,
    outcome: Receiver<Result<()>>,
}

impl Receipt {
    pub fn transaction_id(&self) -> TransactionId {
        self.transaction
    }

    /// Block until the transaction has been executed and return its outcome
    ///
    /// Returns `WorkersLost` if no worker was left to run the transaction,
    /// and `PoolStopped` if the pool was dropped before it ran.
    pub fn wait(self) -> Result<()> {
        self.outcome.recv().unwrap_or(Err(BankError::PoolStopped))
    }
}

enum Task {
    Execute {
        transaction: Transaction,
        outcome: Option<Sender<Result<()>>>,
    },
    Stop,
}

/// Fixed-size pool of transaction executors
pub struct WorkerPool {
    config: PoolConfig,
    sender: Sender<Task>,
    receiver: Receiver<Task>,
    state: Mutex<PoolState>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    counters: Arc<Counters>,
}

impl WorkerPool {
    /// Create a pool in the `Created` state; no threads are spawned yet
    pub fn new(config: PoolConfig) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();

        Self {
            config,
            sender,
            receiver,
            state: Mutex::new(PoolState::Created),
            workers: Mutex::new(Vec::new()),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn state(&self) -> PoolState {
        *self.lock_state()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            executed: self.counters.executed.load(Ordering::Acquire),
            failed: self.counters.failed.load(Ordering::Acquire),
        }
    }

    /// Number of transactions waiting in the queue
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Spawn the worker threads
    ///
    /// # Errors
    ///
    /// - `InvalidPoolState` unless the pool is in `Created`
    /// - `IoError` if a thread cannot be spawned; threads spawned so far are
    ///   shut down again and the pool stays in `Created`
    pub fn start(&self) -> Result<()> {
        let mut state = self.lock_state();
        if *state != PoolState::Created {
            return Err(BankError::invalid_pool_state("start", *state));
        }

        let mut workers = self.lock_workers();
        for index in 0..self.config.workers {
            let receiver = self.receiver.clone();
            let counters = Arc::clone(&self.counters);

            let spawned = thread::Builder::new()
                .name(format!("worker-{}", index))
                .spawn(move || worker_loop(receiver, counters));

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    error!("Failed to spawn worker-{}: {}", index, e);
                    self.shutdown_workers(&mut workers);
                    return Err(e.into());
                }
            }
        }

        *state = PoolState::Running;
        info!("Worker pool started with {} workers", workers.len());
        Ok(())
    }

    /// Enqueue a transaction for execution
    ///
    /// # Errors
    ///
    /// - `InvalidPoolState` if the pool has not been started
    /// - `PoolStopped` once `stop` has been called
    pub fn submit(&self, transaction: Transaction) -> Result<()> {
        self.enqueue(transaction, None)
    }

    /// Enqueue a transaction and get a receipt for its outcome
    pub fn submit_tracked(&self, transaction: Transaction) -> Result<Receipt> {
        let (sender, outcome) = crossbeam_channel::bounded(1);
        let id = transaction.id();

        self.enqueue(transaction, Some(sender))?;

        Ok(Receipt {
            transaction: id,
            outcome,
        })
    }

    /// Drain the queue, stop every worker and wait for them to exit
    ///
    /// Calling `stop` on a stopped pool is a no-op.
    ///
    /// # Errors
    ///
    /// - `InvalidPoolState` if the pool was never started, or another `stop`
    ///   is in progress
    /// - `WorkerPanicked` if a worker thread panicked; the remaining workers
    ///   are still joined and the pool still ends up `Stopped`
    /// - `WorkersLost` if every worker exited on a fatal error and queued
    ///   transactions were left unexecuted
    pub fn stop(&self) -> Result<()> {
        let handles = {
            let mut state = self.lock_state();
            match *state {
                PoolState::Running => {}
                PoolState::Stopped => return Ok(()),
                other => return Err(BankError::invalid_pool_state("stop", other)),
            }
            *state = PoolState::Stopping;

            // Sentinels are queued under the state lock, so no submission can
            // land behind them.
            let handles = std::mem::take(&mut *self.lock_workers());
            for _ in &handles {
                self.send(Task::Stop)?;
            }
            handles
        };

        info!("Stopping worker pool, {} tasks pending", self.pending());

        let mut panicked = None;
        for handle in handles {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                error!("{} panicked", name);
                panicked.get_or_insert(name);
            }
        }

        let abandoned = self.fail_stranded();

        *self.lock_state() = PoolState::Stopped;
        info!("Worker pool stopped: {:?}", self.stats());

        match panicked {
            Some(worker) => Err(BankError::WorkerPanicked { worker }),
            None if abandoned > 0 => Err(BankError::WorkersLost { abandoned }),
            None => Ok(()),
        }
    }

    /// Fail every transaction left in the queue after all workers have exited
    ///
    /// Sentinels are queued behind every transaction, so anything still here
    /// once the workers are joined was abandoned by workers that died on a
    /// fatal error.
    fn fail_stranded(&self) -> u64 {
        let stranded: Vec<_> = self
            .receiver
            .try_iter()
            .filter_map(|task| match task {
                Task::Execute {
                    transaction,
                    outcome,
                } => Some((transaction, outcome)),
                Task::Stop => None,
            })
            .collect();

        let abandoned = stranded.len() as u64;
        for (transaction, outcome) in stranded {
            error!("{} abandoned, no worker left to run it", transaction);
            self.counters.failed.fetch_add(1, Ordering::AcqRel);
            if let Some(outcome) = outcome {
                let _ = outcome.send(Err(BankError::WorkersLost { abandoned }));
            }
        }
        abandoned
    }

    fn enqueue(&self, transaction: Transaction, outcome: Option<Sender<Result<()>>>) -> Result<()> {
        let state = self.lock_state();
        match *state {
            PoolState::Running => {}
            PoolState::Created => return Err(BankError::invalid_pool_state("submit", *state)),
            PoolState::Stopping | PoolState::Stopped => return Err(BankError::PoolStopped),
        }

        debug!("Queued {}", transaction);
        self.send(Task::Execute {
            transaction,
            outcome,
        })
    }

    fn send(&self, task: Task) -> Result<()> {
        self.sender.send(task).map_err(|_| BankError::PoolStopped)
    }

    fn shutdown_workers(&self, workers: &mut Vec<JoinHandle<()>>) {
        for _ in workers.iter() {
            let _ = self.send(Task::Stop);
        }
        for handle in workers.drain(..) {
            let _ = handle.join();
        }
    }

    // Neither lock is held while user code runs, so a poisoned guard still
    // holds consistent data.
    fn lock_state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_workers(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.workers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TransactionSink for WorkerPool {
    fn submit(&self, transaction: Transaction) -> Result<()> {
        WorkerPool::submit(self, transaction)
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("pending", &self.pending())
            .field("stats", &self.stats())
            .finish()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if self.state() == PoolState::Running {
            if let Err(e) = self.stop() {
                error!("Worker pool shutdown failed: {}", e);
            }
        }
    }
}

fn worker_loop(tasks: Receiver<Task>, counters: Arc<Counters>) {
    let name = thread::current().name().unwrap_or("worker").to_string();

    // The pool owns a sender for its whole lifetime, so recv only fails once
    // the pool is gone.
    while let Ok(task) = tasks.recv() {
        let (transaction, outcome) = match task {
            Task::Execute {
                transaction,
                outcome,
            } => (transaction, outcome),
            Task::Stop => break,
        };

        let result = transaction.execute();
        let fatal = match &result {
            Ok(()) => {
                counters.executed.fetch_add(1, Ordering::AcqRel);
                debug!("[{}] Executed {}", name, transaction);
                false
            }
            Err(e) => {
                counters.failed.fetch_add(1, Ordering::AcqRel);
                if e.is_fatal() {
                    error!("[{}] {} failed fatally: {}", name, transaction, e);
                    true
                } else {
                    warn!("[{}] {} rejected: {}", name, transaction, e);
                    false
                }
            }
        };

        if let Some(outcome) = outcome {
            // The submitter may have dropped its receipt
            let _ = outcome.send(result);
        }

        if fatal {
            error!("[{}] Terminating, account state can no longer be trusted", name);
            return;
        }
    }

    debug!("[{}] Exiting", name);
}
