//! Bank engine CLI
//!
//! # Usage
//!
//! ```bash
//! cargo run                                  # interactive menu over bank_accounts.json
//! cargo run -- --accounts my_bank.json --workers 4
//! cargo run -- --batch transactions.csv > balances.csv
//! ```
//!
//! Interactive mode loads the accounts file, runs the menu on stdin/stdout,
//! then stops the worker pool and writes the accounts back. Batch mode runs
//! every row of the CSV file through the pool and prints the final balances
//! to stdout; the accounts file is left untouched.
//!
//! Logging goes to stderr and is controlled with `RUST_LOG` (default `warn`).
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (accounts file missing or invalid, I/O failure, worker failure)

use rust_bank_engine::cli::{self, CliArgs};
use rust_bank_engine::core::{AccountRegistry, WorkerPool};
use rust_bank_engine::io::{export_json, import_json, SyncReader};
use rust_bank_engine::session::{run_batch, InteractiveSession, SessionEnd};
use rust_bank_engine::types::Result;
use std::io;
use std::path::Path;
use std::process;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = cli::parse_args();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: &CliArgs) -> Result<()> {
    let registry = import_json(&args.accounts)?;
    let pool = WorkerPool::new(args.to_pool_config());

    match &args.batch {
        Some(path) => run_batch_file(&registry, &pool, path),
        None => run_interactive(&registry, &pool, &args.accounts),
    }
}

fn run_batch_file(registry: &AccountRegistry, pool: &WorkerPool, path: &Path) -> Result<()> {
    let reader = SyncReader::new(path)?;
    let mut output = io::stdout().lock();
    run_batch(registry, pool, reader, &mut output)?;
    Ok(())
}

fn run_interactive(registry: &AccountRegistry, pool: &WorkerPool, accounts: &Path) -> Result<()> {
    pool.start()?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let summary = InteractiveSession::new(registry, pool).run(stdin.lock(), &mut stdout)?;
    if summary.end == SessionEnd::EndOfInput {
        log::info!("Input closed, shutting down");
    }

    // Queued transactions finish before the accounts are saved
    pool.stop()?;
    export_json(registry, accounts)
}
