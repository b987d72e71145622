use crate::core::PoolConfig;
use clap::Parser;
use std::path::PathBuf;

/// Run bank transactions on a pool of worker threads
#[derive(Parser, Debug)]
#[command(name = "bank")]
#[command(about = "Run bank transactions on a pool of worker threads", long_about = None)]
pub struct CliArgs {
    /// JSON file holding the bank's accounts
    #[arg(
        long = "accounts",
        value_name = "PATH",
        default_value = "bank_accounts.json",
        help = "Path to the accounts JSON file (read at startup, written on exit)"
    )]
    pub accounts: PathBuf,

    /// Number of worker threads
    #[arg(
        long = "workers",
        value_name = "COUNT",
        help = "Number of worker threads (default: CPU cores)"
    )]
    pub workers: Option<usize>,

    /// Run a CSV file of transactions instead of the interactive menu
    #[arg(
        long = "batch",
        value_name = "CSV",
        help = "Execute transactions from a CSV file and print final balances"
    )]
    pub batch: Option<PathBuf>,
}

impl CliArgs {
    /// Create a PoolConfig from CLI arguments
    ///
    /// Falls back to the default worker count when `--workers` is absent or
    /// zero.
    pub fn to_pool_config(&self) -> PoolConfig {
        match self.workers {
            Some(workers) => PoolConfig::new(workers),
            None => PoolConfig::default(),
        }
    }
}
