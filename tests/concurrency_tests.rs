//! Concurrency properties of accounts, transactions and the worker pool
//!
//! These tests exercise the engine from many threads at once and check the
//! properties that must hold regardless of scheduling:
//! - balances never go negative
//! - opposing transfers over the same accounts never deadlock
//! - money is conserved across transfers within a closed set of accounts
//! - stop() drains every transaction submitted before it

use rstest::rstest;
use rust_bank_engine::core::{AccountRegistry, PoolConfig, WorkerPool};
use rust_bank_engine::types::{Account, BankError, Transaction};
use rust_decimal::Decimal;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn account(id: u64, balance: i64) -> Arc<Account> {
    Arc::new(Account::new(id, Decimal::new(balance, 0)).unwrap())
}

#[test]
fn test_opposing_transfers_do_not_deadlock() {
    let a = account(1, 1_000);
    let b = account(2, 1_000);
    let (done_tx, done_rx) = mpsc::channel();

    let mut handles = Vec::new();
    for (from, to) in [(&a, &b), (&b, &a)] {
        let from = Arc::clone(from);
        let to = Arc::clone(to);
        let done_tx = done_tx.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..10_000 {
                let tx = Transaction::transfer(Decimal::ONE, Arc::clone(&from), Arc::clone(&to))
                    .unwrap();
                // Either direction may briefly run dry
                let _ = tx.execute();
            }
            done_tx.send(()).unwrap();
        }));
    }

    for _ in 0..2 {
        done_rx
            .recv_timeout(Duration::from_secs(30))
            .expect("transfers did not finish; possible deadlock");
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(
        a.balance().unwrap() + b.balance().unwrap(),
        Decimal::new(2_000, 0)
    );
}

#[rstest]
#[case::two_workers(2)]
#[case::eight_workers(8)]
fn test_ring_transfers_conserve_total(#[case] workers: usize) {
    let registry = AccountRegistry::new();
    for id in 1..=5 {
        registry
            .add(Account::new(id, Decimal::new(100, 0)).unwrap())
            .unwrap();
    }

    let pool = WorkerPool::new(PoolConfig::new(workers));
    pool.start().unwrap();

    for round in 0..200u64 {
        let from = registry.require(round % 5 + 1).unwrap();
        let to = registry.require((round + 2) % 5 + 1).unwrap();
        let amount = Decimal::new((round % 7 + 1) as i64 * 10, 0);
        pool.submit(Transaction::transfer(amount, from, to).unwrap())
            .unwrap();
    }

    pool.stop().unwrap();

    let stats = pool.stats();
    assert_eq!(stats.completed(), 200);
    assert_eq!(registry.total_balance().unwrap(), Decimal::new(500, 0));
    for account in registry.accounts() {
        assert!(account.balance().unwrap() >= Decimal::ZERO);
    }
}

#[test]
fn test_concurrent_withdrawals_never_overdraw() {
    let shared = account(1, 100);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                (0..50)
                    .filter(|_| shared.withdraw(Decimal::ONE).is_ok())
                    .count()
            })
        })
        .collect();

    let succeeded: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    assert_eq!(succeeded, 100);
    assert_eq!(shared.balance().unwrap(), Decimal::ZERO);
}

#[test]
fn test_four_workers_drain_one_hundred_deposits() {
    let registry = AccountRegistry::new();
    for id in 1..=10 {
        registry.add(Account::open(id)).unwrap();
    }

    let pool = WorkerPool::new(PoolConfig::new(4));
    pool.start().unwrap();

    let mut deposited = Decimal::ZERO;
    for n in 1..=100u64 {
        let amount = Decimal::new(n as i64, 0);
        let to = registry.require(n % 10 + 1).unwrap();
        pool.submit(Transaction::deposit(amount, to).unwrap())
            .unwrap();
        deposited += amount;
    }

    pool.stop().unwrap();

    assert_eq!(pool.stats().executed, 100);
    assert_eq!(pool.stats().failed, 0);
    assert_eq!(registry.total_balance().unwrap(), deposited);
    assert_eq!(
        pool.submit(Transaction::deposit(Decimal::ONE, registry.require(1).unwrap()).unwrap()),
        Err(BankError::PoolStopped)
    );
}

#[test]
fn test_receipts_from_many_submitters() {
    let registry = Arc::new(AccountRegistry::new());
    registry.add(Account::open(1)).unwrap();
    let pool = Arc::new(WorkerPool::new(PoolConfig::new(3)));
    pool.start().unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for _ in 0..25 {
                    let to = registry.require(1).unwrap();
                    let receipt = pool
                        .submit_tracked(Transaction::deposit(Decimal::ONE, to).unwrap())
                        .unwrap();
                    receipt.wait().unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    pool.stop().unwrap();

    assert_eq!(
        registry.get(1).unwrap().balance().unwrap(),
        Decimal::new(100, 0)
    );
}
