//! Account type for the bank engine
//!
//! An `Account` owns its balance behind an exclusive lock. Single-account
//! operations lock internally; multi-account operations take the lock
//! explicitly through [`Account::lock`] so they can acquire several accounts
//! in a canonical order.

use crate::types::error::{BankError, Result};
use rust_decimal::Decimal;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Account identifier
///
/// Zero is reserved: constructing an account with id 0 generates a fresh
/// random id instead.
pub type AccountId = u64;

/// A bank account with a lock-protected balance
///
/// # Invariants
///
/// - `balance >= 0` whenever the lock is not held
/// - the balance is only mutated while holding the account's own lock
///
/// The lock is never cloned; `Account` is shared between transactions by
/// wrapping it in an `Arc`.
#[derive(Debug)]
pub struct Account {
    id: AccountId,
    balance: Mutex<Decimal>,
}

impl Account {
    /// Create an account with an initial balance
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if `balance` is negative.
    pub fn new(id: AccountId, balance: Decimal) -> Result<Self> {
        if balance < Decimal::ZERO {
            return Err(BankError::invalid_amount(balance));
        }

        Ok(Account {
            id: resolve_id(id),
            balance: Mutex::new(balance),
        })
    }

    /// Create an account with a zero balance
    pub fn open(id: AccountId) -> Self {
        Account {
            id: resolve_id(id),
            balance: Mutex::new(Decimal::ZERO),
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    /// Snapshot of the current balance
    ///
    /// Takes the lock only for the duration of the read, so the value may be
    /// stale by the time the caller looks at it.
    pub fn balance(&self) -> Result<Decimal> {
        Ok(self.lock()?.balance())
    }

    /// Acquire the account's exclusive lock
    ///
    /// # Errors
    ///
    /// Returns `LockPoisoned` if a previous holder panicked mid-update.
    pub fn lock(&self) -> Result<AccountGuard<'_>> {
        let balance = self
            .balance
            .lock()
            .map_err(|_| BankError::LockPoisoned { account: self.id })?;

        Ok(AccountGuard {
            id: self.id,
            balance,
        })
    }

    /// Atomically add `amount` to the balance
    pub fn deposit(&self, amount: Decimal) -> Result<()> {
        self.lock()?.deposit(amount)
    }

    /// Atomically subtract `amount` from the balance
    pub fn withdraw(&self, amount: Decimal) -> Result<()> {
        self.lock()?.withdraw(amount)
    }
}

/// Exclusive access to one account's balance
///
/// Dropping the guard releases the lock, so every exit path of a critical
/// section releases it.
#[derive(Debug)]
pub struct AccountGuard<'a> {
    id: AccountId,
    balance: MutexGuard<'a, Decimal>,
}

impl AccountGuard<'_> {
    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn balance(&self) -> Decimal {
        *self.balance
    }

    /// Add funds
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount` is negative
    /// - `ArithmeticOverflow` if the balance cannot represent the result
    pub fn deposit(&mut self, amount: Decimal) -> Result<()> {
        if amount < Decimal::ZERO {
            return Err(BankError::invalid_amount(amount));
        }

        *self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| BankError::arithmetic_overflow("deposit", self.id))?;

        Ok(())
    }

    /// Remove funds
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount` is negative
    /// - `InsufficientFunds` if `amount` exceeds the balance; the balance is
    ///   left untouched
    pub fn withdraw(&mut self, amount: Decimal) -> Result<()> {
        if amount < Decimal::ZERO {
            return Err(BankError::invalid_amount(amount));
        }

        if amount > *self.balance {
            return Err(BankError::insufficient_funds(
                self.id,
                *self.balance,
                amount,
            ));
        }

        *self.balance -= amount;
        Ok(())
    }
}

/// Keep a caller-chosen id, or generate one for id 0
fn resolve_id(id: AccountId) -> AccountId {
    if id == 0 {
        generate_id()
    } else {
        id
    }
}

fn generate_id() -> AccountId {
    loop {
        let (high, _) = Uuid::new_v4().as_u64_pair();
        if high != 0 {
            return high;
        }
    }
}
