//! Transaction types for the bank engine
//!
//! A transaction is an immutable description of a money movement. It is
//! validated when constructed and applied by [`Transaction::execute`], which
//! takes the account locks it needs.
//!
//! # Lock ordering
//!
//! A transfer holds both account locks while it withdraws and deposits. To
//! rule out circular wait, the two locks are always acquired in ascending
//! account id order, whichever side is the source. Any two transfers sharing
//! an account pair therefore request the locks in the same global order.

use crate::types::account::{Account, AccountId};
use crate::types::error::{BankError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Transaction identifier
///
/// The digest is derived from the participating account ids, the amount and
/// the creation time. The sequence number comes from a process-wide counter,
/// so two ids produced in the same run never compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId {
    sequence: u64,
    digest: u64,
}

impl TransactionId {
    fn generate(
        source: Option<AccountId>,
        destination: Option<AccountId>,
        amount: Decimal,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut hasher = DefaultHasher::new();
        (source, destination, amount, created_at).hash(&mut hasher);

        TransactionId {
            sequence: NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed),
            digest: hasher.finish(),
        }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:016x}", self.sequence, self.digest)
    }
}

/// Kind of money movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    /// Credit funds to one account
    Deposit,
    /// Debit funds from one account
    Withdraw,
    /// Move funds between two distinct accounts
    Transfer,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionKind::Deposit => "Deposit",
            TransactionKind::Withdraw => "Withdraw",
            TransactionKind::Transfer => "Transfer",
        };
        f.write_str(name)
    }
}

fn validate_amount(amount: Decimal) -> Result<Decimal> {
    if amount < Decimal::ZERO {
        return Err(BankError::invalid_amount(amount));
    }
    Ok(amount)
}

/// Credit `amount` to one account
#[derive(Debug)]
pub struct Deposit {
    id: TransactionId,
    amount: Decimal,
    to: Arc<Account>,
    created_at: DateTime<Utc>,
}

impl Deposit {
    pub fn new(amount: Decimal, to: Arc<Account>) -> Result<Self> {
        let amount = validate_amount(amount)?;
        let created_at = Utc::now();

        Ok(Deposit {
            id: TransactionId::generate(None, Some(to.id()), amount, created_at),
            amount,
            to,
            created_at,
        })
    }

    pub fn execute(&self) -> Result<()> {
        self.to.lock()?.deposit(self.amount)
    }
}

/// Debit `amount` from one account
#[derive(Debug)]
pub struct Withdraw {
    id: TransactionId,
    amount: Decimal,
    from: Arc<Account>,
    created_at: DateTime<Utc>,
}

impl Withdraw {
    pub fn new(amount: Decimal, from: Arc<Account>) -> Result<Self> {
        let amount = validate_amount(amount)?;
        let created_at = Utc::now();

        Ok(Withdraw {
            id: TransactionId::generate(Some(from.id()), None, amount, created_at),
            amount,
            from,
            created_at,
        })
    }

    pub fn execute(&self) -> Result<()> {
        self.from.lock()?.withdraw(self.amount)
    }
}

/// Move `amount` from one account to another
#[derive(Debug)]
pub struct Transfer {
    id: TransactionId,
    amount: Decimal,
    from: Arc<Account>,
    to: Arc<Account>,
    created_at: DateTime<Utc>,
}

impl Transfer {
    /// Create a transfer
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount` is negative
    /// - `SameAccount` if both sides carry the same account id
    pub fn new(amount: Decimal, from: Arc<Account>, to: Arc<Account>) -> Result<Self> {
        let amount = validate_amount(amount)?;

        if from.id() == to.id() {
            return Err(BankError::SameAccount { account: from.id() });
        }

        let created_at = Utc::now();

        Ok(Transfer {
            id: TransactionId::generate(Some(from.id()), Some(to.id()), amount, created_at),
            amount,
            from,
            to,
            created_at,
        })
    }

    /// Withdraw from the source and deposit into the destination atomically
    ///
    /// Both locks are held for the whole operation. If the withdraw fails
    /// nothing is mutated.
    pub fn execute(&self) -> Result<()> {
        let source_first = self.from.id() < self.to.id();
        let (lower, higher) = if source_first {
            (&self.from, &self.to)
        } else {
            (&self.to, &self.from)
        };

        let mut lower_guard = lower.lock()?;
        let mut higher_guard = higher.lock()?;

        let (source, destination) = if source_first {
            (&mut lower_guard, &mut higher_guard)
        } else {
            (&mut higher_guard, &mut lower_guard)
        };

        source.withdraw(self.amount)?;

        if let Err(e) = destination.deposit(self.amount) {
            // Put the funds back; they fit because they were there a moment ago.
            source.deposit(self.amount)?;
            return Err(e);
        }

        Ok(())
    }
}

/// A money movement waiting to be executed
#[derive(Debug)]
pub enum Transaction {
    Deposit(Deposit),
    Withdraw(Withdraw),
    Transfer(Transfer),
}

impl Transaction {
    /// Build a deposit transaction
    pub fn deposit(amount: Decimal, to: Arc<Account>) -> Result<Self> {
        Deposit::new(amount, to).map(Transaction::Deposit)
    }

    /// Build a withdraw transaction
    pub fn withdraw(amount: Decimal, from: Arc<Account>) -> Result<Self> {
        Withdraw::new(amount, from).map(Transaction::Withdraw)
    }

    /// Build a transfer transaction
    pub fn transfer(amount: Decimal, from: Arc<Account>, to: Arc<Account>) -> Result<Self> {
        Transfer::new(amount, from, to).map(Transaction::Transfer)
    }

    pub fn id(&self) -> TransactionId {
        match self {
            Transaction::Deposit(tx) => tx.id,
            Transaction::Withdraw(tx) => tx.id,
            Transaction::Transfer(tx) => tx.id,
        }
    }

    pub fn kind(&self) -> TransactionKind {
        match self {
            Transaction::Deposit(_) => TransactionKind::Deposit,
            Transaction::Withdraw(_) => TransactionKind::Withdraw,
            Transaction::Transfer(_) => TransactionKind::Transfer,
        }
    }

    pub fn amount(&self) -> Decimal {
        match self {
            Transaction::Deposit(tx) => tx.amount,
            Transaction::Withdraw(tx) => tx.amount,
            Transaction::Transfer(tx) => tx.amount,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Transaction::Deposit(tx) => tx.created_at,
            Transaction::Withdraw(tx) => tx.created_at,
            Transaction::Transfer(tx) => tx.created_at,
        }
    }

    /// Account debited by this transaction, if any
    pub fn source(&self) -> Option<AccountId> {
        match self {
            Transaction::Deposit(_) => None,
            Transaction::Withdraw(tx) => Some(tx.from.id()),
            Transaction::Transfer(tx) => Some(tx.from.id()),
        }
    }

    /// Account credited by this transaction, if any
    pub fn destination(&self) -> Option<AccountId> {
        match self {
            Transaction::Deposit(tx) => Some(tx.to.id()),
            Transaction::Withdraw(_) => None,
            Transaction::Transfer(tx) => Some(tx.to.id()),
        }
    }

    /// Apply the transaction to its account(s)
    ///
    /// # Errors
    ///
    /// Business-rule failures (`InsufficientFunds`, `InvalidAmount`,
    /// `ArithmeticOverflow`) leave every balance unchanged. `LockPoisoned`
    /// is fatal for the caller.
    pub fn execute(&self) -> Result<()> {
        match self {
            Transaction::Deposit(tx) => tx.execute(),
            Transaction::Withdraw(tx) => tx.execute(),
            Transaction::Transfer(tx) => tx.execute(),
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transaction::Deposit(tx) => write!(
                f,
                "Deposit transaction {}: {} to account {}",
                tx.id,
                tx.amount,
                tx.to.id()
            ),
            Transaction::Withdraw(tx) => write!(
                f,
                "Withdraw transaction {}: {} from account {}",
                tx.id,
                tx.amount,
                tx.from.id()
            ),
            Transaction::Transfer(tx) => write!(
                f,
                "Transfer transaction {}: {} from account {} to account {}",
                tx.id,
                tx.amount,
                tx.from.id(),
                tx.to.id()
            ),
        }
    }
}
