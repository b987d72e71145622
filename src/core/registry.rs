//! Thread-safe account registry
//!
//! This module provides the `AccountRegistry` struct, which owns every
//! account of the bank and hands out shared handles to them.
//!
//! # Design
//!
//! The registry uses `DashMap` (a concurrent HashMap) keyed by account id.
//! Lookups from the menu, the batch reader and the persistence layer can run
//! concurrently with workers executing transactions; the registry itself
//! never touches balances, which stay behind each account's own lock.
//!
//! # Indexing
//!
//! Menu selection addresses accounts by a 1-based index. Indexes are
//! assigned over the accounts sorted by ascending id, so the same registry
//! always produces the same numbering.

use crate::types::{Account, AccountId, BankError, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Registry of all accounts, keyed by id
#[derive(Debug, Default)]
pub struct AccountRegistry {
    accounts: DashMap<AccountId, Arc<Account>>,
}

impl AccountRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Register an account and return a shared handle to it
    ///
    /// # Errors
    ///
    /// Returns `InvalidAccountReference` if an account with the same id is
    /// already registered; the existing account is left in place.
    pub fn add(&self, account: Account) -> Result<Arc<Account>> {
        let id = account.id();
        let account = Arc::new(account);

        match self.accounts.entry(id) {
            Entry::Occupied(_) => Err(BankError::invalid_reference(format!(
                "account {} is already registered",
                id
            ))),
            Entry::Vacant(entry) => {
                entry.insert(Arc::clone(&account));
                Ok(account)
            }
        }
    }

    /// Look up an account by id
    pub fn get(&self, id: AccountId) -> Option<Arc<Account>> {
        self.accounts.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Look up an account by id, failing if it does not exist
    pub fn require(&self, id: AccountId) -> Result<Arc<Account>> {
        self.get(id)
            .ok_or_else(|| BankError::invalid_reference(format!("account {}", id)))
    }

    /// Return the account at a 1-based position in id order
    ///
    /// # Errors
    ///
    /// Returns `InvalidAccountReference` if `index` is zero or past the end.
    pub fn get_index(&self, index: usize) -> Result<Arc<Account>> {
        index
            .checked_sub(1)
            .and_then(|position| self.accounts().into_iter().nth(position))
            .ok_or_else(|| BankError::invalid_reference(format!("index {}", index)))
    }

    /// All accounts sorted by id
    ///
    /// The returned vector is a snapshot; accounts added afterwards are not
    /// included.
    pub fn accounts(&self) -> Vec<Arc<Account>> {
        let mut accounts: Vec<Arc<Account>> = self
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        accounts.sort_by_key(|account| account.id());
        accounts
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Sum of all balances
    ///
    /// Each balance is read under its own lock, one account at a time, so
    /// the sum is only exact when no transaction is in flight.
    pub fn total_balance(&self) -> Result<Decimal> {
        self.accounts()
            .iter()
            .try_fold(Decimal::ZERO, |sum, account| -> Result<Decimal> {
                Ok(sum + account.balance()?)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn registry_with(ids: &[AccountId]) -> AccountRegistry {
        let registry = AccountRegistry::new();
        for &id in ids {
            registry.add(Account::open(id)).unwrap();
        }
        registry
    }

    #[test]
    fn test_add_and_get() {
        let registry = AccountRegistry::new();
        let handle = registry
            .add(Account::new(7, Decimal::new(10, 0)).unwrap())
            .unwrap();

        let found = registry.get(7).unwrap();
        assert!(Arc::ptr_eq(&handle, &found));
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_add_duplicate_id_is_rejected() {
        let registry = registry_with(&[1]);
        let result = registry.add(Account::new(1, Decimal::new(99, 0)).unwrap());

        assert!(matches!(
            result,
            Err(BankError::InvalidAccountReference { .. })
        ));
        assert_eq!(registry.get(1).unwrap().balance().unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_require_unknown_account() {
        let registry = registry_with(&[1]);
        assert_eq!(
            registry.require(2).unwrap_err(),
            BankError::InvalidAccountReference {
                reference: "account 2".to_string()
            }
        );
    }

    #[rstest]
    #[case::first(1, 10)]
    #[case::middle(2, 20)]
    #[case::last(3, 30)]
    fn test_get_index_follows_id_order(#[case] index: usize, #[case] expected_id: AccountId) {
        let registry = registry_with(&[30, 10, 20]);
        assert_eq!(registry.get_index(index).unwrap().id(), expected_id);
    }

    #[rstest]
    #[case::zero(0)]
    #[case::past_end(4)]
    fn test_get_index_out_of_range(#[case] index: usize) {
        let registry = registry_with(&[1, 2, 3]);
        assert!(matches!(
            registry.get_index(index),
            Err(BankError::InvalidAccountReference { .. })
        ));
    }

    #[test]
    fn test_total_balance() {
        let registry = AccountRegistry::new();
        registry
            .add(Account::new(1, Decimal::new(100, 0)).unwrap())
            .unwrap();
        registry
            .add(Account::new(2, Decimal::new(250, 1)).unwrap())
            .unwrap();

        assert_eq!(registry.total_balance().unwrap(), Decimal::new(1250, 1));
    }

    #[test]
    fn test_empty_registry() {
        let registry = AccountRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.accounts().is_empty());
        assert_eq!(registry.total_balance().unwrap(), Decimal::ZERO);
    }
}
