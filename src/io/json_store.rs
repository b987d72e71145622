//! JSON persistence for the account registry
//!
//! The bank's accounts are loaded from and saved to a single JSON document:
//!
//! ```json
//! {
//!     "accounts": {
//!         "1": { "acc_id": 1, "balance": 100.0 },
//!         "2": { "acc_id": 2, "balance": 0.0 }
//!     }
//! }
//! ```
//!
//! Map keys mirror `acc_id` for readability; on import only `acc_id` is used.
//! Every record goes through `Account::new`, so a negative balance is
//! rejected at this boundary.
//!
//! Balances are written as plain JSON numbers to stay compatible with
//! existing account files, which means they pass through `f64`. Values with
//! up to about 15 significant digits (four-decimal balances below a hundred
//! billion) load exactly; longer values are rounded to the nearest `f64`.

use crate::core::AccountRegistry;
use crate::types::{Account, AccountId, BankError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

/// Serialized form of one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub acc_id: AccountId,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

impl AccountRecord {
    /// Snapshot an account
    pub fn from_account(account: &Account) -> Result<Self> {
        Ok(AccountRecord {
            acc_id: account.id(),
            balance: account.balance()?,
        })
    }

    /// Validate the record and build an account from it
    pub fn into_account(self) -> Result<Account> {
        Account::new(self.acc_id, self.balance)
    }
}

/// Top-level JSON document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountsDocument {
    pub accounts: BTreeMap<String, AccountRecord>,
}

impl AccountsDocument {
    /// Snapshot every account in the registry
    pub fn from_registry(registry: &AccountRegistry) -> Result<Self> {
        let accounts = registry
            .accounts()
            .iter()
            .map(|account| {
                AccountRecord::from_account(account).map(|record| (account.id().to_string(), record))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(AccountsDocument { accounts })
    }

    /// Build a registry from the document
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` for a record with a negative balance
    /// - `InvalidAccountReference` for a duplicate account id
    pub fn into_registry(self) -> Result<AccountRegistry> {
        let registry = AccountRegistry::new();
        for record in self.accounts.into_values() {
            registry.add(record.into_account()?)?;
        }
        Ok(registry)
    }
}

/// Write the registry to `path` as pretty-printed JSON
pub fn export_json(registry: &AccountRegistry, path: &Path) -> Result<()> {
    let document = AccountsDocument::from_registry(registry)?;

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &document)?;
    writer.flush()?;

    log::info!(
        "Exported {} accounts to {}",
        document.accounts.len(),
        path.display()
    );
    Ok(())
}

/// Load a registry from the JSON document at `path`
///
/// # Errors
///
/// - `FileNotFound` if `path` does not exist
/// - `SerializationError` if the document is malformed
/// - any validation error of [`AccountsDocument::into_registry`]
pub fn import_json(path: &Path) -> Result<AccountRegistry> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => BankError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => e.into(),
    })?;

    let document: AccountsDocument = serde_json::from_reader(BufReader::new(file))?;
    let registry = document.into_registry()?;

    log::info!("Imported {} accounts from {}", registry.len(), path.display());
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::NamedTempFile;

    fn write_temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_import_json() {
        let file = write_temp_json(
            r#"{"accounts": {"1": {"acc_id": 1, "balance": 100.0}, "2": {"acc_id": 2, "balance": 0.5}}}"#,
        );

        let registry = import_json(file.path()).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.get(1).unwrap().balance().unwrap(),
            Decimal::new(100, 0)
        );
        assert_eq!(
            registry.get(2).unwrap().balance().unwrap(),
            Decimal::new(5, 1)
        );
    }

    #[test]
    fn test_import_accepts_integer_balance() {
        let file = write_temp_json(r#"{"accounts": {"3": {"acc_id": 3, "balance": 42}}}"#);

        let registry = import_json(file.path()).unwrap();
        assert_eq!(
            registry.get(3).unwrap().balance().unwrap(),
            Decimal::new(42, 0)
        );
    }

    #[test]
    fn test_import_keeps_four_decimal_places() {
        let file = write_temp_json(r#"{"accounts": {"1": {"acc_id": 1, "balance": 12345.6789}}}"#);

        let registry = import_json(file.path()).unwrap();

        assert_eq!(
            registry.get(1).unwrap().balance().unwrap(),
            Decimal::new(123456789, 4)
        );
    }

    #[test]
    fn test_import_rounds_beyond_float_precision() {
        let file = write_temp_json(
            r#"{"accounts": {"1": {"acc_id": 1, "balance": 1234567890.123456789}}}"#,
        );

        let registry = import_json(file.path()).unwrap();

        assert_ne!(
            registry.get(1).unwrap().balance().unwrap(),
            Decimal::new(1234567890123456789, 9)
        );
    }

    #[test]
    fn test_import_missing_file() {
        let result = import_json(Path::new("does_not_exist.json"));
        assert_eq!(
            result.unwrap_err(),
            BankError::FileNotFound {
                path: "does_not_exist.json".to_string()
            }
        );
    }

    #[test]
    fn test_import_rejects_negative_balance() {
        let file = write_temp_json(r#"{"accounts": {"1": {"acc_id": 1, "balance": -1.0}}}"#);

        assert!(matches!(
            import_json(file.path()),
            Err(BankError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_import_rejects_duplicate_ids() {
        let file = write_temp_json(
            r#"{"accounts": {"1": {"acc_id": 1, "balance": 1.0}, "one": {"acc_id": 1, "balance": 2.0}}}"#,
        );

        assert!(matches!(
            import_json(file.path()),
            Err(BankError::InvalidAccountReference { .. })
        ));
    }

    #[test]
    fn test_import_malformed_document() {
        let file = write_temp_json(r#"{"accounts": ["#);

        assert!(matches!(
            import_json(file.path()),
            Err(BankError::SerializationError { .. })
        ));
    }

    #[test]
    fn test_export_then_import_preserves_balances() {
        let registry = AccountRegistry::new();
        registry
            .add(Account::new(1, Decimal::new(6000, 2)).unwrap())
            .unwrap();
        registry
            .add(Account::new(2, Decimal::new(40, 0)).unwrap())
            .unwrap();

        let file = NamedTempFile::new().unwrap();
        export_json(&registry, file.path()).unwrap();

        let written = fs::read_to_string(file.path()).unwrap();
        assert!(written.contains("\"acc_id\": 1"));

        let restored = import_json(file.path()).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(
            restored.get(1).unwrap().balance().unwrap(),
            Decimal::new(60, 0)
        );
        assert_eq!(
            restored.get(2).unwrap().balance().unwrap(),
            Decimal::new(40, 0)
        );
    }
}
