//! CSV format handling for batch transaction input and balance output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserialization
//! - Conversion from CSV records to transaction requests
//! - Account balance serialization
//!
//! Input rows have the columns `type,from,to,amount`:
//!
//! ```text
//! type,from,to,amount
//! deposit,,1,100
//! withdraw,1,,25.5
//! transfer,1,2,40
//! ```

use crate::core::AccountRegistry;
use crate::types::{Account, AccountId, BankError, Result, Transaction, TransactionKind};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;

/// CSV record structure for deserialization
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRecord {
    #[serde(rename = "type")]
    pub tx_type: String,
    pub from: Option<AccountId>,
    pub to: Option<AccountId>,
    pub amount: Option<String>,
}

/// A parsed row that still refers to accounts by id
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRequest {
    pub kind: TransactionKind,
    pub from: Option<AccountId>,
    pub to: Option<AccountId>,
    pub amount: Decimal,
}

impl TransactionRequest {
    /// Look up the referenced accounts and construct the transaction
    ///
    /// # Errors
    ///
    /// - `InvalidAccountReference` if an id is not in the registry
    /// - any construction error of [`Transaction`]
    pub fn resolve(&self, registry: &AccountRegistry) -> Result<Transaction> {
        match self.kind {
            TransactionKind::Deposit => {
                Transaction::deposit(self.amount, lookup(registry, self.to)?)
            }
            TransactionKind::Withdraw => {
                Transaction::withdraw(self.amount, lookup(registry, self.from)?)
            }
            TransactionKind::Transfer => Transaction::transfer(
                self.amount,
                lookup(registry, self.from)?,
                lookup(registry, self.to)?,
            ),
        }
    }
}

fn lookup(registry: &AccountRegistry, id: Option<AccountId>) -> Result<Arc<Account>> {
    // Presence is checked during conversion
    let id = id.ok_or_else(|| BankError::invalid_reference("missing account id"))?;
    registry.require(id)
}

/// Convert a CsvRecord to a TransactionRequest
///
/// This function:
/// - Parses the transaction type (case-insensitive)
/// - Parses the amount into a Decimal
/// - Validates that the account columns required by the type are present
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<TransactionRequest> {
    let kind = match csv_record.tx_type.to_lowercase().as_str() {
        "deposit" => TransactionKind::Deposit,
        "withdraw" | "withdrawal" => TransactionKind::Withdraw,
        "transfer" => TransactionKind::Transfer,
        _ => {
            return Err(BankError::invalid_input(
                &csv_record.tx_type,
                "unknown transaction type",
            ))
        }
    };

    let amount = match csv_record.amount.as_deref().map(str::trim) {
        Some(amount) if !amount.is_empty() => Decimal::from_str(amount)
            .map_err(|_| BankError::invalid_input(amount, "amount is not a number"))?,
        _ => {
            return Err(BankError::invalid_input(
                &csv_record.tx_type,
                "transaction requires an amount",
            ))
        }
    };

    let needs_from = matches!(kind, TransactionKind::Withdraw | TransactionKind::Transfer);
    let needs_to = matches!(kind, TransactionKind::Deposit | TransactionKind::Transfer);

    if needs_from && csv_record.from.is_none() {
        return Err(BankError::invalid_input(
            &csv_record.tx_type,
            "transaction requires a source account",
        ));
    }
    if needs_to && csv_record.to.is_none() {
        return Err(BankError::invalid_input(
            &csv_record.tx_type,
            "transaction requires a destination account",
        ));
    }

    Ok(TransactionRequest {
        kind,
        from: csv_record.from.filter(|_| needs_from),
        to: csv_record.to.filter(|_| needs_to),
        amount,
    })
}

/// Write account balances to CSV format
///
/// Writes columns `account,balance`, sorted by account id, with four
/// decimal places.
pub fn write_accounts_csv(accounts: &[Arc<Account>], output: &mut dyn Write) -> Result<()> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);
    writer.write_record(["account", "balance"])?;

    let mut sorted_accounts = accounts.to_vec();
    sorted_accounts.sort_by_key(|account| account.id());

    for account in sorted_accounts {
        writer.write_record(&[
            account.id().to_string(),
            format!("{:.4}", account.balance()?),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record(tx_type: &str, from: Option<AccountId>, to: Option<AccountId>, amount: Option<&str>) -> CsvRecord {
        CsvRecord {
            tx_type: tx_type.to_string(),
            from,
            to,
            amount: amount.map(|s| s.to_string()),
        }
    }

    #[rstest]
    #[case("deposit", None, Some(1), TransactionKind::Deposit)]
    #[case("DEPOSIT", None, Some(1), TransactionKind::Deposit)]
    #[case("withdraw", Some(1), None, TransactionKind::Withdraw)]
    #[case("withdrawal", Some(1), None, TransactionKind::Withdraw)]
    #[case("transfer", Some(1), Some(2), TransactionKind::Transfer)]
    fn test_convert_csv_record_valid(
        #[case] tx_type: &str,
        #[case] from: Option<AccountId>,
        #[case] to: Option<AccountId>,
        #[case] expected_kind: TransactionKind,
    ) {
        let request = convert_csv_record(record(tx_type, from, to, Some("10.5"))).unwrap();

        assert_eq!(request.kind, expected_kind);
        assert_eq!(request.from, from);
        assert_eq!(request.to, to);
        assert_eq!(request.amount, Decimal::new(105, 1));
    }

    #[test]
    fn test_convert_ignores_unused_account_column() {
        let request = convert_csv_record(record("deposit", Some(9), Some(1), Some("1"))).unwrap();
        assert_eq!(request.from, None);
        assert_eq!(request.to, Some(1));
    }

    #[rstest]
    #[case::invalid_type(record("refund", None, Some(1), Some("1")), "unknown transaction type")]
    #[case::missing_amount(record("deposit", None, Some(1), None), "requires an amount")]
    #[case::blank_amount(record("deposit", None, Some(1), Some("  ")), "requires an amount")]
    #[case::invalid_amount(record("deposit", None, Some(1), Some("ten")), "not a number")]
    #[case::deposit_without_destination(record("deposit", Some(1), None, Some("1")), "destination")]
    #[case::withdraw_without_source(record("withdraw", None, Some(1), Some("1")), "source")]
    #[case::transfer_without_destination(record("transfer", Some(1), None, Some("1")), "destination")]
    fn test_convert_csv_record_errors(#[case] csv_record: CsvRecord, #[case] expected_error: &str) {
        let error = convert_csv_record(csv_record).unwrap_err();
        assert!(
            error.to_string().contains(expected_error),
            "unexpected error: {}",
            error
        );
    }

    #[test]
    fn test_resolve_unknown_account() {
        let registry = AccountRegistry::new();
        registry.add(Account::open(1)).unwrap();

        let request = convert_csv_record(record("transfer", Some(1), Some(2), Some("5"))).unwrap();

        assert_eq!(
            request.resolve(&registry).unwrap_err(),
            BankError::InvalidAccountReference {
                reference: "account 2".to_string()
            }
        );
    }

    #[test]
    fn test_resolve_same_account_transfer() {
        let registry = AccountRegistry::new();
        registry.add(Account::open(1)).unwrap();

        let request = convert_csv_record(record("transfer", Some(1), Some(1), Some("5"))).unwrap();

        assert_eq!(
            request.resolve(&registry).unwrap_err(),
            BankError::SameAccount { account: 1 }
        );
    }

    #[test]
    fn test_resolve_negative_amount() {
        let registry = AccountRegistry::new();
        registry.add(Account::open(1)).unwrap();

        let request = convert_csv_record(record("deposit", None, Some(1), Some("-3"))).unwrap();

        assert!(matches!(
            request.resolve(&registry),
            Err(BankError::InvalidAmount { .. })
        ));
    }

    #[rstest]
    #[case::sorted_by_id(
        vec![(3, Decimal::ZERO), (1, Decimal::new(1000, 1)), (2, Decimal::new(12345, 4))],
        "account,balance\n1,100.0000\n2,1.2345\n3,0.0000\n"
    )]
    #[case::empty_accounts(vec![], "account,balance\n")]
    fn test_write_accounts_csv(#[case] balances: Vec<(AccountId, Decimal)>, #[case] expected_output: &str) {
        let accounts: Vec<Arc<Account>> = balances
            .into_iter()
            .map(|(id, balance)| Arc::new(Account::new(id, balance).unwrap()))
            .collect();

        let mut output = Vec::new();
        write_accounts_csv(&accounts, &mut output).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), expected_output);
    }
}
