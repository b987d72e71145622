//! Prompt state machine for multi-step menu actions
//!
//! A deposit or transfer needs several answers from the user. Each [`Flow`]
//! state knows the prompt to show and how to consume one line of input:
//!
//! ```text
//! DepositAccount ──index──▶ DepositAmount ──amount──▶ Deposit
//! TransferSource ──index──▶ TransferDestination ──index──▶ TransferAmount ──amount──▶ Transfer
//! ```
//!
//! Any invalid answer ends the flow with an error; the caller decides
//! whether to report it and return to the menu.

use crate::core::AccountRegistry;
use crate::types::{Account, BankError, Result, Transaction};
use rust_decimal::Decimal;
use std::fmt::Write as _;
use std::str::FromStr;
use std::sync::Arc;

const SELECT_INDEX: &str = "Enter index of the account number:";

/// Current step of a deposit or transfer dialogue
#[derive(Debug, Clone)]
pub enum Flow {
    DepositAccount,
    DepositAmount {
        account: Arc<Account>,
    },
    TransferSource,
    TransferDestination {
        source: Arc<Account>,
    },
    TransferAmount {
        source: Arc<Account>,
        destination: Arc<Account>,
    },
}

/// Result of feeding one line of input to a [`Flow`]
#[derive(Debug)]
pub enum Step {
    Next(Flow),
    Complete(Transaction),
}

impl Flow {
    pub fn deposit() -> Self {
        Flow::DepositAccount
    }

    pub fn transfer() -> Self {
        Flow::TransferSource
    }

    /// Text to show before reading the next line
    ///
    /// Account selection states include the numbered account listing.
    pub fn prompt(&self, registry: &AccountRegistry) -> Result<String> {
        let heading = match self {
            Flow::DepositAccount => "Select deposit account",
            Flow::TransferSource => "Select account to transfer from",
            Flow::TransferDestination { .. } => "Select account to transfer to",
            Flow::DepositAmount { .. } => return Ok("Enter deposit amount:".to_string()),
            Flow::TransferAmount { .. } => return Ok("Enter transfer amount:".to_string()),
        };

        Ok(format!(
            "{}\n{}{}",
            heading,
            render_accounts(registry)?,
            SELECT_INDEX
        ))
    }

    /// Consume one line of input
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the line is not a valid index or amount
    /// - `InvalidAccountReference` if the index is out of range
    /// - `SameAccount` if the transfer destination equals the source
    /// - `InvalidAmount` for a negative amount
    pub fn advance(self, input: &str, registry: &AccountRegistry) -> Result<Step> {
        let step = match self {
            Flow::DepositAccount => Step::Next(Flow::DepositAmount {
                account: select_account(input, registry)?,
            }),
            Flow::DepositAmount { account } => {
                Step::Complete(Transaction::deposit(parse_amount(input)?, account)?)
            }
            Flow::TransferSource => Step::Next(Flow::TransferDestination {
                source: select_account(input, registry)?,
            }),
            Flow::TransferDestination { source } => {
                let destination = select_account(input, registry)?;
                // Rejected here so the user is not asked for an amount first
                if destination.id() == source.id() {
                    return Err(BankError::SameAccount {
                        account: source.id(),
                    });
                }
                Step::Next(Flow::TransferAmount {
                    source,
                    destination,
                })
            }
            Flow::TransferAmount {
                source,
                destination,
            } => Step::Complete(Transaction::transfer(
                parse_amount(input)?,
                source,
                destination,
            )?),
        };

        Ok(step)
    }
}

/// Numbered listing of all accounts, one per line, in index order
pub fn render_accounts(registry: &AccountRegistry) -> Result<String> {
    let mut listing = String::new();

    for (index, account) in registry.accounts().iter().enumerate() {
        // Writing to a String cannot fail
        let _ = writeln!(
            listing,
            "{}. Account with number {} and balance {}",
            index + 1,
            account.id(),
            account.balance()?
        );
    }

    Ok(listing)
}

fn select_account(input: &str, registry: &AccountRegistry) -> Result<Arc<Account>> {
    let input = input.trim();
    let index = input
        .parse::<usize>()
        .map_err(|_| BankError::invalid_input(input, "expected an account index"))?;

    registry.get_index(index)
}

fn parse_amount(input: &str) -> Result<Decimal> {
    let input = input.trim();
    Decimal::from_str(input).map_err(|_| BankError::invalid_input(input, "expected an amount"))
}
