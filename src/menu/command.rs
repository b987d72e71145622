//! Menu command table
//!
//! Every menu action is listed once in [`Command::ALL`]; [`CommandTable`]
//! indexes that list by number and by name when it is built, and resolving
//! user input is a lookup in those maps.

use crate::types::{BankError, Result};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Menu actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Exit,
    Deposit,
    Transfer,
    ShowAccounts,
}

impl Command {
    pub const ALL: [Command; 4] = [
        Command::Exit,
        Command::Deposit,
        Command::Transfer,
        Command::ShowAccounts,
    ];

    /// Number the user types to select the action
    pub fn number(self) -> u8 {
        match self {
            Command::Exit => 0,
            Command::Deposit => 1,
            Command::Transfer => 2,
            Command::ShowAccounts => 3,
        }
    }

    /// Name accepted as an alternative to the number
    pub fn name(self) -> &'static str {
        match self {
            Command::Exit => "exit",
            Command::Deposit => "deposit",
            Command::Transfer => "transfer",
            Command::ShowAccounts => "show",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Command::Exit => "Exit",
            Command::Deposit => "Deposit",
            Command::Transfer => "Transfer",
            Command::ShowAccounts => "Show accounts",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number(), self.label())
    }
}

/// Lookup table from user input to [`Command`]
#[derive(Debug, Clone)]
pub struct CommandTable {
    by_number: BTreeMap<u8, Command>,
    by_name: HashMap<&'static str, Command>,
}

impl CommandTable {
    pub fn new() -> Self {
        let mut by_number = BTreeMap::new();
        let mut by_name = HashMap::new();

        for command in Command::ALL {
            by_number.insert(command.number(), command);
            by_name.insert(command.name(), command);
        }

        Self { by_number, by_name }
    }

    /// Resolve a line of user input to a command
    ///
    /// Accepts the command number or its name (case-insensitive); surrounding
    /// whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCommand` if the input matches no entry.
    pub fn resolve(&self, input: &str) -> Result<Command> {
        let input = input.trim();

        let found = match input.parse::<u8>() {
            Ok(number) => self.by_number.get(&number),
            Err(_) => self.by_name.get(input.to_lowercase().as_str()),
        };

        found.copied().ok_or_else(|| BankError::UnknownCommand {
            command: input.to_string(),
        })
    }

    /// One-line summary of all actions, in number order
    pub fn help(&self) -> String {
        let actions: Vec<String> = self.by_number.values().map(Command::to_string).collect();
        format!("Actions: {}", actions.join(", "))
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0", Command::Exit)]
    #[case("1", Command::Deposit)]
    #[case("2", Command::Transfer)]
    #[case("3", Command::ShowAccounts)]
    #[case("  2\n", Command::Transfer)]
    #[case("deposit", Command::Deposit)]
    #[case("SHOW", Command::ShowAccounts)]
    #[case("Exit", Command::Exit)]
    fn test_resolve(#[case] input: &str, #[case] expected: Command) {
        assert_eq!(CommandTable::new().resolve(input).unwrap(), expected);
    }

    #[rstest]
    #[case("4")]
    #[case("-1")]
    #[case("withdraw")]
    #[case("")]
    fn test_resolve_unknown(#[case] input: &str) {
        assert_eq!(
            CommandTable::new().resolve(input).unwrap_err(),
            BankError::UnknownCommand {
                command: input.trim().to_string()
            }
        );
    }

    #[test]
    fn test_help_lists_actions_in_order() {
        assert_eq!(
            CommandTable::new().help(),
            "Actions: 0. Exit, 1. Deposit, 2. Transfer, 3. Show accounts"
        );
    }

    #[test]
    fn test_numbers_and_names_are_unique() {
        let table = CommandTable::new();
        assert_eq!(table.by_number.len(), Command::ALL.len());
        assert_eq!(table.by_name.len(), Command::ALL.len());
    }
}
