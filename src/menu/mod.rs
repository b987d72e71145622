//! Interactive menu building blocks
//!
//! - `command` - Table mapping user input to menu actions
//! - `prompt` - Request/response state machine for deposit and transfer dialogues

pub mod command;
pub mod prompt;

pub use command::{Command, CommandTable};
pub use prompt::{render_accounts, Flow, Step};
