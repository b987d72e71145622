//! Interactive menu session
//!
//! Reads actions from any `BufRead` and writes prompts and results to any
//! `Write`, so the same loop drives stdin/stdout in the binary and in-memory
//! buffers in tests.
//!
//! # Error Handling
//!
//! Invalid input, unknown commands and rejected submissions are printed as
//! `Error: ...` and the session returns to the menu. Only I/O errors on the
//! session's own streams and fatal errors end the session with `Err`.

use crate::core::{AccountRegistry, TransactionSink};
use crate::menu::{render_accounts, Command, CommandTable, Flow, Step};
use crate::types::Result;
use log::{debug, warn};
use std::io::{BufRead, Lines, Write};

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user chose the exit action
    Exit,
    /// The input stream was closed
    EndOfInput,
}

/// Outcome of a finished session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub end: SessionEnd,
    pub submitted: usize,
    pub rejected: usize,
}

/// Menu loop over a registry, handing transactions to a sink
pub struct InteractiveSession<'a, S: TransactionSink + ?Sized> {
    registry: &'a AccountRegistry,
    sink: &'a S,
    commands: CommandTable,
}

/// Whether a dialogue ran to completion
enum FlowOutcome {
    Submitted,
    Rejected,
    EndOfInput,
}

impl<'a, S: TransactionSink + ?Sized> InteractiveSession<'a, S> {
    pub fn new(registry: &'a AccountRegistry, sink: &'a S) -> Self {
        Self {
            registry,
            sink,
            commands: CommandTable::new(),
        }
    }

    /// Run the menu until the user exits or the input ends
    ///
    /// Stopping the pool and saving accounts are left to the caller.
    pub fn run<R: BufRead, W: Write>(&self, input: R, output: &mut W) -> Result<SessionSummary> {
        let mut lines = input.lines();
        let mut summary = SessionSummary {
            end: SessionEnd::EndOfInput,
            submitted: 0,
            rejected: 0,
        };

        writeln!(output, "Bank IS")?;
        writeln!(output, "{}", self.commands.help())?;

        loop {
            write!(output, "Enter action: ")?;
            output.flush()?;

            let Some(line) = lines.next().transpose()? else {
                writeln!(output)?;
                return Ok(summary);
            };

            let command = match self.commands.resolve(&line) {
                Ok(command) => command,
                Err(e) => {
                    writeln!(output, "Error: {}", e)?;
                    continue;
                }
            };
            debug!("Menu action: {:?}", command);

            let flow = match command {
                Command::Exit => {
                    summary.end = SessionEnd::Exit;
                    return Ok(summary);
                }
                Command::ShowAccounts => {
                    write!(output, "{}", render_accounts(self.registry)?)?;
                    continue;
                }
                Command::Deposit => Flow::deposit(),
                Command::Transfer => Flow::transfer(),
            };

            match self.run_flow(flow, &mut lines, output)? {
                FlowOutcome::Submitted => summary.submitted += 1,
                FlowOutcome::Rejected => summary.rejected += 1,
                FlowOutcome::EndOfInput => return Ok(summary),
            }
        }
    }

    fn run_flow<R: BufRead, W: Write>(
        &self,
        mut flow: Flow,
        lines: &mut Lines<R>,
        output: &mut W,
    ) -> Result<FlowOutcome> {
        loop {
            writeln!(output, "{}", flow.prompt(self.registry)?)?;
            output.flush()?;

            let Some(line) = lines.next().transpose()? else {
                return Ok(FlowOutcome::EndOfInput);
            };

            let transaction = match flow.advance(&line, self.registry) {
                Ok(Step::Next(next)) => {
                    flow = next;
                    continue;
                }
                Ok(Step::Complete(transaction)) => transaction,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    writeln!(output, "Error: {}", e)?;
                    return Ok(FlowOutcome::Rejected);
                }
            };

            let description = transaction.to_string();
            return match self.sink.submit(transaction) {
                Ok(()) => {
                    writeln!(output, "{} submitted", description)?;
                    Ok(FlowOutcome::Submitted)
                }
                Err(e) if e.is_fatal() => Err(e),
                Err(e) => {
                    warn!("{} rejected: {}", description, e);
                    writeln!(output, "Error: {}", e)?;
                    Ok(FlowOutcome::Rejected)
                }
            };
        }
    }
}
