//! Front ends that drive the engine
//!
//! - `interactive` - Numbered menu over a line-based input stream
//! - `batch` - Whole-file CSV execution through the worker pool

pub mod batch;
pub mod interactive;

pub use batch::{run_batch, BatchSummary};
pub use interactive::{InteractiveSession, SessionEnd, SessionSummary};
