//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over transaction requests from a CSV source.
//! Delegates CSV format concerns to the csv_format module.
//!
//! # Design
//!
//! The SyncReader wraps a csv::Reader and deserializes one row per call to
//! `next()`, so memory use does not grow with the input size. The source can
//! be a file (`SyncReader::new`) or any `io::Read` (`SyncReader::from_reader`),
//! which is how tests and stdin input feed it.
//!
//! # Error Handling
//!
//! - Opening errors (file not found, I/O errors) are returned from `new()`
//! - Row errors are yielded as `ParseError` items carrying the 1-based line
//!   number in the source (the header is line 1), and iteration continues
//!
//! ```no_run
//! use rust_bank_engine::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("transactions.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(request) => println!("Parsed request: {:?}", request),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```

use crate::io::csv_format::{convert_csv_record, CsvRecord, TransactionRequest};
use crate::types::{BankError, Result};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Synchronous CSV reader
///
/// Yields one `Result<TransactionRequest>` per data row.
#[derive(Debug)]
pub struct SyncReader<R: Read = File> {
    reader: csv::Reader<R>,
    line_num: u64,
}

impl SyncReader<File> {
    /// Create a new SyncReader from a file path
    ///
    /// # Errors
    ///
    /// * `FileNotFound` if `path` does not exist
    /// * `IoError` for any other failure to open the file
    pub fn new(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => BankError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => e.into(),
        })?;

        Ok(Self::from_reader(file))
    }
}

impl<R: Read> SyncReader<R> {
    /// Create a SyncReader over any byte source
    ///
    /// The CSV reader is configured to:
    /// - Trim whitespace from all fields
    /// - Allow flexible field counts (for rows with trailing empty columns)
    /// - Use an 8KB buffer
    pub fn from_reader(source: R) -> Self {
        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(source);

        Self {
            reader,
            line_num: 1,
        }
    }
}

impl<R: Read> Iterator for SyncReader<R> {
    type Item = Result<TransactionRequest>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<CsvRecord>();
        let row = deserializer.next()?;
        self.line_num += 1;

        let line = self.line_num;
        Some(
            row.map_err(BankError::from)
                .and_then(convert_csv_record)
                .map_err(|e| match e {
                    BankError::ParseError { message, .. } => BankError::ParseError {
                        line: Some(line),
                        message,
                    },
                    other => BankError::ParseError {
                        line: Some(line),
                        message: other.to_string(),
                    },
                }),
        )
    }
}
