//! I/O module
//!
//! Handles account persistence, CSV parsing and output.
//!
//! # Components
//!
//! - `json_store` - JSON import/export of the account registry
//! - `csv_format` - CSV format handling (record conversion, balance output)
//! - `sync_reader` - Synchronous CSV reader with iterator interface

pub mod csv_format;
pub mod json_store;
pub mod sync_reader;

pub use csv_format::{convert_csv_record, write_accounts_csv, CsvRecord, TransactionRequest};
pub use json_store::{export_json, import_json, AccountRecord, AccountsDocument};
pub use sync_reader::SyncReader;
