//! # Statement Extractor
//!
//! Reads bank statement workbooks and turns their rows into normalized
//! transaction records, driven by a declarative column mapping.
//!
//! ## Features
//!
//! - **Workbook formats**: legacy Excel (`.xls`, BIFF8) and Office Open XML
//!   (`.xlsx`, `.xlsm`), detected from the file content rather than the extension
//! - **Flexible column references**: letter codes (`B`), 0-based indexes (`1`)
//!   or header names (`Narration`) searched in the leading rows
//! - **Date handling**: 1900 and 1904 serial dates, and day-first text dates
//! - **Exact amounts**: decimal arithmetic with thousands separators removed
//! - **Row heuristics**: separator and footer rows are skipped; the separator
//!   characters and footer keywords are configurable
//!
//! ## Example
//!
//! ```no_run
//! use statement_extractor::{extract_transactions, FormatDescriptor};
//!
//! let format = FormatDescriptor::new(2, "Date", "Narration", "Withdrawal", "Deposit");
//! let transactions = extract_transactions("statement.xls", &format, "savings-01")?;
//! for transaction in &transactions {
//!     println!("{} {} {}", transaction.date, transaction.narration, transaction.deposit_amount);
//! }
//! # Ok::<(), statement_extractor::ExtractError>(())
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod format;
mod helpers;
pub mod workbook;

pub use crate::config::ExtractorConfig;
pub use crate::error::ConfigError;
pub use crate::error::ExtractError;
pub use crate::error::WorkbookError;
pub use crate::extract::amount::AmountParse;
pub use crate::extract::candidate::TransactionCandidate;
pub use crate::extract::extract_transactions;
pub use crate::extract::Extractor;
pub use crate::extract::TransactionRows;
pub use crate::format::FormatDescriptor;
pub use crate::workbook::cell::CellValue;
pub use crate::workbook::load_first_sheet;
pub use crate::workbook::sheet::Worksheet;
pub use crate::workbook::DateSystem;
pub use crate::workbook::WorkbookSource;
