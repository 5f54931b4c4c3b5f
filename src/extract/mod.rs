//! # Transaction Extraction
//!
//! Turns the rows of a loaded [`Worksheet`] into [`TransactionCandidate`]s
//! according to a [`FormatDescriptor`]. The driver walks the sheet once,
//! from the configured data start row to the last row:
//!
//! 1. separator rows are skipped;
//! 2. date, narration, withdrawal and deposit cells are read and parsed;
//! 3. rows without a date or narration are skipped, as are footer rows;
//! 4. every other row becomes a candidate.
//!
//! Row-level problems never abort extraction. Only an unresolvable column,
//! an unreadable workbook or an invalid descriptor are errors.

pub mod amount;
pub mod candidate;
pub mod column;
pub mod date;
pub mod filter;

use crate::config::ExtractorConfig;
use crate::error::ExtractError;
use crate::extract::amount::parse_amount;
use crate::extract::amount::AmountParse;
use crate::extract::candidate::TransactionCandidate;
use crate::extract::candidate::METADATA_FILE;
use crate::extract::candidate::METADATA_SOURCE;
use crate::extract::column::resolve_column;
use crate::extract::date::parse_date;
use crate::extract::filter::RowFilter;
use crate::format::FormatDescriptor;
use crate::workbook::cell::CellValue;
use crate::workbook::load_first_sheet;
use crate::workbook::sheet::Worksheet;
use crate::workbook::WorkbookSource;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::iter::FusedIterator;
use std::path::Path;

/// Statement extractor holding the row heuristics.
///
/// Extractors are plain immutable data and can be shared between threads.
#[derive(Clone, Debug)]
pub struct Extractor {
    config: ExtractorConfig,
    filter: RowFilter,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}

impl Extractor {
    pub fn new(config: ExtractorConfig) -> Self {
        let filter = RowFilter::new(&config);
        Self { config, filter }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Loads the first worksheet of `source` and extracts every transaction row.
    ///
    /// The descriptor is validated before the workbook is opened, and all four
    /// columns are resolved before any row is read, so a failure never comes
    /// with partial output.
    pub fn extract(
        &self,
        source: WorkbookSource,
        format: &FormatDescriptor,
        account_id: &str,
    ) -> Result<Vec<TransactionCandidate>, ExtractError> {
        format.validate()?;
        let name = source.name();
        let sheet = load_first_sheet(source)
            .map_err(|source| ExtractError::SourceUnavailable { name: name.to_owned(), source })?;
        let candidates = self.rows(&sheet, format, account_id, &name)?.collect();
        Ok(candidates)
    }

    /// Lazily extracts transactions from an already loaded worksheet.
    ///
    /// `file_name` is recorded in the `file` metadata entry of each candidate.
    pub fn rows<'a>(
        &'a self,
        sheet: &'a Worksheet,
        format: &FormatDescriptor,
        account_id: &str,
        file_name: &str,
    ) -> Result<TransactionRows<'a>, ExtractError> {
        format.validate()?;
        let [date, narration, withdrawal, deposit] = format
            .columns()
            .map(|reference| resolve_column(sheet, reference, self.config.header_search_rows));
        let columns = Columns {
            date: date?,
            narration: narration?,
            withdrawal: withdrawal?,
            deposit: deposit?,
        };
        log::debug!(
            "Extracting '{}' from row {} (0-based: {}), column indices - Date: {}, Narration: {}, Withdrawal: {}, Deposit: {}",
            file_name,
            format.data_start_row,
            format.data_start_row - 1,
            columns.date,
            columns.narration,
            columns.withdrawal,
            columns.deposit,
        );

        Ok(TransactionRows {
            sheet,
            filter: &self.filter,
            provenance: &self.config.provenance,
            columns,
            account_id: account_id.to_owned(),
            file_name: file_name.to_owned(),
            start_row: format.data_start_row - 1,
            state: DriverState::Scanning,
            emitted: 0,
        })
    }
}

/// Extracts transactions from a workbook file with the default heuristics.
pub fn extract_transactions<P: AsRef<Path>>(
    path: P,
    format: &FormatDescriptor,
    account_id: &str,
) -> Result<Vec<TransactionCandidate>, ExtractError> {
    Extractor::default().extract(WorkbookSource::from(path.as_ref()), format, account_id)
}

/// Resolved 0-based indexes of the four mapped columns
#[derive(Copy, Clone, Debug)]
struct Columns {
    date: usize,
    narration: usize,
    withdrawal: usize,
    deposit: usize,
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum DriverState {
    Scanning,
    /// Next row (0-based) to examine
    Extracting(usize),
    Done,
}

/// Why a row produced no candidate
#[derive(Clone, Debug, PartialEq)]
enum SkipReason {
    Separator,
    MissingDate,
    EmptyNarration,
    FooterKeyword(String),
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Separator => f.write_str("separator row"),
            SkipReason::MissingDate => f.write_str("no readable date"),
            SkipReason::EmptyNarration => f.write_str("empty narration"),
            SkipReason::FooterKeyword(keyword) => write!(f, "footer keyword '{keyword}'"),
        }
    }
}

/// Lazy iterator over the transaction rows of a worksheet, in row order
pub struct TransactionRows<'a> {
    sheet: &'a Worksheet,
    filter: &'a RowFilter,
    provenance: &'a str,
    columns: Columns,
    account_id: String,
    file_name: String,
    start_row: usize,
    state: DriverState,
    emitted: usize,
}

impl TransactionRows<'_> {
    fn read_row(&self, row: usize) -> Result<TransactionCandidate, SkipReason> {
        if self.filter.is_separator(self.sheet, row) {
            return Err(SkipReason::Separator);
        }

        let date = parse_date(self.sheet.get(row, self.columns.date), self.sheet.date_system());
        let narration = match self.sheet.get(row, self.columns.narration) {
            // Zero reads as no narration
            CellValue::Number(number) if *number == 0.0 => String::new(),
            cell => cell.to_text().trim().to_owned(),
        };
        let withdrawal = self.amount(row, self.columns.withdrawal, "withdrawal");
        let deposit = self.amount(row, self.columns.deposit, "deposit");

        let date = date.ok_or(SkipReason::MissingDate)?;
        if narration.is_empty() {
            return Err(SkipReason::EmptyNarration);
        }
        if let Some(keyword) = self.filter.footer_keyword(&narration) {
            return Err(SkipReason::FooterKeyword(keyword.to_owned()));
        }

        let metadata = BTreeMap::from([
            (METADATA_SOURCE.to_owned(), self.provenance.to_owned()),
            (METADATA_FILE.to_owned(), self.file_name.to_owned()),
        ]);
        Ok(TransactionCandidate {
            account_id: self.account_id.to_owned(),
            date,
            narration,
            withdrawal_amount: withdrawal,
            deposit_amount: deposit,
            metadata,
        })
    }

    fn amount(&self, row: usize, col: usize, label: &str) -> rust_decimal::Decimal {
        let parsed = parse_amount(self.sheet.get(row, col));
        if let AmountParse::Unreadable(text) = &parsed {
            log::debug!("Row {}: unreadable {} amount '{}', recorded as zero", row + 1, label, text);
        }
        parsed.amount()
    }
}

impl Iterator for TransactionRows<'_> {
    type Item = TransactionCandidate;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                DriverState::Scanning => {
                    self.state = DriverState::Extracting(self.start_row);
                }
                DriverState::Extracting(row) if row >= self.sheet.row_count() => {
                    log::info!("Extracted {} transactions from '{}'", self.emitted, self.file_name);
                    self.state = DriverState::Done;
                }
                DriverState::Extracting(row) => {
                    self.state = DriverState::Extracting(row + 1);
                    match self.read_row(row) {
                        Ok(candidate) => {
                            self.emitted += 1;
                            log::trace!(
                                "Row {}: {} | {} | W: {} | D: {}",
                                row + 1,
                                candidate.date.format("%Y-%m-%d"),
                                candidate.narration.chars().take(50).collect::<String>(),
                                candidate.withdrawal_amount,
                                candidate.deposit_amount,
                            );
                            return Some(candidate);
                        }
                        Err(reason) => log::debug!("Skipping row {}: {}", row + 1, reason),
                    }
                }
                DriverState::Done => return None,
            }
        }
    }
}

impl FusedIterator for TransactionRows<'_> {}
