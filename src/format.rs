use crate::config::load_document;
use crate::error::ConfigError;
use crate::error::ExtractError;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;

/// Declarative description of a bank's statement layout.
///
/// Column references may be a letter code (`"B"`), a 0-based index (`"1"`)
/// or a header name (`"Narration"`). Keys are accepted in snake_case or
/// camelCase:
///
/// ```toml
/// format_name = "HDFC savings"
/// data_start_row = 23
/// date_column = "A"
/// narration_column = "Narration"
/// withdrawal_column = "Withdrawal Amt."
/// deposit_column = "Deposit Amt."
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatDescriptor {
    #[serde(default, alias = "formatName", skip_serializing_if = "Option::is_none")]
    pub format_name: Option<String>,
    #[serde(default, alias = "bankName", skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    /// 1-indexed row where transaction data begins
    #[serde(alias = "dataStartRow")]
    pub data_start_row: usize,
    #[serde(alias = "dateColumn")]
    pub date_column: String,
    #[serde(alias = "narrationColumn")]
    pub narration_column: String,
    #[serde(alias = "withdrawalColumn")]
    pub withdrawal_column: String,
    #[serde(alias = "depositColumn")]
    pub deposit_column: String,
}

impl FormatDescriptor {
    pub fn new(data_start_row: usize, date: &str, narration: &str, withdrawal: &str, deposit: &str) -> Self {
        Self {
            format_name: None,
            bank_name: None,
            data_start_row,
            date_column: date.to_owned(),
            narration_column: narration.to_owned(),
            withdrawal_column: withdrawal.to_owned(),
            deposit_column: deposit.to_owned(),
        }
    }

    /// Loads a descriptor from a `.toml` or `.json` file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        load_document(path.as_ref())
    }

    /// Checks the invariants that do not depend on a worksheet
    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.data_start_row < 1 {
            return Err(ExtractError::InvalidFormat(format!(
                "data_start_row is 1-indexed, got {}",
                self.data_start_row
            )));
        }
        Ok(())
    }

    /// Column references in the order date, narration, withdrawal, deposit
    pub(crate) fn columns(&self) -> [&str; 4] {
        [
            self.date_column.as_str(),
            self.narration_column.as_str(),
            self.withdrawal_column.as_str(),
            self.deposit_column.as_str(),
        ]
    }
}
