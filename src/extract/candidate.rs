use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;

/// Metadata key holding the provenance tag
pub const METADATA_SOURCE: &str = "source";
/// Metadata key holding the base name of the statement file
pub const METADATA_FILE: &str = "file";

/// A normalized transaction read from one statement row, ready to be
/// persisted by the caller
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionCandidate {
    pub account_id: String,
    pub date: NaiveDateTime,
    pub narration: String,
    pub withdrawal_amount: Decimal,
    pub deposit_amount: Decimal,
    pub metadata: BTreeMap<String, String>,
}

impl TransactionCandidate {
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(METADATA_SOURCE).map(String::as_str)
    }

    pub fn file(&self) -> Option<&str> {
        self.metadata.get(METADATA_FILE).map(String::as_str)
    }
}
