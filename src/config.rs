//! Tunable heuristics of the extractor and the loader shared by every
//! configuration file the crate reads.

use crate::error::ConfigError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Heuristics applied while walking statement rows.
///
/// Every field has a default, so a configuration file only lists what it
/// overrides:
///
/// ```toml
/// footer_keywords = ["closing", "carried forward"]
/// provenance = "bank-upload"
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// How many leading rows are searched when a column is referenced by header name
    pub header_search_rows: usize,
    /// Characters that make up separator rows
    pub separator_chars: String,
    /// Narrations containing any of these (case-insensitive) are footer rows
    pub footer_keywords: Vec<String>,
    /// Value of the `source` metadata entry of every candidate
    pub provenance: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            header_search_rows: 10,
            separator_chars: "*-=".to_owned(),
            footer_keywords: ["statement", "summary", "opening", "closing", "balance", "generated"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            provenance: "imported".to_owned(),
        }
    }
}

impl ExtractorConfig {
    /// Loads a configuration from a `.toml` or `.json` file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        load_document(path.as_ref())
    }
}

/// Reads and deserializes a TOML or JSON document, chosen by file extension
pub(crate) fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let name = path.display().to_string();
    let extension = path
        .extension()
        .map(|extension| extension.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if extension != "toml" && extension != "json" {
        return Err(ConfigError::UnsupportedExtension(name));
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io { path: name.to_owned(), source })?;
    if extension == "toml" {
        toml::from_str(&content).map_err(|source| ConfigError::Toml { path: name, source })
    } else {
        serde_json::from_str(&content).map_err(|source| ConfigError::Json { path: name, source })
    }
}
