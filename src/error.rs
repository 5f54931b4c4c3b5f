use thiserror::Error;

/// Errors surfaced to callers of the extractor.
///
/// Only conditions that make the whole extraction meaningless are reported here.
/// Row-level anomalies never become errors; the offending rows are skipped.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// A configured column reference matched no column of the sheet.
    #[error("Could not resolve column reference '{reference}'")]
    ColumnResolution { reference: String },

    /// The workbook could not be opened or decoded.
    #[error("Cannot read workbook '{name}': {source}")]
    SourceUnavailable {
        name: String,
        #[source]
        source: WorkbookError,
    },

    /// The statement format violates one of its invariants.
    #[error("Invalid statement format: {0}")]
    InvalidFormat(String),
}

/// Errors raised while loading format descriptors or extractor configuration files.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in '{path}': {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid JSON in '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported configuration file '{0}' (expected .toml or .json)")]
    UnsupportedExtension(String),
}

/// Aggregates every failure that can happen while decoding a workbook.
#[derive(Error, Debug)]
pub enum WorkbookError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    // Helper module errors
    #[error("{0}")]
    CfbHelperError(#[from] crate::helpers::cfb::CfbError),

    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    #[error("{0}")]
    Biff8HelperError(#[from] crate::helpers::biff8::Biff8Error),

    // Workbook module errors
    #[error("{0}")]
    XlsError(#[from] crate::workbook::xls::XlsError),

    #[error("Unrecognized workbook format for '{0}'")]
    UnknownFormat(String),

    #[error("Workbook '{0}' is password protected")]
    PasswordProtected(String),

    #[error("Workbook '{0}' contains no worksheet")]
    NoWorksheet(String),

    #[error("Workbook part '{0}' is missing")]
    MissingPart(String),
}

pub(crate) trait ResultOptionChain {
    fn ok_none_else<F>(self, f: F) -> Self
    where
        F: FnOnce() -> Self;
}

impl<T, E> ResultOptionChain for Result<Option<T>, E> {
    fn ok_none_else<F>(self, f: F) -> Self
    where
        F: FnOnce() -> Self,
    {
        match self {
            Ok(None) => f(),
            _ => self,
        }
    }
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, WorkbookError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| WorkbookError::WithContextError(format!("{}: {}", message, e)))
    }
}
