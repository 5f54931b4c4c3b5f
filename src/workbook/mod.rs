//! # Workbook Loading
//!
//! Reads the first worksheet of a legacy `.xls` (BIFF8 inside an OLE compound
//! file) or modern `.xlsx` (OOXML package) workbook into a [`Worksheet`].
//! The container format is detected from the leading magic bytes, so the file
//! extension is never trusted.

pub(crate) mod cell;
#[cfg(test)]
pub(crate) mod fixtures;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod xls;
pub(crate) mod xlsx;

use crate::error::ResultMessage;
use crate::error::WorkbookError;
use crate::helpers::cfb::CompoundFile;
use crate::helpers::reader::SourceReader;
use crate::workbook::sheet::Worksheet;
use crate::workbook::xls::XlsWorkbook;
use crate::workbook::xlsx::XlsxWorkbook;
use std::path::Path;
use std::path::PathBuf;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Epoch used by the workbook for serial date numbers
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DateSystem {
    /// Serial 1 is 1900-01-01 (with the phantom 1900-02-29)
    #[default]
    V1900,
    /// Serial 0 is 1904-01-01
    V1904,
}

impl DateSystem {
    pub(crate) fn from_1904_flag(is_1904: bool) -> Self {
        if is_1904 {
            DateSystem::V1904
        } else {
            DateSystem::V1900
        }
    }
}

/// Where the workbook bytes come from
#[derive(Clone, Debug)]
pub enum WorkbookSource {
    /// A file on the local file system
    Path(PathBuf),
    /// An upload already held in memory
    Bytes { name: String, data: Vec<u8> },
}

impl WorkbookSource {
    /// Base name of the source, used for provenance and error messages
    pub fn name(&self) -> String {
        match self {
            WorkbookSource::Path(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string_lossy().into_owned()),
            WorkbookSource::Bytes { name, .. } => Path::new(name)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| name.to_owned()),
        }
    }
}

impl From<PathBuf> for WorkbookSource {
    fn from(path: PathBuf) -> Self {
        WorkbookSource::Path(path)
    }
}

impl From<&Path> for WorkbookSource {
    fn from(path: &Path) -> Self {
        WorkbookSource::Path(path.to_path_buf())
    }
}

/// Common interface over the supported workbook containers
pub(crate) trait Workbook {
    /// Base name of the workbook file
    fn name(&self) -> &str;

    /// Worksheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;

    /// Loads the worksheet at `index` (in workbook order)
    fn read_sheet(&mut self, index: usize) -> Result<Worksheet, WorkbookError>;
}

/// Opens a workbook, detecting its container format from the magic bytes.
pub(crate) fn open_workbook(source: WorkbookSource) -> Result<Box<dyn Workbook>, WorkbookError> {
    let name = source.name();
    let mut reader = match source {
        WorkbookSource::Path(path) => SourceReader::from_path(&path)?,
        WorkbookSource::Bytes { data, .. } => SourceReader::from_bytes(data),
    };

    let magic = reader.peek::<8>()?;
    if magic.starts_with(ZIP_MAGIC) {
        log::debug!("Opening '{name}' as an OOXML workbook");
        Ok(Box::new(XlsxWorkbook::open(&name, reader)?))
    } else if CompoundFile::is_compound(&magic) {
        let cfb = CompoundFile::parse(reader.into_bytes()?)?;
        // Encrypted OOXML packages are wrapped in a compound file
        if cfb.contains("EncryptedPackage") {
            return Err(WorkbookError::PasswordProtected(name));
        }
        log::debug!("Opening '{name}' as a BIFF8 workbook");
        Ok(Box::new(XlsWorkbook::open(&name, &cfb)?))
    } else {
        Err(WorkbookError::UnknownFormat(name))
    }
}

/// Loads the first worksheet of a workbook.
///
/// The underlying file handle lives only inside this call and is released
/// before it returns, whether loading succeeded or not.
pub fn load_first_sheet(source: WorkbookSource) -> Result<Worksheet, WorkbookError> {
    let mut workbook = open_workbook(source)?;
    let name = workbook.name().to_owned();
    let sheet_names = workbook.sheet_names();
    if sheet_names.is_empty() {
        Err(WorkbookError::NoWorksheet(name.to_owned()))?;
    }
    let sheet = workbook.read_sheet(0).with_prefix(&format!("{}[{}]", name, sheet_names[0]))?;
    log::debug!(
        "Loaded sheet '{}' of '{}' with {} rows and {} columns",
        sheet.name(),
        name,
        sheet.row_count(),
        sheet.col_count()
    );
    Ok(sheet)
}
