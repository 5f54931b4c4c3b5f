use crate::error::ResultOptionChain;
use crate::error::WorkbookError;
use crate::helpers::biff8::Biff8Reader;
use crate::helpers::cfb::CompoundFile;
use crate::match_biff8_record;
use crate::workbook::cell::CellValue;
use crate::workbook::reference::index_to_reference;
use crate::workbook::sheet::Worksheet;
use crate::workbook::DateSystem;
use crate::workbook::Workbook;
use thiserror::Error;

// BIFF8 record type identifiers
const FORMULA: u16 = 6;        // Formula with its cached result
const EOF: u16 = 10;           // End of a substream
const DATE1904: u16 = 34;      // Date system flag (1904 vs 1900 base)
const FILE_PASS: u16 = 47;     // Encryption header
const CODE_PAGE: u16 = 66;     // Encoding of 8-bit strings
const BOUND_SHEET8: u16 = 133; // Sheet name, kind and substream offset
const MUL_RK: u16 = 189;       // Run of RK numbers on one row
const SST: u16 = 252;          // Shared string table
const LABEL_SST: u16 = 253;    // String cell referencing the SST
const NUMBER: u16 = 515;       // Floating point cell
const LABEL: u16 = 516;        // Inline string cell
const BOOL_ERR: u16 = 517;     // Boolean or error cell
const STRING: u16 = 519;       // String result of the preceding FORMULA
const RK: u16 = 638;           // Compressed number cell
const BOF: u16 = 2057;         // Start of a substream

/// BOUNDSHEET8 sheet type of a plain worksheet
const SHEET_TYPE_WORKSHEET: u8 = 0;

/// Error types specific to XLS file parsing
#[derive(Error, Debug)]
pub enum XlsError {
    #[error("Invalid Code page '{0}'")]
    CodePage(u16),

    #[error("Invalid Formula value '{1:#018x}' at {0}")]
    FormulaValue(String, u64),
}

/// A legacy Excel 97-2003 workbook
pub(crate) struct XlsWorkbook {
    name: String,
    reader: Biff8Reader,
    date_system: DateSystem,
    shared_strings: Vec<String>,
    /// Worksheets as (name, substream offset) pairs in workbook order
    sheets: Vec<(String, usize)>,
}

impl XlsWorkbook {
    /// Reads the workbook globals substream: date system, encoding, shared
    /// strings and the worksheet directory
    pub(crate) fn open(name: &str, cfb: &CompoundFile) -> Result<XlsWorkbook, WorkbookError> {
        let mut reader = cfb.stream("Workbook")
            .ok_none_else(|| cfb.stream("Book"))?
            .map(Biff8Reader::new)
            .ok_or_else(|| WorkbookError::MissingPart("Workbook".to_owned()))?;
        let mut is_1904 = false;
        let mut shared_strings = Vec::new();
        let mut sheets: Vec<(String, usize)> = Vec::new();
        match_biff8_record!(reader => {
            EOF => break,
            FILE_PASS => Err(WorkbookError::PasswordProtected(name.to_owned()))?,
            DATE1904 => is_1904 = reader.read_u16()? == 1,
            CODE_PAGE => {
                let code_page = reader.read_u16()?;
                reader.encoding = codepage::to_encoding(code_page).ok_or(XlsError::CodePage(code_page))?;
            }
            SST => shared_strings = load_shared_strings(&mut reader)?,
            BOUND_SHEET8 => {
                let pointer = reader.read_u32()? as usize;
                reader.skip(1)?; // Visibility
                let kind = reader.read_u8()?;
                let sheet_name = reader.read_short_unicode_string()?;
                if kind == SHEET_TYPE_WORKSHEET {
                    sheets.push((sheet_name, pointer));
                } else {
                    log::trace!("Ignoring non-worksheet sheet '{sheet_name}' of type {kind}");
                }
            }
        });

        Ok(XlsWorkbook {
            name: name.to_owned(),
            reader,
            date_system: DateSystem::from_1904_flag(is_1904),
            shared_strings,
            sheets,
        })
    }
}

impl Workbook for XlsWorkbook {
    fn name(&self) -> &str {
        &self.name
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.to_owned()).collect()
    }

    fn read_sheet(&mut self, index: usize) -> Result<Worksheet, WorkbookError> {
        let (sheet_name, pointer) = self.sheets.get(index).cloned()
            .ok_or_else(|| WorkbookError::NoWorksheet(self.name.to_owned()))?;
        let mut sheet = Worksheet::new(&sheet_name, self.date_system);
        let reader = &mut self.reader;

        reader.goto(pointer);
        reader.next()?; // BOF of the worksheet substream
        // Cell awaiting the STRING record that carries its formula result
        let mut pending_string = None::<(usize, usize)>;
        while let Some(kind) = reader.next()? {
            match kind {
                BOF | EOF => break,
                MUL_RK => {
                    let row = reader.read_u16()? as usize;
                    let first_col = reader.read_u16()? as usize;
                    let last_col = reader.last_u16()? as usize;
                    for col in first_col..=last_col {
                        reader.skip(2)?; // XF index
                        sheet.push(row, col, CellValue::Number(reader.read_rk_number()?));
                    }
                }
                NUMBER | RK | LABEL | LABEL_SST | BOOL_ERR | FORMULA => {
                    let row = reader.read_u16()? as usize;
                    let col = reader.read_u16()? as usize;
                    reader.skip(2)?; // XF index
                    let value = match kind {
                        NUMBER => CellValue::Number(reader.read_f64()?),
                        RK => CellValue::Number(reader.read_rk_number()?),
                        LABEL => CellValue::Text(reader.read_unicode_string()?),
                        LABEL_SST => {
                            let index = reader.read_u32()? as usize;
                            self.shared_strings.get(index)
                                .map(|text| CellValue::Text(text.to_owned()))
                                .unwrap_or(CellValue::Empty)
                        }
                        BOOL_ERR => {
                            let value = reader.read_u8()?;
                            let is_error = reader.read_u8()? != 0;
                            if is_error { CellValue::Empty } else { CellValue::Number(value as f64) }
                        }
                        _ => match read_formula_result(reader.read_u64()?, row, col)? {
                            Some(value) => value,
                            None => {
                                pending_string = Some((row, col));
                                CellValue::Empty
                            }
                        },
                    };
                    sheet.push(row, col, value);
                }
                STRING => {
                    if let Some((row, col)) = pending_string.take() {
                        sheet.push(row, col, CellValue::Text(reader.read_unicode_string()?));
                    }
                }
                _ => (),
            }
        }
        Ok(sheet)
    }
}

/// Reads the SST body: total count, unique count, then the strings
fn load_shared_strings(reader: &mut Biff8Reader) -> Result<Vec<String>, WorkbookError> {
    reader.skip(4)?;
    let count = reader.read_u32()? as usize;
    let mut shared_strings: Vec<String> = Vec::with_capacity(count.min(65536));
    for _ in 0..count {
        shared_strings.push(reader.read_rich_extended_string()?);
    }
    Ok(shared_strings)
}

/// Decodes the cached result of a FORMULA record.
///
/// Returns `None` when the result is a string that follows in a STRING record.
fn read_formula_result(formula: u64, row: usize, col: usize) -> Result<Option<CellValue>, WorkbookError> {
    if formula & 0xFFFF_0000_0000_0000 != 0xFFFF_0000_0000_0000 {
        return Ok(Some(CellValue::Number(f64::from_bits(formula))));
    }
    match formula & 0xFF {
        0 => Ok(None),
        1 => Ok(Some(CellValue::Number(((formula >> 16) & 0xFF) as f64))),
        2 | 3 => Ok(Some(CellValue::Empty)),
        _ => Err(XlsError::FormulaValue(index_to_reference(row, col), formula))?,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::fixtures::biff8_record;
    use crate::workbook::fixtures::biff8_stream;
    use crate::workbook::fixtures::compound_file;
    use crate::workbook::fixtures::label_sst_record;
    use crate::workbook::fixtures::number_record;
    use crate::workbook::fixtures::sst_record;
    use crate::workbook::fixtures::xls_workbook;

    fn open(data: Vec<u8>) -> Result<XlsWorkbook, WorkbookError> {
        let cfb = CompoundFile::parse(data)?;
        XlsWorkbook::open("statement.xls", &cfb)
    }

    #[test]
    fn reads_numbers_and_labels() {
        let data = xls_workbook(false, &[
            (0, 0, CellValue::from("Date")),
            (0, 1, CellValue::from("Narration")),
            (1, 0, CellValue::Number(45292.0)),
            (1, 1, CellValue::from("Salary")),
            (1, 3, CellValue::Number(50000.5)),
        ]);
        let mut workbook = open(data).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Sheet1"]);

        let sheet = workbook.read_sheet(0).unwrap();
        assert_eq!(sheet.date_system(), DateSystem::V1900);
        assert_eq!(sheet.row_count(), 2);
        assert_eq!(sheet.col_count(), 4);
        assert_eq!(sheet.get(0, 1), &CellValue::from("Narration"));
        assert_eq!(sheet.get(1, 0), &CellValue::Number(45292.0));
        assert_eq!(sheet.get(1, 3), &CellValue::Number(50000.5));
    }

    #[test]
    fn reads_date1904_flag() {
        let mut workbook = open(xls_workbook(true, &[(0, 0, CellValue::Number(1.0))])).unwrap();
        assert_eq!(workbook.read_sheet(0).unwrap().date_system(), DateSystem::V1904);
    }

    #[test]
    fn reads_shared_strings_and_rk_runs() {
        let mut mul_rk = Vec::new();
        mul_rk.extend_from_slice(&2u16.to_le_bytes()); // row
        mul_rk.extend_from_slice(&1u16.to_le_bytes()); // first column
        for value in [100i32, 250] {
            mul_rk.extend_from_slice(&0u16.to_le_bytes());
            mul_rk.extend_from_slice(&(((value << 2) as u32) | 0x02).to_le_bytes());
        }
        mul_rk.extend_from_slice(&2u16.to_le_bytes()); // last column

        let stream = biff8_stream(
            vec![sst_record(&["Opening Balance", "ATM"])],
            vec![("Sheet1", 0, vec![
                label_sst_record(0, 0, 1),
                number_record(1, 0, 3.5),
                biff8_record(MUL_RK, &mul_rk),
            ])],
        );
        let mut workbook = open(compound_file(&[("Workbook", stream)])).unwrap();
        let sheet = workbook.read_sheet(0).unwrap();

        assert_eq!(sheet.get(0, 0), &CellValue::from("ATM"));
        assert_eq!(sheet.get(1, 0), &CellValue::Number(3.5));
        assert_eq!(sheet.get(2, 1), &CellValue::Number(100.0));
        assert_eq!(sheet.get(2, 2), &CellValue::Number(250.0));
    }

    #[test]
    fn skips_chart_sheets() {
        let stream = biff8_stream(
            Vec::new(),
            vec![
                ("Chart1", 2, Vec::new()),
                ("Data", 0, vec![number_record(0, 0, 7.0)]),
            ],
        );
        let mut workbook = open(compound_file(&[("Workbook", stream)])).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Data"]);
        assert_eq!(workbook.read_sheet(0).unwrap().get(0, 0), &CellValue::Number(7.0));
    }

    #[test]
    fn file_pass_is_password_protected() {
        let stream = biff8_stream(vec![biff8_record(FILE_PASS, &[1, 0, 1, 0])], Vec::new());
        let result = open(compound_file(&[("Workbook", stream)]));
        assert!(matches!(result, Err(WorkbookError::PasswordProtected(name)) if name == "statement.xls"));
    }

    #[test]
    fn missing_workbook_stream() {
        let result = open(compound_file(&[("Summary", vec![0; 16])]));
        assert!(matches!(result, Err(WorkbookError::MissingPart(_))));
    }

    #[test]
    fn formula_results() {
        assert_eq!(read_formula_result(12.5f64.to_bits(), 0, 0).unwrap(), Some(CellValue::Number(12.5)));
        assert_eq!(read_formula_result(0xFFFF_0000_0000_0000, 0, 0).unwrap(), None);
        assert_eq!(read_formula_result(0xFFFF_0000_0001_0001, 0, 0).unwrap(), Some(CellValue::Number(1.0)));
        assert_eq!(read_formula_result(0xFFFF_0000_0007_0002, 0, 0).unwrap(), Some(CellValue::Empty));
        assert!(read_formula_result(0xFFFF_0000_0000_0009, 1, 2).is_err());
    }
}
