use crate::error::ExtractError;
use crate::workbook::reference::column_to_index;
use crate::workbook::sheet::Worksheet;

/// Resolves a column reference to a 0-based column index of `sheet`.
///
/// Strategies are tried in order and the first in-range index wins:
/// 1. a letter code (`A`, `AB`, case-insensitive);
/// 2. a 0-based numeric index (`0`, `3`);
/// 3. a header name, matched case-insensitively against the trimmed text of
///    the cells in the first `header_search_rows` rows.
///
/// A letter or numeric reference pointing past the last column falls through
/// to the header search, so a header literally named `Date` still resolves.
pub fn resolve_column(sheet: &Worksheet, reference: &str, header_search_rows: usize) -> Result<usize, ExtractError> {
    let unresolved = || ExtractError::ColumnResolution { reference: reference.to_owned() };
    let wanted = reference.trim();
    if wanted.is_empty() {
        return Err(unresolved());
    }

    let direct = if wanted.bytes().all(|byte| byte.is_ascii_alphabetic()) {
        column_to_index(wanted)
    } else if wanted.bytes().all(|byte| byte.is_ascii_digit()) {
        wanted.parse::<usize>().ok()
    } else {
        None
    };
    if let Some(index) = direct.filter(|index| *index < sheet.col_count()) {
        return Ok(index);
    }

    find_header(sheet, wanted, header_search_rows).ok_or_else(unresolved)
}

fn find_header(sheet: &Worksheet, wanted: &str, header_search_rows: usize) -> Option<usize> {
    let wanted = wanted.to_lowercase();
    (0..sheet.row_count().min(header_search_rows)).find_map(|row| {
        sheet.row(row).position(|cell| cell.to_text().trim().to_lowercase() == wanted)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::cell::CellValue;
    use crate::workbook::DateSystem;

    fn sheet(rows: Vec<Vec<CellValue>>) -> Worksheet {
        Worksheet::from_rows("Sheet1", DateSystem::V1900, rows)
    }

    fn header_sheet() -> Worksheet {
        sheet(vec![
            vec!["Bank of Somewhere".into()],
            vec![
                "Txn Date".into(),
                " Narration ".into(),
                "Withdrawal Amt.".into(),
                "Deposit Amt.".into(),
                "Date".into(),
            ],
        ])
    }

    #[test]
    fn letter_references() {
        let sheet = header_sheet();
        assert_eq!(resolve_column(&sheet, "A", 10).unwrap(), 0);
        assert_eq!(resolve_column(&sheet, "d", 10).unwrap(), 3);
    }

    #[test]
    fn numeric_references() {
        let sheet = header_sheet();
        assert_eq!(resolve_column(&sheet, "0", 10).unwrap(), 0);
        assert_eq!(resolve_column(&sheet, "4", 10).unwrap(), 4);
    }

    #[test]
    fn header_references() {
        let sheet = header_sheet();
        assert_eq!(resolve_column(&sheet, "narration", 10).unwrap(), 1);
        assert_eq!(resolve_column(&sheet, " Withdrawal Amt. ", 10).unwrap(), 2);
        // All letters but far beyond the last column, so found as a header
        assert_eq!(resolve_column(&sheet, "Date", 10).unwrap(), 4);
    }

    #[test]
    fn header_search_is_limited() {
        let sheet = header_sheet();
        assert!(resolve_column(&sheet, "Narration", 1).is_err());
        assert_eq!(resolve_column(&sheet, "Narration", 2).unwrap(), 1);
    }

    #[test]
    fn unresolvable_references() {
        let sheet = header_sheet();
        for reference in ["Balance", "", "  ", "99", "ZZ"] {
            match resolve_column(&sheet, reference, 10) {
                Err(ExtractError::ColumnResolution { reference: failed }) => assert_eq!(failed, reference),
                other => panic!("'{reference}' resolved to {other:?}"),
            }
        }
    }

    #[test]
    fn numeric_header_cells_match_their_text() {
        let sheet = sheet(vec![vec!["Date".into(), CellValue::Number(2024.0)]]);
        assert_eq!(resolve_column(&sheet, "2024", 10).unwrap(), 1);
    }
}
