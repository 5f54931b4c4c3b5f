//! Conversions between A1-style cell references and 0-based indexes

/// Converts a letter-only column code to its 0-based index (A=0, Z=25, AA=26).
///
/// Returns `None` for empty input, non-letters, or codes too long to fit in `usize`.
pub fn column_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() || !letters.bytes().all(|byte| byte.is_ascii_alphabetic()) {
        return None;
    }
    let mut value = 0usize;
    for byte in letters.bytes() {
        let digit = (byte.to_ascii_uppercase() - b'A') as usize + 1;
        value = value.checked_mul(26)?.checked_add(digit)?;
    }
    Some(value - 1)
}

/// Converts a 0-based column index back to its letter code.
pub fn index_to_column(index: usize) -> String {
    let mut letters = Vec::new();
    let mut remaining = index as u128 + 1;
    while remaining > 0 {
        remaining -= 1;
        letters.push(b'A' + (remaining % 26) as u8);
        remaining /= 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Parses a cell reference such as `B3` into `(row, col)`, both 0-based.
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    let col = column_to_index(letters)?;
    let row = digits.parse::<usize>().ok()?.checked_sub(1)?;
    Some((row, col))
}

/// Formats a 0-based `(row, col)` pair as a cell reference such as `B3`.
pub(crate) fn index_to_reference(row: usize, col: usize) -> String {
    format!("{}{}", index_to_column(col), row + 1)
}
