use crate::workbook::cell::CellValue;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Outcome of reading a withdrawal or deposit cell
#[derive(Clone, Debug, PartialEq)]
pub enum AmountParse {
    /// A readable amount, already made non-negative
    Value(Decimal),
    /// Empty cell or blank text
    Blank,
    /// Text that is not a number once separators are removed
    Unreadable(String),
}

impl AmountParse {
    /// The amount to record: the value itself, or zero when the cell was
    /// blank or unreadable
    pub fn amount(&self) -> Decimal {
        match self {
            AmountParse::Value(value) => *value,
            AmountParse::Blank | AmountParse::Unreadable(_) => zero(),
        }
    }
}

/// Zero with two decimal places, so it renders as `0.00`
fn zero() -> Decimal {
    Decimal::new(0, 2)
}

/// Parses an amount cell.
///
/// Numbers go through their shortest decimal representation so `1234.56`
/// stays exactly `1234.56`, falling back to the exact binary value when that
/// text has more digits than a `Decimal` holds. Text has commas and
/// whitespace removed first and may use an exponent (`1.5E3`).
/// Negative amounts are reported by magnitude. Magnitudes beyond
/// `Decimal::MAX` are unreadable.
pub fn parse_amount(value: &CellValue) -> AmountParse {
    let amount = match value {
        CellValue::Empty => return AmountParse::Blank,
        CellValue::Number(number) => Decimal::from_str(&number.to_string())
            .ok()
            .or_else(|| Decimal::from_f64_retain(*number)),
        CellValue::Text(text) => {
            let text: String = text.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
            if text.is_empty() {
                return AmountParse::Blank;
            }
            Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)).ok()
        }
    };
    match amount {
        Some(amount) => AmountParse::Value(magnitude(amount)),
        None => AmountParse::Unreadable(value.to_text()),
    }
}

/// Absolute value; `-0` and `0` both become `0.00`
fn magnitude(amount: Decimal) -> Decimal {
    if amount.is_zero() {
        zero()
    } else {
        amount.abs()
    }
}
