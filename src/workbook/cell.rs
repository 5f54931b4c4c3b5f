use std::fmt::Display;

/// Content of a single worksheet cell.
///
/// Workbook readers fold every stored cell kind into one of these three
/// variants: booleans become `0`/`1` numbers, error cells become `Empty`.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl CellValue {
    /// Returns true for `Empty` and for text that is blank after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// Textual form of the cell; numbers use their shortest representation
    /// (`2024.0` renders as `2024`).
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Number(number) => write!(f, "{number}"),
            CellValue::Text(text) => f.write_str(text),
            CellValue::Empty => Ok(()),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_owned())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}
