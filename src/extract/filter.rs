use crate::config::ExtractorConfig;
use crate::workbook::sheet::Worksheet;

/// Classifies rows that carry no transaction: separator lines drawn with
/// punctuation and footer/summary lines recognised by keyword.
#[derive(Clone, Debug)]
pub struct RowFilter {
    separator_chars: Vec<char>,
    footer_keywords: Vec<String>,
}

impl RowFilter {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            separator_chars: config.separator_chars.chars().collect(),
            footer_keywords: config.footer_keywords.iter().map(|keyword| keyword.to_lowercase()).collect(),
        }
    }

    /// True when every non-empty cell of `row`, across all columns of the
    /// sheet, is made only of separator characters. A row without any
    /// non-empty cell is a separator too.
    pub fn is_separator(&self, sheet: &Worksheet, row: usize) -> bool {
        sheet.row(row).all(|cell| {
            cell.is_blank() || cell.to_text().trim().chars().all(|c| self.separator_chars.contains(&c))
        })
    }

    /// Returns the first footer keyword contained in the narration, compared
    /// case-insensitively.
    pub fn footer_keyword(&self, narration: &str) -> Option<&str> {
        let narration = narration.to_lowercase();
        self.footer_keywords
            .iter()
            .find(|keyword| !keyword.is_empty() && narration.contains(keyword.as_str()))
            .map(String::as_str)
    }
}

impl Default for RowFilter {
    fn default() -> Self {
        Self::new(&ExtractorConfig::default())
    }
}
