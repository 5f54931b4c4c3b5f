use crate::error::WorkbookError;
use crate::helpers::reader::SourceReader;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::workbook::cell::CellValue;
use crate::workbook::reference::reference_to_index;
use crate::workbook::sheet::Worksheet;
use crate::workbook::DateSystem;
use crate::workbook::Workbook;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufReader;
use zip::read::ZipFile;
use zip::ZipArchive;

// XML tag names of the OOXML workbook parts
const TAG_RELATIONSHIP: &[u8] = b"Relationship";
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");   // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");       // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t");                  // Text content within strings
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr");
const TAG_SHEET: QName = QName(b"sheet");
const TAG_ROW: QName = QName(b"row");
const TAG_CELL: QName = QName(b"c");
const TAG_INLINE_STRING: QName = QName(b"is");
const TAG_VALUE: QName = QName(b"v");

const WORKBOOK_PART: &str = "xl/workbook.xml";
const RELATIONSHIPS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// How the text of a `<c>` element is to be read, from its `t` attribute
#[derive(Copy, Clone, Debug, Default, PartialEq)]
enum CellKind {
    #[default]
    Number,
    SharedString,
    InlineString,
    Boolean,
    IsoDateTime,
    Error,
}

impl CellKind {
    fn from_type_attribute(kind: Option<Cow<'_, str>>) -> Self {
        match kind.as_deref() {
            Some("s") => CellKind::SharedString,
            Some("inlineStr") | Some("str") => CellKind::InlineString,
            Some("b") => CellKind::Boolean,
            Some("d") => CellKind::IsoDateTime,
            Some("e") => CellKind::Error,
            _ => CellKind::Number,
        }
    }
}

/// An Office Open XML workbook (`.xlsx`, `.xlsm`)
pub(crate) struct XlsxWorkbook {
    name: String,
    zip: ZipArchive<SourceReader>,
    date_system: DateSystem,
    /// Worksheets as (name, part path) pairs in workbook order
    sheets: Vec<(String, String)>,
}

impl XlsxWorkbook {
    pub(crate) fn open(name: &str, reader: SourceReader) -> Result<XlsxWorkbook, WorkbookError> {
        let mut zip = ZipArchive::new(reader)?;
        let (sheets, is_1904) = load_workbook(&mut zip)?;
        Ok(XlsxWorkbook {
            name: name.to_owned(),
            zip,
            date_system: DateSystem::from_1904_flag(is_1904),
            sheets,
        })
    }
}

impl Workbook for XlsxWorkbook {
    fn name(&self) -> &str {
        &self.name
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.to_owned()).collect()
    }

    fn read_sheet(&mut self, index: usize) -> Result<Worksheet, WorkbookError> {
        let (sheet_name, part) = self.sheets.get(index).cloned()
            .ok_or_else(|| WorkbookError::NoWorksheet(self.name.to_owned()))?;
        let shared_strings = load_shared_strings(&mut self.zip)?;
        let mut sheet = Worksheet::new(&sheet_name, self.date_system);

        let mut reader = self.zip.xml_reader(&part)?
            .ok_or_else(|| WorkbookError::MissingPart(part.to_owned()))?;
        let mut row_count = 0usize;
        let mut col_count = 0usize;
        let mut row = 0usize;
        let mut col = 0usize;
        let mut kind = CellKind::default();
        let mut value = String::new();
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_ROW => {
                if let Some(number) = event.get_attribute_value("r")? {
                    row_count = number.trim().parse::<usize>()?.saturating_sub(1);
                }
                col_count = 0;
            }
            Event::End(event) if event.name() == TAG_ROW => {
                row_count += 1;
            }
            Event::Start(event) if event.name() == TAG_CELL => {
                (row, col) = event.get_attribute_value("r")?
                    .and_then(|reference| reference_to_index(&reference))
                    .unwrap_or((row_count, col_count));
                col_count = col + 1;
                kind = CellKind::from_type_attribute(event.get_attribute_value("t")?);
                value.clear();
            }
            Event::Start(event) if event.name() == TAG_INLINE_STRING => {
                value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
            }
            Event::Start(event) if event.name() == TAG_VALUE => {
                value = read_string_value(&mut reader, TAG_VALUE, true)?;
            }
            Event::End(event) if event.name() == TAG_CELL => {
                if !value.is_empty() {
                    sheet.push(row, col, to_cell_value(kind, &value, &shared_strings)?);
                    value.clear();
                }
            }
        });
        Ok(sheet)
    }
}

/// Converts the raw text of a cell according to its declared kind
fn to_cell_value(kind: CellKind, value: &str, shared_strings: &[String]) -> Result<CellValue, WorkbookError> {
    Ok(match kind {
        CellKind::SharedString => {
            let index = value.trim().parse::<usize>()?;
            shared_strings.get(index)
                .map(|text| CellValue::Text(text.to_owned()))
                .unwrap_or(CellValue::Empty)
        }
        CellKind::InlineString | CellKind::IsoDateTime => CellValue::Text(value.to_owned()),
        CellKind::Boolean => match value.trim() {
            "1" | "true" => CellValue::Number(1.0),
            _ => CellValue::Number(0.0),
        },
        CellKind::Error => CellValue::Empty,
        CellKind::Number => value.trim().parse::<f64>()
            .map(CellValue::Number)
            .unwrap_or_else(|_| CellValue::Text(value.to_owned())),
    })
}

/// Reads the worksheet list (name and part path) and the `date1904` flag
fn load_workbook(zip: &mut ZipArchive<SourceReader>) -> Result<(Vec<(String, String)>, bool), WorkbookError> {
    let relationships = load_relationships(zip, RELATIONSHIPS_PART)?;
    let mut reader = zip.xml_reader(WORKBOOK_PART)?
        .ok_or_else(|| WorkbookError::MissingPart(WORKBOOK_PART.to_owned()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let name = event.get_attribute_value("name")?;
            let id = event.get_local_attribute_value("id")?;
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(&id.to_string()) {
                    sheets.push((name.to_string(), path.to_owned()));
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event.get_attribute_value("date1904")?
                .map(|value| value.eq("1") || value.eq("true"))
                .unwrap_or(false);
        }
    });
    Ok((sheets, is_1904))
}

/// Maps relationship ids to worksheet part paths
fn load_relationships(zip: &mut ZipArchive<SourceReader>, path: &str) -> Result<HashMap<String, String>, WorkbookError> {
    let mut reader = zip.xml_reader(path)?
        .ok_or_else(|| WorkbookError::MissingPart(path.to_owned()))?;
    let mut relationships: HashMap<String, String> = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            // Only worksheet relationships; chartsheets and dialogs hold no cells
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(&target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Resolves a relationship target against the `xl/` folder
fn to_zip_path(path: &str) -> String {
    if let Some(absolute) = path.strip_prefix('/') {
        absolute.to_owned()
    } else if path.starts_with("xl/") {
        path.to_owned()
    } else {
        format!("xl/{path}")
    }
}

/// Loads the whole shared string table; an absent part means no shared strings
fn load_shared_strings(zip: &mut ZipArchive<SourceReader>) -> Result<Vec<String>, WorkbookError> {
    let mut shared_strings = Vec::<String>::new();
    let mut reader = match zip.xml_reader(SHARED_STRINGS_PART)? {
        Some(reader) => reader,
        None => return Ok(shared_strings),
    };
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
            shared_strings.push(read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?);
        }
    });
    Ok(shared_strings)
}

/// Collects the character data up to `end_tag`, skipping phonetic runs.
/// `is_text_content` is set for `<v>`, whose text is not wrapped in `<t>`.
fn read_string_value(
    reader: &mut XmlReader<BufReader<ZipFile<'_, SourceReader>>>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, WorkbookError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_bytes_text(&event)?,
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}
