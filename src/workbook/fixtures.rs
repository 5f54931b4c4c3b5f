//! Builders for small in-memory workbooks used by the unit tests

use crate::helpers::cfb::SIGNATURE;
use crate::workbook::cell::CellValue;
use std::io::Cursor;
use std::io::Write;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

const SECTOR_SIZE: usize = 512;
const MINI_STREAM_CUTOFF: usize = 4096;
const FREE_SECTOR: u32 = 0xFFFF_FFFF;
const END_OF_CHAIN: u32 = 0xFFFF_FFFE;
const FAT_SECTOR: u32 = 0xFFFF_FFFD;

/// Writes the given `(path, content)` parts into a ZIP archive
pub(crate) fn zip_package(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (path, content) in parts {
        writer.start_file(*path, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A one-sheet `.xlsx` package around the given worksheet XML
pub(crate) fn xlsx_package(is_1904: bool, sheet_xml: &str, shared_strings: Option<&str>) -> Vec<u8> {
    let workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<workbookPr date1904="{}"/>
<sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#,
        if is_1904 { "1" } else { "0" }
    );
    let relationships = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>
</Relationships>"#;
    let mut parts = vec![
        ("xl/workbook.xml", workbook.as_str()),
        ("xl/_rels/workbook.xml.rels", relationships),
        ("xl/worksheets/sheet1.xml", sheet_xml),
    ];
    if let Some(shared_strings) = shared_strings {
        parts.push(("xl/sharedStrings.xml", shared_strings));
    }
    zip_package(&parts)
}

/// A one-sheet `.xlsx` workbook; numeric-looking values become number cells,
/// other non-empty values become shared strings
pub(crate) fn xlsx_workbook(is_1904: bool, rows: &[&[&str]]) -> Vec<u8> {
    let mut shared: Vec<&str> = Vec::new();
    let mut sheet_xml = String::from("<worksheet><sheetData>");
    for (row, values) in rows.iter().enumerate() {
        sheet_xml.push_str(&format!(r#"<row r="{}">"#, row + 1));
        for (col, value) in values.iter().enumerate() {
            let reference = crate::workbook::reference::index_to_reference(row, col);
            if value.is_empty() {
                continue;
            } else if value.parse::<f64>().is_ok() {
                sheet_xml.push_str(&format!(r#"<c r="{reference}"><v>{value}</v></c>"#));
            } else {
                sheet_xml.push_str(&format!(r#"<c r="{reference}" t="s"><v>{}</v></c>"#, shared.len()));
                shared.push(*value);
            }
        }
        sheet_xml.push_str("</row>");
    }
    sheet_xml.push_str("</sheetData></worksheet>");

    let items: String = shared.iter().map(|text| format!("<si><t>{}</t></si>", escape(text))).collect();
    let shared_xml = format!(r#"<sst count="{0}" uniqueCount="{0}">{1}</sst>"#, shared.len(), items);
    xlsx_package(is_1904, &sheet_xml, Some(&shared_xml))
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Assembles a version 3 compound file holding the given streams.
///
/// Layout: sector 0 is the FAT, then the directory, then each stream in
/// regular sectors (small streams are padded up to the mini stream cutoff).
pub(crate) fn compound_file(streams: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let directory_sectors = (streams.len() + 1).div_ceil(SECTOR_SIZE / 128);
    let mut fat = vec![FAT_SECTOR];
    for index in 0..directory_sectors {
        let id = fat.len() as u32;
        fat.push(if index + 1 == directory_sectors { END_OF_CHAIN } else { id + 1 });
    }

    let mut entries = vec![directory_entry("Root Entry", 5, END_OF_CHAIN, 0)];
    let mut body = Vec::new();
    for (name, data) in streams {
        let size = data.len().max(MINI_STREAM_CUTOFF);
        let mut content = data.clone();
        content.resize(size.div_ceil(SECTOR_SIZE) * SECTOR_SIZE, 0);
        let start = fat.len() as u32;
        let count = content.len() / SECTOR_SIZE;
        for index in 0..count {
            fat.push(if index + 1 == count { END_OF_CHAIN } else { start + index as u32 + 1 });
        }
        entries.push(directory_entry(name, 2, start, size));
        body.extend(content);
    }
    assert!(fat.len() <= SECTOR_SIZE / 4, "fixture streams too large for a single FAT sector");
    fat.resize(SECTOR_SIZE / 4, FREE_SECTOR);
    entries.resize(directory_sectors * SECTOR_SIZE / 128, [0u8; 128]);

    let mut header = vec![0u8; SECTOR_SIZE];
    header[..8].copy_from_slice(&SIGNATURE);
    header[24..26].copy_from_slice(&0x003Eu16.to_le_bytes());
    header[26..28].copy_from_slice(&3u16.to_le_bytes());
    header[28..30].copy_from_slice(&0xFFFEu16.to_le_bytes());
    header[30..32].copy_from_slice(&9u16.to_le_bytes());
    header[32..34].copy_from_slice(&6u16.to_le_bytes());
    header[44..48].copy_from_slice(&1u32.to_le_bytes());
    header[48..52].copy_from_slice(&1u32.to_le_bytes());
    header[56..60].copy_from_slice(&(MINI_STREAM_CUTOFF as u32).to_le_bytes());
    header[60..64].copy_from_slice(&END_OF_CHAIN.to_le_bytes());
    header[68..72].copy_from_slice(&END_OF_CHAIN.to_le_bytes());
    header[76..80].copy_from_slice(&0u32.to_le_bytes());
    for slot in header[80..].chunks_exact_mut(4) {
        slot.copy_from_slice(&FREE_SECTOR.to_le_bytes());
    }

    let mut file = header;
    file.extend(fat.iter().flat_map(|id| id.to_le_bytes()));
    file.extend(entries.iter().flatten());
    file.extend(body);
    file
}

fn directory_entry(name: &str, kind: u8, start: u32, size: usize) -> [u8; 128] {
    let mut entry = [0u8; 128];
    let units: Vec<u16> = name.encode_utf16().chain(std::iter::once(0)).collect();
    for (index, unit) in units.iter().enumerate() {
        entry[index * 2..index * 2 + 2].copy_from_slice(&unit.to_le_bytes());
    }
    entry[64..66].copy_from_slice(&((units.len() * 2) as u16).to_le_bytes());
    entry[66] = kind;
    entry[67] = 1;
    entry[68..72].copy_from_slice(&FREE_SECTOR.to_le_bytes());
    entry[72..76].copy_from_slice(&FREE_SECTOR.to_le_bytes());
    entry[76..80].copy_from_slice(&FREE_SECTOR.to_le_bytes());
    entry[116..120].copy_from_slice(&start.to_le_bytes());
    entry[120..128].copy_from_slice(&(size as u64).to_le_bytes());
    entry
}

/// A raw BIFF8 record
pub(crate) fn biff8_record(kind: u16, payload: &[u8]) -> Vec<u8> {
    let mut record = Vec::with_capacity(payload.len() + 4);
    record.extend_from_slice(&kind.to_le_bytes());
    record.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    record.extend_from_slice(payload);
    record
}

fn bof_record(substream: u16) -> Vec<u8> {
    let mut payload = vec![0u8; 16];
    payload[..2].copy_from_slice(&0x0600u16.to_le_bytes());
    payload[2..4].copy_from_slice(&substream.to_le_bytes());
    biff8_record(0x0809, &payload)
}

fn cell_header(row: u16, col: u16) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&row.to_le_bytes());
    payload.extend_from_slice(&col.to_le_bytes());
    payload.extend_from_slice(&0u16.to_le_bytes());
    payload
}

/// Uncompressed (16-bit) character data preceded by the option byte
fn wide_chars(text: &str) -> Vec<u8> {
    let mut bytes = vec![0x01];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}

pub(crate) fn number_record(row: u16, col: u16, value: f64) -> Vec<u8> {
    let mut payload = cell_header(row, col);
    payload.extend_from_slice(&value.to_le_bytes());
    biff8_record(0x0203, &payload)
}

pub(crate) fn label_record(row: u16, col: u16, text: &str) -> Vec<u8> {
    let mut payload = cell_header(row, col);
    payload.extend_from_slice(&(text.encode_utf16().count() as u16).to_le_bytes());
    payload.extend(wide_chars(text));
    biff8_record(0x0204, &payload)
}

pub(crate) fn label_sst_record(row: u16, col: u16, index: u32) -> Vec<u8> {
    let mut payload = cell_header(row, col);
    payload.extend_from_slice(&index.to_le_bytes());
    biff8_record(0x00FD, &payload)
}

pub(crate) fn sst_record(strings: &[&str]) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&(strings.len() as u32).to_le_bytes());
    payload.extend_from_slice(&(strings.len() as u32).to_le_bytes());
    for text in strings {
        payload.extend_from_slice(&(text.encode_utf16().count() as u16).to_le_bytes());
        payload.extend(wide_chars(text));
    }
    biff8_record(0x00FC, &payload)
}

/// A workbook stream: the globals substream (with the given extra records and
/// one BOUNDSHEET8 per sheet) followed by one substream per `(name, type, cells)`
pub(crate) fn biff8_stream(globals: Vec<Vec<u8>>, sheets: Vec<(&str, u8, Vec<Vec<u8>>)>) -> Vec<u8> {
    let bound_sheet_size = |name: &str| 4 + 6 + 2 + name.len();
    let globals_size = bof_record(0x0005).len()
        + globals.iter().map(Vec::len).sum::<usize>()
        + sheets.iter().map(|(name, _, _)| bound_sheet_size(name)).sum::<usize>()
        + 4;

    let mut substreams = Vec::new();
    let mut bound_sheets = Vec::new();
    for (name, kind, cells) in sheets {
        let mut payload = ((globals_size + substreams.len()) as u32).to_le_bytes().to_vec();
        payload.push(0); // visible
        payload.push(kind);
        payload.push(name.len() as u8);
        payload.push(0); // compressed characters
        payload.extend_from_slice(name.as_bytes());
        bound_sheets.push(biff8_record(0x0085, &payload));

        substreams.extend(bof_record(0x0010));
        substreams.extend(cells.into_iter().flatten());
        substreams.extend(biff8_record(0x000A, &[]));
    }

    let mut stream = bof_record(0x0005);
    stream.extend(globals.into_iter().flatten());
    stream.extend(bound_sheets.into_iter().flatten());
    stream.extend(biff8_record(0x000A, &[]));
    stream.extend(substreams);
    stream
}

/// A one-sheet `.xls` workbook with number and label cells
pub(crate) fn xls_workbook(is_1904: bool, cells: &[(u16, u16, CellValue)]) -> Vec<u8> {
    let globals = if is_1904 { vec![biff8_record(0x0022, &1u16.to_le_bytes())] } else { Vec::new() };
    let records = cells
        .iter()
        .filter_map(|(row, col, value)| match value {
            CellValue::Number(number) => Some(number_record(*row, *col, *number)),
            CellValue::Text(text) => Some(label_record(*row, *col, text)),
            CellValue::Empty => None,
        })
        .collect();
    compound_file(&[("Workbook", biff8_stream(globals, vec![("Sheet1", 0, records)]))])
}
