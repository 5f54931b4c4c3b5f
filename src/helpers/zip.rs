//! Part lookup inside the ZIP package of an OOXML workbook

use crate::error::WorkbookError;
use crate::helpers::xml::XmlReader;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::ZipArchive;

pub(crate) trait ZipHelper<RS: Read + Seek> {
    /// Opens a part by name, ignoring case and accepting `\` as separator
    fn part(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, WorkbookError>;

    /// Opens a part wrapped in an XML event reader
    fn xml_reader(&'_ mut self, name: &str) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, WorkbookError>;
}

impl<RS: Read + Seek> ZipHelper<RS> for ZipArchive<RS> {
    fn part(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, WorkbookError> {
        let wanted = name.replace('\\', "/");
        let path = self
            .file_names()
            .find(|candidate| wanted.eq_ignore_ascii_case(&candidate.replace('\\', "/")))
            .map(str::to_owned);
        match path.map(|path| self.by_name(&path)).transpose() {
            Ok(part) => Ok(part),
            Err(ZipError::FileNotFound) => Ok(None),
            Err(error) => Err(error)?,
        }
    }

    fn xml_reader(&'_ mut self, name: &str) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, WorkbookError> {
        Ok(self.part(name)?.map(|part| XmlReader::new(BufReader::new(part))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::fixtures::zip_package;
    use std::io::Cursor;

    #[test]
    fn finds_parts_case_insensitively() {
        let package = zip_package(&[("xl/Workbook.xml", "<workbook/>")]);
        let mut archive = ZipArchive::new(Cursor::new(package)).unwrap();

        let mut content = String::new();
        archive.part("XL/workbook.xml").unwrap().unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "<workbook/>");
        assert!(archive.part("xl\\workbook.xml").unwrap().is_some());
        assert!(archive.part("xl/styles.xml").unwrap().is_none());
    }
}
