//! Streaming XML helpers for the OOXML workbook parts

use crate::error::WorkbookError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::BufRead;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Unknown XML entity '&{0};'")]
    UnknownEntity(String),

    #[error("Invalid character reference '&{0};'")]
    InvalidCharacterReference(String),
}

/// Event pull reader with a reusable buffer
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    pub(crate) fn new(source: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(source);
        let config = reader.config_mut();
        config.check_comments = false;
        config.check_end_names = false;
        config.expand_empty_elements = true;
        config.trim_text(false);
        XmlReader {
            reader,
            buffer: Vec::with_capacity(1024),
        }
    }

    /// Returns the next event, or `None` once the document ends
    pub(crate) fn next(&'_ mut self) -> Result<Option<Event<'_>>, WorkbookError> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer)? {
            Event::Eof => Ok(None),
            event => Ok(Some(event)),
        }
    }
}

/// Attribute lookup on start tags
pub(crate) trait XmlNodeHelper<'a> {
    /// Unescaped value of the attribute whose qualified name is `name`
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, WorkbookError>;

    /// Unescaped value of the first attribute whose local name (prefix stripped) is `name`
    fn get_local_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, WorkbookError>;
}

impl<'a> XmlNodeHelper<'a> for BytesStart<'a> {
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, WorkbookError> {
        match self.try_get_attribute(name)? {
            Some(attribute) => Ok(Some(attribute.unescape_value()?)),
            None => Ok(None),
        }
    }

    fn get_local_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, WorkbookError> {
        for attribute in self.attributes() {
            let attribute = attribute?;
            if attribute.key.local_name().as_ref() == name.as_bytes() {
                return Ok(Some(attribute.unescape_value()?));
            }
        }
        Ok(None)
    }
}

/// Accumulates character data, resolving entity and character references
pub(crate) trait XmlTextContextHelper {
    fn push_bytes_text(&mut self, text: &BytesText) -> Result<(), WorkbookError>;

    fn push_bytes_ref(&mut self, reference: &BytesRef) -> Result<(), WorkbookError>;
}

impl XmlTextContextHelper for String {
    fn push_bytes_text(&mut self, text: &BytesText) -> Result<(), WorkbookError> {
        self.push_str(&text.xml_content()?);
        Ok(())
    }

    fn push_bytes_ref(&mut self, reference: &BytesRef) -> Result<(), WorkbookError> {
        let raw = reference.xml_content()?;
        if let Some(number) = raw.strip_prefix('#') {
            let code = match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16),
                None => number.parse::<u32>(),
            }
            .map_err(|_| XmlError::InvalidCharacterReference(raw.to_string()))?;
            let character = char::from_u32(code)
                .ok_or_else(|| XmlError::InvalidCharacterReference(raw.to_string()))?;
            self.push(character);
        } else if let Some(entity) = resolve_xml_entity(&raw) {
            self.push_str(entity);
        } else {
            Err(XmlError::UnknownEntity(raw.to_string()))?;
        }
        Ok(())
    }
}

#[macro_export]
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(event) = $reader.next()? {
            match event {
                $($arms)*
                _ => (),
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::name::QName;

    fn collect_text(xml: &str) -> Result<String, WorkbookError> {
        let mut reader = XmlReader::new(xml.as_bytes());
        let mut text = String::new();
        match_xml_events!(reader => {
            Event::Text(event) => text.push_bytes_text(&event)?,
            Event::GeneralRef(event) => text.push_bytes_ref(&event)?,
        });
        Ok(text)
    }

    #[test]
    fn resolves_entities_and_character_references() {
        assert_eq!(collect_text("<t>Fish &amp; Chips &#8377;&#x41;</t>").unwrap(), "Fish & Chips \u{20B9}A");
    }

    #[test]
    fn unknown_entity_is_an_error() {
        assert!(collect_text("<t>&bogus;</t>").is_err());
    }

    #[test]
    fn reads_plain_and_prefixed_attributes() -> Result<(), WorkbookError> {
        let mut reader = XmlReader::new(r#"<sheet name="Sheet1" r:id="rId1"/>"#.as_bytes());
        let mut seen = None;
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == QName(b"sheet") => {
                let name = event.get_attribute_value("name")?.map(|value| value.to_string());
                let id = event.get_local_attribute_value("id")?.map(|value| value.to_string());
                seen = name.zip(id);
            }
        });
        assert_eq!(seen, Some(("Sheet1".to_owned(), "rId1".to_owned())));
        Ok(())
    }
}
