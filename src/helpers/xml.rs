//! Thin wrapper over `quick_xml` tuned for the parts of an `.xlsx` package.

use crate::error::ReadError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::BufRead;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Parse entity '{0}' failed")]
    ParseEntityError(String),
}

/// Streaming XML reader that owns its event buffer.
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    pub(crate) fn new(buf_reader: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(buf_reader);
        let config = reader.config_mut();
        config.check_comments = false;
        config.check_end_names = false;
        config.expand_empty_elements = true;
        config.trim_text(false);

        let buffer = Vec::with_capacity(1024);
        XmlReader { reader, buffer }
    }

    /// Reads the next event; `None` at end of document.
    pub(crate) fn next(&'_ mut self) -> Result<Option<Event<'_>>, ReadError> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer) {
            Ok(Event::Eof) => Ok(None),
            Ok(event) => Ok(Some(event)),
            Err(error) => Err(ReadError::XmlError(error)),
        }
    }
}

pub(crate) trait XmlAttributeHelper<'a> {
    /// Gets the unescaped attribute value
    fn get_value(&self) -> Result<Cow<'a, str>, ReadError>;
}

impl<'a> XmlAttributeHelper<'a> for Attribute<'a> {
    fn get_value(&self) -> Result<Cow<'a, str>, ReadError> {
        Ok(self.unescape_value()?)
    }
}

pub(crate) trait XmlNodeHelper<'a> {
    /// Gets an attribute value by its qualified name
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, ReadError>;
}

impl<'a> XmlNodeHelper<'a> for BytesStart<'a> {
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, ReadError> {
        self.try_get_attribute(name)?
            .map(|attribute| attribute.get_value())
            .transpose()
    }
}

pub(crate) trait XmlTextContextHelper {
    /// Appends an entity or character reference (`&amp;`, `&#1054;`, `&#x41E;`)
    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), ReadError>;
}

impl XmlTextContextHelper for String {
    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), ReadError> {
        let raw = bytes.xml_content()?;
        if let Some(number) = raw.strip_prefix('#') {
            let code = if let Some(hex) = number.strip_prefix('x') {
                u32::from_str_radix(hex, 16)?
            } else {
                number.parse::<u32>()?
            };
            if let Some(character) = char::from_u32(code) {
                self.push(character);
            }
        } else if let Some(entity) = resolve_xml_entity(&raw) {
            self.push_str(entity);
        } else {
            Err(XmlError::ParseEntityError(raw.to_string()))?;
        }

        Ok(())
    }
}

#[macro_export]
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(result) = $reader.next()? {
            match result {
                Event::Eof => break,
                $($arms)*
                _ => (),
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(xml: &str) -> String {
        let mut reader = XmlReader::new(xml.as_bytes());
        let mut text = String::new();
        while let Some(event) = reader.next().unwrap() {
            match event {
                Event::Text(event) => text.push_str(&event.xml_content().unwrap()),
                Event::GeneralRef(event) => text.push_bytes_ref(&event).unwrap(),
                _ => (),
            }
        }
        text
    }

    #[test]
    fn resolves_entities_and_character_references() {
        assert_eq!(text_of("<t>A&amp;B</t>"), "A&B");
        assert_eq!(text_of("<t>&#1054;&#x421;</t>"), "ОС");
    }

    #[test]
    fn reads_attributes() {
        let mut reader = XmlReader::new(r#"<c r="B2" t="s"/>"#.as_bytes());
        match reader.next().unwrap() {
            Some(Event::Start(event)) => {
                assert_eq!(event.get_attribute_value("r").unwrap().as_deref(), Some("B2"));
                assert_eq!(event.get_attribute_value("s").unwrap(), None);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
