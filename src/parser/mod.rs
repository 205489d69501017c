//! XML tokenizer adapter for GExport configuration dumps.
//!
//! Wraps a `quick_xml` reader and turns the raw markup stream into the small
//! closed set of events the conversion engine dispatches on. No schema or
//! column logic here; this module only knows the three GExport tags
//! (`class`, `object`, `parameter`) and how to read their attributes.

use quick_xml::encoding::Decoder;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{XmlError, XmlResult};

/// Attributes of an `object` element.
///
/// Only the first object at depth 1 carries the network-element identity;
/// deeper objects usually have none of these set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectAttrs {
    pub vendor: Option<String>,
    pub technique: Option<String>,
    pub version: Option<String>,
}

/// One event of the GExport element stream.
///
/// Self-closing elements are expanded so that every `ClassStart` and
/// `ObjectStart` is matched by its end event, exactly as a non-empty element
/// would be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CmEvent {
    /// `<class name="...">`. The name is absent if the attribute is missing.
    ClassStart { name: Option<String> },
    /// `</class>`
    ClassEnd,
    /// `<object vendor="..." technique="..." version="...">`
    ObjectStart(ObjectAttrs),
    /// `</object>`
    ObjectEnd,
    /// `<parameter name="..." value="..."/>`. Elements missing either
    /// attribute are dropped by the adapter.
    Parameter { name: String, value: String },
    /// An XML comment.
    Comment(String),
    /// Non-whitespace character data.
    Text(String),
}

/// Streaming event source over one GExport XML document.
///
/// The source is single-use; the two-pass orchestrator opens the same file
/// once per pass.
pub struct XmlEventSource<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    /// End event synthesized for a self-closing `class`/`object` element,
    /// delivered on the next call.
    pending: Option<CmEvent>,
}

impl XmlEventSource<BufReader<File>> {
    /// Open an event source over a file on disk.
    pub fn open(path: &Path) -> XmlResult<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> XmlEventSource<R> {
    /// Build an event source over any buffered reader.
    pub fn from_reader(input: R) -> Self {
        let mut reader = Reader::from_reader(input);
        reader.config_mut().trim_text(true);
        Self {
            reader,
            buf: Vec::new(),
            pending: None,
        }
    }

    /// Pull the next event, or `None` at end of document.
    ///
    /// Tags other than `class`/`object`/`parameter` are skipped.
    pub fn next_event(&mut self) -> XmlResult<Option<CmEvent>> {
        if let Some(ev) = self.pending.take() {
            return Ok(Some(ev));
        }

        let decoder = self.reader.decoder();
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"class" => return Ok(Some(Self::class_start(decoder, &e)?)),
                    b"object" => return Ok(Some(Self::object_start(decoder, &e)?)),
                    b"parameter" => {
                        if let Some(ev) = Self::parameter(decoder, &e)? {
                            return Ok(Some(ev));
                        }
                    }
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                    b"class" => {
                        let start = Self::class_start(decoder, &e)?;
                        self.pending = Some(CmEvent::ClassEnd);
                        return Ok(Some(start));
                    }
                    b"object" => {
                        let start = Self::object_start(decoder, &e)?;
                        self.pending = Some(CmEvent::ObjectEnd);
                        return Ok(Some(start));
                    }
                    b"parameter" => {
                        if let Some(ev) = Self::parameter(decoder, &e)? {
                            return Ok(Some(ev));
                        }
                    }
                    _ => {}
                },
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"class" => return Ok(Some(CmEvent::ClassEnd)),
                    b"object" => return Ok(Some(CmEvent::ObjectEnd)),
                    _ => {}
                },
                Ok(Event::Text(e)) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    if !text.trim().is_empty() {
                        return Ok(Some(CmEvent::Text(text)));
                    }
                }
                Ok(Event::Comment(e)) => {
                    return Ok(Some(CmEvent::Comment(
                        String::from_utf8_lossy(&e).into_owned(),
                    )));
                }
                Ok(Event::Eof) => return Ok(None),
                Ok(_) => {}
                Err(e) => return Err(XmlError::ParseError(e)),
            }
        }
    }

    fn class_start(decoder: Decoder, e: &BytesStart) -> XmlResult<CmEvent> {
        let mut name = None;
        for attr in e.attributes() {
            let attr = attr?;
            if attr.key.as_ref() == b"name" {
                name = Some(Self::attr_value(decoder, &attr)?);
            }
        }
        Ok(CmEvent::ClassStart { name })
    }

    fn object_start(decoder: Decoder, e: &BytesStart) -> XmlResult<CmEvent> {
        let mut attrs = ObjectAttrs::default();
        for attr in e.attributes() {
            let attr = attr?;
            match attr.key.as_ref() {
                b"vendor" => attrs.vendor = Some(Self::attr_value(decoder, &attr)?),
                b"technique" => attrs.technique = Some(Self::attr_value(decoder, &attr)?),
                b"version" => attrs.version = Some(Self::attr_value(decoder, &attr)?),
                _ => {}
            }
        }
        Ok(CmEvent::ObjectStart(attrs))
    }

    fn parameter(decoder: Decoder, e: &BytesStart) -> XmlResult<Option<CmEvent>> {
        let mut name = None;
        let mut value = None;
        for attr in e.attributes() {
            let attr = attr?;
            match attr.key.as_ref() {
                b"name" => name = Some(Self::attr_value(decoder, &attr)?),
                b"value" => value = Some(Self::attr_value(decoder, &attr)?),
                _ => {}
            }
        }
        match (name, value) {
            (Some(name), Some(value)) => Ok(Some(CmEvent::Parameter { name, value })),
            _ => Ok(None),
        }
    }

    /// Decode and unescape one attribute value. Unescaping matters: the
    /// multi-value separator `&` arrives as `&amp;` in well-formed dumps.
    fn attr_value(decoder: Decoder, attr: &Attribute) -> XmlResult<String> {
        let value = attr
            .decode_and_unescape_value(decoder)
            .map_err(quick_xml::Error::from)?;
        Ok(value.into_owned())
    }
}
