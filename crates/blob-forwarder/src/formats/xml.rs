// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! XML to JSON conversion.
//!
//! Follows the usual `xmltodict` layout:
//!
//! ```text
//! <log level="warn"><msg>disk</msg><msg>cpu</msg><empty/></log>
//!
//! {"log": {"@level": "warn", "msg": ["disk", "cpu"], "empty": null}}
//! ```
//!
//! Attributes are `@`-prefixed keys. Text is the element value when the
//! element has neither attributes nor children, `#text` otherwise. Text is
//! trimmed, and an element left with nothing is `null`.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use super::{FileFormat, RecordStream};
use crate::error::IngestError;

const ATTRIBUTE_PREFIX: char = '@';
const TEXT_KEY: &str = "#text";

pub(super) fn parse_xml(text: &str) -> Result<RecordStream, IngestError> {
    to_value(text)
        .map(|document| vec![document])
        .map_err(|message| IngestError::Parse {
            format: FileFormat::Xml,
            message,
        })
}

/// An element whose end tag has not been seen yet.
struct Element {
    name: String,
    entries: Map<String, Value>,
    text: String,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self, String> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut entries = Map::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| format!("in <{name}>: {e}"))?;
            let key = format!(
                "{ATTRIBUTE_PREFIX}{}",
                String::from_utf8_lossy(attribute.key.as_ref())
            );
            let value = attribute
                .unescape_value()
                .map_err(|e| format!("in <{name}>: {e}"))?;
            entries.insert(key, Value::String(value.into_owned()));
        }
        Ok(Element {
            name,
            entries,
            text: String::new(),
        })
    }

    fn into_value(self) -> (String, Value) {
        let text = self.text.trim();
        let value = if self.entries.is_empty() {
            if text.is_empty() {
                Value::Null
            } else {
                Value::String(text.to_string())
            }
        } else {
            let mut entries = self.entries;
            if !text.is_empty() {
                entries.insert(TEXT_KEY.to_string(), Value::String(text.to_string()));
            }
            Value::Object(entries)
        };
        (self.name, value)
    }
}

/// Adds `value` under `key`, turning repeated keys into an array.
fn push_child(entries: &mut Map<String, Value>, key: String, value: Value) {
    match entries.get_mut(&key) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            entries.insert(key, value);
        }
    }
}

#[derive(Default)]
struct DocumentBuilder {
    stack: Vec<Element>,
    root: Option<Value>,
}

impl DocumentBuilder {
    fn open(&mut self, element: Element) -> Result<(), String> {
        if self.stack.is_empty() && self.root.is_some() {
            return Err(format!("junk after document element: <{}>", element.name));
        }
        self.stack.push(element);
        Ok(())
    }

    fn close(&mut self) -> Result<(), String> {
        let (name, value) = self
            .stack
            .pop()
            .ok_or_else(|| "closing tag without an open element".to_string())?
            .into_value();
        match self.stack.last_mut() {
            Some(parent) => push_child(&mut parent.entries, name, value),
            None => {
                let mut document = Map::new();
                document.insert(name, value);
                self.root = Some(Value::Object(document));
            }
        }
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), String> {
        match self.stack.last_mut() {
            Some(element) => {
                element.text.push_str(text);
                Ok(())
            }
            None if text.trim().is_empty() => Ok(()),
            None => Err("text outside of the document element".to_string()),
        }
    }

    fn finish(self) -> Result<Value, String> {
        if let Some(element) = self.stack.last() {
            return Err(format!("unclosed element <{}>", element.name));
        }
        self.root.ok_or_else(|| "no document element found".to_string())
    }
}

fn to_value(text: &str) -> Result<Value, String> {
    let mut reader = Reader::from_str(text);
    let mut builder = DocumentBuilder::default();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("at byte {}: {e}", reader.error_position()))?;
        match event {
            Event::Start(start) => builder.open(Element::open(&start)?)?,
            Event::Empty(start) => {
                builder.open(Element::open(&start)?)?;
                builder.close()?;
            }
            Event::End(_) => builder.close()?,
            Event::Text(content) => {
                let content = content.unescape().map_err(|e| e.to_string())?;
                builder.text(&content)?;
            }
            Event::CData(content) => builder.text(&String::from_utf8_lossy(&content))?,
            Event::Eof => break,
            // Comments, declarations, processing instructions and doctypes carry no data
            _ => {}
        }
    }

    builder.finish()
}
