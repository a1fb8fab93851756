// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Conversion of raw object bytes into an ordered stream of JSON records.
//!
//! The format is picked from the object name alone, by exact (case-sensitive)
//! suffix:
//!
//! | Suffix    | Records                                                   |
//! |-----------|-----------------------------------------------------------|
//! | `.ndjson` | one per non-blank line, any bad line fails the object     |
//! | `.json`   | as `.ndjson`, falling back to one whole-document record   |
//! | `.txt`    | one `{"line_number", "content"}` object per line          |
//! | `.xml`    | one record holding the whole document                     |
//!
//! Anything else is [`IngestError::UnsupportedFormat`]. Content must be UTF-8
//! for every format.

mod xml;

use std::fmt;

use serde_json::{json, Value};
use tracing::debug;

use crate::error::IngestError;

/// A single unit of forwarded data.
pub type Record = Value;

/// Records extracted from one object, in source order.
pub type RecordStream = Vec<Record>;

type Parser = fn(&str) -> Result<RecordStream, IngestError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Ndjson,
    Json,
    Text,
    Xml,
}

/// Suffix dispatch table. New formats only need a variant and a row here.
const SUFFIXES: &[(&str, FileFormat)] = &[
    (".ndjson", FileFormat::Ndjson),
    (".json", FileFormat::Json),
    (".txt", FileFormat::Text),
    (".xml", FileFormat::Xml),
];

impl FileFormat {
    /// Returns the format registered for the suffix of `file_name`, if any.
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        SUFFIXES
            .iter()
            .find(|(suffix, _)| file_name.ends_with(suffix))
            .map(|(_, format)| *format)
    }

    /// Like [`FileFormat::from_file_name`], failing with
    /// [`IngestError::UnsupportedFormat`].
    pub fn detect(file_name: &str) -> Result<Self, IngestError> {
        Self::from_file_name(file_name).ok_or_else(|| IngestError::UnsupportedFormat {
            file_name: file_name.to_string(),
        })
    }

    #[must_use]
    pub fn suffix(self) -> &'static str {
        SUFFIXES
            .iter()
            .find(|(_, format)| *format == self)
            .map_or("", |(suffix, _)| *suffix)
    }

    fn parser(self) -> Parser {
        match self {
            FileFormat::Ndjson => parse_ndjson,
            FileFormat::Json => parse_json,
            FileFormat::Text => parse_text,
            FileFormat::Xml => xml::parse_xml,
        }
    }

    /// Decodes `bytes` as UTF-8 and extracts its records.
    pub fn parse(self, bytes: &[u8]) -> Result<RecordStream, IngestError> {
        let text = std::str::from_utf8(bytes)?;
        (self.parser())(text)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix().trim_start_matches('.'))
    }
}

/// Detects the format of `file_name` and extracts the records of `bytes`.
pub fn parse(file_name: &str, bytes: &[u8]) -> Result<RecordStream, IngestError> {
    FileFormat::detect(file_name)?.parse(bytes)
}

/// Splits on `\n`, `\r\n` and a lone `\r`. A trailing line break does not
/// start an extra empty line.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        match rest.find(|c: char| c == '\r' || c == '\n') {
            Some(end) => {
                let line = &rest[..end];
                let width = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[end + width..];
                Some(line)
            }
            None => Some(std::mem::take(&mut rest)),
        }
    })
}

/// Parses every non-blank line as a standalone JSON value. On failure returns
/// the 1-based line number along with the JSON error.
fn parse_lines(text: &str) -> Result<RecordStream, (usize, serde_json::Error)> {
    split_lines(text.trim_end())
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| serde_json::from_str(line).map_err(|e| (index + 1, e)))
        .collect()
}

fn parse_ndjson(text: &str) -> Result<RecordStream, IngestError> {
    parse_lines(text).map_err(|(line, e)| IngestError::Parse {
        format: FileFormat::Ndjson,
        message: format!("line {line}: {e}"),
    })
}

fn parse_json(text: &str) -> Result<RecordStream, IngestError> {
    match parse_lines(text) {
        Ok(records) => Ok(records),
        Err((line, e)) => {
            debug!("Content is not NDJSON (line {line}: {e}), parsing it as a single document");
            serde_json::from_str::<Record>(text)
                .map(|record| vec![record])
                .map_err(|e| IngestError::Parse {
                    format: FileFormat::Json,
                    message: e.to_string(),
                })
        }
    }
}

#[allow(clippy::unnecessary_wraps)]
fn parse_text(text: &str) -> Result<RecordStream, IngestError> {
    Ok(split_lines(text.trim_end())
        .enumerate()
        .map(|(index, line)| json!({ "line_number": index + 1, "content": line }))
        .collect())
}
