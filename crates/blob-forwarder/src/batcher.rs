// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Size-bounded batching of records.
//!
//! Records are serialized once, as compact JSON, and grouped in order until
//! the next one would push the summed serialized size over the uncompressed
//! ceiling:
//!
//! ```text
//!   limit = 10
//!   sizes:   4   5   3   12   2
//!   batches: [4 5] [3] [12] [2]
//! ```
//!
//! Sizes are measured on the exact bytes that are sent, so compact JSON with
//! raw UTF-8 and no separator padding.
//!
//! The ceiling is only checked against what has already accumulated, so a
//! record larger than the ceiling is never rejected here: it is shipped alone
//! and the compressed-size check in [`crate::flusher`] has the final word.

use std::iter::FusedIterator;

use tracing::warn;

use crate::constants;
use crate::formats::Record;

/// An ordered group of serialized records sent as one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    lines: Vec<String>,
    uncompressed_size: usize,
}

impl Batch {
    fn push(&mut self, line: String) {
        self.uncompressed_size += line.len();
        self.lines.push(line);
    }

    /// Serialized records, one compact JSON document each.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of the UTF-8 byte lengths of the serialized records. Newline
    /// separators are not counted.
    #[must_use]
    pub fn uncompressed_size(&self) -> usize {
        self.uncompressed_size
    }

    /// The batch as newline-delimited JSON, without a trailing newline.
    #[must_use]
    pub fn to_ndjson(&self) -> String {
        self.lines.join("\n")
    }
}

/// Groups records into batches under an uncompressed size ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batcher {
    max_uncompressed_size: usize,
}

impl Default for Batcher {
    /// Uses the collector limit, [`constants::MAX_UNCOMPRESSED_SIZE`].
    fn default() -> Self {
        Batcher::new(constants::MAX_UNCOMPRESSED_SIZE)
    }
}

impl Batcher {
    /// Creates a batcher with a custom ceiling. Prefer [`Batcher::default`]
    /// outside of tests.
    #[must_use]
    pub fn new(max_uncompressed_size: usize) -> Self {
        Batcher {
            max_uncompressed_size,
        }
    }

    #[must_use]
    pub fn max_uncompressed_size(&self) -> usize {
        self.max_uncompressed_size
    }

    /// Lazily splits `records` into batches in a single forward pass.
    ///
    /// Every record ends up in exactly one batch and batches come out in
    /// input order. No batch is empty.
    ///
    /// ```rust
    /// use blob_forwarder::batcher::Batcher;
    /// use serde_json::json;
    ///
    /// // {"n":1} is 7 bytes
    /// let batches: Vec<_> = Batcher::new(14)
    ///     .batches(vec![json!({"n": 1}), json!({"n": 2}), json!({"n": 3})])
    ///     .collect();
    /// assert_eq!(batches.len(), 2);
    /// assert_eq!(batches[0].to_ndjson(), "{\"n\":1}\n{\"n\":2}");
    /// assert_eq!(batches[1].to_ndjson(), "{\"n\":3}");
    /// ```
    pub fn batches<I>(&self, records: I) -> Batches<I::IntoIter>
    where
        I: IntoIterator<Item = Record>,
    {
        Batches {
            records: records.into_iter(),
            max_uncompressed_size: self.max_uncompressed_size,
            carry: None,
        }
    }
}

/// Iterator returned by [`Batcher::batches`].
#[derive(Debug)]
pub struct Batches<I> {
    records: I,
    max_uncompressed_size: usize,
    // Record that closed the previous batch; it opens the next one.
    carry: Option<String>,
}

fn serialize(record: &Record, max_uncompressed_size: usize) -> String {
    let line = record.to_string();
    if line.len() > max_uncompressed_size {
        warn!(
            "Record of {} bytes exceeds the {} byte batch limit, sending it in its own batch",
            line.len(),
            max_uncompressed_size
        );
    }
    line
}

impl<I> Iterator for Batches<I>
where
    I: Iterator<Item = Record>,
{
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        let mut batch = Batch::default();
        if let Some(line) = self.carry.take() {
            batch.push(line);
        }

        for record in self.records.by_ref() {
            let line = serialize(&record, self.max_uncompressed_size);
            if !batch.is_empty()
                && batch.uncompressed_size() + line.len() > self.max_uncompressed_size
            {
                self.carry = Some(line);
                return Some(batch);
            }
            batch.push(line);
        }

        (!batch.is_empty()).then_some(batch)
    }
}

impl<I> FusedIterator for Batches<I> where I: FusedIterator<Item = Record> {}
