// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Collector intake limits.
//!
//! The collector rejects payloads above either ceiling, so both are enforced
//! before anything goes on the wire. They are injected into
//! [`crate::batcher::Batcher`] and [`crate::flusher::Flusher`] rather than read
//! directly, which lets tests run with much smaller values.

/// Maximum summed size in bytes of the serialized records in one batch,
/// measured before compression.
///
/// A record that is larger than this on its own still gets a batch to itself.
pub const MAX_UNCOMPRESSED_SIZE: usize = 4 * 1_024 * 1_024;

/// Maximum size in bytes of one gzip-compressed batch.
///
/// A batch that compresses above this is dropped and reported, never split.
pub const MAX_COMPRESSED_SIZE: usize = 10 * 1_024 * 1_024;

/// Default timeout for one POST to the collector.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default gzip level, the same as `gzip -9`.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 9;

pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";
pub const GZIP_CONTENT_ENCODING: &str = "gzip";
