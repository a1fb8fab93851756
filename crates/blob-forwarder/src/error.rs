// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::formats::FileFormat;

/// Errors that abort a whole object: no record can be recovered from it.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Unsupported file type for {file_name}")]
    UnsupportedFormat { file_name: String },

    #[error("Content is not valid UTF-8: {0}")]
    Decode(#[from] std::str::Utf8Error),

    #[error("Error parsing {format} content: {message}")]
    Parse { format: FileFormat, message: String },
}

/// Errors that abort a single batch. Remaining batches are still attempted.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Compressed batch is {size} bytes, above the {limit} byte collector limit")]
    CompressedTooLarge { size: usize, limit: usize },

    #[error("Failed to compress batch: {0}")]
    Compression(#[from] std::io::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Failures talking to the collector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Error sending batch to collector: {0}")]
    Request(String),

    #[error("Collector rejected batch with status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Errors raised while reading configuration at start-up.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}
