// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! # Blob Forwarder
//!
//! One-shot ingestion of storage objects into an HTTP log collector.
//!
//! Every invocation handles exactly one object:
//!
//! ```text
//!   object name + bytes
//!          │
//!          v
//!   ┌──────────────┐
//!   │   formats    │  (.ndjson / .json / .txt / .xml -> JSON records)
//!   └──────┬───────┘
//!          │
//!          v
//!   ┌──────────────┐
//!   │   batcher    │  (<= 4 MiB of serialized records per batch)
//!   └──────┬───────┘
//!          │
//!          v
//!   ┌──────────────┐
//!   │   flusher    │  (NDJSON, gzip, <= 10 MiB, POST)
//!   └──────┬───────┘
//!          │
//!          v
//!      Collector
//! ```
//!
//! - [`formats`]: suffix dispatch and per-format record extraction
//! - [`batcher`]: size-bounded grouping of records
//! - [`flusher`]: compression, compressed-size ceiling and delivery
//! - [`pipeline`]: orchestration and the fail-soft invocation boundary
//! - [`http`]: the [`http::Transport`] seam and its `reqwest` implementation
//! - [`config`]: environment configuration
//! - [`logger`]: log line formatting for the function binary

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod batcher;
pub mod config;
pub mod constants;
pub mod error;
pub mod flusher;
pub mod formats;
pub mod http;
pub mod logger;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod test_support;
