// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log line formatting for the function binary.
//!
//! Every line is prefixed with `BLOB_FORWARDER` so forwarder output can be
//! told apart from the host runtime's own logs:
//!
//! ```text
//! BLOB_FORWARDER | LEVEL | [span_name{span_fields}:] message {event_fields}
//! ```
//!
//! ```text
//! BLOB_FORWARDER | INFO | Processed blob: Name: logs/app.ndjson, Blob Size: 2048 bytes
//! BLOB_FORWARDER | ERROR | ingest{file="logs/app.ndjson"}: Failed to send batch 1 of logs/app.ndjson: ... batch=1 records=5120
//! ```

use std::error::Error;
use std::fmt;

use tracing_core::{Event, Subscriber};
use tracing_subscriber::fmt::{
    format::{self, FormatEvent, FormatFields},
    FmtContext, FormattedFields,
};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

const PREFIX: &str = "BLOB_FORWARDER";

/// Event formatter that prefixes messages with `BLOB_FORWARDER` and the level.
///
/// Line layout:
///
/// 1. **Prefix**: always `BLOB_FORWARDER`, so host log sinks can filter on it
/// 2. **Level**: ERROR, WARN, INFO, DEBUG or TRACE
/// 3. **Span context**: every active span from the root, with its fields
/// 4. **Message** followed by the event's own fields
///
/// Span fields are read from what the fmt layer stored when the span was
/// created. A span without them is written by name only.
#[derive(Debug, Clone, Copy)]
pub struct Formatter;

impl<S, N> FormatEvent<S, N> for Formatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(&mut writer, "{PREFIX} | {} | ", event.metadata().level())?;

        // Root to current
        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}", span.name())?;

                // Stored by the fmt layer on span creation
                let ext = span.extensions();
                if let Some(fields) = ext.get::<FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{{{fields}}}")?;
                    }
                }
                write!(writer, ": ")?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Filter directives for `log_level`, with the HTTP stack silenced.
#[must_use]
pub fn env_filter_directives(log_level: &str) -> String {
    format!("h2=off,hyper=off,rustls=off,{log_level}")
}

/// Installs the global subscriber. Fails if `log_level` is not a valid filter
/// or a global subscriber is already set.
pub fn init(log_level: &str) -> Result<(), Box<dyn Error>> {
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_new(env_filter_directives(log_level))?)
        .with_ansi(false)
        .event_format(Formatter)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
