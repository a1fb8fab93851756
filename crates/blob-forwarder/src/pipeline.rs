// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Per-object orchestration: parse, batch, then send each batch in order.
//!
//! [`Pipeline::process`] returns everything that happened so it can be
//! inspected. [`Pipeline::run`] and [`Pipeline::on_new_object`] are the
//! invocation boundary and only log.

use std::sync::Arc;

use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::batcher::Batcher;
use crate::config::{Config, TOKEN_ENV};
use crate::error::{ConfigError, DeliveryError, IngestError};
use crate::flusher::{Delivery, Flusher, FlusherConfig};
use crate::formats::FileFormat;
use crate::http::ReqwestTransport;

/// Outcome of processing one object.
#[derive(Debug)]
pub struct PipelineReport {
    pub file_name: String,
    pub format: FileFormat,
    pub records: usize,
    /// One entry per batch, in send order.
    pub batches: Vec<Result<Delivery, DeliveryError>>,
}

impl PipelineReport {
    #[must_use]
    pub fn delivered(&self) -> usize {
        self.batches.iter().filter(|batch| batch.is_ok()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.batches.iter().filter(|batch| batch.is_err()).count()
    }
}

#[derive(Clone)]
pub struct Pipeline {
    batcher: Batcher,
    flusher: Flusher,
}

impl Pipeline {
    #[must_use]
    pub fn new(batcher: Batcher, flusher: Flusher) -> Self {
        Pipeline { batcher, flusher }
    }

    /// Builds the production pipeline: collector limits and a reqwest
    /// transport configured from `config`.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let transport = Arc::new(ReqwestTransport::from_config(config));
        let flusher =
            Flusher::new(transport, FlusherConfig::from(config)).map_err(|e| {
                ConfigError::Invalid {
                    var: TOKEN_ENV,
                    reason: e.to_string(),
                }
            })?;
        Ok(Pipeline::new(Batcher::default(), flusher))
    }

    /// Parses `bytes` and sends every resulting batch.
    ///
    /// A batch failure is logged and recorded, and the following batches are
    /// still sent. Only a failure to read the object as a whole is returned
    /// as an error, in which case nothing was sent.
    pub async fn process(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<PipelineReport, IngestError> {
        let format = FileFormat::detect(file_name)?;
        let records = format.parse(bytes)?;
        let record_count = records.len();
        debug!("Parsed {record_count} records from {format} content");

        let mut report = PipelineReport {
            file_name: file_name.to_string(),
            format,
            records: record_count,
            batches: Vec::new(),
        };
        if record_count == 0 {
            info!("No records found in {file_name}, nothing to send");
            return Ok(report);
        }

        for (index, batch) in self.batcher.batches(records).enumerate() {
            let outcome = self.flusher.send_batch(&batch).await;
            if let Err(e) = &outcome {
                error!(
                    batch = index,
                    records = batch.len(),
                    "Failed to send batch {index} of {file_name}: {e}"
                );
            }
            report.batches.push(outcome);
        }

        Ok(report)
    }

    /// Processes one object and logs the outcome. Never fails.
    pub async fn run(&self, file_name: &str, bytes: &[u8]) {
        let span = info_span!("ingest", file = file_name);
        async {
            match self.process(file_name, bytes).await {
                Ok(report) if report.failed() == 0 => info!(
                    "Forwarded {} records from {} in {} batches",
                    report.records,
                    report.file_name,
                    report.batches.len()
                ),
                Ok(report) => warn!(
                    "Forwarded {} of {} batches from {}, {} failed",
                    report.delivered(),
                    report.batches.len(),
                    report.file_name,
                    report.failed()
                ),
                Err(e) => error!("Error processing {file_name}: {e}"),
            }
        }
        .instrument(span)
        .await;
    }

    /// Entry point for a new-object notification.
    pub async fn on_new_object(&self, name: &str, bytes: &[u8], declared_length: u64) {
        info!("Processed blob: Name: {name}, Blob Size: {declared_length} bytes");
        let received = bytes.len() as u64;
        if received != declared_length {
            warn!(
                "Declared size of {name} is {declared_length} bytes but {received} bytes were received"
            );
        }
        self.run(name, bytes).await;
    }
}
