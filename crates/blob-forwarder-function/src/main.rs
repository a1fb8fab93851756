// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::{env, fs, process::ExitCode};

use tracing::{debug, error};

use blob_forwarder::{
    config::{Config, LOG_LEVEL_ENV},
    logger,
    pipeline::Pipeline,
};

#[tokio::main(flavor = "current_thread")]
pub async fn main() -> ExitCode {
    let log_level = env::var(LOG_LEVEL_ENV)
        .map(|val| val.trim().to_lowercase())
        .unwrap_or("info".to_string());

    if let Err(e) = logger::init(&log_level) {
        eprintln!("Failed to initialize logging with level '{log_level}': {e}");
        return ExitCode::FAILURE;
    }
    debug!("Logging subsystem enabled");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let pipeline = match Pipeline::from_config(&config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!("Error creating pipeline: {e}");
            return ExitCode::FAILURE;
        }
    };

    let Some(path) = env::args().nth(1) else {
        error!("Usage: blob-forwarder-function <object path>");
        return ExitCode::FAILURE;
    };

    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Unable to read {path}: {e}");
            return ExitCode::FAILURE;
        }
    };
    let declared_length = fs::metadata(&path)
        .map(|metadata| metadata.len())
        .unwrap_or(bytes.len() as u64);

    // Delivery failures are logged by the pipeline and do not fail the run
    pipeline.on_new_object(&path, &bytes, declared_length).await;
    ExitCode::SUCCESS
}
