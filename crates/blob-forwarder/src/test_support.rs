// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! In-memory [`Transport`] for unit tests.

use std::collections::VecDeque;
use std::io::Read;
use std::sync::Mutex;

use async_trait::async_trait;
use flate2::read::GzDecoder;
use reqwest::header::HeaderMap;

use crate::error::TransportError;
use crate::http::{Transport, TransportResponse};

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub(crate) endpoint: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Vec<u8>,
}

impl RecordedRequest {
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// The gunzipped body.
    pub(crate) fn decoded_body(&self) -> String {
        let mut decoded = String::new();
        GzDecoder::new(self.body.as_slice())
            .read_to_string(&mut decoded)
            .expect("body should be valid gzip");
        decoded
    }
}

/// Records every request and answers from a script, then with 202 once the
/// script runs out.
#[derive(Debug, Default)]
pub(crate) struct RecordingTransport {
    responses: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl RecordingTransport {
    pub(crate) fn accepting() -> Self {
        Self::default()
    }

    pub(crate) fn scripted(
        responses: impl IntoIterator<Item = Result<TransportResponse, TransportError>>,
    ) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::default(),
        }
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("lock poisoned").clone()
    }
}

pub(crate) fn status(status: u16, body: &str) -> Result<TransportResponse, TransportError> {
    Ok(TransportResponse {
        status,
        body: body.to_string(),
    })
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn post(
        &self,
        endpoint: &str,
        headers: &HeaderMap,
        body: Vec<u8>,
    ) -> Result<TransportResponse, TransportError> {
        self.requests
            .lock()
            .expect("lock poisoned")
            .push(RecordedRequest {
                endpoint: endpoint.to_string(),
                headers: headers.clone(),
                body,
            });
        self.responses
            .lock()
            .expect("lock poisoned")
            .pop_front()
            .unwrap_or_else(|| status(202, "{}"))
    }
}
