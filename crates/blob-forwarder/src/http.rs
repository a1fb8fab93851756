// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! HTTP delivery to the collector.
//!
//! [`Transport`] is the only seam between the pipeline and the network: it
//! posts one body with the given headers and reports the status it got back.
//! Whether that status counts as success is decided by the
//! [`crate::flusher::Flusher`].
//!
//! [`ReqwestTransport`] is the production implementation. Its client is built
//! from [`Config`] with:
//! - a per-request timeout (`FORWARDER_TIMEOUT_SECS`, 30s by default)
//! - an optional HTTPS proxy (`FORWARDER_PROXY_HTTPS` or `HTTPS_PROXY`)
//! - pooled connections with TCP keep-alive

use core::time::Duration;
use std::error::Error;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tracing::{debug, error};

use crate::config::Config;
use crate::error::TransportError;

/// What the collector answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `body` to `endpoint` in a single POST.
    ///
    /// Any status code is an `Ok`; only failing to get a response at all
    /// (connection, TLS, timeout) is an error.
    async fn post(
        &self,
        endpoint: &str,
        headers: &HeaderMap,
        body: Vec<u8>,
    ) -> Result<TransportResponse, TransportError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        ReqwestTransport { client }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(get_client(config))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post(
        &self,
        endpoint: &str,
        headers: &HeaderMap,
        body: Vec<u8>,
    ) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .post(endpoint)
            .headers(headers.clone())
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!("Failed to read collector response body (status {status}): {e}");
                String::new()
            }
        };
        Ok(TransportResponse { status, body })
    }
}

/// Creates the HTTP client used to reach the collector.
///
/// An unusable proxy setting is logged and ignored rather than failing the
/// invocation.
#[must_use]
pub fn get_client(config: &Config) -> reqwest::Client {
    match build_client(config, true) {
        Ok(client) => client,
        Err(e) => {
            error!("Unable to parse proxy configuration: {e}, falling back to direct connection");
            match build_client(config, false) {
                Ok(client) => client,
                Err(inner) => {
                    error!("Failed to build HTTP client without proxy: {inner}, using reqwest defaults");
                    reqwest::Client::new()
                }
            }
        }
    }
}

fn build_client(config: &Config, allow_proxy: bool) -> Result<reqwest::Client, Box<dyn Error>> {
    let mut client = reqwest::Client::builder()
        .timeout(config.timeout)
        .pool_idle_timeout(Some(Duration::from_secs(270)))
        .tcp_keepalive(Some(Duration::from_secs(120)));

    if allow_proxy {
        if let Some(https_uri) = &config.https_proxy {
            debug!("Sending batches through HTTPS proxy {https_uri}");
            client = client.proxy(reqwest::Proxy::https(https_uri.as_str())?);
        }
    }

    Ok(client.build()?)
}
