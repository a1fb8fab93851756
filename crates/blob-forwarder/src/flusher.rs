// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Compression and delivery of batches to the collector.
//!
//! ```text
//!   Batch
//!     │
//!     v
//!   ┌─────────────┐
//!   │   NDJSON    │ (records joined by '\n')
//!   └──────┬──────┘
//!          │
//!          v
//!   ┌─────────────┐
//!   │    gzip     │
//!   └──────┬──────┘
//!          │
//!          v
//!   ┌─────────────┐
//!   │ size check  │ (> 10 MiB: dropped, never posted)
//!   └──────┬──────┘
//!          │
//!          v
//!   ┌─────────────┐
//!   │  HTTP POST  │ (one attempt, no retry)
//!   └─────────────┘
//! ```

use std::io::Write;
use std::sync::Arc;

use flate2::write::GzEncoder;
use flate2::Compression;
use reqwest::header::{
    HeaderMap, HeaderValue, InvalidHeaderValue, AUTHORIZATION, CONTENT_ENCODING, CONTENT_TYPE,
};
use tracing::{debug, info};

use crate::batcher::Batch;
use crate::config::Config;
use crate::constants;
use crate::error::{DeliveryError, TransportError};
use crate::http::Transport;

pub struct FlusherConfig {
    pub endpoint: String,
    pub token: String,
    pub max_compressed_size: usize,
    pub compression_level: u32,
}

impl From<&Config> for FlusherConfig {
    fn from(config: &Config) -> Self {
        FlusherConfig {
            endpoint: config.endpoint.clone(),
            token: config.token.clone(),
            max_compressed_size: constants::MAX_COMPRESSED_SIZE,
            compression_level: config.compression_level,
        }
    }
}

/// A batch the collector accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub status: u16,
    pub records: usize,
    pub uncompressed_bytes: usize,
    pub compressed_bytes: usize,
}

/// Sends batches to a single collector endpoint.
#[derive(Clone)]
pub struct Flusher {
    transport: Arc<dyn Transport>,
    endpoint: String,
    headers: HeaderMap,
    max_compressed_size: usize,
    compression: Compression,
}

impl Flusher {
    /// Fails only if the token cannot be carried in an `Authorization` header.
    pub fn new(
        transport: Arc<dyn Transport>,
        config: FlusherConfig,
    ) -> Result<Self, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();
        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", config.token))?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static(constants::NDJSON_CONTENT_TYPE),
        );
        headers.insert(
            CONTENT_ENCODING,
            HeaderValue::from_static(constants::GZIP_CONTENT_ENCODING),
        );

        Ok(Flusher {
            transport,
            endpoint: config.endpoint,
            headers,
            max_compressed_size: config.max_compressed_size,
            compression: Compression::new(config.compression_level.min(9)),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn max_compressed_size(&self) -> usize {
        self.max_compressed_size
    }

    /// Serializes `batch` as NDJSON and gzips it.
    pub fn compress(&self, batch: &Batch) -> Result<Vec<u8>, DeliveryError> {
        let mut encoder = GzEncoder::new(Vec::new(), self.compression);
        for (index, line) in batch.lines().iter().enumerate() {
            if index > 0 {
                encoder.write_all(b"\n")?;
            }
            encoder.write_all(line.as_bytes())?;
        }
        Ok(encoder.finish()?)
    }

    /// Compresses `batch` and posts it, unless it compresses above the
    /// ceiling. Nothing is retried.
    pub async fn send_batch(&self, batch: &Batch) -> Result<Delivery, DeliveryError> {
        let payload = self.compress(batch)?;
        let compressed_bytes = payload.len();
        if compressed_bytes > self.max_compressed_size {
            return Err(DeliveryError::CompressedTooLarge {
                size: compressed_bytes,
                limit: self.max_compressed_size,
            });
        }

        debug!(
            "Posting {} records ({} bytes, {} compressed) to collector",
            batch.len(),
            batch.uncompressed_size(),
            compressed_bytes
        );
        let response = self
            .transport
            .post(&self.endpoint, &self.headers, payload)
            .await?;
        info!("Collector response: {} - {}", response.status, response.body);

        if !response.is_success() {
            return Err(TransportError::Status {
                status: response.status,
                body: response.body,
            }
            .into());
        }

        Ok(Delivery {
            status: response.status,
            records: batch.len(),
            uncompressed_bytes: batch.uncompressed_size(),
            compressed_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batcher::Batcher;
    use crate::test_support::{status, RecordingTransport};
    use serde_json::json;

    const ENDPOINT: &str = "https://collector.example.com/v1/http";

    fn create_test_config() -> FlusherConfig {
        FlusherConfig {
            endpoint: ENDPOINT.to_string(),
            token: "test-token".to_string(),
            max_compressed_size: constants::MAX_COMPRESSED_SIZE,
            compression_level: 6,
        }
    }

    fn batch_of(records: Vec<serde_json::Value>) -> Batch {
        let mut batches: Vec<Batch> = Batcher::default().batches(records).collect();
        assert_eq!(batches.len(), 1);
        batches.remove(0)
    }

    #[test]
    fn test_headers() {
        let flusher = Flusher::new(
            Arc::new(RecordingTransport::accepting()),
            create_test_config(),
        )
        .unwrap();

        let headers = flusher.headers();
        assert_eq!(headers.get("Authorization").unwrap(), "Bearer test-token");
        assert!(headers.get("Authorization").unwrap().is_sensitive());
        assert_eq!(headers.get("Content-Type").unwrap(), "application/x-ndjson");
        assert_eq!(headers.get("Content-Encoding").unwrap(), "gzip");
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn test_invalid_token() {
        let config = FlusherConfig {
            token: "bad\ntoken".to_string(),
            ..create_test_config()
        };
        assert!(Flusher::new(Arc::new(RecordingTransport::accepting()), config).is_err());
    }

    #[test]
    fn test_from_config() {
        let config = Config {
            endpoint: ENDPOINT.to_string(),
            token: "t".to_string(),
            compression_level: 1,
            ..Config::default()
        };
        let flusher_config = FlusherConfig::from(&config);
        assert_eq!(flusher_config.endpoint, ENDPOINT);
        assert_eq!(flusher_config.token, "t");
        assert_eq!(flusher_config.compression_level, 1);
        assert_eq!(
            flusher_config.max_compressed_size,
            constants::MAX_COMPRESSED_SIZE
        );
    }

    #[test]
    fn test_compress_produces_ndjson_gzip() {
        let flusher = Flusher::new(
            Arc::new(RecordingTransport::accepting()),
            create_test_config(),
        )
        .unwrap();
        let batch = batch_of(vec![json!({"a": 1}), json!({"b": "two"})]);

        let compressed = flusher.compress(&batch).unwrap();

        assert_eq!(&compressed[..2], &[0x1f_u8, 0x8b], "gzip magic bytes");
        let request = crate::test_support::RecordedRequest {
            endpoint: String::new(),
            headers: HeaderMap::new(),
            body: compressed,
        };
        assert_eq!(request.decoded_body(), "{\"a\":1}\n{\"b\":\"two\"}");
    }

    #[tokio::test]
    async fn test_send_batch_posts_once() {
        let transport = Arc::new(RecordingTransport::accepting());
        let flusher = Flusher::new(transport.clone(), create_test_config()).unwrap();
        let batch = batch_of(vec![json!({"msg": "hello"}), json!({"msg": "world"})]);

        let delivery = flusher.send_batch(&batch).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].endpoint, ENDPOINT);
        assert_eq!(requests[0].header("authorization"), Some("Bearer test-token"));
        assert_eq!(
            requests[0].header("content-type"),
            Some("application/x-ndjson")
        );
        assert_eq!(requests[0].header("content-encoding"), Some("gzip"));
        assert_eq!(
            requests[0].decoded_body(),
            "{\"msg\":\"hello\"}\n{\"msg\":\"world\"}"
        );
        assert_eq!(
            delivery,
            Delivery {
                status: 202,
                records: 2,
                uncompressed_bytes: batch.uncompressed_size(),
                compressed_bytes: requests[0].body.len(),
            }
        );
    }

    #[tokio::test]
    async fn test_compressed_too_large_is_never_posted() {
        let transport = Arc::new(RecordingTransport::accepting());
        let config = FlusherConfig {
            max_compressed_size: 16,
            ..create_test_config()
        };
        let flusher = Flusher::new(transport.clone(), config).unwrap();
        let batch = batch_of(vec![json!({"msg": "this will not fit in sixteen bytes"})]);

        let result = flusher.send_batch(&batch).await;

        match result {
            Err(DeliveryError::CompressedTooLarge { size, limit }) => {
                assert!(size > 16);
                assert_eq!(limit, 16);
            }
            other => panic!("expected CompressedTooLarge, got {other:?}"),
        }
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_compressed_size_may_equal_limit() {
        let batch = batch_of(vec![json!({"msg": "exact"})]);
        let probe = Flusher::new(
            Arc::new(RecordingTransport::accepting()),
            create_test_config(),
        )
        .unwrap();
        let exact = probe.compress(&batch).unwrap().len();

        let transport = Arc::new(RecordingTransport::accepting());
        let config = FlusherConfig {
            max_compressed_size: exact,
            ..create_test_config()
        };
        let flusher = Flusher::new(transport.clone(), config).unwrap();

        assert!(flusher.send_batch(&batch).await.is_ok());
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_non_success_status_is_transport_error() {
        let transport = Arc::new(RecordingTransport::scripted([status(
            401,
            "invalid token",
        )]));
        let flusher = Flusher::new(transport.clone(), create_test_config()).unwrap();
        let batch = batch_of(vec![json!({"a": 1})]);

        let result = flusher.send_batch(&batch).await;

        match result {
            Err(DeliveryError::Transport(TransportError::Status { status, body })) => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid token");
            }
            other => panic!("expected status error, got {other:?}"),
        }
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_request_failure_is_transport_error() {
        let transport = Arc::new(RecordingTransport::scripted([Err(
            TransportError::Request("connection refused".to_string()),
        )]));
        let flusher = Flusher::new(transport, create_test_config()).unwrap();
        let batch = batch_of(vec![json!({"a": 1})]);

        let result = flusher.send_batch(&batch).await;

        assert!(matches!(
            result,
            Err(DeliveryError::Transport(TransportError::Request(_)))
        ));
    }
}
