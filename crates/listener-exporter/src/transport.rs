// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! HTTP delivery of compressed payloads to the listener.
//!
//! One POST per payload, no retries. The `reqwest::Client` built here holds
//! the connection pool shared by every export call of an exporter.

use core::time::Duration;
use reqwest::header::{AUTHORIZATION, CONTENT_ENCODING, CONTENT_TYPE};
use std::error::Error;
use std::time::Instant;
use tracing::{debug, error};

use crate::config::ExportConfig;
use crate::error::TransportError;

const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Gzip-compressed NDJSON for a single export call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritePayload {
    pub body: Vec<u8>,
    pub record_count: usize,
}

/// Builds the pooled HTTP client for `config`.
///
/// An unusable proxy is logged and the client falls back to a direct
/// connection, so a bad proxy setting never prevents the exporter from
/// starting.
#[must_use]
pub fn get_client(config: &ExportConfig) -> reqwest::Client {
    match build_client(config.https_proxy.as_deref(), config.timeout()) {
        Ok(client) => client,
        Err(e) => {
            error!(
                "Unable to parse proxy configuration: {}, falling back to direct connection",
                e
            );
            match build_client(None, config.timeout()) {
                Ok(client) => client,
                Err(inner) => {
                    error!(
                        "Failed to build HTTP client without proxy: {}, using reqwest defaults",
                        inner
                    );
                    reqwest::Client::new()
                }
            }
        }
    }
}

fn build_client(
    proxy_url: Option<&str>,
    timeout: Duration,
) -> Result<reqwest::Client, Box<dyn Error>> {
    let mut builder = reqwest::Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Some(Duration::from_secs(270)))
        .tcp_keepalive(Some(Duration::from_secs(120)));
    if let Some(proxy) = proxy_url {
        builder = builder.proxy(reqwest::Proxy::https(proxy)?);
    }
    Ok(builder.build()?)
}

#[derive(Debug, Clone)]
pub struct ListenerClient {
    client: reqwest::Client,
}

impl ListenerClient {
    #[must_use]
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            client: get_client(config),
        }
    }

    #[must_use]
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// POSTs `payload` to `endpoint`. Only a 2xx status counts as delivered.
    pub async fn send(
        &self,
        endpoint: &str,
        token: &str,
        payload: WritePayload,
    ) -> Result<(), TransportError> {
        let time = Instant::now();
        let resp = self
            .client
            .post(endpoint)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CONTENT_ENCODING, "gzip")
            .header(CONTENT_TYPE, NDJSON_CONTENT_TYPE)
            .body(payload.body)
            .send()
            .await?;
        let elapsed = time.elapsed();

        let status = resp.status();
        if status.is_success() {
            debug!(
                "TRACES | Sent {} records in {} ms",
                payload.record_count,
                elapsed.as_millis()
            );
            return Ok(());
        }

        // The body is only kept for the error message
        let body = resp.text().await.unwrap_or_default();
        Err(TransportError::Status { status, body })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mockito::Server;
    use reqwest::StatusCode;

    fn payload() -> WritePayload {
        WritePayload {
            body: vec![0x1f, 0x8b, 0x08],
            record_count: 1,
        }
    }

    fn client() -> ListenerClient {
        ListenerClient::new(&ExportConfig {
            traces_token: "test".to_string(),
            timeout_secs: 5,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_send_posts_with_token_and_encoding() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("authorization", "Bearer secret")
            .match_header("content-encoding", "gzip")
            .match_header("content-type", NDJSON_CONTENT_TYPE)
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let result = client().send(&server.url(), "secret", payload()).await;
        assert!(result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_status(503)
            .with_body("unavailable")
            .expect(1)
            .create_async()
            .await;

        let result = client().send(&server.url(), "secret", payload()).await;
        match result {
            Err(TransportError::Status { status, body }) => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(body, "unavailable");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        // no retry
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        // Port 9 (discard) is not expected to accept connections on the test host
        let result = client()
            .send("http://127.0.0.1:9", "secret", payload())
            .await;
        assert!(matches!(
            result,
            Err(TransportError::Request(_) | TransportError::Timeout)
        ));
    }

    #[tokio::test]
    async fn test_stalled_listener_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let client = ListenerClient::new(&ExportConfig {
            traces_token: "test".to_string(),
            timeout_secs: 1,
            ..Default::default()
        });
        let started = Instant::now();
        let result = client
            .send(&format!("http://{addr}"), "secret", payload())
            .await;
        assert!(matches!(result, Err(TransportError::Timeout)));
        assert!(started.elapsed() >= Duration::from_secs(1));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_bad_proxy_falls_back_to_direct_client() {
        let config = ExportConfig {
            traces_token: "test".to_string(),
            https_proxy: Some("::not a url::".to_string()),
            ..Default::default()
        };
        // must not panic
        let _client = ListenerClient::new(&config);
    }
}
