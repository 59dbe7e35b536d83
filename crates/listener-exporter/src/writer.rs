// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Backend write path: serialize, compress, send.

use async_trait::async_trait;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use crate::compression::compress;
use crate::config::ExportConfig;
use crate::error::{Signal, TransportError};
use crate::records::ConvertedRecord;
use crate::serializer::serialize;
use crate::transport::{ListenerClient, WritePayload};

/// Ships the records of one export call as a single payload.
#[async_trait]
pub trait SpanWriter: Send + Sync {
    async fn write(&self, records: &[ConvertedRecord]) -> Result<(), TransportError>;

    /// Releases transport resources. Writes issued afterwards fail with
    /// [`TransportError::Closed`].
    async fn shutdown(&self) {}
}

#[async_trait]
impl<W: SpanWriter + ?Sized> SpanWriter for Arc<W> {
    async fn write(&self, records: &[ConvertedRecord]) -> Result<(), TransportError> {
        (**self).write(records).await
    }

    async fn shutdown(&self) {
        (**self).shutdown().await;
    }
}

pub struct HttpSpanWriter {
    client: RwLock<Option<ListenerClient>>,
    endpoint: String,
    token: String,
    compression_level: u32,
}

impl HttpSpanWriter {
    /// Writer posting to the listener of `config` with the traces token.
    #[must_use]
    pub fn new(config: &ExportConfig) -> Self {
        Self::with_client(config, ListenerClient::new(config))
    }

    #[must_use]
    pub fn with_client(config: &ExportConfig, client: ListenerClient) -> Self {
        Self {
            client: RwLock::new(Some(client)),
            endpoint: config.listener_url(),
            token: config.token(Signal::Traces).to_string(),
            compression_level: config.compression_level,
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn client(&self) -> Option<ListenerClient> {
        self.client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SpanWriter for HttpSpanWriter {
    async fn write(&self, records: &[ConvertedRecord]) -> Result<(), TransportError> {
        let client = self.client().ok_or(TransportError::Closed)?;

        let ndjson = serialize(records);
        let body = compress(&ndjson, self.compression_level).map_err(TransportError::Compression)?;
        debug!(
            "TRACES | Compressed {} records from {} to {} bytes",
            records.len(),
            ndjson.len(),
            body.len()
        );

        client
            .send(
                &self.endpoint,
                &self.token,
                WritePayload {
                    body,
                    record_count: records.len(),
                },
            )
            .await
    }

    async fn shutdown(&self) {
        let released = self
            .client
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if released.is_some() {
            debug!("TRACES | Released listener client");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::records::ServiceRecord;
    use mockito::Server;

    fn config(endpoint: String) -> ExportConfig {
        ExportConfig {
            traces_token: "test".to_string(),
            custom_endpoint: Some(endpoint),
            timeout_secs: 5,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_write_sends_one_payload() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("authorization", "Bearer test")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let writer = HttpSpanWriter::new(&config(server.url()));
        let records = vec![
            ConvertedRecord::Service(ServiceRecord::new("a", "op")),
            ConvertedRecord::Service(ServiceRecord::new("b", "op")),
        ];
        writer.write(&records).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_write_after_shutdown_is_closed() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_status(200)
            .expect(0)
            .create_async()
            .await;

        let writer = HttpSpanWriter::new(&config(server.url()));
        writer.shutdown().await;
        let result = writer
            .write(&[ConvertedRecord::Service(ServiceRecord::new("a", "op"))])
            .await;
        assert!(matches!(result, Err(TransportError::Closed)));
        mock.assert_async().await;
    }
}
