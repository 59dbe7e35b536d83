// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Per-call orchestration of convert, write and lifecycle checks.
//!
//! Trace export is best effort: once a batch has been converted, failures to
//! deliver it are logged and the call still succeeds. Conversion failures are
//! the only per-call errors surfaced to the caller besides lifecycle and
//! disabled-signal rejections.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::config::ExportConfig;
use crate::converter::{Converter, ListenerConverter};
use crate::error::{ConfigurationError, ExportError, Signal, TransportError};
use crate::model::{MetricBatch, TraceBatch};
use crate::writer::{HttpSpanWriter, SpanWriter};

#[async_trait]
pub trait Exporter: Send + Sync {
    /// Converts `batch` and ships it to the listener as one payload.
    async fn consume_traces(
        &self,
        cancel: &CancellationToken,
        batch: &TraceBatch,
    ) -> Result<(), ExportError>;

    async fn consume_metrics(
        &self,
        cancel: &CancellationToken,
        batch: &MetricBatch,
    ) -> Result<(), ExportError>;

    /// Stops accepting batches and releases the transport. Idempotent.
    ///
    /// The exporter stops accepting batches even when `cancel` fires before
    /// the transport is released.
    async fn shutdown(&self, cancel: &CancellationToken) -> Result<(), ExportError>;
}

#[allow(clippy::module_name_repetitions)]
pub struct ListenerExporter<C = ListenerConverter, W = HttpSpanWriter> {
    config: Arc<ExportConfig>,
    converter: C,
    /// Absent when the traces signal is disabled.
    writer: Option<W>,
    shut_down: AtomicBool,
}

impl ListenerExporter {
    /// Builds an exporter shipping to the listener described by `config`.
    pub fn new(config: Option<ExportConfig>) -> Result<Self, ConfigurationError> {
        let config = config.ok_or(ConfigurationError::Missing)?;
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    /// `config` must already have passed [`ExportConfig::validate`].
    pub(crate) fn from_validated(config: ExportConfig) -> Self {
        let writer = config
            .traces_enabled()
            .then(|| HttpSpanWriter::new(&config));
        Self::assemble(config, ListenerConverter, writer)
    }
}

impl<C, W> ListenerExporter<C, W>
where
    C: Converter,
    W: SpanWriter,
{
    pub fn with_components(
        config: ExportConfig,
        converter: C,
        writer: W,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self::assemble(config, converter, Some(writer)))
    }

    fn assemble(config: ExportConfig, converter: C, writer: Option<W>) -> Self {
        Self {
            config: Arc::new(config),
            converter,
            writer,
            shut_down: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    fn check_accepting(&self, signal: Signal) -> Result<(), ExportError> {
        if self.is_shut_down() {
            return Err(ExportError::ShutDown);
        }
        if !self.config.enabled(signal) {
            return Err(ExportError::SignalDisabled(signal));
        }
        Ok(())
    }
}

#[async_trait]
impl<C, W> Exporter for ListenerExporter<C, W>
where
    C: Converter,
    W: SpanWriter,
{
    async fn consume_traces(
        &self,
        cancel: &CancellationToken,
        batch: &TraceBatch,
    ) -> Result<(), ExportError> {
        self.check_accepting(Signal::Traces)?;
        let Some(writer) = &self.writer else {
            return Err(ExportError::SignalDisabled(Signal::Traces));
        };

        let records = self.converter.convert(batch)?;
        if records.is_empty() {
            debug!("TRACES | Nothing to export");
            return Ok(());
        }

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(TransportError::Cancelled),
            result = writer.write(&records) => result,
        };

        match result {
            Ok(()) => debug!(
                "TRACES | Exported {} spans as {} records",
                batch.span_count(),
                records.len()
            ),
            Err(TransportError::Cancelled) => warn!(
                "TRACES | Export of {} records cancelled before completion",
                records.len()
            ),
            Err(e) => error!("TRACES | Failed to export {} records: {e}", records.len()),
        }
        Ok(())
    }

    async fn consume_metrics(
        &self,
        _cancel: &CancellationToken,
        batch: &MetricBatch,
    ) -> Result<(), ExportError> {
        self.check_accepting(Signal::Metrics)?;

        if !batch.is_empty() {
            warn!(
                "METRICS | Metric export is not supported, dropping {} points",
                batch.len()
            );
        }
        Ok(())
    }

    async fn shutdown(&self, cancel: &CancellationToken) -> Result<(), ExportError> {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if let Some(writer) = &self.writer {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    warn!("TRACES | Shutdown cancelled before the transport was released");
                    return Ok(());
                }
                () = writer.shutdown() => {}
            }
        }
        debug!("Exporter shut down");
        Ok(())
    }
}
