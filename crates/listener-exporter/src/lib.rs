// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! # Listener Exporter
//!
//! Ships trace batches to a listener intake. Each export call converts a
//! [`TraceBatch`] into span and service records, writes them as
//! newline-delimited JSON, gzip-compresses the result and POSTs it once with
//! the account's bearer token.
//!
//! - [`converter`]: batch to records
//! - [`serializer`] and [`compression`]: the payload body
//! - [`transport`] and [`writer`]: delivery
//! - [`exporter`] and [`factory`]: the per-signal entry points
//!
//! Delivery is best effort. Transport failures are logged and the export call
//! still succeeds; conversion failures are returned.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod compression;
pub mod config;
pub mod converter;
pub mod error;
pub mod exporter;
pub mod factory;
pub mod model;
pub mod records;
pub mod serializer;
pub mod transport;
pub mod writer;

pub use config::ExportConfig;
pub use converter::{Converter, ListenerConverter};
pub use error::{ConfigurationError, ConversionError, ExportError, Signal, TransportError};
pub use exporter::{Exporter, ListenerExporter};
pub use factory::{create_metrics_exporter, create_traces_exporter};
pub use model::{
    KeyValue, MetricBatch, MetricPoint, Process, ProcessRef, Span, SpanId, SpanKind, TagValue,
    TraceBatch, TraceId,
};
pub use records::ConvertedRecord;
pub use writer::{HttpSpanWriter, SpanWriter};
