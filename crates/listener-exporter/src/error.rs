// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy of the exporter.
//!
//! Each class maps to one propagation rule:
//! - [`ConfigurationError`] aborts construction, no exporter is produced.
//! - [`ConversionError`] is returned to the caller of `consume_traces`.
//! - [`TransportError`] is logged and swallowed on the traces path.

use reqwest::StatusCode;
use std::fmt;

/// Telemetry signal an exporter can be activated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Traces,
    Metrics,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Traces => f.write_str("traces"),
            Signal::Metrics => f.write_str("metrics"),
        }
    }
}

/// Errors raised while building an exporter.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("exporter configuration is missing")]
    Missing,

    #[error("no traces or metrics token configured")]
    NoToken,

    #[error("{0} token is empty, the {0} signal is disabled")]
    SignalDisabled(Signal),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised when a batch does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    #[error("span {span_index} references process {process_index} but the batch declares {process_count} processes")]
    ProcessIndexOutOfRange {
        span_index: usize,
        process_index: usize,
        process_count: usize,
    },

    #[error("span {0} has an all zeros trace id")]
    EmptyTraceId(usize),

    #[error("span {0} has an all zeros span id")]
    EmptySpanId(usize),
}

/// Errors raised on the write path. Never surfaced past the exporter for traces.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request to listener failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("request to listener timed out")]
    Timeout,

    #[error("listener responded with {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("export cancelled before the listener responded")]
    Cancelled,

    #[error("transport is closed")]
    Closed,

    #[error("failed to compress payload: {0}")]
    Compression(#[source] std::io::Error),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Request(err)
        }
    }
}

/// Errors returned to the upstream pipeline by the exporter entry points.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to convert traces: {0}")]
    Conversion(#[from] ConversionError),

    #[error("{0} signal is not enabled on this exporter")]
    SignalDisabled(Signal),

    #[error("exporter is shut down")]
    ShutDown,
}
