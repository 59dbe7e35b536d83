// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Backend-neutral telemetry handed over by the upstream pipeline.
//!
//! A [`TraceBatch`] groups spans under the processes that emitted them. Spans
//! point at their process either by index into [`TraceBatch::processes`] or by
//! carrying it inline, so a batch coming from several services can share
//! process metadata without copying it per span.

use std::fmt;
use std::time::{Duration, SystemTime};

/// 128-bit trace identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TraceId(pub u128);

impl TraceId {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(u128::from_be_bytes(bytes))
    }

    #[must_use]
    pub fn high(&self) -> u64 {
        (self.0 >> 64) as u64
    }

    #[must_use]
    pub fn low(&self) -> u64 {
        self.0 as u64
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// The listener expects the short form when the high half is unset.
impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.high() == 0 {
            write!(f, "{:016x}", self.low())
        } else {
            write!(f, "{:016x}{:016x}", self.high(), self.low())
        }
    }
}

/// 64-bit span identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SpanId(pub u64);

impl SpanId {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    String(String),
    Bool(bool),
    Int64(i64),
    Float64(f64),
    Binary(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue {
    pub key: String,
    pub value: TagValue,
}

impl KeyValue {
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: TagValue::String(value.into()),
        }
    }

    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        Self {
            key: key.into(),
            value: TagValue::Bool(value),
        }
    }

    pub fn int64(key: impl Into<String>, value: i64) -> Self {
        Self {
            key: key.into(),
            value: TagValue::Int64(value),
        }
    }

    pub fn float64(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value: TagValue::Float64(value),
        }
    }

    pub fn binary(key: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            value: TagValue::Binary(value),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpanKind {
    #[default]
    Unspecified,
    Internal,
    Server,
    Client,
    Producer,
    Consumer,
}

impl SpanKind {
    /// Value of the `span.kind` tag, `None` when the kind carries no information.
    #[must_use]
    pub fn as_tag_value(&self) -> Option<&'static str> {
        match self {
            SpanKind::Unspecified => None,
            SpanKind::Internal => Some("internal"),
            SpanKind::Server => Some("server"),
            SpanKind::Client => Some("client"),
            SpanKind::Producer => Some("producer"),
            SpanKind::Consumer => Some("consumer"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceType {
    ChildOf,
    FollowsFrom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanReference {
    pub ref_type: ReferenceType,
    pub trace_id: TraceId,
    pub span_id: SpanId,
}

/// Timestamped event recorded on a span.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanLog {
    pub timestamp: SystemTime,
    pub fields: Vec<KeyValue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Process {
    pub service_name: String,
    pub host: Option<String>,
    pub tags: Vec<KeyValue>,
}

impl Process {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: KeyValue) -> Self {
        self.tags.push(tag);
        self
    }
}

/// How a span points at the process that emitted it.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessRef {
    /// Index into [`TraceBatch::processes`].
    Index(usize),
    Inline(Process),
}

impl Default for ProcessRef {
    fn default() -> Self {
        ProcessRef::Index(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub parent_span_id: Option<SpanId>,
    pub references: Vec<SpanReference>,
    pub operation_name: String,
    pub kind: SpanKind,
    pub flags: u32,
    pub start_time: SystemTime,
    pub duration: Duration,
    pub tags: Vec<KeyValue>,
    pub logs: Vec<SpanLog>,
    pub process: ProcessRef,
}

impl Default for Span {
    fn default() -> Self {
        Self {
            trace_id: TraceId::default(),
            span_id: SpanId::default(),
            parent_span_id: None,
            references: Vec::new(),
            operation_name: String::new(),
            kind: SpanKind::default(),
            flags: 0,
            start_time: SystemTime::UNIX_EPOCH,
            duration: Duration::ZERO,
            tags: Vec::new(),
            logs: Vec::new(),
            process: ProcessRef::default(),
        }
    }
}

impl Span {
    pub fn new(trace_id: TraceId, span_id: SpanId, operation_name: impl Into<String>) -> Self {
        Self {
            trace_id,
            span_id,
            operation_name: operation_name.into(),
            ..Default::default()
        }
    }
}

/// Spans grouped under the processes that produced them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceBatch {
    pub processes: Vec<Process>,
    pub spans: Vec<Span>,
}

impl TraceBatch {
    /// Builds a batch where every span belongs to `process`.
    #[must_use]
    pub fn with_process(process: Process, spans: Vec<Span>) -> Self {
        let spans = spans
            .into_iter()
            .map(|mut span| {
                span.process = ProcessRef::Index(0);
                span
            })
            .collect();
        Self {
            processes: vec![process],
            spans,
        }
    }

    #[must_use]
    pub fn span_count(&self) -> usize {
        self.spans.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    pub name: String,
    pub value: f64,
    pub timestamp: SystemTime,
    pub attributes: Vec<KeyValue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricBatch {
    pub points: Vec<MetricPoint>,
}

impl MetricBatch {
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
