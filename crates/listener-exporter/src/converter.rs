// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Conversion of [`TraceBatch`]es into listener records.
//!
//! The output always lists every span record first, in input order, followed
//! by one service record per distinct (service, operation) pair in the order
//! the pairs were first seen.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ConversionError;
use crate::model::{KeyValue, Process, ProcessRef, ReferenceType, Span, TraceBatch};
use crate::records::{
    tag_map, ConvertedRecord, LogRecord, ProcessRecord, RefType, ReferenceRecord, ServiceRecord,
    SpanRecord, TagRecord, SPAN_RECORD_TYPE,
};

const SPAN_KIND_TAG_KEY: &str = "span.kind";
const HOSTNAME_TAG_KEY: &str = "hostname";

/// Turns a batch into the records written to the listener.
///
/// Implemented for plain functions and closures so callers can swap in their
/// own conversion.
pub trait Converter: Send + Sync {
    fn convert(&self, batch: &TraceBatch) -> Result<Vec<ConvertedRecord>, ConversionError>;
}

impl<F> Converter for F
where
    F: Fn(&TraceBatch) -> Result<Vec<ConvertedRecord>, ConversionError> + Send + Sync,
{
    fn convert(&self, batch: &TraceBatch) -> Result<Vec<ConvertedRecord>, ConversionError> {
        self(batch)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListenerConverter;

impl Converter for ListenerConverter {
    fn convert(&self, batch: &TraceBatch) -> Result<Vec<ConvertedRecord>, ConversionError> {
        let shared_processes: Vec<ProcessRecord> =
            batch.processes.iter().map(process_record).collect();

        let mut span_records = Vec::with_capacity(batch.spans.len());
        let mut service_records = Vec::new();
        let mut seen_services: HashSet<(&str, &str)> = HashSet::new();

        for (span_index, span) in batch.spans.iter().enumerate() {
            if span.trace_id.is_empty() {
                return Err(ConversionError::EmptyTraceId(span_index));
            }
            if span.span_id.is_empty() {
                return Err(ConversionError::EmptySpanId(span_index));
            }

            let (service_name, process) = match &span.process {
                ProcessRef::Index(process_index) => {
                    let (Some(process), Some(record)) = (
                        batch.processes.get(*process_index),
                        shared_processes.get(*process_index),
                    ) else {
                        return Err(ConversionError::ProcessIndexOutOfRange {
                            span_index,
                            process_index: *process_index,
                            process_count: batch.processes.len(),
                        });
                    };
                    (process.service_name.as_str(), record.clone())
                }
                ProcessRef::Inline(process) => {
                    (process.service_name.as_str(), process_record(process))
                }
            };

            if seen_services.insert((service_name, span.operation_name.as_str())) {
                service_records.push(ServiceRecord::new(service_name, &span.operation_name));
            }
            span_records.push(span_record(span, process));
        }

        Ok(span_records
            .into_iter()
            .map(ConvertedRecord::Span)
            .chain(service_records.into_iter().map(ConvertedRecord::Service))
            .collect())
    }
}

fn process_record(process: &Process) -> ProcessRecord {
    let mut tags: Vec<TagRecord> = process.tags.iter().map(TagRecord::from).collect();
    if let Some(host) = &process.host {
        if !process.tags.iter().any(|kv| kv.key == HOSTNAME_TAG_KEY) {
            tags.push(TagRecord::from(&KeyValue::string(HOSTNAME_TAG_KEY, host)));
        }
    }
    ProcessRecord {
        service_name: process.service_name.clone(),
        tag: tag_map(&tags),
        tags,
    }
}

fn span_record(span: &Span, process: ProcessRecord) -> SpanRecord {
    let trace_id = span.trace_id.to_string();
    let start_time = unix_micros(span.start_time);

    let mut references = Vec::with_capacity(span.references.len() + 1);
    if let Some(parent) = span.parent_span_id {
        references.push(ReferenceRecord {
            ref_type: RefType::ChildOf,
            trace_id: trace_id.clone(),
            span_id: parent.to_string(),
        });
    }
    for reference in &span.references {
        let is_parent = reference.ref_type == ReferenceType::ChildOf
            && reference.trace_id == span.trace_id
            && Some(reference.span_id) == span.parent_span_id;
        if is_parent {
            continue;
        }
        references.push(ReferenceRecord {
            ref_type: match reference.ref_type {
                ReferenceType::ChildOf => RefType::ChildOf,
                ReferenceType::FollowsFrom => RefType::FollowsFrom,
            },
            trace_id: reference.trace_id.to_string(),
            span_id: reference.span_id.to_string(),
        });
    }

    let mut tags: Vec<TagRecord> = span.tags.iter().map(TagRecord::from).collect();
    if let Some(kind) = span.kind.as_tag_value() {
        if !span.tags.iter().any(|kv| kv.key == SPAN_KIND_TAG_KEY) {
            tags.push(TagRecord::from(&KeyValue::string(SPAN_KIND_TAG_KEY, kind)));
        }
    }

    let logs = span
        .logs
        .iter()
        .map(|log| LogRecord {
            timestamp: unix_micros(log.timestamp),
            fields: log.fields.iter().map(TagRecord::from).collect(),
        })
        .collect();

    SpanRecord {
        trace_id,
        span_id: span.span_id.to_string(),
        operation_name: span.operation_name.clone(),
        references,
        flags: span.flags,
        start_time,
        start_time_millis: start_time / 1_000,
        timestamp: start_time / 1_000,
        duration: u64::try_from(span.duration.as_micros()).unwrap_or(u64::MAX),
        tag: tag_map(&tags),
        tags,
        logs,
        process,
        record_type: SPAN_RECORD_TYPE.to_string(),
    }
}

/// Times before the epoch clamp to zero.
fn unix_micros(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_micros()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
