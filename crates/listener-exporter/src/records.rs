// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Listener wire schema.
//!
//! The listener indexes two document kinds from the same stream: spans and
//! services. They are told apart by their fields (and the `type`
//! discriminator), never by framing.

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::debug;

use crate::model::{KeyValue, TagValue};

pub const SPAN_RECORD_TYPE: &str = "jaegerSpan";
pub const SERVICE_RECORD_TYPE: &str = "jaegerService";

/// Dots in tag keys would be read as object paths by the listener index.
const TAG_DOT_REPLACEMENT: &str = "@";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Bool,
    Int64,
    Float64,
    Binary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagRecord {
    pub key: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub value: Value,
}

impl From<&KeyValue> for TagRecord {
    fn from(kv: &KeyValue) -> Self {
        let (value_type, value) = match &kv.value {
            TagValue::String(s) => (ValueType::String, Value::from(s.as_str())),
            TagValue::Bool(b) => (ValueType::Bool, Value::from(*b)),
            TagValue::Int64(i) => (ValueType::Int64, Value::from(*i)),
            // NaN and infinities have no JSON form and become null
            TagValue::Float64(f) => (ValueType::Float64, Value::from(*f)),
            TagValue::Binary(bytes) => (
                ValueType::Binary,
                Value::from(base64::engine::general_purpose::STANDARD.encode(bytes)),
            ),
        };
        TagRecord {
            key: kv.key.clone(),
            value_type,
            value,
        }
    }
}

/// Builds the flattened `tag` object. When two keys flatten to the same
/// name (`a.b` and `a@b`) the first one is kept.
pub(crate) fn tag_map(tags: &[TagRecord]) -> BTreeMap<String, Value> {
    let mut map = BTreeMap::new();
    for tag in tags {
        match map.entry(tag.key.replace('.', TAG_DOT_REPLACEMENT)) {
            Entry::Vacant(entry) => {
                entry.insert(tag.value.clone());
            }
            Entry::Occupied(entry) => {
                debug!(
                    "TRACES | Tag '{}' collides with '{}', keeping the first",
                    tag.key,
                    entry.key()
                );
            }
        }
    }
    map
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefType {
    ChildOf,
    FollowsFrom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceRecord {
    pub ref_type: RefType,
    #[serde(rename = "traceID")]
    pub trace_id: String,
    #[serde(rename = "spanID")]
    pub span_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Microseconds since the Unix epoch.
    pub timestamp: u64,
    pub fields: Vec<TagRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRecord {
    pub service_name: String,
    #[serde(default)]
    pub tags: Vec<TagRecord>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tag: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanRecord {
    #[serde(rename = "traceID")]
    pub trace_id: String,
    #[serde(rename = "spanID")]
    pub span_id: String,
    pub operation_name: String,
    pub references: Vec<ReferenceRecord>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub flags: u32,
    /// Microseconds since the Unix epoch.
    pub start_time: u64,
    pub start_time_millis: u64,
    #[serde(rename = "@timestamp")]
    pub timestamp: u64,
    /// Microseconds.
    pub duration: u64,
    pub tags: Vec<TagRecord>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tag: BTreeMap<String, Value>,
    pub logs: Vec<LogRecord>,
    pub process: ProcessRecord,
    #[serde(rename = "type")]
    pub record_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    pub service_name: String,
    pub operation_name: String,
    #[serde(rename = "type")]
    pub record_type: String,
}

impl ServiceRecord {
    pub fn new(service_name: impl Into<String>, operation_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            operation_name: operation_name.into(),
            record_type: SERVICE_RECORD_TYPE.to_string(),
        }
    }
}

/// One line of the listener payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConvertedRecord {
    Span(SpanRecord),
    Service(ServiceRecord),
}

impl ConvertedRecord {
    #[must_use]
    pub fn is_span(&self) -> bool {
        matches!(self, ConvertedRecord::Span(_))
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(value: &u32) -> bool {
    *value == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_record_types() {
        let tag = TagRecord::from(&KeyValue::int64("http.status_code", 200));
        assert_eq!(tag.value_type, ValueType::Int64);
        assert_eq!(tag.value, Value::from(200));

        let tag = TagRecord::from(&KeyValue::binary("payload", vec![1, 2, 3]));
        assert_eq!(tag.value_type, ValueType::Binary);
        assert_eq!(tag.value, Value::from("AQID"));
    }

    #[test]
    fn test_tag_map_replaces_dots() {
        let tags = vec![
            TagRecord::from(&KeyValue::string("http.method", "GET")),
            TagRecord::from(&KeyValue::bool("error", false)),
        ];
        let map = tag_map(&tags);
        assert_eq!(map.get("http@method"), Some(&Value::from("GET")));
        assert_eq!(map.get("error"), Some(&Value::from(false)));
        assert!(!map.contains_key("http.method"));
    }

    #[test]
    fn test_tag_map_keeps_first_of_colliding_keys() {
        let tags = vec![
            TagRecord::from(&KeyValue::string("db.name", "orders")),
            TagRecord::from(&KeyValue::string("db@name", "shadow")),
        ];
        let map = tag_map(&tags);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("db@name"), Some(&Value::from("orders")));
    }

    #[test]
    fn test_service_record_json_shape() {
        let record = ConvertedRecord::Service(ServiceRecord::new("svc", "op"));
        let json = serde_json::to_value(&record).expect("serializable");
        assert_eq!(
            json,
            serde_json::json!({
                "serviceName": "svc",
                "operationName": "op",
                "type": "jaegerService",
            })
        );
    }

    #[test]
    fn test_reference_json_shape() {
        let reference = ReferenceRecord {
            ref_type: RefType::FollowsFrom,
            trace_id: "0000000000000001".to_string(),
            span_id: "0000000000000002".to_string(),
        };
        let json = serde_json::to_value(&reference).expect("serializable");
        assert_eq!(json["refType"], "FOLLOWS_FROM");
        assert_eq!(json["traceID"], "0000000000000001");
    }
}
