// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use tracing::error;

use crate::records::ConvertedRecord;

/// Renders records as newline-delimited JSON, one object per line, keeping
/// their order.
#[must_use]
pub fn serialize(records: &[ConvertedRecord]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(records.len() * 256);
    for record in records {
        // Writing into a Vec only fails on a non-serializable record
        match serde_json::to_writer(&mut buf, record) {
            Ok(()) => buf.push(b'\n'),
            Err(e) => error!("TRACES | Dropping record that failed to serialize: {e}"),
        }
    }
    buf
}
