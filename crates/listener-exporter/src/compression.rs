// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Gzip framing of listener payloads.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};

pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Gzip-compresses `data` at `level` (0-9, higher values are clamped).
pub fn compress(data: &[u8], level: u32) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(
        Vec::with_capacity(data.len() / 4),
        Compression::new(level.min(9)),
    );
    encoder.write_all(data)?;
    encoder.finish()
}

/// Inverse of [`compress`], used to verify payloads.
pub fn decompress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_round_trip() {
        let compressed = compress(&[], DEFAULT_COMPRESSION_LEVEL).unwrap();
        // gzip header and trailer are always present
        assert!(!compressed.is_empty());
        assert!(decompress(&compressed).unwrap().is_empty());
    }

    #[test]
    fn test_gzip_magic() {
        let compressed = compress(b"{\"a\":1}\n", DEFAULT_COMPRESSION_LEVEL).unwrap();
        assert_eq!(&compressed[..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn test_decompress_garbage_fails() {
        assert!(decompress(b"not gzip").is_err());
    }

    proptest! {
        #[test]
        fn round_trip(data in proptest::collection::vec(any::<u8>(), 0..4096), level in 0u32..12) {
            let compressed = compress(&data, level).unwrap();
            prop_assert_eq!(decompress(&compressed).unwrap(), data);
        }
    }
}
