//! Generic inflate of compressed replay regions.
//!
//! Compressed replays store their sections as a zlib stream starting at a
//! revision-dependent offset. The detector does not know that offset up
//! front, so it calls [`inflate_at`] for each candidate and scores the
//! output. Output size is capped to keep a hostile stream from expanding
//! without bound.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::error::{ParserError, Result};

/// Inflates the zlib stream starting at `offset`.
///
/// Trailing bytes after the end of the stream are ignored.
///
/// # Errors
///
/// - `ParserError::OutOfBounds` if `offset` is past the end of `data`
/// - `ParserError::DecompressionError` if the stream is invalid, empty, or
///   inflates to more than `limit` bytes
pub fn inflate_at(data: &[u8], offset: usize, limit: usize) -> Result<Vec<u8>> {
    if offset >= data.len() {
        return Err(ParserError::out_of_bounds(1, offset, data.len()));
    }

    let compressed = &data[offset..];
    let mut output = Vec::new();
    // One extra byte lets us tell "exactly at the limit" from "over it".
    let mut decoder = ZlibDecoder::new(compressed).take(limit as u64 + 1);
    decoder
        .read_to_end(&mut output)
        .map_err(|e| ParserError::DecompressionError {
            reason: format!("inflate at offset 0x{offset:X} failed: {e}"),
        })?;

    if output.len() > limit {
        return Err(ParserError::DecompressionError {
            reason: format!("inflate at offset 0x{offset:X} exceeds {limit} bytes"),
        });
    }
    if output.is_empty() {
        return Err(ParserError::DecompressionError {
            reason: format!("inflate at offset 0x{offset:X} produced no data"),
        });
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn zlib(payload: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(payload).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_inflate_at_zero() {
        // "Test" compressed with zlib (12 bytes)
        let data = [
            0x78, 0x9C, 0x0B, 0x49, 0x2D, 0x2E, 0x01, 0x00, 0x03, 0xDD, 0x01, 0xA1,
        ];
        assert_eq!(inflate_at(&data, 0, 1024).unwrap(), b"Test");
    }

    #[test]
    fn test_inflate_at_offset_with_trailing_bytes() {
        let mut data = b"JUNKJUNK".to_vec();
        data.extend_from_slice(&zlib(b"section payload"));
        data.extend_from_slice(b"trailer");
        assert_eq!(inflate_at(&data, 8, 1024).unwrap(), b"section payload");
    }

    #[test]
    fn test_inflate_invalid_stream() {
        let data = [0xFF; 32];
        assert!(matches!(
            inflate_at(&data, 0, 1024),
            Err(ParserError::DecompressionError { .. })
        ));
    }

    #[test]
    fn test_inflate_respects_limit() {
        let data = zlib(&[0u8; 4096]);
        assert!(inflate_at(&data, 0, 4096).is_ok());
        assert!(matches!(
            inflate_at(&data, 0, 1000),
            Err(ParserError::DecompressionError { .. })
        ));
    }

    #[test]
    fn test_inflate_offset_past_end() {
        let data = [0x78, 0x9C];
        assert!(matches!(
            inflate_at(&data, 2, 1024),
            Err(ParserError::OutOfBounds { .. })
        ));
    }
}
