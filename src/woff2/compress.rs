//! Brotli compression of the WOFF2 table data and metadata blocks.

use std::io::{Cursor, Read};

use brotli::enc::backward_references::BrotliEncoderMode;
use brotli::enc::BrotliEncoderParams;
use log::{debug, warn};

use crate::error::Woff2Error;

// This is the default size of the buffer in the brotli crate.
// There's no guidance on how to choose this value.
const BROTLI_DECODER_BUFFER_SIZE: usize = 4096;

/// The highest Brotli quality
pub const MAX_EFFORT: u8 = 11;

/// Window size used by the reference encoder
const LG_WINDOW: i32 = 22;

/// Compress `data` with Brotli in font mode.
///
/// `effort` is the Brotli quality, clamped to 11. If the encoder fails the next lower quality is
/// tried, the error is only returned when quality 0 fails too.
pub fn compress(data: &[u8], effort: u8) -> Result<Vec<u8>, Woff2Error> {
    let effort = if effort > MAX_EFFORT {
        warn!("compression effort {} clamped to {}", effort, MAX_EFFORT);
        MAX_EFFORT
    } else {
        effort
    };

    let mut last_error = String::new();
    for quality in (0..=effort).rev() {
        match compress_with_quality(data, quality) {
            Ok(compressed) => return Ok(compressed),
            Err(err) => {
                debug!("brotli quality {} failed: {}", quality, err);
                last_error = err.to_string();
            }
        }
    }

    Err(Woff2Error::Compression(last_error))
}

fn compress_with_quality(data: &[u8], quality: u8) -> Result<Vec<u8>, std::io::Error> {
    let params = BrotliEncoderParams {
        quality: i32::from(quality),
        lgwin: LG_WINDOW,
        mode: BrotliEncoderMode::BROTLI_MODE_FONT,
        size_hint: data.len(),
        ..BrotliEncoderParams::default()
    };
    let mut compressed = Vec::new();
    brotli::BrotliCompress(&mut Cursor::new(data), &mut compressed, &params)?;

    Ok(compressed)
}

/// Decompress `data`, which must decompress to exactly `expected_length` bytes.
pub fn decompress(data: &[u8], expected_length: usize) -> Result<Vec<u8>, Woff2Error> {
    let input =
        brotli_decompressor::Decompressor::new(Cursor::new(data), BROTLI_DECODER_BUFFER_SIZE);
    let mut output = Vec::new();
    // Read one byte past the expected length so that overlong streams are detected without
    // decompressing all of them
    let limit = u64::try_from(expected_length)
        .ok()
        .and_then(|length| length.checked_add(1))
        .ok_or(Woff2Error::Decompression("expected length too large"))?;
    input
        .take(limit)
        .read_to_end(&mut output)
        .map_err(|_err| Woff2Error::Decompression("corrupt or truncated brotli stream"))?;

    if output.len() != expected_length {
        return Err(Woff2Error::Decompression(
            "decompressed size does not match the table directory",
        ));
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<u8> {
        (0..4000u32).map(|i| (i % 251) as u8 ^ (i / 97) as u8).collect()
    }

    #[test]
    fn test_round_trip() {
        let data = sample();
        for effort in [0, 5, 11] {
            let compressed = compress(&data, effort).unwrap();
            assert_eq!(decompress(&compressed, data.len()).unwrap(), data);
        }
    }

    #[test]
    fn test_effort_is_clamped() {
        let data = sample();
        assert_eq!(
            compress(&data, 200).unwrap(),
            compress(&data, MAX_EFFORT).unwrap()
        );
    }

    #[test]
    fn test_length_mismatch() {
        let data = sample();
        let compressed = compress(&data, 4).unwrap();
        assert!(matches!(
            decompress(&compressed, data.len() - 1),
            Err(Woff2Error::Decompression(_))
        ));
        assert!(matches!(
            decompress(&compressed, data.len() + 1),
            Err(Woff2Error::Decompression(_))
        ));
    }

    #[test]
    fn test_truncated_stream() {
        let data = sample();
        let compressed = compress(&data, 4).unwrap();
        assert!(matches!(
            decompress(&compressed[..compressed.len() / 2], data.len()),
            Err(Woff2Error::Decompression(_))
        ));
    }

    #[test]
    fn test_empty() {
        let compressed = compress(&[], 11).unwrap();
        assert_eq!(decompress(&compressed, 0).unwrap(), Vec::<u8>::new());
    }
}
