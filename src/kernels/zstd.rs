//! A thin kernel wrapping the `zstd` crate behind the common
//! `(input, &mut output_buf)` signature used by the other codecs.
//!
//! This is the workhorse lossless candidate: it nearly always beats the
//! educational codecs on real data, and having it behind the same interface
//! keeps the orchestrator oblivious to which kernels are hand-rolled.

use std::io::Write;

use crate::error::CrunchError;

/// Compresses the input at the given zstd level.
pub fn encode(input: &[u8], output_buf: &mut Vec<u8>, level: i32) -> Result<(), CrunchError> {
    output_buf.clear();
    let mut encoder = zstd::stream::Encoder::new(&mut *output_buf, level)
        .map_err(|e| CrunchError::ZstdError(format!("Failed to create encoder: {e}")))?;
    encoder
        .write_all(input)
        .map_err(|e| CrunchError::ZstdError(format!("Failed to write data: {e}")))?;
    encoder
        .finish()
        .map_err(|e| CrunchError::ZstdError(format!("Failed to finalize stream: {e}")))?;
    Ok(())
}

/// Decompresses a zstd frame.
pub fn decode(input: &[u8], output_buf: &mut Vec<u8>) -> Result<(), CrunchError> {
    output_buf.clear();
    let mut decoder = zstd::stream::Decoder::new(input)
        .map_err(|e| CrunchError::ZstdError(format!("Failed to create decoder: {e}")))?;
    std::io::copy(&mut decoder, output_buf)
        .map_err(|e| CrunchError::ZstdError(format!("Failed to decompress: {e}")))?;
    Ok(())
}

//==================================================================================
// Unit Tests
//==================================================================================
