//! This module contains the pure, stateless kernel for Run-Length Encoding.
//!
//! The encoded stream is a sequence of `(byte, leb128 count)` pairs. Using a
//! variable-length count instead of a fixed byte means a megabyte of zeros
//! collapses into a handful of bytes, and short runs still cost only two.
//! The tradeoff is the classic RLE one: input with no runs inflates, since
//! every byte becomes a pair. The orchestrator's keep-best rule absorbs that.

use std::io::Cursor;

use super::leb128;
use crate::error::CrunchError;

/// Sanity cap on the total decoded size. A tiny stream can legitimately
/// expand by orders of magnitude, but a declared run past this bound is
/// treated as malformed rather than allocated.
const MAX_DECODED_LEN: u64 = 1 << 31;

/// Encodes the input as `(byte, leb128 run_length)` pairs.
pub fn encode(input: &[u8], output_buf: &mut Vec<u8>) -> Result<(), CrunchError> {
    output_buf.clear();
    let mut iter = input.iter();
    let Some(&first) = iter.next() else {
        return Ok(());
    };

    let mut current = first;
    let mut run: u64 = 1;
    for &byte in iter {
        if byte == current {
            run += 1;
        } else {
            output_buf.push(current);
            leb128::encode_one(run, output_buf)?;
            current = byte;
            run = 1;
        }
    }
    output_buf.push(current);
    leb128::encode_one(run, output_buf)?;
    Ok(())
}

/// Decodes a stream of `(byte, leb128 run_length)` pairs.
pub fn decode(input: &[u8], output_buf: &mut Vec<u8>) -> Result<(), CrunchError> {
    output_buf.clear();
    let mut cursor = Cursor::new(input);

    while (cursor.position() as usize) < input.len() {
        let pos = cursor.position() as usize;
        let byte = input[pos];
        cursor.set_position((pos + 1) as u64);

        let run = leb128::decode_one::<u64>(&mut cursor)
            .map_err(|_| CrunchError::RleDecode("Truncated run length".to_string()))?;
        if run == 0 {
            return Err(CrunchError::RleDecode("Zero-length run".to_string()));
        }
        if run > MAX_DECODED_LEN - output_buf.len() as u64 {
            return Err(CrunchError::RleDecode(format!(
                "Run of {run} exceeds the decoded-size limit"
            )));
        }
        output_buf.resize(output_buf.len() + run as usize, byte);
    }
    Ok(())
}

//==================================================================================
// Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(input: &[u8]) -> Vec<u8> {
        let mut encoded = Vec::new();
        encode(input, &mut encoded).unwrap();
        let mut decoded = Vec::new();
        decode(&encoded, &mut decoded).unwrap();
        decoded
    }

    #[test]
    fn test_rle_roundtrip_runs() {
        let input = b"aaaaaaaaabbbccccccccc";
        assert_eq!(roundtrip(input), input);
    }

    #[test]
    fn test_rle_empty_input() {
        assert_eq!(roundtrip(&[]), Vec::<u8>::new());
    }

    #[test]
    fn test_rle_long_run_uses_varint_count() {
        let input = vec![0u8; 1_000_000];
        let mut encoded = Vec::new();
        encode(&input, &mut encoded).unwrap();
        // One byte plus a three-byte LEB128 count.
        assert_eq!(encoded.len(), 4);
        assert_eq!(roundtrip(&input), input);
    }

    #[test]
    fn test_rle_inflates_without_runs() {
        let input: Vec<u8> = (0..=255).collect();
        let mut encoded = Vec::new();
        encode(&input, &mut encoded).unwrap();
        assert_eq!(encoded.len(), input.len() * 2);
        assert_eq!(roundtrip(&input), input);
    }

    #[test]
    fn test_rle_decode_truncated_pair() {
        // A lone byte with its count missing.
        let mut decoded = Vec::new();
        let result = decode(&[b'a'], &mut decoded);
        assert!(matches!(result, Err(CrunchError::RleDecode(_))));
    }

    #[test]
    fn test_rle_decode_zero_run_rejected() {
        let mut decoded = Vec::new();
        let result = decode(&[b'a', 0x00], &mut decoded);
        assert!(matches!(result, Err(CrunchError::RleDecode(_))));
    }

    #[test]
    fn test_rle_decode_rejects_unreasonable_run() {
        // A few header bytes declaring a u64::MAX run must fail, not
        // allocate.
        let mut stream = vec![b'a'];
        leb128::encode_one(u64::MAX, &mut stream).unwrap();

        let mut decoded = Vec::new();
        let result = decode(&stream, &mut decoded);
        assert!(matches!(result, Err(CrunchError::RleDecode(_))));
    }
}
