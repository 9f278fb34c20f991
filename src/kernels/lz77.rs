//! This module contains the pure, stateless kernel for LZ77 dictionary
//! compression with a sliding window.
//!
//! The token format is fixed-width: a big-endian `u16` back-reference offset,
//! a `u8` match length, and (usually) one literal "next" byte. A literal-only
//! token is written as `(0, 0, byte)`. The next byte is omitted in exactly one
//! case: a match whose run reaches the end of the input. The decoder detects
//! that case by running out of bytes after the length field.
//!
//! Matches shorter than [`MIN_MATCH`] are emitted as literals, since a token
//! costs three bytes and a short match would break even at best. When several
//! window positions yield the same best length, the match nearest to the
//! cursor wins; nearer offsets are smaller numbers and model recency.

use std::io::Cursor;

use crate::error::CrunchError;

/// Minimum match length worth a token over plain literals.
pub const MIN_MATCH: usize = 3;

/// Hard cap on the window so an offset always fits the token's `u16`.
const MAX_WINDOW: usize = u16::MAX as usize;

/// Hard cap on the lookahead so a length always fits the token's `u8`.
const MAX_LOOKAHEAD: usize = u8::MAX as usize;

/// Encodes the input as a stream of LZ77 tokens.
///
/// `window` and `lookahead` are clamped to the limits of the token format.
pub fn encode(
    input: &[u8],
    output_buf: &mut Vec<u8>,
    window: usize,
    lookahead: usize,
) -> Result<(), CrunchError> {
    output_buf.clear();
    let window = window.clamp(1, MAX_WINDOW);
    let lookahead = lookahead.clamp(1, MAX_LOOKAHEAD);

    let mut pos = 0usize;
    while pos < input.len() {
        let window_start = pos.saturating_sub(window);
        let max_len = lookahead.min(input.len() - pos);

        let mut best_len = 0usize;
        let mut best_offset = 0usize;
        // Scan from the nearest window position outward, keeping the first
        // strictly-better match. Equal-length candidates therefore resolve to
        // the smallest offset.
        for start in (window_start..pos).rev() {
            let mut len = 0usize;
            // The match source may run past `pos` into the region being
            // encoded; the decoder reproduces this by copying byte-by-byte.
            while len < max_len && input[start + len] == input[pos + len] {
                len += 1;
            }
            if len > best_len {
                best_len = len;
                best_offset = pos - start;
                if best_len == max_len {
                    break;
                }
            }
        }

        if best_len >= MIN_MATCH {
            output_buf.extend_from_slice(&(best_offset as u16).to_be_bytes());
            output_buf.push(best_len as u8);
            match input.get(pos + best_len) {
                Some(&next) => {
                    output_buf.push(next);
                    pos += best_len + 1;
                }
                // Match runs to end of input; the trailing byte is omitted.
                None => {
                    pos += best_len;
                }
            }
        } else {
            output_buf.extend_from_slice(&0u16.to_be_bytes());
            output_buf.push(0);
            output_buf.push(input[pos]);
            pos += 1;
        }
    }
    Ok(())
}

fn read_byte(cursor: &mut Cursor<&[u8]>, context: &str) -> Result<u8, CrunchError> {
    let pos = cursor.position() as usize;
    let byte = *cursor
        .get_ref()
        .get(pos)
        .ok_or_else(|| CrunchError::Lz77Decode(format!("Truncated token: {context}")))?;
    cursor.set_position((pos + 1) as u64);
    Ok(byte)
}

/// Decodes a stream of LZ77 tokens back into the original bytes.
pub fn decode(input: &[u8], output_buf: &mut Vec<u8>) -> Result<(), CrunchError> {
    output_buf.clear();
    let mut cursor = Cursor::new(input);

    while (cursor.position() as usize) < input.len() {
        let hi = read_byte(&mut cursor, "missing offset high byte")?;
        let lo = read_byte(&mut cursor, "missing offset low byte")?;
        let offset = u16::from_be_bytes([hi, lo]) as usize;
        let length = read_byte(&mut cursor, "missing length byte")? as usize;

        if offset == 0 && length == 0 {
            let literal = read_byte(&mut cursor, "missing literal byte")?;
            output_buf.push(literal);
            continue;
        }

        if offset == 0 || offset > output_buf.len() {
            return Err(CrunchError::Lz77Decode(format!(
                "Back-reference offset {} exceeds {} decoded bytes",
                offset,
                output_buf.len()
            )));
        }

        // Byte-by-byte copy so overlapping references (offset < length)
        // replicate the run the way the encoder saw it.
        let start = output_buf.len() - offset;
        for i in 0..length {
            let byte = output_buf[start + i];
            output_buf.push(byte);
        }

        // The next byte is absent only when the final match consumed the
        // rest of the input.
        if (cursor.position() as usize) < input.len() {
            let next = read_byte(&mut cursor, "missing next byte")?;
            output_buf.push(next);
        }
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
        encode(input, &mut encoded, 4096, 64).unwrap();
        let mut decoded = Vec::new();
        decode(&encoded, &mut decoded).unwrap();
        decoded
    }

    #[test]
    fn test_lz77_roundtrip_repetitive_text() {
        let input = b"abracadabra abracadabra abracadabra";
        assert_eq!(roundtrip(input), input);
    }

    #[test]
    fn test_lz77_roundtrip_no_matches() {
        let input: Vec<u8> = (0..=255).collect();
        assert_eq!(roundtrip(&input), input);
    }

    #[test]
    fn test_lz77_empty_input() {
        assert_eq!(roundtrip(&[]), Vec::<u8>::new());
    }

    #[test]
    fn test_lz77_overlapping_match() {
        // "aaaa..." forces a back-reference whose source overlaps its
        // destination (offset 1, length > 1).
        let input = vec![b'a'; 200];
        assert_eq!(roundtrip(&input), input);
    }

    #[test]
    fn test_lz77_trailing_match_omits_next_byte() {
        // "abcabc": the second "abc" matches to end-of-input, so the final
        // token carries no literal. Stream is literal*3 (4 bytes each) plus
        // one 3-byte token.
        let input = b"abcabc";
        let mut encoded = Vec::new();
        encode(input, &mut encoded, 4096, 64).unwrap();
        assert_eq!(encoded.len(), 3 * 4 + 3);

        let mut decoded = Vec::new();
        decode(&encoded, &mut decoded).unwrap();
        assert_eq!(decoded, input);
    }

    #[test]
    fn test_lz77_prefers_nearest_offset_on_ties() {
        // At the final "abc", both offset 4 and offset 8 yield a length-3
        // match; the nearer one must win.
        let input = b"abcXabcYabc";
        let mut encoded = Vec::new();
        encode(input, &mut encoded, 4096, 64).unwrap();

        // Tokens: 4 literals ("abcX"), a match+next ("abc" + 'Y'), then the
        // trailing match with no next byte.
        assert_eq!(encoded.len(), 16 + 4 + 3);
        let final_token = &encoded[20..23];
        let offset = u16::from_be_bytes([final_token[0], final_token[1]]);
        assert_eq!(offset, 4);
        assert_eq!(final_token[2], 3);

        let mut decoded = Vec::new();
        decode(&encoded, &mut decoded).unwrap();
        assert_eq!(decoded, input);
    }

    #[test]
    fn test_lz77_decode_invalid_offset() {
        // Offset 5 with nothing decoded yet.
        let stream = [0x00, 0x05, 0x03, b'x'];
        let mut decoded = Vec::new();
        let result = decode(&stream, &mut decoded);
        assert!(matches!(result, Err(CrunchError::Lz77Decode(_))));
    }

    #[test]
    fn test_lz77_decode_truncated_token() {
        let stream = [0x00, 0x00];
        let mut decoded = Vec::new();
        let result = decode(&stream, &mut decoded);
        assert!(matches!(result, Err(CrunchError::Lz77Decode(_))));
    }

    #[test]
    fn test_lz77_short_matches_stay_literal() {
        // A two-byte repeat is below MIN_MATCH and must not produce a
        // back-reference.
        let input = b"ab ab";
        let mut encoded = Vec::new();
        encode(input, &mut encoded, 4096, 64).unwrap();
        assert_eq!(encoded.len(), input.len() * 4);
        assert_eq!(roundtrip(input), input);
    }
}
