//! This module contains the pure, stateless kernel for LEB128 (Little-Endian
//! Base 128) variable-length integer encoding and decoding.
//!
//! The RLE kernel uses it for run lengths and the artifact module uses it for
//! header fields, so most encoded values are small and fit in one byte. The
//! implementation is generic over unsigned integers and fully panic-free.

use num_traits::{PrimInt, ToPrimitive, Unsigned};
use std::io::Cursor;

use crate::error::CrunchError;

/// Encodes a single unsigned integer as a LEB128 byte sequence, appending to
/// the buffer.
pub fn encode_one<T>(mut value: T, buffer: &mut Vec<u8>) -> Result<(), CrunchError>
where
    T: PrimInt + Unsigned,
{
    let zero = T::zero();
    let low_seven = T::from(0x7F).ok_or_else(|| {
        CrunchError::Internal("LEB128 mask does not fit the integer type".to_string())
    })?;
    let continuation = T::from(0x80).ok_or_else(|| {
        CrunchError::Internal("LEB128 continuation bit does not fit the integer type".to_string())
    })?;

    loop {
        let mut byte = value & low_seven;
        value = value >> 7;
        if value != zero {
            byte = byte | continuation;
        }
        let byte_u8 = byte.to_u8().ok_or_else(|| {
            CrunchError::Internal("LEB128 byte did not fit in u8".to_string())
        })?;
        buffer.push(byte_u8);
        if value == zero {
            return Ok(());
        }
    }
}

/// Decodes a single unsigned integer from a LEB128 byte stream cursor.
pub fn decode_one<T>(cursor: &mut Cursor<&[u8]>) -> Result<T, CrunchError>
where
    T: PrimInt + Unsigned,
{
    let mut result = T::zero();
    let mut shift = 0usize;
    let total_bits = std::mem::size_of::<T>() * 8;

    loop {
        let pos = cursor.position() as usize;
        let byte = *cursor
            .get_ref()
            .get(pos)
            .ok_or_else(|| CrunchError::Leb128Decode("Unexpected end of buffer".to_string()))?;
        cursor.set_position((pos + 1) as u64);

        let payload = T::from(byte & 0x7F).ok_or_else(|| {
            CrunchError::Leb128Decode("7-bit payload does not fit the integer type".to_string())
        })?;
        result = result | (payload << shift);

        if byte & 0x80 == 0 {
            return Ok(result);
        }

        shift += 7;
        if shift >= total_bits {
            return Err(CrunchError::Leb128Decode(
                "Integer overflow during decoding".to_string(),
            ));
        }
    }
}

//==================================================================================
// Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: u64) -> u64 {
        let mut buf = Vec::new();
        encode_one(value, &mut buf).unwrap();
        let mut cursor = Cursor::new(buf.as_slice());
        decode_one::<u64>(&mut cursor).unwrap()
    }

    #[test]
    fn test_leb128_roundtrip_boundaries() {
        for value in [0u64, 1, 127, 128, 16383, 16384, 624485, u64::MAX] {
            assert_eq!(roundtrip(value), value);
        }
    }

    #[test]
    fn test_leb128_single_byte_for_small_values() {
        let mut buf = Vec::new();
        encode_one(42u64, &mut buf).unwrap();
        assert_eq!(buf, vec![42]);
    }

    #[test]
    fn test_decode_truncated_buffer() {
        // 624485 encodes to [0xE5, 0x8E, 0x26]; cut the final byte.
        let mut buf = Vec::new();
        encode_one(624485u64, &mut buf).unwrap();
        buf.truncate(buf.len() - 1);

        let mut cursor = Cursor::new(buf.as_slice());
        let result = decode_one::<u64>(&mut cursor);
        assert!(matches!(result, Err(CrunchError::Leb128Decode(_))));
    }

    #[test]
    fn test_decode_overflow_error() {
        let buf = vec![0xFF; 10];
        let mut cursor = Cursor::new(buf.as_slice());
        let result = decode_one::<u64>(&mut cursor);
        assert!(matches!(result, Err(CrunchError::Leb128Decode(_))));
    }
}
