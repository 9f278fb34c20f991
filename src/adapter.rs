//! The seam between the compression engine and concrete media containers.
//!
//! The engine never parses image, document, or video container formats; a
//! [`MediaAdapter`] owned by the caller decodes container bytes into
//! [`RawMedia`] and re-encodes transformed media back into bytes. Lossy
//! candidate sizes are measured on the adapter's re-encoded output, so the
//! adapter fully defines what "smaller" means for its format.
//!
//! Two reference adapters ship with the crate: [`IdentityAdapter`] for plain
//! byte payloads and [`RawFrameAdapter`] for uncompressed RGB24 frame
//! sequences. Real container adapters live with the callers that own those
//! formats.

use std::io::Cursor;

use crate::error::CrunchError;
use crate::kernels::leb128;
use crate::video::Frame;

/// Decoded media, the common currency of the candidate pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum RawMedia {
    /// An opaque byte payload (text, documents, anything byte-shaped).
    Bytes(Vec<u8>),

    /// A decoded video: a sequence of same-sized RGB24 frames.
    Frames(Vec<Frame>),
}

/// Decodes container bytes to raw media and back.
pub trait MediaAdapter {
    fn decode_to_raw(&self, input: &[u8]) -> Result<RawMedia, CrunchError>;
    fn encode_from_raw(&self, media: &RawMedia) -> Result<Vec<u8>, CrunchError>;
}

//==================================================================================
// I. IdentityAdapter
//==================================================================================

/// Byte passthrough: the payload is its own raw form.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityAdapter;

impl MediaAdapter for IdentityAdapter {
    fn decode_to_raw(&self, input: &[u8]) -> Result<RawMedia, CrunchError> {
        Ok(RawMedia::Bytes(input.to_vec()))
    }

    fn encode_from_raw(&self, media: &RawMedia) -> Result<Vec<u8>, CrunchError> {
        match media {
            RawMedia::Bytes(bytes) => Ok(bytes.clone()),
            RawMedia::Frames(_) => Err(CrunchError::Adapter(
                "Identity adapter handles byte payloads only".to_string(),
            )),
        }
    }
}

//==================================================================================
// II. RawFrameAdapter
//==================================================================================

/// An uncompressed frame-sequence container: a small varint header
/// (`width`, `height`, `frame_count`) followed by packed RGB24 frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawFrameAdapter;

impl MediaAdapter for RawFrameAdapter {
    fn decode_to_raw(&self, input: &[u8]) -> Result<RawMedia, CrunchError> {
        let mut cursor = Cursor::new(input);
        let width = leb128::decode_one::<u64>(&mut cursor)
            .map_err(|e| CrunchError::Adapter(format!("Bad frame header: {e}")))?
            as usize;
        let height = leb128::decode_one::<u64>(&mut cursor)
            .map_err(|e| CrunchError::Adapter(format!("Bad frame header: {e}")))?
            as usize;
        let count = leb128::decode_one::<u64>(&mut cursor)
            .map_err(|e| CrunchError::Adapter(format!("Bad frame header: {e}")))?
            as usize;

        // The header fields come straight off the wire; the payload length
        // must account for every declared byte before anything is allocated.
        let frame_len = width
            .checked_mul(height)
            .and_then(|area| area.checked_mul(3))
            .ok_or_else(|| {
                CrunchError::Adapter(format!("Frame dimensions {width}x{height} overflow"))
            })?;
        let expected = frame_len.checked_mul(count).ok_or_else(|| {
            CrunchError::Adapter(format!("Payload size for {count} frames overflows"))
        })?;
        let offset = cursor.position() as usize;
        let remaining = input.len() - offset;
        if expected != remaining {
            return Err(CrunchError::Adapter(format!(
                "Header declares {expected} payload bytes, found {remaining}"
            )));
        }
        if frame_len == 0 && count != 0 {
            return Err(CrunchError::Adapter(format!(
                "Zero-area frames with count {count}"
            )));
        }

        let mut frames = Vec::with_capacity(count);
        for slab in input[offset..].chunks_exact(frame_len.max(1)) {
            frames.push(Frame::new(width, height, slab.to_vec())?);
        }
        Ok(RawMedia::Frames(frames))
    }

    fn encode_from_raw(&self, media: &RawMedia) -> Result<Vec<u8>, CrunchError> {
        let RawMedia::Frames(frames) = media else {
            return Err(CrunchError::Adapter(
                "Raw frame adapter handles frame sequences only".to_string(),
            ));
        };

        let (width, height) = frames
            .first()
            .map(|f| (f.width, f.height))
            .unwrap_or((0, 0));
        let mut output = Vec::new();
        leb128::encode_one(width as u64, &mut output)?;
        leb128::encode_one(height as u64, &mut output)?;
        leb128::encode_one(frames.len() as u64, &mut output)?;
        for frame in frames {
            if frame.width != width || frame.height != height {
                return Err(CrunchError::Adapter(
                    "Frame sequence has mixed dimensions".to_string(),
                ));
            }
            output.extend_from_slice(&frame.pixels);
        }
        Ok(output)
    }
}

//==================================================================================
// Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_roundtrip() {
        let adapter = IdentityAdapter;
        let raw = adapter.decode_to_raw(b"hello").unwrap();
        assert_eq!(raw, RawMedia::Bytes(b"hello".to_vec()));
        assert_eq!(adapter.encode_from_raw(&raw).unwrap(), b"hello");
    }

    #[test]
    fn test_identity_rejects_frames() {
        let adapter = IdentityAdapter;
        let media = RawMedia::Frames(vec![Frame::filled(2, 2, [0, 0, 0])]);
        assert!(matches!(
            adapter.encode_from_raw(&media),
            Err(CrunchError::Adapter(_))
        ));
    }

    #[test]
    fn test_raw_frame_roundtrip() {
        let adapter = RawFrameAdapter;
        let frames = vec![
            Frame::filled(4, 2, [10, 20, 30]),
            Frame::filled(4, 2, [200, 100, 0]),
        ];
        let media = RawMedia::Frames(frames.clone());

        let bytes = adapter.encode_from_raw(&media).unwrap();
        let decoded = adapter.decode_to_raw(&bytes).unwrap();
        assert_eq!(decoded, media);
    }

    #[test]
    fn test_raw_frame_truncated_payload() {
        let adapter = RawFrameAdapter;
        let media = RawMedia::Frames(vec![Frame::filled(4, 4, [1, 2, 3])]);
        let mut bytes = adapter.encode_from_raw(&media).unwrap();
        bytes.truncate(bytes.len() - 5);

        assert!(matches!(
            adapter.decode_to_raw(&bytes),
            Err(CrunchError::Adapter(_))
        ));
    }

    #[test]
    fn test_raw_frame_huge_dimensions_rejected() {
        // Wire dimensions of u64::MAX would overflow the per-frame byte
        // count; the adapter must report that, not panic.
        let mut bytes = Vec::new();
        leb128::encode_one(u64::MAX, &mut bytes).unwrap();
        leb128::encode_one(u64::MAX, &mut bytes).unwrap();
        leb128::encode_one(1u64, &mut bytes).unwrap();
        bytes.extend_from_slice(&[0u8; 16]);

        assert!(matches!(
            RawFrameAdapter.decode_to_raw(&bytes),
            Err(CrunchError::Adapter(_))
        ));
    }

    #[test]
    fn test_raw_frame_overstated_count_rejected() {
        // A 1x1 header claiming u64::MAX frames over a 3-byte payload.
        let mut bytes = Vec::new();
        leb128::encode_one(1u64, &mut bytes).unwrap();
        leb128::encode_one(1u64, &mut bytes).unwrap();
        leb128::encode_one(u64::MAX, &mut bytes).unwrap();
        bytes.extend_from_slice(&[7, 8, 9]);

        assert!(matches!(
            RawFrameAdapter.decode_to_raw(&bytes),
            Err(CrunchError::Adapter(_))
        ));
    }

    #[test]
    fn test_raw_frame_mixed_dimensions_rejected() {
        let adapter = RawFrameAdapter;
        let media = RawMedia::Frames(vec![
            Frame::filled(4, 4, [0, 0, 0]),
            Frame::filled(2, 2, [0, 0, 0]),
        ]);
        assert!(matches!(
            adapter.encode_from_raw(&media),
            Err(CrunchError::Adapter(_))
        ));
    }
}
