//! The self-describing container for lossless candidate output.
//!
//! Every lossless winner is wrapped in an [`EncodedArtifact`] before its size
//! is measured, so the bytes that get compared (and eventually written to
//! disk) are the bytes `decompress` can reverse. The header is deliberately
//! tiny, four bytes: a 2-byte magic, a format version, and one byte packing
//! the payload kind (high nibble) with the codec tag (low nibble). Anything
//! larger would drown short payloads in framing and stop tiny wins from
//! registering as wins. Byte payloads hold one kernel blob; frame-stream
//! payloads hold a dimension header plus one length-prefixed kernel blob per
//! frame.

use std::io::Cursor;

use crate::error::CrunchError;
use crate::kernels::leb128;

pub const MAGIC: [u8; 2] = *b"CR";
pub const FORMAT_VERSION: u8 = 1;

const PAYLOAD_BYTES: u8 = 0;
const PAYLOAD_FRAME_STREAM: u8 = 1;

/// Identifies the kernel that produced a payload blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecTag {
    Huffman = 1,
    RunLength = 2,
    Lz77 = 3,
    Zstd = 4,
}

impl CodecTag {
    fn from_byte(byte: u8) -> Result<Self, CrunchError> {
        match byte {
            1 => Ok(CodecTag::Huffman),
            2 => Ok(CodecTag::RunLength),
            3 => Ok(CodecTag::Lz77),
            4 => Ok(CodecTag::Zstd),
            other => Err(CrunchError::ArtifactFormat(format!(
                "Unknown codec tag {other}"
            ))),
        }
    }
}

/// The artifact body. Frame streams keep per-frame blobs separate so each
/// frame decodes independently.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactPayload {
    Bytes(Vec<u8>),
    FrameStream {
        width: usize,
        height: usize,
        frames: Vec<Vec<u8>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncodedArtifact {
    pub codec: CodecTag,
    pub payload: ArtifactPayload,
}

impl EncodedArtifact {
    /// Serializes header and payload into the on-disk byte form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CrunchError> {
        let mut output = Vec::new();
        output.extend_from_slice(&MAGIC);
        output.push(FORMAT_VERSION);

        match &self.payload {
            ArtifactPayload::Bytes(blob) => {
                output.push((PAYLOAD_BYTES << 4) | self.codec as u8);
                output.extend_from_slice(blob);
            }
            ArtifactPayload::FrameStream {
                width,
                height,
                frames,
            } => {
                output.push((PAYLOAD_FRAME_STREAM << 4) | self.codec as u8);
                leb128::encode_one(*width as u64, &mut output)?;
                leb128::encode_one(*height as u64, &mut output)?;
                leb128::encode_one(frames.len() as u64, &mut output)?;
                for blob in frames {
                    leb128::encode_one(blob.len() as u64, &mut output)?;
                    output.extend_from_slice(blob);
                }
            }
        }
        Ok(output)
    }

    /// Parses the byte form back into an artifact, validating the header.
    pub fn from_bytes(input: &[u8]) -> Result<Self, CrunchError> {
        if input.len() < 4 {
            return Err(CrunchError::ArtifactFormat(
                "Input shorter than the artifact header".to_string(),
            ));
        }
        if input[0..2] != MAGIC {
            return Err(CrunchError::ArtifactFormat(
                "Missing artifact magic".to_string(),
            ));
        }
        let version = input[2];
        if version != FORMAT_VERSION {
            return Err(CrunchError::ArtifactFormat(format!(
                "Unsupported format version {version}"
            )));
        }
        let codec = CodecTag::from_byte(input[3] & 0x0F)?;

        match input[3] >> 4 {
            PAYLOAD_BYTES => Ok(EncodedArtifact {
                codec,
                payload: ArtifactPayload::Bytes(input[4..].to_vec()),
            }),
            PAYLOAD_FRAME_STREAM => {
                let body = &input[4..];
                let mut cursor = Cursor::new(body);
                let width = leb128::decode_one::<u64>(&mut cursor)? as usize;
                let height = leb128::decode_one::<u64>(&mut cursor)? as usize;
                let count = leb128::decode_one::<u64>(&mut cursor)? as usize;

                // Each frame blob costs at least its one-byte length prefix,
                // so a count beyond the remaining bytes is unbackable.
                let remaining = body.len() - cursor.position() as usize;
                if count > remaining {
                    return Err(CrunchError::ArtifactFormat(format!(
                        "Declared frame count {count} exceeds {remaining} remaining bytes"
                    )));
                }

                let mut frames = Vec::with_capacity(count);
                for index in 0..count {
                    let blob_len = leb128::decode_one::<u64>(&mut cursor)? as usize;
                    let start = cursor.position() as usize;
                    let blob = body.get(start..start + blob_len).ok_or_else(|| {
                        CrunchError::ArtifactFormat(format!("Frame blob {index} truncated"))
                    })?;
                    frames.push(blob.to_vec());
                    cursor.set_position((start + blob_len) as u64);
                }
                if (cursor.position() as usize) != body.len() {
                    return Err(CrunchError::ArtifactFormat(
                        "Trailing bytes after frame stream".to_string(),
                    ));
                }
                Ok(EncodedArtifact {
                    codec,
                    payload: ArtifactPayload::FrameStream {
                        width,
                        height,
                        frames,
                    },
                })
            }
            other => Err(CrunchError::ArtifactFormat(format!(
                "Unknown payload kind {other}"
            ))),
        }
    }
}

//==================================================================================
// Unit Tests
//==================================================================================
