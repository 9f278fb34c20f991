//! This module defines the single, unified error type for the entire crunch
//! core.
//!
//! By using a single error enum, we can propagate errors from any kernel,
//! candidate, or pipeline stage up to the caller with full context. The
//! `thiserror` crate is used to reduce boilerplate. Failures local to one
//! compression candidate are wrapped in `CandidateExecution` so the
//! orchestrator can recover them without aborting the whole run.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrunchError {
    #[error("Huffman decoding error: {0}")]
    HuffmanDecode(String),

    #[error("RLE decoding error: {0}")]
    RleDecode(String),

    #[error("LZ77 decoding error: {0}")]
    Lz77Decode(String),

    #[error("LEB128 decoding error: {0}")]
    Leb128Decode(String),

    #[error("Zstd operation failed: {0}")]
    ZstdError(String),

    #[error("Candidate '{name}' failed: {source}")]
    CandidateExecution {
        name: String,
        #[source]
        source: Box<CrunchError>,
    },

    #[error("Media adapter failed: {0}")]
    Adapter(String),

    #[error("Malformed artifact: {0}")]
    ArtifactFormat(String),

    #[error("Quality must be between 1 and 100, got {0}")]
    InvalidQuality(u8),

    #[error("Frame buffer length mismatch: expected {0}, got {1}")]
    FrameBufferMismatch(usize, usize),

    #[error("Frame dimensions {0}x{1} overflow the addressable buffer size")]
    FrameDimensionOverflow(usize, usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal logic error (this is a bug): {0}")]
    Internal(String),
}
