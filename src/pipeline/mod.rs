//! The strategy pipeline: candidate enumeration and execution, the keep-best
//! orchestrator, the artifact container, and scratch-file handling.

pub mod artifact;
pub mod candidate;
pub mod orchestrator;
pub mod scratch;

pub use artifact::{ArtifactPayload, CodecTag, EncodedArtifact};
pub use candidate::{candidate_set, CandidateKind, CandidateOutput};
pub use orchestrator::{
    compress, compress_file, decompress, Compressed, CompressionResult, NO_IMPROVEMENT,
};
pub use scratch::ScratchFile;
