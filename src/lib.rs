//! The core engine of the crunch adaptive compression library.
//!
//! crunch does not guess which compression strategy fits a payload. For each
//! input it runs a fixed set of candidate strategies (entropy coding,
//! run-length, dictionary matching, zstd, and the lossy video transforms),
//! measures each candidate's real output size against the original, and keeps
//! the smallest, reporting "no improvement" when nothing helps.
//!
//! The crate is layered strictly:
//!
//! - [`kernels`]: pure, stateless byte codecs.
//! - [`video`]: frames, motion estimation, DCT quantization, and the chunked
//!   parallel sequence pipeline.
//! - [`pipeline`]: candidate strategies, the keep-best orchestrator, the
//!   reversible artifact format, and scratch-file promotion.
//! - [`adapter`]: the trait seam to container formats the engine never
//!   parses itself.

pub mod adapter;
pub mod config;
pub mod error;
pub mod kernels;
pub mod pipeline;
pub mod video;

pub use adapter::{IdentityAdapter, MediaAdapter, RawFrameAdapter, RawMedia};
pub use config::{CompressionMode, EngineConfig, Quality};
pub use error::CrunchError;
pub use pipeline::{
    compress, compress_file, decompress, CandidateKind, Compressed, CompressionResult,
};
pub use video::{Frame, FrameTransform, MotionVector, ProgressEvent};

/// The version of the crunch-core crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
