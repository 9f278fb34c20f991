//! The stateless compression kernels.
//!
//! Every kernel in this module is a pure function over byte slices with the
//! signature `fn(input, &mut output_buf) -> Result<(), CrunchError>` (plus
//! codec-specific parameters). Kernels never read configuration, never log,
//! and never touch the filesystem; all policy lives in the pipeline layer.
//! Each encoded blob is self-decodable given only the kernel that produced it.

pub mod huffman;
pub mod leb128;
pub mod lz77;
pub mod rle;
pub mod zstd;
