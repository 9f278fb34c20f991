//! The video transform pipeline: frames, motion estimation, DCT quantization,
//! and chunked parallel sequence processing.

pub mod dct;
pub mod frame;
pub mod motion;
pub mod pipeline;

pub use frame::Frame;
pub use motion::MotionVector;
pub use pipeline::{transform_sequence, FrameTransform, ProgressEvent, ProgressFn};
