//! Chunked, parallel execution of frame transforms over a video sequence.
//!
//! The sequence is processed in bounded chunks so memory stays proportional
//! to the chunk size, not the video length. DCT quantization is embarrassingly
//! parallel and fans frames out across a rayon pool; the motion kinds are
//! inherently sequential per frame (each needs the previous *processed* frame)
//! and instead parallelize the block search inside each frame. The previous
//! frame reference is carried across chunk boundaries, and output order always
//! matches input order.

use log::debug;
use ndarray::Array2;
use rayon::prelude::*;
use std::time::{Duration, Instant};

use super::dct;
use super::frame::{self, Frame};
use super::motion;
use crate::config::{EngineConfig, Quality};
use crate::error::CrunchError;

/// The lossy transform applied to a frame sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameTransform {
    /// Per-block motion search against the previous processed frame, then a
    /// 70/30 temporal blend.
    MotionCompensation {
        block_size: usize,
        search_range: i32,
    },

    /// Per-frame DCT quantization in YCbCr with 2x chroma subsampling.
    DctQuantization { quality: Quality },

    /// Motion search (vectors logged, not yet exploited) plus the DCT pass.
    Hybrid {
        block_size: usize,
        search_range: i32,
        quality: Quality,
    },
}

/// A progress snapshot delivered through the caller's callback.
#[derive(Debug, Clone, Copy)]
pub struct ProgressEvent {
    pub processed_frames: usize,
    pub total_frames: usize,
    pub elapsed: Duration,
}

/// Caller-supplied progress sink. Invoked from the coordinating thread only.
pub type ProgressFn<'a> = &'a (dyn Fn(ProgressEvent) + Sync);

/// Frames per chunk: bounded above by `max_chunk_frames`, and sized so each
/// worker sees roughly one chunk's worth of a short video.
pub fn chunk_size(total_frames: usize, workers: usize, max_chunk_frames: usize) -> usize {
    max_chunk_frames.min((total_frames / workers.max(1)).max(1))
}

/// Rate-bounds progress emission: at most one event per second unless the
/// whole-percent figure moved.
struct ProgressTracker {
    start: Instant,
    last_emit: Instant,
    last_percent: u64,
}

impl ProgressTracker {
    fn new() -> Self {
        let now = Instant::now();
        ProgressTracker {
            start: now,
            last_emit: now,
            last_percent: 0,
        }
    }

    fn report(&mut self, processed: usize, total: usize, progress: Option<ProgressFn>) {
        let Some(callback) = progress else { return };
        let percent = (processed as u64 * 100) / total.max(1) as u64;
        let now = Instant::now();
        if percent != self.last_percent || now.duration_since(self.last_emit) >= Duration::from_secs(1)
        {
            self.last_percent = percent;
            self.last_emit = now;
            callback(ProgressEvent {
                processed_frames: processed,
                total_frames: total,
                elapsed: now.duration_since(self.start),
            });
        }
    }
}

fn quantize_frame(input: &Frame, quant: &Array2<f32>) -> Frame {
    let [y, cb, cr] = input.to_ycbcr();
    let cb_half = frame::downsample_2x(&cb);
    let cr_half = frame::downsample_2x(&cr);

    let y_out = dct::quantize_plane(&y, quant);
    let cb_out = dct::quantize_plane(&cb_half, quant);
    let cr_out = dct::quantize_plane(&cr_half, quant);

    let cb_full = frame::upsample_to(&cb_out, input.height, input.width);
    let cr_full = frame::upsample_to(&cr_out, input.height, input.width);
    Frame::from_ycbcr(&y_out, &cb_full, &cr_full)
}

/// Applies a lossy transform to a frame sequence, preserving frame order.
pub fn transform_sequence(
    frames: &[Frame],
    transform: &FrameTransform,
    config: &EngineConfig,
    progress: Option<ProgressFn>,
) -> Result<Vec<Frame>, CrunchError> {
    if frames.is_empty() {
        return Ok(Vec::new());
    }
    let (width, height) = (frames[0].width, frames[0].height);
    for frame in frames {
        if frame.width != width || frame.height != height {
            return Err(CrunchError::FrameBufferMismatch(
                width * height * 3,
                frame.pixels.len(),
            ));
        }
    }

    let workers = config.effective_workers();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| CrunchError::Internal(format!("Failed to build worker pool: {e}")))?;

    let total = frames.len();
    let chunk_frames = chunk_size(total, workers, config.max_chunk_frames);
    debug!(
        "Transforming {} frames in chunks of {} across {} workers",
        total, chunk_frames, workers
    );

    let mut output: Vec<Frame> = Vec::with_capacity(total);
    let mut previous: Option<Frame> = None;
    let mut tracker = ProgressTracker::new();

    for chunk in frames.chunks(chunk_frames) {
        match transform {
            FrameTransform::DctQuantization { quality } => {
                let quant = dct::quant_matrix(*quality);
                let mut processed: Vec<Frame> = pool
                    .install(|| chunk.par_iter().map(|f| quantize_frame(f, &quant)).collect());
                output.append(&mut processed);
            }

            FrameTransform::MotionCompensation {
                block_size,
                search_range,
            } => {
                for current in chunk {
                    let next = match previous.as_ref() {
                        Some(prev) => {
                            let vectors = pool.install(|| {
                                motion::estimate_motion(current, prev, *block_size, *search_range)
                            })?;
                            let moving = vectors
                                .iter()
                                .filter(|v| v.dx != 0 || v.dy != 0)
                                .count();
                            debug!("{moving}/{} blocks in motion", vectors.len());
                            motion::blend_frames(current, prev)?
                        }
                        // No reference for the first frame; pass it through.
                        None => current.clone(),
                    };
                    previous = Some(next.clone());
                    output.push(next);
                    tracker.report(output.len(), total, progress);
                }
                continue;
            }

            FrameTransform::Hybrid {
                block_size,
                search_range,
                quality,
            } => {
                let quant = dct::quant_matrix(*quality);
                for current in chunk {
                    if let Some(prev) = previous.as_ref() {
                        let vectors = pool.install(|| {
                            motion::estimate_motion(current, prev, *block_size, *search_range)
                        })?;
                        debug!("Estimated {} motion vectors", vectors.len());
                    }
                    let next = quantize_frame(current, &quant);
                    previous = Some(next.clone());
                    output.push(next);
                    tracker.report(output.len(), total, progress);
                }
                continue;
            }
        }

        previous = output.last().cloned();
        tracker.report(output.len(), total, progress);
    }

    Ok(output)
}

//==================================================================================
// Unit Tests
//==================================================================================
