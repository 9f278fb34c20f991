//! Block-based motion estimation and temporal frame blending.
//!
//! Estimation follows the classic exhaustive-search formulation: the luma
//! plane of the current frame is cut into square blocks, and each block is
//! matched against the previous frame within a `+/- search_range` pixel
//! window by minimizing the sum of absolute differences (SAD). A vector of
//! `(-4, 0)` therefore means the block's content sat 4 pixels to the left in
//! the previous frame. Blocks are independent, so the search runs on a rayon
//! parallel iterator; results are collected back in row-major block order.

use ndarray::Array2;
use rayon::prelude::*;

use super::frame::Frame;
use crate::error::CrunchError;

/// A per-block displacement into the previous frame, bounded by the search
/// range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionVector {
    pub dx: i32,
    pub dy: i32,
}

/// Number of full blocks per axis. Partial edge blocks are not searched.
pub fn block_grid(width: usize, height: usize, block_size: usize) -> (usize, usize) {
    (height / block_size, width / block_size)
}

fn sad(
    current: &Array2<f32>,
    previous: &Array2<f32>,
    cur_row: usize,
    cur_col: usize,
    prev_row: usize,
    prev_col: usize,
    block_size: usize,
) -> f32 {
    let mut total = 0.0f32;
    for row in 0..block_size {
        for col in 0..block_size {
            let diff = current[[cur_row + row, cur_col + col]]
                - previous[[prev_row + row, prev_col + col]];
            total += diff.abs();
        }
    }
    total
}

/// Estimates one motion vector per full block, row-major.
///
/// Candidate displacements are scanned `dy` then `dx` ascending and only a
/// strictly smaller SAD replaces the best, so ties resolve deterministically
/// toward the top-left of the search window.
pub fn estimate_motion(
    current: &Frame,
    previous: &Frame,
    block_size: usize,
    search_range: i32,
) -> Result<Vec<MotionVector>, CrunchError> {
    if current.width != previous.width || current.height != previous.height {
        return Err(CrunchError::FrameBufferMismatch(
            previous.pixels.len(),
            current.pixels.len(),
        ));
    }

    let cur_luma = current.luma();
    let prev_luma = previous.luma();
    let (rows, cols) = block_grid(current.width, current.height, block_size);
    let height = current.height as i32;
    let width = current.width as i32;
    let block = block_size as i32;

    let blocks: Vec<(usize, usize)> = (0..rows)
        .flat_map(|row| (0..cols).map(move |col| (row, col)))
        .collect();

    let vectors = blocks
        .par_iter()
        .map(|&(block_row, block_col)| {
            let cur_row = block_row * block_size;
            let cur_col = block_col * block_size;

            let mut best = MotionVector { dx: 0, dy: 0 };
            let mut best_sad = f32::INFINITY;
            for dy in -search_range..=search_range {
                let prev_row = cur_row as i32 + dy;
                if prev_row < 0 || prev_row + block > height {
                    continue;
                }
                for dx in -search_range..=search_range {
                    let prev_col = cur_col as i32 + dx;
                    if prev_col < 0 || prev_col + block > width {
                        continue;
                    }
                    let cost = sad(
                        &cur_luma,
                        &prev_luma,
                        cur_row,
                        cur_col,
                        prev_row as usize,
                        prev_col as usize,
                        block_size,
                    );
                    if cost < best_sad {
                        best_sad = cost;
                        best = MotionVector { dx, dy };
                    }
                }
            }
            best
        })
        .collect();

    Ok(vectors)
}

/// Blends the current frame toward the previous one (70% current, 30%
/// previous), the temporal smoothing step applied after estimation.
pub fn blend_frames(current: &Frame, previous: &Frame) -> Result<Frame, CrunchError> {
    if current.pixels.len() != previous.pixels.len() {
        return Err(CrunchError::FrameBufferMismatch(
            previous.pixels.len(),
            current.pixels.len(),
        ));
    }

    let pixels = current
        .pixels
        .iter()
        .zip(previous.pixels.iter())
        .map(|(&cur, &prev)| {
            (0.7 * cur as f32 + 0.3 * prev as f32)
                .round()
                .clamp(0.0, 255.0) as u8
        })
        .collect();

    Ok(Frame {
        width: current.width,
        height: current.height,
        pixels,
    })
}

//==================================================================================
// Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic per-pixel noise so every block is locally unique.
    fn noise(x: usize, y: usize) -> u8 {
        let v = (x as u32)
            .wrapping_mul(31)
            .wrapping_add((y as u32).wrapping_mul(17))
            .wrapping_mul(2654435761);
        (v >> 24) as u8
    }

    fn noise_frame(width: usize, height: usize, shift_x: usize) -> Frame {
        let mut pixels = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            for x in 0..width {
                let src_x = x.saturating_sub(shift_x);
                let value = noise(src_x, y);
                pixels.extend_from_slice(&[value, value, value]);
            }
        }
        Frame::new(width, height, pixels).unwrap()
    }

    #[test]
    fn test_identical_frames_give_zero_vectors() {
        let frame = noise_frame(48, 48, 0);
        let vectors = estimate_motion(&frame, &frame, 16, 16).unwrap();
        assert_eq!(vectors.len(), 9);
        assert!(vectors
            .iter()
            .all(|v| *v == MotionVector { dx: 0, dy: 0 }));
    }

    #[test]
    fn test_horizontal_shift_detected_in_interior_blocks() {
        // Content moves 4 pixels to the right, so blocks find their match 4
        // pixels to the left in the previous frame.
        let previous = noise_frame(64, 64, 0);
        let current = noise_frame(64, 64, 4);
        let vectors = estimate_motion(&current, &previous, 16, 16).unwrap();

        let (_, cols) = block_grid(64, 64, 16);
        for block_row in 1..3 {
            for block_col in 1..3 {
                let vector = vectors[block_row * cols + block_col];
                assert_eq!(vector, MotionVector { dx: -4, dy: 0 });
            }
        }
    }

    #[test]
    fn test_mismatched_dimensions_rejected() {
        let a = Frame::filled(32, 32, [0, 0, 0]);
        let b = Frame::filled(16, 16, [0, 0, 0]);
        assert!(matches!(
            estimate_motion(&a, &b, 16, 16),
            Err(CrunchError::FrameBufferMismatch(..))
        ));
    }

    #[test]
    fn test_blend_weights() {
        let current = Frame::filled(2, 2, [100, 100, 100]);
        let previous = Frame::filled(2, 2, [200, 200, 200]);
        let blended = blend_frames(&current, &previous).unwrap();
        // 0.7 * 100 + 0.3 * 200 = 130
        assert!(blended.pixels.iter().all(|&p| p == 130));
    }
}
