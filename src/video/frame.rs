//! Frame representation and color-space plumbing for the video pipeline.
//!
//! A [`Frame`] owns a packed RGB24 pixel buffer. The transform stages never
//! work on RGB directly: they convert to full-range BT.601 YCbCr planes
//! (`ndarray::Array2<f32>`), subsample the chroma planes 2x per axis, and
//! convert back after quantization. Keeping the planes as `f32` arrays avoids
//! repeated int/float churn inside the DCT loops.

use ndarray::Array2;

use crate::error::CrunchError;

/// An owned RGB24 frame. `pixels` is row-major, 3 bytes per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

impl Frame {
    /// Wraps a packed RGB24 buffer, validating its length.
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self, CrunchError> {
        let expected = width
            .checked_mul(height)
            .and_then(|area| area.checked_mul(3))
            .ok_or(CrunchError::FrameDimensionOverflow(width, height))?;
        if pixels.len() != expected {
            return Err(CrunchError::FrameBufferMismatch(expected, pixels.len()));
        }
        Ok(Frame {
            width,
            height,
            pixels,
        })
    }

    /// A solid-color frame, mostly useful in tests.
    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> Self {
        let mut pixels = Vec::with_capacity(width * height * 3);
        for _ in 0..width * height {
            pixels.extend_from_slice(&rgb);
        }
        Frame {
            width,
            height,
            pixels,
        }
    }

    #[inline]
    fn rgb_at(&self, row: usize, col: usize) -> (f32, f32, f32) {
        let base = (row * self.width + col) * 3;
        (
            self.pixels[base] as f32,
            self.pixels[base + 1] as f32,
            self.pixels[base + 2] as f32,
        )
    }

    /// The BT.601 luma plane. Motion estimation searches on this alone.
    pub fn luma(&self) -> Array2<f32> {
        Array2::from_shape_fn((self.height, self.width), |(row, col)| {
            let (r, g, b) = self.rgb_at(row, col);
            0.299 * r + 0.587 * g + 0.114 * b
        })
    }

    /// Converts to full-resolution `[Y, Cb, Cr]` planes (full-range BT.601).
    pub fn to_ycbcr(&self) -> [Array2<f32>; 3] {
        let shape = (self.height, self.width);
        let mut y = Array2::zeros(shape);
        let mut cb = Array2::zeros(shape);
        let mut cr = Array2::zeros(shape);

        for row in 0..self.height {
            for col in 0..self.width {
                let (r, g, b) = self.rgb_at(row, col);
                y[[row, col]] = 0.299 * r + 0.587 * g + 0.114 * b;
                cb[[row, col]] = -0.168_736 * r - 0.331_264 * g + 0.5 * b + 128.0;
                cr[[row, col]] = 0.5 * r - 0.418_688 * g - 0.081_312 * b + 128.0;
            }
        }
        [y, cb, cr]
    }

    /// Rebuilds an RGB24 frame from full-resolution YCbCr planes, clamping to
    /// the byte range.
    pub fn from_ycbcr(y: &Array2<f32>, cb: &Array2<f32>, cr: &Array2<f32>) -> Self {
        let (height, width) = y.dim();
        let mut pixels = Vec::with_capacity(width * height * 3);

        for row in 0..height {
            for col in 0..width {
                let luma = y[[row, col]];
                let b_diff = cb[[row, col]] - 128.0;
                let r_diff = cr[[row, col]] - 128.0;

                let r = luma + 1.402 * r_diff;
                let g = luma - 0.344_136 * b_diff - 0.714_136 * r_diff;
                let b = luma + 1.772 * b_diff;

                pixels.push(r.round().clamp(0.0, 255.0) as u8);
                pixels.push(g.round().clamp(0.0, 255.0) as u8);
                pixels.push(b.round().clamp(0.0, 255.0) as u8);
            }
        }
        Frame {
            width,
            height,
            pixels,
        }
    }
}

/// Downsamples a plane 2x per axis by averaging each 2x2 cell. Odd edges
/// average whatever samples exist.
pub fn downsample_2x(plane: &Array2<f32>) -> Array2<f32> {
    let (height, width) = plane.dim();
    let out_height = height.div_ceil(2);
    let out_width = width.div_ceil(2);

    Array2::from_shape_fn((out_height, out_width), |(row, col)| {
        let mut sum = 0.0f32;
        let mut count = 0.0f32;
        for dr in 0..2 {
            for dc in 0..2 {
                let src_row = row * 2 + dr;
                let src_col = col * 2 + dc;
                if src_row < height && src_col < width {
                    sum += plane[[src_row, src_col]];
                    count += 1.0;
                }
            }
        }
        sum / count
    })
}

/// Upsamples a plane to the target size by nearest-neighbor replication.
pub fn upsample_to(plane: &Array2<f32>, height: usize, width: usize) -> Array2<f32> {
    let (src_height, src_width) = plane.dim();
    Array2::from_shape_fn((height, width), |(row, col)| {
        let src_row = (row / 2).min(src_height - 1);
        let src_col = (col / 2).min(src_width - 1);
        plane[[src_row, src_col]]
    })
}

//==================================================================================
// Unit Tests
//==================================================================================
