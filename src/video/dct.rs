//! 8x8 DCT quantization, the irreversible step of the lossy video path.
//!
//! Each plane is cut into zero-padded 8x8 blocks. A block is level-shifted,
//! transformed with the orthonormal type-II DCT, divided elementwise by the
//! quality-scaled quantization matrix, rounded (information is lost here),
//! multiplied back, and inverse-transformed. The DCT basis matrix is built
//! once and cached in a `OnceLock`.

use ndarray::Array2;
use std::sync::OnceLock;

use crate::config::Quality;

const BLOCK: usize = 8;

/// The JPEG luminance base quantization table.
#[rustfmt::skip]
const BASE_QUANT: [[f32; BLOCK]; BLOCK] = [
    [16.0, 11.0, 10.0, 16.0,  24.0,  40.0,  51.0,  61.0],
    [12.0, 12.0, 14.0, 19.0,  26.0,  58.0,  60.0,  55.0],
    [14.0, 13.0, 16.0, 24.0,  40.0,  57.0,  69.0,  56.0],
    [14.0, 17.0, 22.0, 29.0,  51.0,  87.0,  80.0,  62.0],
    [18.0, 22.0, 37.0, 56.0,  68.0, 109.0, 103.0,  77.0],
    [24.0, 35.0, 55.0, 64.0,  81.0, 104.0, 113.0,  92.0],
    [49.0, 64.0, 78.0, 87.0, 103.0, 121.0, 120.0, 101.0],
    [72.0, 92.0, 95.0, 98.0, 112.0, 100.0, 103.0,  99.0],
];

static DCT_BASIS: OnceLock<Array2<f32>> = OnceLock::new();

/// The orthonormal type-II DCT basis: `C[u][x] = a(u) * cos((2x+1)u*pi/16)`.
fn dct_basis() -> &'static Array2<f32> {
    DCT_BASIS.get_or_init(|| {
        Array2::from_shape_fn((BLOCK, BLOCK), |(u, x)| {
            let alpha = if u == 0 {
                (1.0f32 / BLOCK as f32).sqrt()
            } else {
                (2.0f32 / BLOCK as f32).sqrt()
            };
            let angle =
                ((2 * x + 1) as f32 * u as f32 * std::f32::consts::PI) / (2.0 * BLOCK as f32);
            alpha * angle.cos()
        })
    })
}

/// Scales the base table for a quality setting.
///
/// `q < 50` multiplies steps by `50/q`; `q >= 50` by `(100-q)/50`. Each step
/// is clamped to at least 1, so quality 100 quantizes with unit steps instead
/// of dividing by zero.
pub fn quant_matrix(quality: Quality) -> Array2<f32> {
    let q = quality.get() as f32;
    let scale = if q < 50.0 { 50.0 / q } else { (100.0 - q) / 50.0 };
    Array2::from_shape_fn((BLOCK, BLOCK), |(row, col)| {
        (BASE_QUANT[row][col] * scale).max(1.0)
    })
}

fn forward_block(block: &Array2<f32>) -> Array2<f32> {
    let basis = dct_basis();
    basis.dot(block).dot(&basis.t())
}

fn inverse_block(coeffs: &Array2<f32>) -> Array2<f32> {
    let basis = dct_basis();
    basis.t().dot(coeffs).dot(basis)
}

/// Runs the quantize/dequantize cycle over a whole plane.
///
/// The plane is padded with zeros to block multiples and cropped back, so
/// arbitrary dimensions are accepted.
pub fn quantize_plane(plane: &Array2<f32>, quant: &Array2<f32>) -> Array2<f32> {
    let (height, width) = plane.dim();
    let padded_height = height.div_ceil(BLOCK) * BLOCK;
    let padded_width = width.div_ceil(BLOCK) * BLOCK;

    let mut padded = Array2::<f32>::zeros((padded_height, padded_width));
    padded
        .slice_mut(ndarray::s![..height, ..width])
        .assign(plane);

    let mut block = Array2::<f32>::zeros((BLOCK, BLOCK));
    for block_row in (0..padded_height).step_by(BLOCK) {
        for block_col in (0..padded_width).step_by(BLOCK) {
            block.assign(&padded.slice(ndarray::s![
                block_row..block_row + BLOCK,
                block_col..block_col + BLOCK
            ]));
            block.mapv_inplace(|v| v - 128.0);

            let mut coeffs = forward_block(&block);
            // The rounding after division is the lossy step.
            ndarray::Zip::from(&mut coeffs)
                .and(quant)
                .for_each(|c, &q| *c = (*c / q).round() * q);

            let restored = inverse_block(&coeffs);
            padded
                .slice_mut(ndarray::s![
                    block_row..block_row + BLOCK,
                    block_col..block_col + BLOCK
                ])
                .assign(&restored.mapv(|v| v + 128.0));
        }
    }

    padded.slice(ndarray::s![..height, ..width]).to_owned()
}

//==================================================================================
// Unit Tests
//==================================================================================
