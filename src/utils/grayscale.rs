//! Grayscale conversion and smoothing for RGB answer-sheet photos

use rayon::prelude::*;

// Integer luma coefficients (Rec.601, scaled by 256)
const COEF_R: u32 = 77;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

/// Threshold above which row-parallel conversion pays off
const PARALLEL_MIN_PIXELS: usize = 640 * 480;

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32) >> 8).min(255) as u8
}

/// Convert an RGB buffer (3 bytes per pixel) to a grayscale plane.
///
/// Large images are converted row-parallel; the output is identical either
/// way, so the pipeline stays deterministic.
pub fn rgb_to_grayscale(rgb: &[u8], width: usize, height: usize) -> Vec<u8> {
    let pixel_count = width * height;
    debug_assert!(rgb.len() >= pixel_count * 3);

    let mut gray = vec![0u8; pixel_count];
    if pixel_count >= PARALLEL_MIN_PIXELS {
        gray.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
            convert_row(rgb, width, y, row);
        });
    } else {
        for (y, row) in gray.chunks_mut(width).enumerate() {
            convert_row(rgb, width, y, row);
        }
    }
    gray
}

fn convert_row(rgb: &[u8], width: usize, y: usize, row: &mut [u8]) {
    let row_start = y * width * 3;
    for (x, out) in row.iter_mut().enumerate() {
        let idx = row_start + x * 3;
        *out = luma(rgb[idx], rgb[idx + 1], rgb[idx + 2]);
    }
}

/// 5x5 box blur over a grayscale plane.
///
/// Cheap stand-in for a Gaussian; smooths sensor noise and jpeg artifacts
/// before the global threshold in marker detection.
pub fn box_blur_5x5(gray: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = vec![0u8; width * height];
    if width == 0 || height == 0 {
        return out;
    }

    for y in 0..height {
        let y0 = y.saturating_sub(2);
        let y1 = (y + 2).min(height - 1);
        for x in 0..width {
            let x0 = x.saturating_sub(2);
            let x1 = (x + 2).min(width - 1);

            let mut sum = 0u32;
            let mut count = 0u32;
            for yy in y0..=y1 {
                let row = yy * width;
                for xx in x0..=x1 {
                    sum += gray[row + xx] as u32;
                    count += 1;
                }
            }
            out[y * width + x] = (sum / count) as u8;
        }
    }
    out
}
