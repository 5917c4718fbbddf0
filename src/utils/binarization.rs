//! Binarization: global Otsu threshold and local mean-adaptive threshold
//!
//! Both produce a [`BitMatrix`] where true = dark (ink/foreground).

use crate::models::BitMatrix;

/// Binarize with Otsu's automatically selected global threshold
pub fn otsu_binarize(gray: &[u8], width: usize, height: usize) -> BitMatrix {
    let threshold = otsu_threshold(gray);
    threshold_binarize(gray, width, height, threshold)
}

/// Compute Otsu's optimal threshold from the intensity histogram
pub fn otsu_threshold(gray: &[u8]) -> u8 {
    let mut histogram = [0u64; 256];
    for &pixel in gray {
        histogram[pixel as usize] += 1;
    }

    let total: u64 = gray.len() as u64;
    if total == 0 {
        return 128;
    }
    let weighted_total: u64 = histogram
        .iter()
        .enumerate()
        .map(|(v, &n)| v as u64 * n)
        .sum();

    // Single sweep over candidate thresholds with running class sums
    let mut best_threshold = 128u8;
    let mut best_variance = 0.0f64;
    let mut below_count = 0u64;
    let mut below_sum = 0u64;

    for t in 0..256usize {
        below_count += histogram[t];
        below_sum += t as u64 * histogram[t];

        let above_count = total - below_count;
        if below_count == 0 || above_count == 0 {
            continue;
        }

        let mean_below = below_sum as f64 / below_count as f64;
        let mean_above = (weighted_total - below_sum) as f64 / above_count as f64;
        let w_below = below_count as f64 / total as f64;
        let w_above = above_count as f64 / total as f64;
        let variance = w_below * w_above * (mean_below - mean_above).powi(2);

        if variance > best_variance {
            best_variance = variance;
            best_threshold = t as u8;
        }
    }

    best_threshold
}

/// Binarize against a fixed global threshold (dark = below threshold)
pub fn threshold_binarize(gray: &[u8], width: usize, height: usize, threshold: u8) -> BitMatrix {
    let mut binary = BitMatrix::new(width, height);
    for y in 0..height {
        let row = y * width;
        for x in 0..width {
            if gray[row + x] < threshold {
                binary.set(x, y, true);
            }
        }
    }
    binary
}

/// Local mean-adaptive binarization over a square neighborhood.
///
/// A pixel is dark when its intensity is at least `bias` below the mean of
/// the surrounding `block_size` x `block_size` window. Unlike a global
/// threshold this tolerates illumination drift across a photographed page.
pub fn adaptive_binarize(
    gray: &[u8],
    width: usize,
    height: usize,
    block_size: usize,
    bias: i32,
) -> BitMatrix {
    let mut binary = BitMatrix::new(width, height);
    if width == 0 || height == 0 {
        return binary;
    }
    let radius = (block_size.max(3) / 2) as isize;

    // Integral image with a zero row/column of padding
    let stride = width + 1;
    let mut integral = vec![0u64; stride * (height + 1)];
    for y in 0..height {
        let mut row_sum = 0u64;
        for x in 0..width {
            row_sum += gray[y * width + x] as u64;
            integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row_sum;
        }
    }

    let window_sum = |x0: usize, y0: usize, x1: usize, y1: usize| -> u64 {
        // Inclusive corners, integral is shifted by +1
        integral[(y1 + 1) * stride + x1 + 1] + integral[y0 * stride + x0]
            - integral[y0 * stride + x1 + 1]
            - integral[(y1 + 1) * stride + x0]
    };

    for y in 0..height {
        let y0 = (y as isize - radius).max(0) as usize;
        let y1 = ((y as isize + radius) as usize).min(height - 1);
        for x in 0..width {
            let x0 = (x as isize - radius).max(0) as usize;
            let x1 = ((x as isize + radius) as usize).min(width - 1);

            let count = ((x1 - x0 + 1) * (y1 - y0 + 1)) as u64;
            let mean = (window_sum(x0, y0, x1, y1) / count) as i32;
            if (gray[y * width + x] as i32) <= mean - bias {
                binary.set(x, y, true);
            }
        }
    }

    binary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_binarize() {
        let gray = vec![100, 150, 200, 50]; // 2x2 image
        let binary = threshold_binarize(&gray, 2, 2, 128);
        assert!(binary.get(0, 0)); // 100 < 128
        assert!(!binary.get(1, 0)); // 150 >= 128
        assert!(!binary.get(0, 1)); // 200 >= 128
        assert!(binary.get(1, 1)); // 50 < 128
    }

    #[test]
    fn test_otsu_separates_two_classes() {
        let mut gray = vec![50u8; 50];
        gray.extend(vec![200u8; 50]);
        let binary = otsu_binarize(&gray, 10, 10);
        assert!(binary.get(0, 0)); // dark class
        assert!(!binary.get(0, 7)); // light class
    }

    #[test]
    fn test_adaptive_ignores_uniform_background() {
        // Flat gray: nothing is locally darker than its neighborhood
        let gray = vec![180u8; 40 * 40];
        let binary = adaptive_binarize(&gray, 40, 40, 25, 5);
        assert_eq!(binary.count_set(), 0);
    }

    #[test]
    fn test_adaptive_finds_local_ink_under_gradient() {
        // Left half bright, right half dim, one dark dot in each half.
        // A global threshold at the Otsu split would lose one of them.
        let width = 60;
        let height = 20;
        let mut gray = vec![0u8; width * height];
        for y in 0..height {
            for x in 0..width {
                gray[y * width + x] = if x < 30 { 230 } else { 120 };
            }
        }
        gray[10 * width + 10] = 20;
        gray[10 * width + 45] = 20;

        let binary = adaptive_binarize(&gray, width, height, 9, 5);
        assert!(binary.get(10, 10));
        assert!(binary.get(45, 10));
        assert!(!binary.get(3, 3));
        assert!(!binary.get(55, 3));
    }
}
