//! Connected-component extraction over a binary image
//!
//! Two-pass union-find labeling (8-connectivity) that yields per-region
//! statistics: bounding box, dark pixel count and centroid. Both the marker
//! and bubble stages filter these regions by size and shape.

use crate::models::{BitMatrix, Point, Rect};

/// A connected dark region with its accumulated statistics
#[derive(Debug, Clone, Copy)]
pub struct Region {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
    /// Number of dark pixels in the region
    pub area: usize,
    sum_x: u64,
    sum_y: u64,
}

impl Region {
    /// Bounding box of the region
    pub fn bbox(&self) -> Rect {
        Rect {
            x: self.min_x,
            y: self.min_y,
            w: self.max_x - self.min_x + 1,
            h: self.max_y - self.min_y + 1,
        }
    }

    /// Centroid of the dark pixels (not the bbox center)
    pub fn centroid(&self) -> Point {
        Point::new(
            self.sum_x as f32 / self.area as f32,
            self.sum_y as f32 / self.area as f32,
        )
    }

    /// Dark pixel count divided by bbox area; 1.0 for a solid rectangle
    pub fn solidity(&self) -> f32 {
        let bbox = self.bbox();
        self.area as f32 / (bbox.w * bbox.h) as f32
    }
}

struct Labels {
    parent: Vec<u32>,
}

impl Labels {
    fn new() -> Self {
        Self { parent: vec![0] } // label 0 is background
    }

    fn fresh(&mut self) -> u32 {
        let label = self.parent.len() as u32;
        self.parent.push(label);
        label
    }

    fn find(&mut self, x: u32) -> u32 {
        let mut root = x;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        // Path compression
        let mut cur = x;
        while self.parent[cur as usize] != root {
            let next = self.parent[cur as usize];
            self.parent[cur as usize] = root;
            cur = next;
        }
        root
    }

    fn union(&mut self, a: u32, b: u32) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra.max(rb) as usize] = ra.min(rb);
        }
    }
}

/// Extract all connected dark regions from a binary image
pub fn find_regions(binary: &BitMatrix) -> Vec<Region> {
    let width = binary.width();
    let height = binary.height();
    let mut labels = vec![0u32; width * height];
    let mut uf = Labels::new();

    // First pass: assign provisional labels, merging across the four
    // already-visited neighbors (8-connectivity).
    for y in 0..height {
        for x in 0..width {
            if !binary.get(x, y) {
                continue;
            }

            let mut assigned = 0u32;
            let mut consider = |label: u32, uf: &mut Labels, assigned: &mut u32| {
                if label == 0 {
                    return;
                }
                if *assigned == 0 {
                    *assigned = label;
                } else if *assigned != label {
                    uf.union(*assigned, label);
                }
            };

            if x > 0 {
                consider(labels[y * width + x - 1], &mut uf, &mut assigned);
            }
            if y > 0 {
                consider(labels[(y - 1) * width + x], &mut uf, &mut assigned);
                if x > 0 {
                    consider(labels[(y - 1) * width + x - 1], &mut uf, &mut assigned);
                }
                if x + 1 < width {
                    consider(labels[(y - 1) * width + x + 1], &mut uf, &mut assigned);
                }
            }

            labels[y * width + x] = if assigned == 0 { uf.fresh() } else { assigned };
        }
    }

    // Second pass: accumulate statistics per root label. Indexing by root
    // keeps the output order independent of hash-map iteration.
    let mut slots: Vec<Option<Region>> = vec![None; uf.parent.len()];
    for y in 0..height {
        for x in 0..width {
            let label = labels[y * width + x];
            if label == 0 {
                continue;
            }
            let root = uf.find(label) as usize;
            let region = slots[root].get_or_insert(Region {
                min_x: x,
                min_y: y,
                max_x: x,
                max_y: y,
                area: 0,
                sum_x: 0,
                sum_y: 0,
            });
            region.min_x = region.min_x.min(x);
            region.min_y = region.min_y.min(y);
            region.max_x = region.max_x.max(x);
            region.max_y = region.max_y.max(y);
            region.area += 1;
            region.sum_x += x as u64;
            region.sum_y += y as u64;
        }
    }

    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix_with_square(x0: usize, y0: usize, side: usize) -> BitMatrix {
        let mut matrix = BitMatrix::new(40, 40);
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                matrix.set(x, y, true);
            }
        }
        matrix
    }

    #[test]
    fn test_single_square() {
        let matrix = matrix_with_square(5, 7, 4);
        let regions = find_regions(&matrix);
        assert_eq!(regions.len(), 1);

        let r = &regions[0];
        assert_eq!(r.bbox(), Rect { x: 5, y: 7, w: 4, h: 4 });
        assert_eq!(r.area, 16);
        assert!((r.solidity() - 1.0).abs() < 1e-6);
        let c = r.centroid();
        assert!((c.x - 6.5).abs() < 1e-3);
        assert!((c.y - 8.5).abs() < 1e-3);
    }

    #[test]
    fn test_separate_regions() {
        let mut matrix = matrix_with_square(2, 2, 3);
        for y in 20..23 {
            for x in 30..33 {
                matrix.set(x, y, true);
            }
        }
        let regions = find_regions(&matrix);
        assert_eq!(regions.len(), 2);
    }

    #[test]
    fn test_diagonal_pixels_connect() {
        // 8-connectivity: a diagonal staircase is one region
        let mut matrix = BitMatrix::new(10, 10);
        for i in 0..5 {
            matrix.set(i, i, true);
        }
        let regions = find_regions(&matrix);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 5);
    }

    #[test]
    fn test_ring_solidity_is_low() {
        // Hollow square outline: solidity well below a filled square's
        let mut matrix = BitMatrix::new(30, 30);
        for i in 5..15 {
            matrix.set(i, 5, true);
            matrix.set(i, 14, true);
            matrix.set(5, i, true);
            matrix.set(14, i, true);
        }
        let regions = find_regions(&matrix);
        assert_eq!(regions.len(), 1);
        assert!(regions[0].solidity() < 0.5);
    }
}
