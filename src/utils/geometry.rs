//! Projective geometry: 4-point perspective transforms and quad measures

use crate::models::Point;

/// 3x3 perspective transformation matrix
#[derive(Debug, Clone, Copy)]
pub struct PerspectiveTransform {
    m: [f64; 9],
}

impl PerspectiveTransform {
    /// Solve the transform mapping each `src[i]` onto `dst[i]`.
    ///
    /// Uses the direct linear transform: eight unknowns (the ninth entry is
    /// fixed at 1), solved by Gaussian elimination with partial pivoting.
    /// Returns None for degenerate (collinear / coincident) point sets.
    pub fn from_quad(src: &[Point; 4], dst: &[Point; 4]) -> Option<Self> {
        let mut a = [[0.0f64; 9]; 8];

        for i in 0..4 {
            let (sx, sy) = (src[i].x as f64, src[i].y as f64);
            let (dx, dy) = (dst[i].x as f64, dst[i].y as f64);

            a[i * 2] = [sx, sy, 1.0, 0.0, 0.0, 0.0, -dx * sx, -dx * sy, dx];
            a[i * 2 + 1] = [0.0, 0.0, 0.0, sx, sy, 1.0, -dy * sx, -dy * sy, dy];
        }

        let h = solve_8x8(&mut a)?;
        Some(Self {
            m: [h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0],
        })
    }

    /// Map a point through the transform
    pub fn apply(&self, p: Point) -> Point {
        let (x, y) = (p.x as f64, p.y as f64);
        let w = self.m[6] * x + self.m[7] * y + self.m[8];
        if w.abs() < 1e-12 {
            return Point::new(0.0, 0.0);
        }
        Point::new(
            ((self.m[0] * x + self.m[1] * y + self.m[2]) / w) as f32,
            ((self.m[3] * x + self.m[4] * y + self.m[5]) / w) as f32,
        )
    }
}

/// Gaussian elimination with partial pivoting on an augmented 8x9 system
fn solve_8x8(a: &mut [[f64; 9]; 8]) -> Option<[f64; 8]> {
    const EPS: f64 = 1e-9;

    for col in 0..8 {
        let pivot = (col..8).max_by(|&i, &j| {
            a[i][col]
                .abs()
                .partial_cmp(&a[j][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[pivot][col].abs() < EPS {
            return None;
        }
        a.swap(col, pivot);

        for row in (col + 1)..8 {
            let factor = a[row][col] / a[col][col];
            for k in col..9 {
                a[row][k] -= factor * a[col][k];
            }
        }
    }

    let mut x = [0.0f64; 8];
    for row in (0..8).rev() {
        let mut sum = a[row][8];
        for k in (row + 1)..8 {
            sum -= a[row][k] * x[k];
        }
        if a[row][row].abs() < EPS {
            return None;
        }
        x[row] = sum / a[row][row];
    }
    Some(x)
}

/// Absolute area of a quadrilateral given corners in traversal order
pub fn quad_area(corners: &[Point; 4]) -> f32 {
    let mut twice_area = 0.0f32;
    for i in 0..4 {
        let p = corners[i];
        let q = corners[(i + 1) % 4];
        twice_area += p.x * q.y - q.x * p.y;
    }
    twice_area.abs() / 2.0
}
