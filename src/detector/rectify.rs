//! Stage 2: rectify perspective using the corner markers

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::ScanError;
use crate::models::{Marker, Point, RectifiedSheet};
use crate::utils::geometry::{PerspectiveTransform, quad_area};
use crate::utils::grayscale::rgb_to_grayscale;

/// Minimum usable side length for the rectified sheet
const MIN_DST_SIDE: usize = 16;
/// Quadrilaterals below this area are treated as collapsed
const MIN_QUAD_AREA: f32 = 64.0;

/// Warp the raw RGB image so the marker quadrilateral becomes an upright
/// rectangle.
///
/// With four markers the corners are ordered by the sum/difference
/// heuristic; with three, the missing corner is completed as a
/// parallelogram. Collapsed or collinear marker geometry is fatal.
pub fn rectify(
    rgb: &[u8],
    width: usize,
    height: usize,
    markers: &[Marker],
) -> Result<RectifiedSheet, ScanError> {
    let mut points: Vec<Point> = markers.iter().map(|m| m.centroid).collect();
    match points.len() {
        4 => {}
        3 => {
            let fourth = complete_parallelogram(&points);
            warn!(
                x = fourth.x,
                y = fourth.y,
                "only 3 markers found, synthesized the 4th corner"
            );
            points.push(fourth);
        }
        n => {
            return Err(ScanError::Pipeline(format!(
                "rectifier needs 3 or 4 markers, got {n}"
            )));
        }
    }

    let src = order_corners(&points);
    if quad_area(&src) < MIN_QUAD_AREA {
        return Err(ScanError::InvalidGeometry);
    }

    let [tl, tr, br, bl] = src;
    let dst_width = tr.distance(&tl).max(br.distance(&bl)).round() as usize;
    let dst_height = bl.distance(&tl).max(br.distance(&tr)).round() as usize;
    if dst_width < MIN_DST_SIDE || dst_height < MIN_DST_SIDE {
        return Err(ScanError::InvalidGeometry);
    }

    let dst = [
        Point::new(0.0, 0.0),
        Point::new(dst_width as f32 - 1.0, 0.0),
        Point::new(dst_width as f32 - 1.0, dst_height as f32 - 1.0),
        Point::new(0.0, dst_height as f32 - 1.0),
    ];

    // Inverse mapping: walk destination pixels, sample the source
    let transform =
        PerspectiveTransform::from_quad(&dst, &src).ok_or(ScanError::InvalidGeometry)?;

    debug!(dst_width, dst_height, "warping sheet to canonical rectangle");

    let mut warped = vec![0u8; dst_width * dst_height * 3];
    warped
        .par_chunks_mut(dst_width * 3)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..dst_width {
                let src_pt = transform.apply(Point::new(x as f32, y as f32));
                let pixel = sample_bilinear(rgb, width, height, src_pt);
                row[x * 3..x * 3 + 3].copy_from_slice(&pixel);
            }
        });

    let gray = rgb_to_grayscale(&warped, dst_width, dst_height);
    Ok(RectifiedSheet {
        rgb: warped,
        gray,
        width: dst_width,
        height: dst_height,
    })
}

/// Order four corners as top-left, top-right, bottom-right, bottom-left.
///
/// Top-left has the smallest x+y, bottom-right the largest; top-right has
/// the smallest y-x, bottom-left the largest.
fn order_corners(points: &[Point]) -> [Point; 4] {
    let sum = |p: &Point| p.x + p.y;
    let diff = |p: &Point| p.y - p.x;
    let pick = |key: &dyn Fn(&Point) -> f32, max: bool| -> Point {
        let mut best = points[0];
        for p in &points[1..] {
            let better = if max {
                key(p) > key(&best)
            } else {
                key(p) < key(&best)
            };
            if better {
                best = *p;
            }
        }
        best
    };

    [
        pick(&sum, false),
        pick(&diff, false),
        pick(&sum, true),
        pick(&diff, true),
    ]
}

/// Complete the fourth corner of a parallelogram from three markers.
///
/// The pivot is the corner adjacent to both others (smallest summed distance
/// to them); the missing corner is its reflection: a - pivot + b.
fn complete_parallelogram(points: &[Point]) -> Point {
    debug_assert_eq!(points.len(), 3);
    let mut pivot = 0usize;
    let mut best = f32::INFINITY;
    for i in 0..3 {
        let total =
            points[i].distance(&points[(i + 1) % 3]) + points[i].distance(&points[(i + 2) % 3]);
        if total < best {
            best = total;
            pivot = i;
        }
    }
    let a = points[(pivot + 1) % 3];
    let b = points[(pivot + 2) % 3];
    Point::new(
        a.x - points[pivot].x + b.x,
        a.y - points[pivot].y + b.y,
    )
}

fn sample_bilinear(rgb: &[u8], width: usize, height: usize, p: Point) -> [u8; 3] {
    // Outside the source image reads as white paper
    if p.x < 0.0 || p.y < 0.0 || p.x > width as f32 - 1.0 || p.y > height as f32 - 1.0 {
        return [255, 255, 255];
    }

    let x0 = p.x.floor() as usize;
    let y0 = p.y.floor() as usize;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let fx = p.x - x0 as f32;
    let fy = p.y - y0 as f32;

    let mut out = [0u8; 3];
    for (c, slot) in out.iter_mut().enumerate() {
        let p00 = rgb[(y0 * width + x0) * 3 + c] as f32;
        let p10 = rgb[(y0 * width + x1) * 3 + c] as f32;
        let p01 = rgb[(y1 * width + x0) * 3 + c] as f32;
        let p11 = rgb[(y1 * width + x1) * 3 + c] as f32;
        let top = p00 + (p10 - p00) * fx;
        let bottom = p01 + (p11 - p01) * fx;
        *slot = (top + (bottom - top) * fy).round().clamp(0.0, 255.0) as u8;
    }
    out
}
