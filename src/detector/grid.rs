//! Stage 4: order bubble candidates into question rows of five options

use tracing::debug;

use crate::error::ScanError;
use crate::models::{BubbleCandidate, Choice, Question};

/// Partition candidates into N rows of five and label columns A..E.
///
/// Candidates are stably sorted by centroid (top-to-bottom, then
/// left-to-right) and banded into rows: a candidate joins the current row
/// while its y stays within half the median bubble height of the row's
/// running mean. Each band is then sorted left-to-right; column order
/// assigns the letters and band rank assigns the 1-based question number.
/// The whole procedure is deterministic for identical input.
pub fn group_into_questions(
    candidates: Vec<BubbleCandidate>,
    num_questions: usize,
) -> Result<Vec<Question>, ScanError> {
    if candidates.len() != num_questions * Choice::COUNT {
        // Stage 3 guarantees the count; anything else is an internal fault.
        return Err(ScanError::Pipeline(format!(
            "grouper got {} candidates for {} questions",
            candidates.len(),
            num_questions
        )));
    }

    let tolerance = median_height(&candidates) / 2.0;

    let mut sorted = candidates;
    sorted.sort_by(|a, b| {
        (a.centroid.y, a.centroid.x)
            .partial_cmp(&(b.centroid.y, b.centroid.x))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Band by vertical position against the row's running mean
    let mut bands: Vec<Vec<BubbleCandidate>> = Vec::new();
    let mut row_mean_y = f32::NEG_INFINITY;
    for candidate in sorted {
        let y = candidate.centroid.y;
        match bands.last_mut() {
            Some(band) if (y - row_mean_y).abs() <= tolerance => {
                band.push(candidate);
                let n = band.len() as f32;
                row_mean_y += (y - row_mean_y) / n;
            }
            _ => {
                bands.push(vec![candidate]);
                row_mean_y = y;
            }
        }
    }

    debug!(rows = bands.len(), "clustered bubble rows");

    if bands.len() != num_questions || bands.iter().any(|b| b.len() != Choice::COUNT) {
        return Err(ScanError::MalformedGrid);
    }

    let questions = bands
        .into_iter()
        .enumerate()
        .map(|(row, mut band)| {
            band.sort_by(|a, b| {
                a.centroid
                    .x
                    .partial_cmp(&b.centroid.x)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            let options: [BubbleCandidate; Choice::COUNT] = std::array::from_fn(|i| band[i]);
            Question {
                number: row as u32 + 1,
                options,
            }
        })
        .collect();

    Ok(questions)
}

fn median_height(candidates: &[BubbleCandidate]) -> f32 {
    let mut heights: Vec<usize> = candidates.iter().map(|c| c.bbox.h).collect();
    heights.sort_unstable();
    heights[heights.len() / 2] as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Point, Rect};

    fn bubble(x: f32, y: f32) -> BubbleCandidate {
        BubbleCandidate {
            centroid: Point::new(x, y),
            bbox: Rect {
                x: x as usize - 10,
                y: y as usize - 10,
                w: 20,
                h: 20,
            },
            area: 314,
        }
    }

    fn grid(rows: usize, jitter: fn(usize, usize) -> (f32, f32)) -> Vec<BubbleCandidate> {
        let mut out = Vec::new();
        for row in 0..rows {
            for col in 0..5 {
                let (dx, dy) = jitter(row, col);
                out.push(bubble(40.0 + col as f32 * 50.0 + dx, 30.0 + row as f32 * 40.0 + dy));
            }
        }
        out
    }

    #[test]
    fn test_clean_grid_rows_and_labels() {
        let mut candidates = grid(3, |_, _| (0.0, 0.0));
        // Shuffle deterministically to prove order independence
        candidates.reverse();
        candidates.swap(2, 9);

        let questions = group_into_questions(candidates, 3).unwrap();
        assert_eq!(questions.len(), 3);
        for (i, q) in questions.iter().enumerate() {
            assert_eq!(q.number, i as u32 + 1);
            // Options strictly left to right
            for w in q.options.windows(2) {
                assert!(w[0].centroid.x < w[1].centroid.x);
            }
            // Row i sits below row i-1
            assert!((q.options[0].centroid.y - (30.0 + i as f32 * 40.0)).abs() < 1.0);
        }
    }

    #[test]
    fn test_jittered_rows_still_band() {
        // Up to 4px of vertical jitter, well inside the 10px tolerance
        let candidates = grid(4, |row, col| {
            let sign = if (row + col) % 2 == 0 { 1.0 } else { -1.0 };
            (0.0, sign * (col as f32))
        });
        let questions = group_into_questions(candidates, 4).unwrap();
        assert_eq!(questions.len(), 4);
    }

    #[test]
    fn test_uneven_rows_are_fatal() {
        // 4 bubbles in the first row, 6 in the second
        let mut candidates = grid(2, |_, _| (0.0, 0.0));
        let moved = candidates.remove(3);
        candidates.push(BubbleCandidate {
            centroid: Point::new(moved.centroid.x + 250.0, moved.centroid.y + 40.0),
            ..moved
        });

        let err = group_into_questions(candidates, 2).unwrap_err();
        assert_eq!(err, ScanError::MalformedGrid);
    }

    #[test]
    fn test_determinism() {
        let a = group_into_questions(grid(5, |_, _| (0.0, 0.0)), 5).unwrap();
        let b = group_into_questions(grid(5, |_, _| (0.0, 0.0)), 5).unwrap();
        for (qa, qb) in a.iter().zip(&b) {
            assert_eq!(qa.number, qb.number);
            for (oa, ob) in qa.options.iter().zip(&qb.options) {
                assert_eq!(oa.centroid, ob.centroid);
            }
        }
    }
}
