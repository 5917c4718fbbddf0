//! Stage 3: locate answer-bubble candidates on the rectified sheet

use tracing::{debug, warn};

use crate::config::BubbleConfig;
use crate::detector::regions::find_regions;
use crate::error::ScanError;
use crate::models::{BitMatrix, BubbleCandidate, RectifiedSheet};
use crate::utils::binarization::adaptive_binarize;

/// Find exactly 5 bubbles per declared question on the rectified sheet.
///
/// Uses a local adaptive threshold (illumination varies across a
/// photographed page even after rectification) and keeps regions that are
/// bubble-sized and near-round. Excess detections are trimmed to the
/// expected count by size; any remaining mismatch is fatal.
///
/// Returns the candidates plus the binary image, which stage 5 reuses to
/// score fill intensity.
pub fn locate_bubbles(
    sheet: &RectifiedSheet,
    num_questions: usize,
    config: &BubbleConfig,
) -> Result<(Vec<BubbleCandidate>, BitMatrix), ScanError> {
    let expected = num_questions * 5;
    let binary = adaptive_binarize(
        &sheet.gray,
        sheet.width,
        sheet.height,
        config.block_size,
        config.bias,
    );

    let mut candidates: Vec<BubbleCandidate> = find_regions(&binary)
        .into_iter()
        .filter(|region| {
            let bbox = region.bbox();
            bbox.w >= config.min_size
                && bbox.h >= config.min_size
                && (config.aspect_min..=config.aspect_max).contains(&bbox.aspect())
        })
        .map(|region| BubbleCandidate {
            centroid: region.centroid(),
            bbox: region.bbox(),
            area: region.area,
        })
        .collect();

    debug!(
        found = candidates.len(),
        expected, "bubble candidates after filtering"
    );

    if candidates.len() > expected {
        warn!(
            found = candidates.len(),
            expected, "trimming noise detections by size"
        );
        // Keep the largest; ties break on position so the trim is deterministic.
        candidates.sort_by(|a, b| {
            b.area.cmp(&a.area).then_with(|| {
                (a.centroid.y, a.centroid.x)
                    .partial_cmp(&(b.centroid.y, b.centroid.x))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
        });
        candidates.truncate(expected);
    }

    if candidates.len() != expected {
        return Err(ScanError::BubbleCountMismatch {
            found: candidates.len(),
            expected,
        });
    }

    Ok((candidates, binary))
}
