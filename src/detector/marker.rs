//! Stage 1: locate the alignment markers printed near the page corners

use tracing::{debug, warn};

use crate::config::MarkerConfig;
use crate::detector::regions::find_regions;
use crate::error::ScanError;
use crate::models::{CornerRole, Marker, Point};
use crate::utils::binarization::otsu_binarize;
use crate::utils::grayscale::box_blur_5x5;

/// Find 3 or 4 role-tagged corner markers on the raw (pre-rectification) image.
///
/// The image is smoothed, globally thresholded (Otsu picks the level) and
/// segmented into connected regions; regions that are large, near-square and
/// solid qualify as markers. Each survivor is tagged with the page quadrant
/// its centroid falls in. More than four survivors are trimmed to the best
/// four; fewer than three is fatal.
pub fn locate_markers(
    gray: &[u8],
    width: usize,
    height: usize,
    config: &MarkerConfig,
) -> Result<Vec<Marker>, ScanError> {
    let blurred = box_blur_5x5(gray, width, height);
    let binary = otsu_binarize(&blurred, width, height);

    let mut markers: Vec<Marker> = find_regions(&binary)
        .into_iter()
        .filter(|region| {
            let bbox = region.bbox();
            region.area >= config.min_area
                && (config.aspect_min..=config.aspect_max).contains(&bbox.aspect())
                && region.solidity() >= config.min_solidity
        })
        .map(|region| {
            let centroid = region.centroid();
            Marker {
                centroid,
                area: region.area,
                bbox: region.bbox(),
                role: quadrant_role(centroid, width, height),
            }
        })
        .collect();

    debug!(count = markers.len(), "marker candidates after filtering");

    if markers.len() < 3 {
        return Err(ScanError::MarkersNotFound {
            found: markers.len(),
        });
    }

    if markers.len() > 4 {
        warn!(
            count = markers.len(),
            "more than 4 marker candidates, keeping the best 4"
        );
        // Largest area wins; on equal area, closer to its expected corner wins.
        markers.sort_by(|a, b| {
            b.area.cmp(&a.area).then_with(|| {
                let da = corner_distance(a, width, height);
                let db = corner_distance(b, width, height);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
        });
        markers.truncate(4);
    }

    Ok(markers)
}

fn quadrant_role(centroid: Point, width: usize, height: usize) -> CornerRole {
    let left = centroid.x < width as f32 / 2.0;
    let top = centroid.y < height as f32 / 2.0;
    match (top, left) {
        (true, true) => CornerRole::TopLeft,
        (true, false) => CornerRole::TopRight,
        (false, true) => CornerRole::BottomLeft,
        (false, false) => CornerRole::BottomRight,
    }
}

fn corner_distance(marker: &Marker, width: usize, height: usize) -> f32 {
    marker
        .centroid
        .distance(&marker.role.expected_corner(width, height))
}
