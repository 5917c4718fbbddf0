//! End-to-end scan: raw RGB pixels in, graded answer map out

use tracing::{debug, info};

use crate::config::ScanConfig;
use crate::detector::{bubble, grid, marker, rectify, resolve};
use crate::error::ScanError;
use crate::models::ScanResult;
use crate::utils::grayscale::rgb_to_grayscale;

/// Run all five stages on one sheet photo.
///
/// `rgb` is tightly packed 3-byte RGB, `width * height * 3` bytes. The same
/// bytes always produce the same result; every stage is deterministic.
pub fn scan(
    rgb: &[u8],
    width: usize,
    height: usize,
    num_questions: usize,
    config: &ScanConfig,
) -> Result<ScanResult, ScanError> {
    if num_questions == 0 {
        return Err(ScanError::Pipeline("question count must be positive".into()));
    }
    if width == 0 || height == 0 || rgb.len() != width * height * 3 {
        return Err(ScanError::Pipeline(format!(
            "pixel buffer is {} bytes, expected {} for {width}x{height}",
            rgb.len(),
            width * height * 3
        )));
    }

    info!(width, height, num_questions, "scanning sheet");

    let gray = rgb_to_grayscale(rgb, width, height);
    let markers = marker::locate_markers(&gray, width, height, &config.marker)?;
    debug!(markers = markers.len(), "stage 1 done");

    let sheet = rectify::rectify(rgb, width, height, &markers)?;
    debug!(
        width = sheet.width,
        height = sheet.height,
        "stage 2 done"
    );

    let (candidates, binary) = bubble::locate_bubbles(&sheet, num_questions, &config.bubble)?;
    debug!(bubbles = candidates.len(), "stage 3 done");

    let questions = grid::group_into_questions(candidates, num_questions)?;
    debug!(rows = questions.len(), "stage 4 done");

    let (answers, annotated) = resolve::resolve_answers(&sheet, &questions, &binary, &config.scoring);
    info!(questions = answers.len(), "scan complete");

    Ok(ScanResult {
        answers,
        total_questions: num_questions as u32,
        annotated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_mismatched_buffer() {
        let err = scan(&[0u8; 30], 100, 100, 10, &ScanConfig::default()).unwrap_err();
        assert!(matches!(err, ScanError::Pipeline(_)));
    }

    #[test]
    fn test_rejects_zero_questions() {
        let rgb = vec![255u8; 10 * 10 * 3];
        let err = scan(&rgb, 10, 10, 0, &ScanConfig::default()).unwrap_err();
        assert!(matches!(err, ScanError::Pipeline(_)));
    }

    #[test]
    fn test_blank_page_has_no_markers() {
        let rgb = vec![255u8; 200 * 200 * 3];
        let err = scan(&rgb, 200, 200, 10, &ScanConfig::default()).unwrap_err();
        assert_eq!(err, ScanError::MarkersNotFound { found: 0 });
    }
}
