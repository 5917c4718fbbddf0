//! Stage 5: score fill intensity and resolve each question to a verdict
//!
//! Resolution never fails. A question where no option stands out resolves to
//! `Verdict::Ambiguous` rather than aborting the sheet; blank rows, double
//! marks and faint erasures all land there.

use tracing::debug;

use crate::config::ScoringConfig;
use crate::models::{
    AnnotatedImage, AnswerMap, BitMatrix, BubbleCandidate, Choice, Question, RectifiedSheet,
    Verdict,
};

/// Resolve every question row against the stage-3 binary image.
///
/// Returns the verdicts keyed by question number plus a copy of the
/// rectified image with the outcome drawn on top of each bubble.
pub fn resolve_answers(
    sheet: &RectifiedSheet,
    questions: &[Question],
    binary: &BitMatrix,
    config: &ScoringConfig,
) -> (AnswerMap, AnnotatedImage) {
    let mut verdicts = Vec::with_capacity(questions.len());
    let mut annotated = AnnotatedImage {
        rgb: sheet.rgb.clone(),
        width: sheet.width,
        height: sheet.height,
    };

    for question in questions {
        let scores: [f32; Choice::COUNT] =
            std::array::from_fn(|i| fill_score(binary, &question.options[i]));
        let verdict = resolve_scores(&scores, config.confidence_ratio);
        debug!(question = question.number, ?scores, %verdict, "resolved");

        for (i, bubble) in question.options.iter().enumerate() {
            let chosen = matches!(verdict, Verdict::Marked(c) if c.index() == i);
            draw_outcome(&mut annotated, bubble, chosen);
        }
        verdicts.push(verdict);
    }

    (AnswerMap::from_verdicts(verdicts), annotated)
}

/// Fraction of dark pixels inside the circle inscribed in the bubble's bbox.
///
/// Sampling the inscribed circle instead of the full bbox keeps the printed
/// outline corners out of the score, so an unmarked ring scores near its ink
/// coverage and a filled bubble scores near 1.
pub fn fill_score(binary: &BitMatrix, bubble: &BubbleCandidate) -> f32 {
    let center = bubble.bbox.center();
    let radius = (bubble.bbox.w.min(bubble.bbox.h) as f32) / 2.0;
    let r2 = radius * radius;

    let mut dark = 0usize;
    let mut total = 0usize;
    for y in bubble.bbox.y..bubble.bbox.y + bubble.bbox.h {
        for x in bubble.bbox.x..bubble.bbox.x + bubble.bbox.w {
            let dx = x as f32 + 0.5 - center.x;
            let dy = y as f32 + 0.5 - center.y;
            if dx * dx + dy * dy > r2 {
                continue;
            }
            total += 1;
            if binary.get(x, y) {
                dark += 1;
            }
        }
    }

    if total == 0 {
        return 0.0;
    }
    dark as f32 / total as f32
}

/// Apply the confidence rule to one row of fill scores.
///
/// The darkest option wins only when it exceeds `ratio` times the runner-up.
/// A row of all-zero scores is ambiguous by definition.
pub fn resolve_scores(scores: &[f32; Choice::COUNT], ratio: f32) -> Verdict {
    let mut top = 0usize;
    for i in 1..scores.len() {
        if scores[i] > scores[top] {
            top = i;
        }
    }
    if scores[top] <= 0.0 {
        return Verdict::Ambiguous;
    }

    let runner_up = scores
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != top)
        .map(|(_, &s)| s)
        .fold(0.0f32, f32::max);

    if scores[top] > ratio * runner_up {
        match Choice::from_index(top) {
            Some(choice) => Verdict::Marked(choice),
            None => Verdict::Ambiguous,
        }
    } else {
        Verdict::Ambiguous
    }
}

/// Circle the bubble on the annotation: thick yellow for the chosen option,
/// thin green for the rest.
fn draw_outcome(image: &mut AnnotatedImage, bubble: &BubbleCandidate, chosen: bool) {
    let (color, thickness) = if chosen {
        ([255u8, 215, 0], 3.0f32)
    } else {
        ([0u8, 200, 0], 1.0f32)
    };
    let center = bubble.bbox.center();
    let radius = (bubble.bbox.w.max(bubble.bbox.h) as f32) / 2.0 + 2.0;

    let pad = thickness.ceil() as isize + 1;
    let y0 = (bubble.bbox.y as isize - pad).max(0) as usize;
    let y1 = ((bubble.bbox.y + bubble.bbox.h) as isize + pad).min(image.height as isize) as usize;
    let x0 = (bubble.bbox.x as isize - pad).max(0) as usize;
    let x1 = ((bubble.bbox.x + bubble.bbox.w) as isize + pad).min(image.width as isize) as usize;

    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f32 + 0.5 - center.x;
            let dy = y as f32 + 0.5 - center.y;
            let dist = (dx * dx + dy * dy).sqrt();
            if (dist - radius).abs() <= thickness / 2.0 {
                let idx = (y * image.width + x) * 3;
                image.rgb[idx..idx + 3].copy_from_slice(&color);
            }
        }
    }
}
