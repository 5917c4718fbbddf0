//! Core data structures shared across the pipeline stages

/// Compact binary image
pub mod matrix;
/// 2D point math
pub mod point;
/// Answer-sheet domain types (choices, verdicts, markers, questions)
pub mod sheet;

pub use matrix::BitMatrix;
pub use point::Point;
pub use sheet::{
    AnnotatedImage, AnswerMap, BubbleCandidate, Choice, CornerRole, Marker, Question, Rect,
    RectifiedSheet, ScanResult, Verdict,
};
