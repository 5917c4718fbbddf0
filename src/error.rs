//! The closed set of pipeline failure kinds
//!
//! Every variant describes a structurally unsuitable image, not a transient
//! fault: retrying with the same bytes cannot succeed. Callers map these to
//! user-facing messages; the pipeline only propagates them.

use thiserror::Error;

/// Fatal pipeline failures, one per stage contract violation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScanError {
    /// Stage 1 found fewer than the three markers rectification needs
    #[error("found {found} alignment markers, need at least 3")]
    MarkersNotFound {
        /// Qualifying marker regions found
        found: usize,
    },

    /// Stage 2 could not form a usable quadrilateral from the markers
    #[error("marker geometry is degenerate, cannot rectify perspective")]
    InvalidGeometry,

    /// Stage 3 could not isolate exactly five bubbles per question
    #[error("found {found} answer bubbles, expected {expected}")]
    BubbleCountMismatch {
        /// Candidates retained after filtering
        found: usize,
        /// 5 x declared question count
        expected: usize,
    },

    /// Stage 4 could not partition the bubbles into rows of five
    #[error("bubble positions do not form a grid of 5-option rows")]
    MalformedGrid,

    /// Any other stage-internal fault
    #[error("pipeline failure: {0}")]
    Pipeline(String),
}
