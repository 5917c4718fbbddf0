use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::Point;

/// One of the five lettered options on a question row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Choice {
    /// Leftmost option
    A,
    /// Second option
    B,
    /// Third option
    C,
    /// Fourth option
    D,
    /// Rightmost option
    E,
}

impl Choice {
    /// Number of options per question
    pub const COUNT: usize = 5;

    /// Get the choice at a column index (0 = A .. 4 = E)
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Choice::A),
            1 => Some(Choice::B),
            2 => Some(Choice::C),
            3 => Some(Choice::D),
            4 => Some(Choice::E),
            _ => None,
        }
    }

    /// Column index of this choice (0 = A .. 4 = E)
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Parse a choice from its letter, case-insensitive
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(Choice::A),
            'B' => Some(Choice::B),
            'C' => Some(Choice::C),
            'D' => Some(Choice::D),
            'E' => Some(Choice::E),
            _ => None,
        }
    }

    /// The letter for this choice
    pub fn as_char(&self) -> char {
        match self {
            Choice::A => 'A',
            Choice::B => 'B',
            Choice::C => 'C',
            Choice::D => 'D',
            Choice::E => 'E',
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Resolver verdict for a single question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum Verdict {
    /// One option was confidently darker than the rest
    Marked(Choice),
    /// No option stood out against the runner-up
    Ambiguous,
}

impl From<Verdict> for String {
    fn from(v: Verdict) -> String {
        v.to_string()
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Marked(choice) => write!(f, "{}", choice),
            Verdict::Ambiguous => write!(f, "ambiguous"),
        }
    }
}

/// Mapping from 1-based question number to verdict, keys always contiguous 1..N
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerMap(BTreeMap<u32, Verdict>);

impl AnswerMap {
    /// Build from verdicts in question order (index 0 becomes question 1)
    pub fn from_verdicts(verdicts: Vec<Verdict>) -> Self {
        Self(
            verdicts
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i as u32 + 1, v))
                .collect(),
        )
    }

    /// Verdict for a question number, if present
    pub fn get(&self, question: u32) -> Option<Verdict> {
        self.0.get(&question).copied()
    }

    /// Number of questions
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no questions were resolved
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over (question number, verdict) in question order
    pub fn iter(&self) -> impl Iterator<Item = (u32, Verdict)> + '_ {
        self.0.iter().map(|(&q, &v)| (q, v))
    }
}

/// Axis-aligned bounding box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    /// Left edge
    pub x: usize,
    /// Top edge
    pub y: usize,
    /// Width in pixels
    pub w: usize,
    /// Height in pixels
    pub h: usize,
}

impl Rect {
    /// Width / height ratio
    pub fn aspect(&self) -> f32 {
        self.w as f32 / self.h.max(1) as f32
    }

    /// Geometric center
    pub fn center(&self) -> Point {
        Point::new(
            self.x as f32 + self.w as f32 / 2.0,
            self.y as f32 + self.h as f32 / 2.0,
        )
    }
}

/// Which page corner a marker belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CornerRole {
    /// Upper-left quadrant
    TopLeft,
    /// Upper-right quadrant
    TopRight,
    /// Lower-left quadrant
    BottomLeft,
    /// Lower-right quadrant
    BottomRight,
}

impl CornerRole {
    /// The ideal marker position for this role on a width x height page
    pub fn expected_corner(&self, width: usize, height: usize) -> Point {
        let (w, h) = (width as f32 - 1.0, height as f32 - 1.0);
        match self {
            CornerRole::TopLeft => Point::new(0.0, 0.0),
            CornerRole::TopRight => Point::new(w, 0.0),
            CornerRole::BottomLeft => Point::new(0.0, h),
            CornerRole::BottomRight => Point::new(w, h),
        }
    }
}

/// An alignment marker detected near a page corner
#[derive(Debug, Clone, Copy)]
pub struct Marker {
    /// Centroid of the marker region
    pub centroid: Point,
    /// Dark pixel count of the region
    pub area: usize,
    /// Bounding box of the region
    pub bbox: Rect,
    /// Corner the marker was assigned to
    pub role: CornerRole,
}

/// A candidate answer bubble on the rectified sheet
#[derive(Debug, Clone, Copy)]
pub struct BubbleCandidate {
    /// Centroid of the region
    pub centroid: Point,
    /// Bounding box of the region
    pub bbox: Rect,
    /// Dark pixel count of the region
    pub area: usize,
}

/// One question row: exactly five candidates in column order A..E
#[derive(Debug, Clone)]
pub struct Question {
    /// 1-based question number, assigned top to bottom
    pub number: u32,
    /// Candidates in left-to-right order; index 0 is option A
    pub options: [BubbleCandidate; Choice::COUNT],
}

/// Perspective-corrected sheet produced by the rectifier
#[derive(Debug, Clone)]
pub struct RectifiedSheet {
    /// RGB pixels, 3 bytes per pixel
    pub rgb: Vec<u8>,
    /// Grayscale plane derived from `rgb`
    pub gray: Vec<u8>,
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
}

/// Rectified RGB image with resolved bubbles circled, for caller display
#[derive(Debug, Clone)]
pub struct AnnotatedImage {
    /// RGB pixels, 3 bytes per pixel
    pub rgb: Vec<u8>,
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
}

/// Full pipeline output for one sheet
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    /// Verdict per question, keys 1..N
    pub answers: AnswerMap,
    /// Number of questions the sheet was scanned for
    pub total_questions: u32,
    /// Annotated rectified image (not serialized; the caller encodes it)
    #[serde(skip)]
    pub annotated: AnnotatedImage,
}
