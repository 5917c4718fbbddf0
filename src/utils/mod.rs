//! Pixel-level primitives shared by the detection stages

/// Global and adaptive thresholding
pub mod binarization;
/// Perspective transforms and quad measures
pub mod geometry;
/// RGB to grayscale conversion and smoothing
pub mod grayscale;
