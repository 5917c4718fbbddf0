//! Pipeline and cache configuration
//!
//! All vision parameters are plain struct fields with documented defaults.
//! `from_env()` constructors read `GABARITO_*` overrides for deployments
//! that tune without recompiling; nothing here is global state.

use std::time::Duration;

fn parse_env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn parse_env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_env_i32(name: &str, default: i32) -> i32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<i32>().ok())
        .unwrap_or(default)
}

fn parse_env_f32(name: &str, default: f32) -> f32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<f32>().ok())
        .unwrap_or(default)
}

/// Marker detection parameters (stage 1)
#[derive(Debug, Clone, Copy)]
pub struct MarkerConfig {
    /// Minimum dark pixel count for a region to qualify as a marker
    pub min_area: usize,
    /// Accepted bbox width/height ratio band
    pub aspect_min: f32,
    /// Accepted bbox width/height ratio band
    pub aspect_max: f32,
    /// Minimum area/bbox ratio; rejects outlines, text and round
    /// bubble marks (a filled disk sits near 0.785)
    pub min_solidity: f32,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            min_area: 100,
            aspect_min: 0.8,
            aspect_max: 1.2,
            min_solidity: 0.85,
        }
    }
}

/// Bubble detection parameters (stage 3)
#[derive(Debug, Clone, Copy)]
pub struct BubbleConfig {
    /// Adaptive threshold neighborhood side length
    pub block_size: usize,
    /// Adaptive threshold bias constant
    pub bias: i32,
    /// Minimum bubble bbox width and height in pixels
    pub min_size: usize,
    /// Accepted bbox width/height ratio band
    pub aspect_min: f32,
    /// Accepted bbox width/height ratio band
    pub aspect_max: f32,
}

impl Default for BubbleConfig {
    fn default() -> Self {
        Self {
            block_size: 25,
            bias: 5,
            min_size: 18,
            aspect_min: 0.8,
            aspect_max: 1.2,
        }
    }
}

/// Answer resolution parameters (stage 5)
#[derive(Debug, Clone, Copy)]
pub struct ScoringConfig {
    /// The top fill score must exceed this multiple of the runner-up,
    /// otherwise the question resolves to ambiguous
    pub confidence_ratio: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            confidence_ratio: 1.5,
        }
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanConfig {
    /// Stage 1 parameters
    pub marker: MarkerConfig,
    /// Stage 3 parameters
    pub bubble: BubbleConfig,
    /// Stage 5 parameters
    pub scoring: ScoringConfig,
}

impl ScanConfig {
    /// Defaults with `GABARITO_*` environment overrides applied
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            marker: MarkerConfig {
                min_area: parse_env_usize("GABARITO_MIN_MARKER_AREA", defaults.marker.min_area),
                aspect_min: parse_env_f32("GABARITO_MARKER_ASPECT_MIN", defaults.marker.aspect_min),
                aspect_max: parse_env_f32("GABARITO_MARKER_ASPECT_MAX", defaults.marker.aspect_max),
                min_solidity: parse_env_f32(
                    "GABARITO_MARKER_MIN_SOLIDITY",
                    defaults.marker.min_solidity,
                ),
            },
            bubble: BubbleConfig {
                block_size: parse_env_usize("GABARITO_BUBBLE_BLOCK_SIZE", defaults.bubble.block_size),
                bias: parse_env_i32("GABARITO_BUBBLE_BIAS", defaults.bubble.bias),
                min_size: parse_env_usize("GABARITO_MIN_BUBBLE_SIZE", defaults.bubble.min_size),
                aspect_min: parse_env_f32("GABARITO_BUBBLE_ASPECT_MIN", defaults.bubble.aspect_min),
                aspect_max: parse_env_f32("GABARITO_BUBBLE_ASPECT_MAX", defaults.bubble.aspect_max),
            },
            scoring: ScoringConfig {
                confidence_ratio: parse_env_f32(
                    "GABARITO_CONFIDENCE_RATIO",
                    defaults.scoring.confidence_ratio,
                ),
            },
        }
    }
}

/// Result cache sizing
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// Maximum number of cached results
    pub max_entries: usize,
    /// Entry lifetime; older entries read as misses
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 50,
            ttl: Duration::from_secs(1800),
        }
    }
}

impl CacheConfig {
    /// Defaults with `GABARITO_*` environment overrides applied
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: parse_env_usize("GABARITO_CACHE_MAX_ENTRIES", defaults.max_entries),
            ttl: Duration::from_secs(parse_env_u64(
                "GABARITO_CACHE_TTL_SECONDS",
                defaults.ttl.as_secs(),
            )),
        }
    }
}
