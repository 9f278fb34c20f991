//! The single source of truth for all crunch compression configuration.
//!
//! This module defines the unified `EngineConfig` struct, which is designed to
//! be created once at the application boundary (e.g., from a user request or a
//! config file) and then passed by reference through the system. Centralizing
//! the settings here keeps the kernels and the video pipeline free of ambient
//! tuning knobs.

use serde::{Deserialize, Serialize};

use crate::error::CrunchError;

//==================================================================================
// I. Core Configuration Enums & Structs
//==================================================================================

/// Selects between the lossy and lossless candidate sets.
///
/// This is the primary input to candidate enumeration. Lossless candidates
/// must round-trip exactly; lossy candidates trade fidelity for size and are
/// steered by [`Quality`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompressionMode {
    /// Transforms that discard information (DCT quantization, motion blend,
    /// text reduction). Output size is measured after re-encoding.
    Lossy,

    /// **Default:** fully reversible entropy/dictionary coding. The `quality`
    /// parameter is ignored by these candidates.
    #[default]
    Lossless,
}

/// A validated compression quality in `[1, 100]`.
///
/// Lower values quantize more aggressively. Lossless candidates ignore it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "u8", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u8) -> Result<Self, CrunchError> {
        if (1..=100).contains(&value) {
            Ok(Quality(value))
        } else {
            Err(CrunchError::InvalidQuality(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Quality(50)
    }
}

impl TryFrom<u8> for Quality {
    type Error = CrunchError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Quality::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> u8 {
        quality.0
    }
}

//==================================================================================
// II. The Unified EngineConfig
//==================================================================================

/// The single, unified configuration for a compression run.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Lossy or lossless candidate set.
    #[serde(default)]
    pub mode: CompressionMode,

    /// Quality in `[1, 100]`; drives DCT quantization and lossy text
    /// reduction. Ignored by lossless candidates.
    #[serde(default)]
    pub quality: Quality,

    /// LZ77 sliding-window size in symbols. Larger windows find better
    /// matches at O(window * lookahead) cost per position.
    #[serde(default = "default_lz77_window")]
    pub lz77_window: usize,

    /// LZ77 lookahead buffer size in symbols. Capped at 255 so a match
    /// length always fits the token's length byte.
    #[serde(default = "default_lz77_lookahead")]
    pub lz77_lookahead: usize,

    /// Zstd compression level for the final-stage entropy candidate.
    #[serde(default = "default_zstd_level")]
    pub zstd_level: i32,

    /// Block edge length for motion estimation.
    #[serde(default = "default_motion_block_size")]
    pub motion_block_size: usize,

    /// Motion search range in pixels (searched as a +/- window).
    #[serde(default = "default_motion_search_range")]
    pub motion_search_range: i32,

    /// Worker count for frame-chunk parallelism. `0` means auto-detect from
    /// the available CPU parallelism.
    #[serde(default)]
    pub workers: usize,

    /// Upper bound on the number of frames processed per chunk.
    #[serde(default = "default_max_chunk_frames")]
    pub max_chunk_frames: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: CompressionMode::default(),
            quality: Quality::default(),
            lz77_window: default_lz77_window(),
            lz77_lookahead: default_lz77_lookahead(),
            zstd_level: default_zstd_level(),
            motion_block_size: default_motion_block_size(),
            motion_search_range: default_motion_search_range(),
            workers: 0,
            max_chunk_frames: default_max_chunk_frames(),
        }
    }
}

impl EngineConfig {
    /// Resolves the effective worker count, auto-detecting when unset.
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1)
        } else {
            self.workers
        }
    }
}

fn default_lz77_window() -> usize {
    4096
}

fn default_lz77_lookahead() -> usize {
    64
}

fn default_zstd_level() -> i32 {
    3
}

fn default_motion_block_size() -> usize {
    16
}

fn default_motion_search_range() -> i32 {
    16
}

fn default_max_chunk_frames() -> usize {
    30
}

//==================================================================================
// Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_bounds() {
        assert!(Quality::new(1).is_ok());
        assert!(Quality::new(100).is_ok());
        assert!(matches!(
            Quality::new(0),
            Err(CrunchError::InvalidQuality(0))
        ));
        assert!(matches!(
            Quality::new(101),
            Err(CrunchError::InvalidQuality(101))
        ));
    }

    #[test]
    fn test_config_defaults_from_empty_json() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.mode, CompressionMode::Lossless);
        assert_eq!(config.quality.get(), 50);
        assert_eq!(config.lz77_window, 4096);
        assert_eq!(config.lz77_lookahead, 64);
        assert_eq!(config.motion_block_size, 16);
        assert_eq!(config.max_chunk_frames, 30);
    }

    #[test]
    fn test_config_mode_round_trips_snake_case() {
        let json = r#"{"mode":"lossy","quality":80}"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.mode, CompressionMode::Lossy);
        assert_eq!(config.quality.get(), 80);

        let back = serde_json::to_string(&config).unwrap();
        assert!(back.contains("\"mode\":\"lossy\""));
    }

    #[test]
    fn test_effective_workers_auto_detect() {
        let config = EngineConfig::default();
        assert!(config.effective_workers() >= 1);

        let pinned = EngineConfig {
            workers: 3,
            ..Default::default()
        };
        assert_eq!(pinned.effective_workers(), 3);
    }
}
