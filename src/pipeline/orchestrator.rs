//! The empirical strategy orchestrator.
//!
//! The engine does not predict which strategy suits a payload; it runs every
//! candidate for the media type and mode against the unmodified original and
//! keeps the smallest output. The fold is an explicit accumulator seeded with
//! the original size, so "no candidate improved" falls out naturally instead
//! of being a special case. A candidate that fails is logged and skipped; it
//! can never take the whole run down.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::adapter::MediaAdapter;
use crate::adapter::RawMedia;
use crate::config::EngineConfig;
use crate::error::CrunchError;
use crate::pipeline::artifact::{ArtifactPayload, EncodedArtifact};
use crate::pipeline::candidate::{candidate_set, kernel_decode, CandidateKind, CandidateOutput};
use crate::pipeline::scratch::ScratchFile;
use crate::video::{Frame, ProgressFn};

pub const NO_IMPROVEMENT: &str = "no improvement";

/// The outcome summary of one compression run. Field names are part of the
/// JSON surface consumed by callers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CompressionResult {
    pub success: bool,
    pub original_size: u64,
    pub compressed_size: u64,
    pub ratio: f64,
    pub algorithm: String,
    pub description: String,
    pub error: Option<String>,
}

impl CompressionResult {
    fn empty_payload() -> Self {
        CompressionResult {
            success: true,
            original_size: 0,
            compressed_size: 0,
            ratio: 0.0,
            algorithm: "none".to_string(),
            description: "Empty payload".to_string(),
            error: None,
        }
    }

    fn no_improvement(original_size: u64) -> Self {
        CompressionResult {
            success: false,
            original_size,
            compressed_size: original_size,
            ratio: 1.0,
            algorithm: "none".to_string(),
            description: "No candidate improved on the original".to_string(),
            error: Some(NO_IMPROVEMENT.to_string()),
        }
    }

    fn winner(original_size: u64, compressed_size: u64, candidate: &CandidateKind) -> Self {
        CompressionResult {
            success: true,
            original_size,
            compressed_size,
            ratio: original_size as f64 / compressed_size as f64,
            algorithm: candidate.name().to_string(),
            description: candidate.description(),
            error: None,
        }
    }
}

/// A compression outcome plus the winning bytes, when any candidate won.
#[derive(Debug, Clone)]
pub struct Compressed {
    pub result: CompressionResult,
    pub bytes: Option<Vec<u8>>,
}

/// Runs one candidate to the byte form its size is judged by: artifact bytes
/// for lossless kinds, adapter-re-encoded bytes for lossy transforms.
fn run_candidate(
    candidate: &CandidateKind,
    media: &RawMedia,
    adapter: &dyn MediaAdapter,
    config: &EngineConfig,
    progress: Option<ProgressFn>,
) -> Result<Vec<u8>, CrunchError> {
    match candidate.execute(media, config, progress)? {
        CandidateOutput::Encoded(artifact) => artifact.to_bytes(),
        CandidateOutput::Transformed(raw) => adapter.encode_from_raw(&raw),
    }
}

/// Compresses a payload in memory, trying every applicable candidate.
pub fn compress(
    input: &[u8],
    adapter: &dyn MediaAdapter,
    config: &EngineConfig,
    progress: Option<ProgressFn>,
) -> Result<Compressed, CrunchError> {
    let original_size = input.len() as u64;
    if input.is_empty() {
        return Ok(Compressed {
            result: CompressionResult::empty_payload(),
            bytes: None,
        });
    }

    let media = adapter.decode_to_raw(input)?;
    let mut best: Option<(u64, Vec<u8>, CandidateKind)> = None;

    for candidate in candidate_set(&media, config.mode, config) {
        let bytes = match run_candidate(&candidate, &media, adapter, config, progress) {
            Ok(bytes) => bytes,
            Err(error @ CrunchError::Adapter(_)) => return Err(error),
            Err(error) => {
                warn!("Skipping candidate '{}': {error}", candidate.name());
                continue;
            }
        };
        let size = bytes.len() as u64;
        debug!(
            "Candidate '{}': {size} bytes against original {original_size}",
            candidate.name()
        );

        // Strictly smaller only, so ties keep the earliest candidate.
        let bar = best.as_ref().map(|(s, _, _)| *s).unwrap_or(original_size);
        if size < bar {
            best = Some((size, bytes, candidate));
        }
    }

    Ok(match best {
        Some((size, bytes, candidate)) => Compressed {
            result: CompressionResult::winner(original_size, size, &candidate),
            bytes: Some(bytes),
        },
        None => Compressed {
            result: CompressionResult::no_improvement(original_size),
            bytes: None,
        },
    })
}

/// Reverses a lossless artifact back to container bytes through the adapter.
pub fn decompress(input: &[u8], adapter: &dyn MediaAdapter) -> Result<Vec<u8>, CrunchError> {
    if input.is_empty() {
        return Ok(Vec::new());
    }
    let artifact = EncodedArtifact::from_bytes(input)?;

    let media = match artifact.payload {
        ArtifactPayload::Bytes(blob) => {
            let mut restored = Vec::new();
            kernel_decode(artifact.codec, &blob, &mut restored)?;
            RawMedia::Bytes(restored)
        }
        ArtifactPayload::FrameStream {
            width,
            height,
            frames,
        } => {
            let mut restored = Vec::with_capacity(frames.len());
            for blob in &frames {
                let mut pixels = Vec::new();
                kernel_decode(artifact.codec, blob, &mut pixels)?;
                restored.push(Frame::new(width, height, pixels)?);
            }
            RawMedia::Frames(restored)
        }
    };
    adapter.encode_from_raw(&media)
}

/// File-backed compression: each winning candidate is staged at the scratch
/// path and renamed onto the destination, so the destination only ever holds
/// a complete artifact. If nothing improves, the destination is not created.
pub fn compress_file(
    input_path: &Path,
    output_path: &Path,
    adapter: &dyn MediaAdapter,
    config: &EngineConfig,
    progress: Option<ProgressFn>,
) -> Result<CompressionResult, CrunchError> {
    let input = fs::read(input_path)?;
    let original_size = input.len() as u64;
    if input.is_empty() {
        return Ok(CompressionResult::empty_payload());
    }

    let media = adapter.decode_to_raw(&input)?;
    let mut best: Option<(u64, CandidateKind)> = None;

    for candidate in candidate_set(&media, config.mode, config) {
        let bytes = match run_candidate(&candidate, &media, adapter, config, progress) {
            Ok(bytes) => bytes,
            Err(error @ CrunchError::Adapter(_)) => return Err(error),
            Err(error) => {
                warn!("Skipping candidate '{}': {error}", candidate.name());
                continue;
            }
        };
        let size = bytes.len() as u64;

        let bar = best.as_ref().map(|(s, _)| *s).unwrap_or(original_size);
        let scratch = ScratchFile::write(output_path, &bytes)?;
        if size < bar {
            scratch.promote(output_path)?;
            info!(
                "Promoted candidate '{}' at {size} bytes (was {bar})",
                candidate.name()
            );
            best = Some((size, candidate));
        } else {
            scratch.discard()?;
            debug!(
                "Discarded candidate '{}' at {size} bytes (best {bar})",
                candidate.name()
            );
        }
    }

    Ok(match best {
        Some((size, candidate)) => CompressionResult::winner(original_size, size, &candidate),
        None => CompressionResult::no_improvement(original_size),
    })
}

//==================================================================================
// Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::IdentityAdapter;

    fn lossless_config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn test_repetitive_payload_wins_and_roundtrips() {
        let input = b"aaaaaaaaab";
        let out = compress(input, &IdentityAdapter, &lossless_config(), None).unwrap();

        assert!(out.result.success);
        assert!(out.result.compressed_size < 10);
        assert!(out.result.ratio > 1.0);
        assert!(out.result.error.is_none());

        let bytes = out.bytes.unwrap();
        assert_eq!(bytes.len() as u64, out.result.compressed_size);
        let restored = decompress(&bytes, &IdentityAdapter).unwrap();
        assert_eq!(restored, input);
    }

    #[test]
    fn test_empty_payload_succeeds_without_candidates() {
        let out = compress(&[], &IdentityAdapter, &lossless_config(), None).unwrap();
        assert!(out.result.success);
        assert_eq!(out.result.original_size, 0);
        assert_eq!(out.result.compressed_size, 0);
        assert_eq!(out.result.ratio, 0.0);
        assert!(out.bytes.is_none());
    }

    #[test]
    fn test_incompressible_payload_reports_no_improvement() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let input: Vec<u8> = (0..1000).map(|_| rng.gen()).collect();

        let out = compress(&input, &IdentityAdapter, &lossless_config(), None).unwrap();
        assert!(!out.result.success);
        assert_eq!(out.result.compressed_size, out.result.original_size);
        assert_eq!(out.result.error.as_deref(), Some(NO_IMPROVEMENT));
        assert!(out.bytes.is_none());
    }

    #[test]
    fn test_result_never_exceeds_original() {
        for input in [&b"hello world"[..], &[0u8; 400][..], &[1, 2, 3][..]] {
            let out = compress(input, &IdentityAdapter, &lossless_config(), None).unwrap();
            assert!(out.result.compressed_size <= out.result.original_size);
        }
    }

    #[test]
    fn test_result_serializes_with_stable_field_names() {
        let out = compress(b"aaaaaaaaab", &IdentityAdapter, &lossless_config(), None).unwrap();
        let value = serde_json::to_value(&out.result).unwrap();
        for key in [
            "success",
            "original_size",
            "compressed_size",
            "ratio",
            "algorithm",
            "description",
            "error",
        ] {
            assert!(value.get(key).is_some(), "missing field {key}");
        }
    }

    #[test]
    fn test_compress_file_promotes_and_cleans_up() {
        let dir = std::env::temp_dir();
        let input_path = dir.join(format!("crunch-orch-in-{}", std::process::id()));
        let output_path = dir.join(format!("crunch-orch-out-{}", std::process::id()));
        fs::write(&input_path, vec![b'z'; 4096]).unwrap();

        let result =
            compress_file(&input_path, &output_path, &IdentityAdapter, &lossless_config(), None)
                .unwrap();
        assert!(result.success);
        assert!(output_path.exists());
        assert!(!ScratchFile::path_for(&output_path).exists());

        let restored = decompress(&fs::read(&output_path).unwrap(), &IdentityAdapter).unwrap();
        assert_eq!(restored, vec![b'z'; 4096]);

        fs::remove_file(&input_path).unwrap();
        fs::remove_file(&output_path).unwrap();
    }

    #[test]
    fn test_compress_file_no_improvement_leaves_no_output() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(99);
        let input: Vec<u8> = (0..512).map(|_| rng.gen()).collect();

        let dir = std::env::temp_dir();
        let input_path = dir.join(format!("crunch-orch-rand-in-{}", std::process::id()));
        let output_path = dir.join(format!("crunch-orch-rand-out-{}", std::process::id()));
        fs::write(&input_path, &input).unwrap();

        let result =
            compress_file(&input_path, &output_path, &IdentityAdapter, &lossless_config(), None)
                .unwrap();
        assert!(!result.success);
        assert!(!output_path.exists());
        assert!(!ScratchFile::path_for(&output_path).exists());

        fs::remove_file(&input_path).unwrap();
    }

    #[test]
    fn test_decompress_rejects_garbage() {
        let result = decompress(b"definitely not an artifact", &IdentityAdapter);
        assert!(matches!(result, Err(CrunchError::ArtifactFormat(_))));
    }
}
