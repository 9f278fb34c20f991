//! Candidate strategies and their execution.
//!
//! A [`CandidateKind`] is a closed enum over every strategy the orchestrator
//! may try, with tuning parameters carried in the variant. Dispatch is a
//! `match`, never a string lookup, so an unhandled strategy is a compile
//! error. `execute` is referentially transparent: the same media and
//! parameters always produce the same output.
//!
//! Lossless candidates produce a self-describing [`EncodedArtifact`] and are
//! verified by decoding before they are allowed to compete. Lossy candidates
//! produce transformed [`RawMedia`]; their size is measured later through the
//! caller's adapter.

use crate::adapter::RawMedia;
use crate::config::{CompressionMode, EngineConfig, Quality};
use crate::error::CrunchError;
use crate::kernels::{huffman, lz77, rle, zstd};
use crate::pipeline::artifact::{ArtifactPayload, CodecTag, EncodedArtifact};
use crate::video::{transform_sequence, FrameTransform, ProgressFn};

/// One compression strategy with its tuning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    Huffman,
    RunLength,
    Lz77 {
        window: usize,
        lookahead: usize,
    },
    Zstd {
        level: i32,
    },
    LossyText {
        quality: Quality,
    },
    MotionCompensation {
        block_size: usize,
        search_range: i32,
    },
    DctQuantization {
        quality: Quality,
    },
    Hybrid {
        block_size: usize,
        search_range: i32,
        quality: Quality,
    },
}

/// What a candidate produced: reversible artifact bytes, or transformed media
/// still needing adapter re-encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateOutput {
    Encoded(EncodedArtifact),
    Transformed(RawMedia),
}

impl CandidateKind {
    /// Stable machine-readable strategy name, reported in results.
    pub fn name(&self) -> &'static str {
        match self {
            CandidateKind::Huffman => "huffman",
            CandidateKind::RunLength => "rle",
            CandidateKind::Lz77 { .. } => "lz77",
            CandidateKind::Zstd { .. } => "zstd",
            CandidateKind::LossyText { .. } => "lossy_text",
            CandidateKind::MotionCompensation { .. } => "motion_compensation",
            CandidateKind::DctQuantization { .. } => "dct_quantization",
            CandidateKind::Hybrid { .. } => "hybrid",
        }
    }

    /// Human-readable description including the tuning parameters.
    pub fn description(&self) -> String {
        match self {
            CandidateKind::Huffman => "Huffman entropy coding".to_string(),
            CandidateKind::RunLength => "Run-length encoding".to_string(),
            CandidateKind::Lz77 { window, lookahead } => {
                format!("LZ77 dictionary coding (window {window}, lookahead {lookahead})")
            }
            CandidateKind::Zstd { level } => format!("Zstandard (level {level})"),
            CandidateKind::LossyText { quality } => {
                format!("Lossy text reduction (quality {})", quality.get())
            }
            CandidateKind::MotionCompensation {
                block_size,
                search_range,
            } => format!(
                "Motion-compensated temporal blend ({block_size}x{block_size} blocks, +/-{search_range}px)"
            ),
            CandidateKind::DctQuantization { quality } => {
                format!("DCT quantization (quality {})", quality.get())
            }
            CandidateKind::Hybrid {
                block_size,
                search_range,
                quality,
            } => format!(
                "Motion estimation + DCT quantization ({block_size}x{block_size}, +/-{search_range}px, quality {})",
                quality.get()
            ),
        }
    }

    /// The artifact codec tag for lossless kinds.
    pub fn codec_tag(&self) -> Option<CodecTag> {
        match self {
            CandidateKind::Huffman => Some(CodecTag::Huffman),
            CandidateKind::RunLength => Some(CodecTag::RunLength),
            CandidateKind::Lz77 { .. } => Some(CodecTag::Lz77),
            CandidateKind::Zstd { .. } => Some(CodecTag::Zstd),
            _ => None,
        }
    }

    /// Runs the strategy against the unmodified media.
    pub fn execute(
        &self,
        media: &RawMedia,
        config: &EngineConfig,
        progress: Option<ProgressFn>,
    ) -> Result<CandidateOutput, CrunchError> {
        match (self, media) {
            (kind, RawMedia::Bytes(bytes)) if kind.codec_tag().is_some() => {
                let codec = required_tag(kind)?;
                let blob = encode_verified(kind, codec, bytes)?;
                Ok(CandidateOutput::Encoded(EncodedArtifact {
                    codec,
                    payload: ArtifactPayload::Bytes(blob),
                }))
            }

            (kind, RawMedia::Frames(frames)) if kind.codec_tag().is_some() => {
                let codec = required_tag(kind)?;
                let (width, height) = frames
                    .first()
                    .map(|f| (f.width, f.height))
                    .unwrap_or((0, 0));
                let mut blobs = Vec::with_capacity(frames.len());
                for frame in frames {
                    blobs.push(encode_verified(kind, codec, &frame.pixels)?);
                }
                Ok(CandidateOutput::Encoded(EncodedArtifact {
                    codec,
                    payload: ArtifactPayload::FrameStream {
                        width,
                        height,
                        frames: blobs,
                    },
                }))
            }

            (CandidateKind::LossyText { quality }, RawMedia::Bytes(bytes)) => Ok(
                CandidateOutput::Transformed(RawMedia::Bytes(reduce_text(bytes, quality.get()))),
            ),

            (
                CandidateKind::MotionCompensation {
                    block_size,
                    search_range,
                },
                RawMedia::Frames(frames),
            ) => {
                let transform = FrameTransform::MotionCompensation {
                    block_size: *block_size,
                    search_range: *search_range,
                };
                let out = transform_sequence(frames, &transform, config, progress)?;
                Ok(CandidateOutput::Transformed(RawMedia::Frames(out)))
            }

            (CandidateKind::DctQuantization { quality }, RawMedia::Frames(frames)) => {
                let transform = FrameTransform::DctQuantization { quality: *quality };
                let out = transform_sequence(frames, &transform, config, progress)?;
                Ok(CandidateOutput::Transformed(RawMedia::Frames(out)))
            }

            (
                CandidateKind::Hybrid {
                    block_size,
                    search_range,
                    quality,
                },
                RawMedia::Frames(frames),
            ) => {
                let transform = FrameTransform::Hybrid {
                    block_size: *block_size,
                    search_range: *search_range,
                    quality: *quality,
                };
                let out = transform_sequence(frames, &transform, config, progress)?;
                Ok(CandidateOutput::Transformed(RawMedia::Frames(out)))
            }

            (kind, _) => Err(CrunchError::Internal(format!(
                "Candidate '{}' does not apply to this media type",
                kind.name()
            ))),
        }
    }
}

/// The fixed, ordered strategy list for a media type and mode. Order matters:
/// the orchestrator keeps the earliest candidate on a size tie.
pub fn candidate_set(
    media: &RawMedia,
    mode: CompressionMode,
    config: &EngineConfig,
) -> Vec<CandidateKind> {
    let lossless = vec![
        CandidateKind::Huffman,
        CandidateKind::RunLength,
        CandidateKind::Lz77 {
            window: config.lz77_window,
            lookahead: config.lz77_lookahead,
        },
        CandidateKind::Zstd {
            level: config.zstd_level,
        },
    ];

    match (media, mode) {
        (RawMedia::Bytes(_), CompressionMode::Lossless) => lossless,
        (RawMedia::Bytes(_), CompressionMode::Lossy) => {
            // Lossy byte mode still races the lossless kernels; the text
            // reduction merely joins the contest.
            let mut set = vec![CandidateKind::LossyText {
                quality: config.quality,
            }];
            set.extend(lossless);
            set
        }
        (RawMedia::Frames(_), CompressionMode::Lossless) => lossless,
        (RawMedia::Frames(_), CompressionMode::Lossy) => vec![
            CandidateKind::MotionCompensation {
                block_size: config.motion_block_size,
                search_range: config.motion_search_range,
            },
            CandidateKind::DctQuantization {
                quality: config.quality,
            },
            CandidateKind::Hybrid {
                block_size: config.motion_block_size,
                search_range: config.motion_search_range,
                quality: config.quality,
            },
        ],
    }
}

//==================================================================================
// I. Kernel dispatch
//==================================================================================

fn required_tag(kind: &CandidateKind) -> Result<CodecTag, CrunchError> {
    kind.codec_tag()
        .ok_or_else(|| CrunchError::Internal(format!("'{}' is not a byte kernel", kind.name())))
}

fn kernel_encode(
    kind: &CandidateKind,
    input: &[u8],
    output_buf: &mut Vec<u8>,
) -> Result<(), CrunchError> {
    match kind {
        CandidateKind::Huffman => huffman::encode(input, output_buf),
        CandidateKind::RunLength => rle::encode(input, output_buf),
        CandidateKind::Lz77 { window, lookahead } => {
            lz77::encode(input, output_buf, *window, *lookahead)
        }
        CandidateKind::Zstd { level } => zstd::encode(input, output_buf, *level),
        other => Err(CrunchError::Internal(format!(
            "'{}' is not a byte kernel",
            other.name()
        ))),
    }
    .map_err(|e| CrunchError::CandidateExecution {
        name: kind.name().to_string(),
        source: Box::new(e),
    })
}

/// Decodes one kernel blob by codec tag. Used by the decompression path.
pub fn kernel_decode(
    codec: CodecTag,
    input: &[u8],
    output_buf: &mut Vec<u8>,
) -> Result<(), CrunchError> {
    match codec {
        CodecTag::Huffman => huffman::decode(input, output_buf),
        CodecTag::RunLength => rle::decode(input, output_buf),
        CodecTag::Lz77 => lz77::decode(input, output_buf),
        CodecTag::Zstd => zstd::decode(input, output_buf),
    }
}

/// Encodes a blob and proves it decodes back to the input before letting it
/// compete on size.
fn encode_verified(
    kind: &CandidateKind,
    codec: CodecTag,
    input: &[u8],
) -> Result<Vec<u8>, CrunchError> {
    let mut blob = Vec::new();
    kernel_encode(kind, input, &mut blob)?;

    let mut restored = Vec::new();
    kernel_decode(codec, &blob, &mut restored)?;
    if restored != input {
        return Err(CrunchError::CandidateExecution {
            name: kind.name().to_string(),
            source: Box::new(CrunchError::Internal(
                "round-trip verification mismatch".to_string(),
            )),
        });
    }
    Ok(blob)
}

//==================================================================================
// II. Lossy text reduction
//==================================================================================

/// Quality-steered text shrinking: whitespace runs always collapse to one
/// space; below quality 70 ASCII punctuation is dropped; below 50 the text is
/// lowercased.
fn reduce_text(input: &[u8], quality: u8) -> Vec<u8> {
    let mut output = Vec::with_capacity(input.len());
    let mut pending_space = false;

    for &byte in input {
        if byte.is_ascii_whitespace() {
            pending_space = !output.is_empty();
            continue;
        }
        if quality < 70 && byte.is_ascii_punctuation() {
            continue;
        }
        if pending_space {
            output.push(b' ');
            pending_space = false;
        }
        output.push(if quality < 50 {
            byte.to_ascii_lowercase()
        } else {
            byte
        });
    }
    output
}

//==================================================================================
// Unit Tests
//==================================================================================
