//! Error types for the `keepshot` crate.
//!
//! This module defines [`KeepshotError`], the unified error type returned by
//! every fallible operation in the crate. Variants carry the offending input,
//! path or offset so a caller (typically an HTTP boundary) can surface them
//! without extra logging.

use std::{io::Error as IoError, path::PathBuf, time::Duration};

use image::ImageError;
use thiserror::Error;

/// The unified error type for all `keepshot` operations.
///
/// Every public method that can fail returns `Result<T, KeepshotError>`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KeepshotError {
    /// A non-blank timestamp could not be parsed, or its frame offset is
    /// outside `0..=120`.
    #[error("Invalid time format: {input:?} ({reason})")]
    InvalidFormat {
        /// The raw timestamp exactly as the caller supplied it.
        input: String,
        /// Why the input was rejected.
        reason: String,
    },

    /// The media has no decodable video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A single-frame render failed. The whole extraction call fails with it.
    #[error("Failed to render frame at {offset:?}: {reason}")]
    RenderFailure {
        /// The clamped offset the renderer was asked for.
        offset: Duration,
        /// Underlying reason reported by the renderer.
        reason: String,
    },

    /// The uploaded video payload was empty.
    #[error("Uploaded video is empty")]
    EmptyVideo,

    /// The media file could not be opened.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path handed to the prober or renderer.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The prober ran but could not produce usable metadata.
    #[error("Failed to probe media: {0}")]
    ProbeFailure(String),

    /// An error originating from the FFmpeg libraries.
    #[cfg(feature = "native")]
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while encoding a still.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The blocking extraction task did not run to completion.
    #[cfg(feature = "async")]
    #[error("Extraction task failed: {0}")]
    TaskFailed(String),
}

impl KeepshotError {
    pub(crate) fn invalid_format(input: &str, reason: impl Into<String>) -> Self {
        KeepshotError::InvalidFormat {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(feature = "native")]
impl From<ffmpeg_next::Error> for KeepshotError {
    fn from(error: ffmpeg_next::Error) -> Self {
        KeepshotError::FfmpegError(error.to_string())
    }
}
