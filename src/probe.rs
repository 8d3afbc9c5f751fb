//! Media probing.
//!
//! A [`MediaProbe`] is the result of inspecting an uploaded video exactly
//! once: its total duration and the frame rate of its primary video stream.
//! The pipeline computes one per upload and shares it read-only across every
//! timestamp resolved for that upload.
//!
//! Probing itself is delegated to a [`MediaProber`] so the pipeline does not
//! depend on a particular decoding backend.

use std::path::Path;
use std::time::Duration;

use crate::error::KeepshotError;
use crate::timestamp::effective_frame_rate;

/// Duration and frame rate of a probed video.
#[derive(Debug, Clone, Copy, PartialEq)]
#[must_use]
pub struct MediaProbe {
    /// Total duration of the media.
    pub duration: Duration,
    /// Frames per second of the primary video stream. Always usable: values
    /// at or below 0.1 are replaced by 30.0 on construction.
    pub frame_rate: f64,
}

impl MediaProbe {
    /// Create a probe result, substituting the default frame rate when
    /// `frame_rate` is missing or unusable.
    pub fn new(duration: Duration, frame_rate: Option<f64>) -> Self {
        Self {
            duration,
            frame_rate: effective_frame_rate(frame_rate.unwrap_or(0.0)),
        }
    }
}

/// Inspects a media file without decoding frames.
///
/// Implementations must be [`Send`] and [`Sync`] so a single extractor can
/// serve concurrent uploads.
pub trait MediaProber: Send + Sync {
    /// Probe the file at `path`.
    ///
    /// # Errors
    ///
    /// Must return [`KeepshotError::NoVideoStream`] if the media has no
    /// decodable video stream.
    fn probe(&self, path: &Path) -> Result<MediaProbe, KeepshotError>;
}

impl<T: MediaProber + ?Sized> MediaProber for std::sync::Arc<T> {
    fn probe(&self, path: &Path) -> Result<MediaProbe, KeepshotError> {
        (**self).probe(path)
    }
}

/// Parse an FFmpeg rational frame rate such as `"30000/1001"` or `"25"`.
///
/// Returns `None` for malformed input or a zero denominator.
pub(crate) fn parse_frame_rate(rate: &str) -> Option<f64> {
    match rate.split_once('/') {
        Some((numerator, denominator)) => {
            let numerator: f64 = numerator.trim().parse().ok()?;
            let denominator: f64 = denominator.trim().parse().ok()?;
            if denominator == 0.0 {
                return None;
            }
            Some(numerator / denominator)
        }
        None => rate.trim().parse().ok(),
    }
}
