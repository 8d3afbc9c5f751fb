//! Async entry points for the extraction pipeline.
//!
//! Probing and rendering block on FFmpeg, either inside the linked libraries
//! or while waiting on a child process. These wrappers move the whole
//! pipeline onto Tokio's blocking pool with `tokio::task::spawn_blocking`, so
//! an async HTTP handler can await an extraction without stalling its
//! runtime. Each call still runs sequentially: one probe, then one render at
//! a time.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use keepshot::{FrameExtractor, KeepshotError, UploadedVideo};
//!
//! # async fn handler(bytes: Vec<u8>) -> Result<(), KeepshotError> {
//! let extractor = Arc::new(FrameExtractor::native("/var/lib/keepshot"));
//! let video = UploadedVideo::new(bytes, Some("upload.mp4"));
//!
//! let stills = extractor
//!     .extract_many_async(video, vec!["00:05".to_string(), "00:10".to_string()])
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::error::KeepshotError;
use crate::pipeline::{ExtractionResult, FrameExtractor, UploadedVideo};
use crate::probe::MediaProber;
use crate::render::FrameRenderer;

impl<P, R> FrameExtractor<P, R>
where
    P: MediaProber + 'static,
    R: FrameRenderer + 'static,
{
    /// [`extract_many`](FrameExtractor::extract_many) on a blocking thread.
    ///
    /// # Errors
    ///
    /// Everything `extract_many` returns, plus [`KeepshotError::TaskFailed`]
    /// if the blocking task panicked or was cancelled.
    pub async fn extract_many_async(
        self: Arc<Self>,
        video: UploadedVideo,
        raw_times: Vec<String>,
    ) -> Result<Vec<ExtractionResult>, KeepshotError> {
        tokio::task::spawn_blocking(move || self.extract_many(&video, &raw_times))
            .await
            .map_err(|error| KeepshotError::TaskFailed(error.to_string()))?
    }

    /// [`extract_one`](FrameExtractor::extract_one) on a blocking thread.
    pub async fn extract_one_async(
        self: Arc<Self>,
        video: UploadedVideo,
        raw_time: String,
    ) -> Result<ExtractionResult, KeepshotError> {
        tokio::task::spawn_blocking(move || self.extract_one(&video, &raw_time))
            .await
            .map_err(|error| KeepshotError::TaskFailed(error.to_string()))?
    }
}
