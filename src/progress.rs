//! Progress reporting.
//!
//! Attach a [`ProgressCallback`] through
//! [`ExtractOptions::with_progress`](crate::ExtractOptions::with_progress) to
//! be told after each still is written.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use keepshot::{ExtractOptions, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{}/{} at {:?}", info.current, info.total, info.offset);
//!     }
//! }
//!
//! let options = ExtractOptions::new().with_progress(Arc::new(PrintProgress));
//! ```

use std::path::PathBuf;
use std::time::Duration;

/// A snapshot taken right after one still has been rendered.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Stills rendered so far in this call, including this one.
    pub current: usize,
    /// Stills this call will render (blank inputs excluded).
    pub total: usize,
    /// Completion percentage (0.0 - 100.0).
    pub percentage: f32,
    /// Wall-clock time since the first render started.
    pub elapsed: Duration,
    /// Estimated time until the last still is written.
    pub estimated_remaining: Option<Duration>,
    /// The (clamped) offset that was rendered.
    pub offset: Duration,
    /// Where the still was written.
    pub output: PathBuf,
}

impl ProgressInfo {
    pub(crate) fn new(
        current: usize,
        total: usize,
        elapsed: Duration,
        offset: Duration,
        output: PathBuf,
    ) -> Self {
        let percentage = if total == 0 {
            100.0
        } else {
            (current as f32 / total as f32) * 100.0
        };

        let estimated_remaining = (current > 0 && current <= total).then(|| {
            let per_item = elapsed / current as u32;
            per_item * (total - current) as u32
        });

        Self {
            current,
            total,
            percentage,
            elapsed,
            estimated_remaining,
            offset,
            output,
        }
    }
}

/// Receives a notification after every rendered still.
///
/// Callbacks observe the extraction; they cannot stop it.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all notifications. Used when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}
