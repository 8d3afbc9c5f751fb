//! Extraction options.
//!
//! [`ExtractOptions`] is a builder carrying the settings that shape every
//! extraction run: the image encoding, the output filename prefix, how
//! three-field timestamps are read, and an optional progress callback.
//!
//! # Example
//!
//! ```
//! use keepshot::{ExtractOptions, ImageFormat, ThreeFieldMode};
//!
//! let options = ExtractOptions::new()
//!     .with_image_format(ImageFormat::Png)
//!     .with_file_prefix("shot")
//!     .with_three_field_mode(ThreeFieldMode::HoursMinutesSeconds);
//!
//! assert_eq!(options.image_format(), ImageFormat::Png);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::progress::{NoOpProgress, ProgressCallback};
use crate::render::ImageFormat;
use crate::timestamp::ThreeFieldMode;

/// Prefix given to rendered image filenames unless overridden.
pub const DEFAULT_FILE_PREFIX: &str = "keepshot";

/// Settings applied to every extraction performed by a
/// [`FrameExtractor`](crate::FrameExtractor).
#[derive(Clone)]
pub struct ExtractOptions {
    pub(crate) image_format: ImageFormat,
    pub(crate) file_prefix: String,
    pub(crate) three_field_mode: ThreeFieldMode,
    pub(crate) progress: Arc<dyn ProgressCallback>,
}

impl Debug for ExtractOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractOptions")
            .field("image_format", &self.image_format)
            .field("file_prefix", &self.file_prefix)
            .field("three_field_mode", &self.three_field_mode)
            .finish_non_exhaustive()
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    /// Defaults: JPEG output, `"keepshot"` prefix, duration-based reading of
    /// three-field timestamps, no progress callback.
    pub fn new() -> Self {
        Self {
            image_format: ImageFormat::default(),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            three_field_mode: ThreeFieldMode::default(),
            progress: Arc::new(NoOpProgress),
        }
    }

    #[must_use]
    pub fn with_image_format(mut self, format: ImageFormat) -> Self {
        self.image_format = format;
        self
    }

    /// Set the filename prefix. Path separators are replaced with `_`, and an
    /// empty prefix falls back to the default.
    #[must_use]
    pub fn with_file_prefix(mut self, prefix: &str) -> Self {
        let cleaned: String = prefix
            .trim()
            .chars()
            .map(|ch| if matches!(ch, '/' | '\\') { '_' } else { ch })
            .collect();
        self.file_prefix = if cleaned.is_empty() {
            DEFAULT_FILE_PREFIX.to_string()
        } else {
            cleaned
        };
        self
    }

    /// Override how `A:B:C` timestamps are read.
    #[must_use]
    pub fn with_three_field_mode(mut self, mode: ThreeFieldMode) -> Self {
        self.three_field_mode = mode;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    pub fn image_format(&self) -> ImageFormat {
        self.image_format
    }

    pub fn file_prefix(&self) -> &str {
        &self.file_prefix
    }

    pub fn three_field_mode(&self) -> ThreeFieldMode {
        self.three_field_mode
    }
}
