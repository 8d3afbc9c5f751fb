//! Single-frame rendering.
//!
//! The pipeline never decodes video itself. For every resolved timestamp it
//! asks a [`FrameRenderer`] to write one still image at that offset.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::time::Duration;

use crate::error::KeepshotError;

/// Output encoding for rendered stills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// JPEG. This is the default.
    #[default]
    Jpeg,
    /// PNG.
    Png,
}

impl ImageFormat {
    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
        }
    }

    /// Parse a user-facing format name (`jpg`, `jpeg`, `png`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            _ => None,
        }
    }

    #[cfg(feature = "native")]
    pub(crate) fn to_image_format(self) -> image::ImageFormat {
        match self {
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Png => image::ImageFormat::Png,
        }
    }
}

impl Display for ImageFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.extension())
    }
}

/// Renders one still image from a video file.
pub trait FrameRenderer: Send + Sync {
    /// Decode the frame at `offset` in `input` and write it to `output` in
    /// `format`, overwriting any existing file.
    ///
    /// Errors of any kind are reported to the caller as
    /// [`KeepshotError::RenderFailure`] by the pipeline.
    fn render(
        &self,
        input: &Path,
        output: &Path,
        offset: Duration,
        format: ImageFormat,
    ) -> Result<(), KeepshotError>;
}

impl<T: FrameRenderer + ?Sized> FrameRenderer for std::sync::Arc<T> {
    fn render(
        &self,
        input: &Path,
        output: &Path,
        offset: Duration,
        format: ImageFormat,
    ) -> Result<(), KeepshotError> {
        (**self).render(input, output, offset, format)
    }
}
