//! # keepshot
//!
//! Keepshot turns an uploaded video and a list of timestamps into one still
//! image per timestamp.
//!
//! Timestamps are free-form strings such as `"42"`, `"01:30"`, `"01:02:15"`
//! or `"00:01:02:15"`; the [`timestamp`] module resolves them against the
//! video's duration and frame rate, and redirects requests past the end to
//! the last safe frame. The [`FrameExtractor`] pipeline stores the upload
//! once, probes it once, and renders every still in input order.
//!
//! ## Quick Start
//!
//! ```no_run
//! use keepshot::{FrameExtractor, UploadedVideo};
//!
//! let extractor = FrameExtractor::native("/var/lib/keepshot");
//! let video = UploadedVideo::new(std::fs::read("input.mp4")?, Some("input.mp4"));
//!
//! let still = extractor.extract_one(&video, "00:42")?;
//! println!("{}", still.url("https://example.com/screenshots"));
//!
//! let stills = extractor.extract_many(&video, &["00:10", "00:05", "01:40"])?;
//! assert_eq!(stills.len(), 3);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Backends
//!
//! Probing and rendering go through the [`MediaProber`] and [`FrameRenderer`]
//! traits:
//!
//! - [`NativeBackend`] links FFmpeg through `ffmpeg-next` (feature `native`,
//!   enabled by default).
//! - [`CommandBackend`] runs the `ffprobe` and `ffmpeg` executables found at
//!   the [`FfmpegPaths`] it is given.
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `native` | In-process decoding via `ffmpeg-next` (default) |
//! | `async` | `extract_many_async` / `extract_one_async` via Tokio |
//! | `full` | Enables all of the above |

#[cfg(feature = "async")]
pub mod asynchronous;
pub mod command;
pub mod configuration;
pub mod error;
#[cfg(feature = "native")]
pub mod native;
pub mod pipeline;
pub mod probe;
pub mod progress;
pub mod render;
pub mod storage;
pub mod timestamp;

pub use command::{CommandBackend, FfmpegPaths};
pub use configuration::ExtractOptions;
pub use error::KeepshotError;
#[cfg(feature = "native")]
pub use native::NativeBackend;
pub use pipeline::{ExtractionResult, FrameExtractor, UploadedVideo};
pub use probe::{MediaProbe, MediaProber};
pub use progress::{ProgressCallback, ProgressInfo};
pub use render::{FrameRenderer, ImageFormat};
pub use storage::{ScratchSpace, TempFile};
pub use timestamp::{ResolvedOffset, ThreeFieldMode, TimeCode};
