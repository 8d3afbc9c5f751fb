//! The frame extraction pipeline.
//!
//! [`FrameExtractor`] turns one uploaded video and a list of raw timestamps
//! into one still image per non-blank timestamp:
//!
//! 1. the upload is written once to a uniquely named temporary file;
//! 2. the file is probed once for its duration and frame rate;
//! 3. every non-blank timestamp is resolved and clamped against that probe;
//! 4. each resolved offset is rendered, one at a time, in input order;
//! 5. the temporary file is deleted, whatever the outcome.
//!
//! A batch either succeeds as a whole or fails on the first error. Stills
//! already written by a failed call stay on disk for the age-based sweep to
//! collect.
//!
//! # Example
//!
//! ```no_run
//! use keepshot::{FrameExtractor, UploadedVideo};
//!
//! let extractor = FrameExtractor::native("/var/lib/keepshot");
//! let video = UploadedVideo::new(std::fs::read("clip.mp4")?, Some("clip.mp4"));
//!
//! for still in extractor.extract_many(&video, &["00:10", "", "00:05", "01:40"])? {
//!     println!("#{} {} -> {}", still.index, still.input, still.path.display());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::command::{CommandBackend, FfmpegPaths};
use crate::configuration::ExtractOptions;
use crate::error::KeepshotError;
#[cfg(feature = "native")]
use crate::native::NativeBackend;
use crate::probe::MediaProber;
use crate::progress::ProgressInfo;
use crate::render::FrameRenderer;
use crate::storage::ScratchSpace;
use crate::timestamp::{self, ResolvedOffset};

/// An uploaded video held in memory.
#[derive(Clone)]
pub struct UploadedVideo {
    bytes: Vec<u8>,
    file_name: Option<String>,
}

impl Debug for UploadedVideo {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("UploadedVideo")
            .field("len", &self.bytes.len())
            .field("file_name", &self.file_name)
            .finish()
    }
}

impl UploadedVideo {
    /// Wrap raw upload bytes. The original file name, if known, is only used
    /// to give the temporary copy the same extension.
    pub fn new<B: Into<Vec<u8>>>(bytes: B, file_name: Option<&str>) -> Self {
        Self {
            bytes: bytes.into(),
            file_name: file_name.map(str::to_string),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn extension(&self) -> Option<&str> {
        self.file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|extension| extension.to_str())
    }
}

/// One rendered still.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Position of the timestamp in the caller's input list.
    pub index: usize,
    /// The timestamp exactly as supplied.
    pub input: String,
    /// The offset the timestamp resolved to, before clamping.
    pub requested: Duration,
    /// The offset that was rendered.
    pub offset: Duration,
    /// Where the still was written.
    pub path: PathBuf,
}

impl ExtractionResult {
    /// The still's file name, which is unique across all extractions.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }

    /// Public reference for the still under `base_url`, e.g.
    /// `https://host/screenshots` gives `https://host/screenshots/{file}`.
    pub fn url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.file_name())
    }

    /// Returns `true` if the timestamp pointed past the end of the media.
    pub fn was_clamped(&self) -> bool {
        self.requested != self.offset
    }
}

/// Extracts stills from uploaded videos.
///
/// The prober and renderer are usually the same backend
/// ([`NativeBackend`](crate::NativeBackend) or
/// [`CommandBackend`]). An extractor holds no per-call state, so one value
/// can serve any number of concurrent uploads.
pub struct FrameExtractor<P, R> {
    prober: P,
    renderer: R,
    scratch: ScratchSpace,
    options: ExtractOptions,
}

impl<P, R> Debug for FrameExtractor<P, R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FrameExtractor")
            .field("scratch", &self.scratch)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "native")]
impl FrameExtractor<NativeBackend, NativeBackend> {
    /// An extractor using the linked FFmpeg libraries, with scratch
    /// directories under `root`.
    pub fn native<D: AsRef<Path>>(root: D) -> Self {
        Self::new(NativeBackend::new(), NativeBackend::new(), root)
    }
}

impl FrameExtractor<CommandBackend, CommandBackend> {
    /// An extractor running the FFmpeg executables at `paths`, with scratch
    /// directories under `root`.
    pub fn command<D: AsRef<Path>>(paths: FfmpegPaths, root: D) -> Self {
        let backend = CommandBackend::new(paths);
        Self::new(backend.clone(), backend, root)
    }
}

impl<P: MediaProber, R: FrameRenderer> FrameExtractor<P, R> {
    /// Create an extractor with scratch directories under `root` (see
    /// [`ScratchSpace::in_directory`]) and default options.
    pub fn new<D: AsRef<Path>>(prober: P, renderer: R, root: D) -> Self {
        Self::with_scratch(prober, renderer, ScratchSpace::in_directory(root))
    }

    pub fn with_scratch(prober: P, renderer: R, scratch: ScratchSpace) -> Self {
        Self {
            prober,
            renderer,
            scratch,
            options: ExtractOptions::new(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn scratch(&self) -> &ScratchSpace {
        &self.scratch
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Render one still per non-blank timestamp, in input order.
    ///
    /// Blank or whitespace-only entries are skipped, so the result may be
    /// shorter than `raw_times` and is empty when every entry is blank.
    ///
    /// # Errors
    ///
    /// - [`KeepshotError::EmptyVideo`] if the upload has no bytes.
    /// - [`KeepshotError::NoVideoStream`] if the media has no video.
    /// - [`KeepshotError::InvalidFormat`] if any non-blank timestamp is
    ///   malformed. No still is rendered in that case.
    /// - [`KeepshotError::RenderFailure`] if any render fails.
    pub fn extract_many<S: AsRef<str>>(
        &self,
        video: &UploadedVideo,
        raw_times: &[S],
    ) -> Result<Vec<ExtractionResult>, KeepshotError> {
        let requests = non_blank(raw_times);
        self.with_ingested(video, |source| self.run(source, &requests, true))
    }

    /// Render a single still. Equivalent to [`extract_many`](Self::extract_many)
    /// with one timestamp, except that a blank timestamp is an error and the
    /// file name carries no ordinal.
    pub fn extract_one(
        &self,
        video: &UploadedVideo,
        raw_time: &str,
    ) -> Result<ExtractionResult, KeepshotError> {
        if timestamp::is_blank(raw_time) {
            return Err(KeepshotError::invalid_format(raw_time, "time is required"));
        }

        let requests = [(0, raw_time)];
        let mut results = self.with_ingested(video, |source| self.run(source, &requests, false))?;
        results
            .pop()
            .ok_or_else(|| KeepshotError::invalid_format(raw_time, "time is required"))
    }

    /// Like [`extract_many`](Self::extract_many) for a video already on disk.
    /// The file is neither copied nor deleted.
    pub fn extract_many_from_path<S: AsRef<str>>(
        &self,
        path: &Path,
        raw_times: &[S],
    ) -> Result<Vec<ExtractionResult>, KeepshotError> {
        let requests = non_blank(raw_times);
        self.run(path, &requests, true)
    }

    fn with_ingested<T>(
        &self,
        video: &UploadedVideo,
        extract: impl FnOnce(&Path) -> Result<T, KeepshotError>,
    ) -> Result<T, KeepshotError> {
        if video.is_empty() {
            return Err(KeepshotError::EmptyVideo);
        }

        // Dropping the guard deletes the copy on every exit path.
        let temp = self.scratch.write_temp(video.bytes(), video.extension())?;
        extract(temp.path())
    }

    fn run(
        &self,
        source: &Path,
        requests: &[(usize, &str)],
        numbered: bool,
    ) -> Result<Vec<ExtractionResult>, KeepshotError> {
        let probe = self.prober.probe(source)?;
        log::debug!(
            "Probed {}: duration {:?}, {:.3} fps",
            source.display(),
            probe.duration,
            probe.frame_rate
        );

        let resolved = requests
            .iter()
            .map(|&(index, raw)| {
                timestamp::resolve_clamped_with(
                    raw,
                    probe.frame_rate,
                    probe.duration,
                    self.options.three_field_mode,
                )
                .map(|offset| (index, raw, offset))
            })
            .collect::<Result<Vec<(usize, &str, ResolvedOffset)>, KeepshotError>>()?;

        if resolved.is_empty() {
            return Ok(Vec::new());
        }
        self.scratch.ensure_output_dir()?;

        let format = self.options.image_format;
        let total = resolved.len();
        let started = Instant::now();
        let mut results = Vec::with_capacity(total);

        for (ordinal, (index, raw, resolved)) in resolved.into_iter().enumerate() {
            if resolved.was_clamped() {
                log::debug!(
                    "Timestamp {raw:?} ({:?}) is past the end; using {:?}",
                    resolved.requested,
                    resolved.offset
                );
            }

            let output = self.scratch.unique_output_path(
                &self.options.file_prefix,
                numbered.then_some(ordinal),
                format,
            );

            self.renderer
                .render(source, &output, resolved.offset, format)
                .map_err(|error| into_render_failure(error, resolved.offset))?;

            log::debug!(
                "Rendered {raw:?} at {:?} to {}",
                resolved.offset,
                output.display()
            );

            self.options.progress.on_progress(&ProgressInfo::new(
                ordinal + 1,
                total,
                started.elapsed(),
                resolved.offset,
                output.clone(),
            ));

            results.push(ExtractionResult {
                index,
                input: raw.to_string(),
                requested: resolved.requested,
                offset: resolved.offset,
                path: output,
            });
        }

        Ok(results)
    }
}

fn non_blank<S: AsRef<str>>(raw_times: &[S]) -> Vec<(usize, &str)> {
    raw_times
        .iter()
        .map(AsRef::as_ref)
        .enumerate()
        .filter(|(_, raw)| !timestamp::is_blank(raw))
        .collect()
}

fn into_render_failure(error: KeepshotError, offset: Duration) -> KeepshotError {
    match error {
        KeepshotError::RenderFailure { .. } => error,
        other => KeepshotError::RenderFailure {
            offset,
            reason: other.to_string(),
        },
    }
}
