//! Probing and rendering through the `ffprobe` / `ffmpeg` executables.
//!
//! [`CommandBackend`] shells out to the FFmpeg command-line tools instead of
//! linking the libraries. Executable locations are supplied up front through
//! [`FfmpegPaths`]; nothing is read from or written to process-global state,
//! so different deployments (a developer machine with FFmpeg on `PATH`, a
//! server with bundled binaries) differ only in the value they construct.
//!
//! # Example
//!
//! ```no_run
//! use keepshot::{CommandBackend, FfmpegPaths, FrameExtractor, UploadedVideo};
//!
//! let backend = CommandBackend::new(FfmpegPaths::in_directory("/opt/ffmpeg/bin"));
//! let extractor = FrameExtractor::new(backend.clone(), backend, "/tmp/keepshot");
//!
//! let video = UploadedVideo::new(std::fs::read("input.mp4")?, Some("input.mp4"));
//! let stills = extractor.extract_many(&video, &["00:05", "00:10"])?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use serde_json::Value;

use crate::error::KeepshotError;
use crate::probe::{MediaProbe, MediaProber, parse_frame_rate};
use crate::render::{FrameRenderer, ImageFormat};

/// Environment variable naming a directory that holds `ffmpeg` and `ffprobe`.
pub const FFMPEG_DIR_ENV: &str = "KEEPSHOT_FFMPEG_DIR";

/// Resolved locations of the FFmpeg executables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegPaths {
    /// Path to `ffmpeg`.
    pub ffmpeg: PathBuf,
    /// Path to `ffprobe`.
    pub ffprobe: PathBuf,
}

impl Default for FfmpegPaths {
    fn default() -> Self {
        Self::from_path()
    }
}

impl FfmpegPaths {
    /// Use bare executable names, resolved through `PATH` when run.
    pub fn from_path() -> Self {
        Self {
            ffmpeg: PathBuf::from(executable_name("ffmpeg")),
            ffprobe: PathBuf::from(executable_name("ffprobe")),
        }
    }

    /// Use the executables inside `directory`.
    pub fn in_directory<P: AsRef<Path>>(directory: P) -> Self {
        let directory = directory.as_ref();
        Self {
            ffmpeg: directory.join(executable_name("ffmpeg")),
            ffprobe: directory.join(executable_name("ffprobe")),
        }
    }

    /// Read [`FFMPEG_DIR_ENV`], falling back to [`from_path`](Self::from_path)
    /// when it is unset or empty.
    pub fn from_env() -> Self {
        match env::var_os(FFMPEG_DIR_ENV) {
            Some(directory) if !directory.is_empty() => Self::in_directory(directory),
            _ => Self::from_path(),
        }
    }
}

/// Probes and renders by running `ffprobe` and `ffmpeg` as child processes.
#[derive(Debug, Clone, Default)]
pub struct CommandBackend {
    paths: FfmpegPaths,
}

impl CommandBackend {
    pub fn new(paths: FfmpegPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &FfmpegPaths {
        &self.paths
    }
}

impl MediaProber for CommandBackend {
    fn probe(&self, path: &Path) -> Result<MediaProbe, KeepshotError> {
        log::debug!(
            "Running {} on {}",
            self.paths.ffprobe.display(),
            path.display()
        );

        let output = Command::new(&self.paths.ffprobe)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(path)
            .output()
            .map_err(|error| {
                KeepshotError::ProbeFailure(format!(
                    "failed to run {}: {error}",
                    self.paths.ffprobe.display()
                ))
            })?;

        if !output.status.success() {
            return Err(KeepshotError::FileOpen {
                path: path.to_path_buf(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_ffprobe_output(&output.stdout)
    }
}

impl FrameRenderer for CommandBackend {
    fn render(
        &self,
        input: &Path,
        output: &Path,
        offset: Duration,
        format: ImageFormat,
    ) -> Result<(), KeepshotError> {
        let seek = format!("{:.3}", offset.as_secs_f64());
        let codec = match format {
            ImageFormat::Jpeg => "mjpeg",
            ImageFormat::Png => "png",
        };

        let result = Command::new(&self.paths.ffmpeg)
            .args(["-v", "error", "-ss", &seek, "-i"])
            .arg(input)
            .args(["-frames:v", "1", "-q:v", "2", "-c:v", codec, "-update", "1", "-y"])
            .arg(output)
            .output()
            .map_err(|error| KeepshotError::RenderFailure {
                offset,
                reason: format!("failed to run {}: {error}", self.paths.ffmpeg.display()),
            })?;

        if !result.status.success() {
            return Err(KeepshotError::RenderFailure {
                offset,
                reason: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        // ffmpeg exits cleanly without writing anything when the seek lands
        // past the last frame.
        if !output.is_file() {
            return Err(KeepshotError::RenderFailure {
                offset,
                reason: "ffmpeg produced no output image".to_string(),
            });
        }

        Ok(())
    }
}

/// Build a [`MediaProbe`] from `ffprobe -print_format json -show_format
/// -show_streams` output.
///
/// The first stream whose `codec_type` is `video` supplies the frame rate
/// (`avg_frame_rate`, then `r_frame_rate`). Duration comes from the format
/// section, falling back to the stream.
///
/// # Errors
///
/// - [`KeepshotError::ProbeFailure`] if the output is not valid JSON.
/// - [`KeepshotError::NoVideoStream`] if no video stream is listed.
pub fn parse_ffprobe_output(stdout: &[u8]) -> Result<MediaProbe, KeepshotError> {
    let json: Value = serde_json::from_slice(stdout).map_err(|error| {
        KeepshotError::ProbeFailure(format!("unreadable ffprobe output: {error}"))
    })?;

    let stream = json["streams"]
        .as_array()
        .and_then(|streams| {
            streams
                .iter()
                .find(|stream| stream["codec_type"].as_str() == Some("video"))
        })
        .ok_or(KeepshotError::NoVideoStream)?;

    let seconds = seconds_field(&json["format"]["duration"])
        .or_else(|| seconds_field(&stream["duration"]))
        .unwrap_or(0.0);

    let frame_rate = ["avg_frame_rate", "r_frame_rate"]
        .iter()
        .filter_map(|key| stream[*key].as_str())
        .filter_map(parse_frame_rate)
        .find(|rate| *rate > 0.0);

    Ok(MediaProbe::new(Duration::from_secs_f64(seconds), frame_rate))
}

fn seconds_field(value: &Value) -> Option<f64> {
    value
        .as_str()
        .and_then(|text| text.parse::<f64>().ok())
        .or_else(|| value.as_f64())
        .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
}

fn executable_name(tool: &str) -> String {
    if cfg!(windows) {
        format!("{tool}.exe")
    } else {
        tool.to_string()
    }
}
