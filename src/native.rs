//! In-process probing and rendering through `ffmpeg-next`.
//!
//! [`NativeBackend`] implements both [`MediaProber`] and [`FrameRenderer`]
//! by linking against the FFmpeg libraries directly. Rendering seeks to the
//! nearest keyframe before the requested offset, decodes forward until the
//! first frame at or after it, converts that frame to RGB and writes it
//! through the [`image`] crate.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::time::Duration;
//!
//! use keepshot::{FrameRenderer, ImageFormat, MediaProber, NativeBackend};
//!
//! let backend = NativeBackend::new();
//! let probe = backend.probe(Path::new("input.mp4"))?;
//! println!("{:?} @ {} fps", probe.duration, probe.frame_rate);
//!
//! backend.render(
//!     Path::new("input.mp4"),
//!     Path::new("still.jpg"),
//!     Duration::from_secs(5),
//!     ImageFormat::Jpeg,
//! )?;
//! # Ok::<(), keepshot::KeepshotError>(())
//! ```

use std::path::Path;
use std::time::Duration;

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage};

use crate::error::KeepshotError;
use crate::probe::{MediaProbe, MediaProber};
use crate::render::{FrameRenderer, ImageFormat};

/// Probes and renders with the linked FFmpeg libraries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeBackend;

impl NativeBackend {
    pub fn new() -> Self {
        Self
    }

    /// Decode the frame shown at `offset` into an RGB image.
    ///
    /// If the stream ends before `offset` is reached, the last decoded frame
    /// is returned instead.
    ///
    /// # Errors
    ///
    /// - [`KeepshotError::FileOpen`] if the file cannot be opened.
    /// - [`KeepshotError::NoVideoStream`] if it has no video stream.
    /// - [`KeepshotError::RenderFailure`] if no frame could be decoded.
    pub fn frame_at(&self, path: &Path, offset: Duration) -> Result<DynamicImage, KeepshotError> {
        let mut input_context = open_input(path)?;

        let (stream_index, time_base, parameters) = {
            let stream = input_context
                .streams()
                .best(Type::Video)
                .ok_or(KeepshotError::NoVideoStream)?;
            (stream.index(), stream.time_base(), stream.parameters())
        };

        let decoder_context = CodecContext::from_parameters(parameters)?;
        let mut decoder = decoder_context.decoder().video()?;
        let width = decoder.width();
        let height = decoder.height();

        let mut scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )?;

        // Container-level seek, expressed in AV_TIME_BASE (microseconds).
        let position = i64::try_from(offset.as_micros()).unwrap_or(i64::MAX);
        if position > 0 {
            input_context.seek(position, ..position)?;
        }

        let target_seconds = offset.as_secs_f64();
        let mut decoded_frame = VideoFrame::empty();
        let mut last_frame: Option<VideoFrame> = None;

        for (stream, packet) in input_context.packets() {
            if stream.index() != stream_index {
                continue;
            }

            decoder.send_packet(&packet)?;

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                if reached_target(&decoded_frame, time_base, target_seconds) {
                    return scale_to_image(&mut scaler, &decoded_frame, width, height);
                }
                last_frame = Some(std::mem::replace(&mut decoded_frame, VideoFrame::empty()));
            }
        }

        decoder.send_eof()?;
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            if reached_target(&decoded_frame, time_base, target_seconds) {
                return scale_to_image(&mut scaler, &decoded_frame, width, height);
            }
            last_frame = Some(std::mem::replace(&mut decoded_frame, VideoFrame::empty()));
        }

        match last_frame {
            Some(frame) => {
                log::debug!(
                    "Stream ended before {offset:?}; using last decoded frame of {}",
                    path.display()
                );
                scale_to_image(&mut scaler, &frame, width, height)
            }
            None => Err(KeepshotError::RenderFailure {
                offset,
                reason: "no video frame could be decoded".to_string(),
            }),
        }
    }
}

impl MediaProber for NativeBackend {
    fn probe(&self, path: &Path) -> Result<MediaProbe, KeepshotError> {
        log::debug!("Probing media file: {}", path.display());

        let input_context = open_input(path)?;
        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(KeepshotError::NoVideoStream)?;

        // A stream without a usable decoder counts as absent.
        CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.decoder().video())
            .map_err(|_| KeepshotError::NoVideoStream)?;

        let container_micros = input_context.duration();
        let duration = if container_micros > 0 {
            Duration::from_micros(container_micros as u64)
        } else if stream.duration() > 0 {
            Duration::from_secs_f64(pts_to_seconds(stream.duration(), stream.time_base()))
        } else {
            Duration::ZERO
        };

        let frame_rate =
            rational_to_f64(stream.avg_frame_rate()).or_else(|| rational_to_f64(stream.rate()));

        Ok(MediaProbe::new(duration, frame_rate))
    }
}

impl FrameRenderer for NativeBackend {
    fn render(
        &self,
        input: &Path,
        output: &Path,
        offset: Duration,
        format: ImageFormat,
    ) -> Result<(), KeepshotError> {
        let image = self.frame_at(input, offset)?;
        image.save_with_format(output, format.to_image_format())?;
        Ok(())
    }
}

fn open_input(path: &Path) -> Result<Input, KeepshotError> {
    ffmpeg_next::init().map_err(|error| KeepshotError::FileOpen {
        path: path.to_path_buf(),
        reason: format!("FFmpeg initialisation failed: {error}"),
    })?;

    ffmpeg_next::format::input(&path).map_err(|error| KeepshotError::FileOpen {
        path: path.to_path_buf(),
        reason: error.to_string(),
    })
}

fn reached_target(frame: &VideoFrame, time_base: Rational, target_seconds: f64) -> bool {
    match frame.timestamp().or_else(|| frame.pts()) {
        Some(pts) => pts_to_seconds(pts, time_base) >= target_seconds,
        // Frames without timing cannot be placed; take what we have.
        None => true,
    }
}

fn scale_to_image(
    scaler: &mut ScalingContext,
    frame: &VideoFrame,
    width: u32,
    height: u32,
) -> Result<DynamicImage, KeepshotError> {
    let mut rgb_frame = VideoFrame::empty();
    scaler.run(frame, &mut rgb_frame)?;

    let buffer = frame_to_rgb_buffer(&rgb_frame, width, height);
    let rgb_image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        KeepshotError::FfmpegError("decoded frame does not match its dimensions".to_string())
    })?;
    Ok(DynamicImage::ImageRgb8(rgb_image))
}

/// Copy an RGB24 frame into a tightly packed buffer, dropping row padding.
fn frame_to_rgb_buffer(frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = frame.stride(0);
    let row_bytes = width as usize * 3;
    let data = frame.data(0);

    if stride == row_bytes {
        return data[..row_bytes * height as usize].to_vec();
    }

    let mut buffer = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        buffer.extend_from_slice(&data[start..start + row_bytes]);
    }
    buffer
}

fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * f64::from(time_base.numerator()) / f64::from(time_base.denominator())
}

fn rational_to_f64(rate: Rational) -> Option<f64> {
    if rate.denominator() == 0 || rate.numerator() <= 0 {
        return None;
    }
    Some(f64::from(rate.numerator()) / f64::from(rate.denominator()))
}
