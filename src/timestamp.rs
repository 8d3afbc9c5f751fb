//! Timestamp resolution.
//!
//! Converts user-supplied timestamp strings into absolute offsets into a
//! media file. The accepted grammar is one to four colon-separated base-10
//! integers:
//!
//! | Fields | Notation | Meaning |
//! |--------|----------|---------|
//! | 1 | `SS` | seconds |
//! | 2 | `MM:SS` | minutes, seconds |
//! | 3 | `A:B:C` | `MM:SS:FF` for media shorter than one hour, `HH:MM:SS` otherwise |
//! | 4 | `HH:MM:SS:FF` | hours, minutes, seconds, frames |
//!
//! The three-field form is ambiguous on purpose: frame-accurate addressing is
//! only offered on media under an hour, because longer content is assumed to
//! be addressed in `HH:MM:SS`. Callers that need a fixed reading can pick a
//! [`ThreeFieldMode`] or build a [`TimeCode`] directly.
//!
//! Requests past the end of the media are never rejected. They are clamped
//! to one second before the end (the "last safe frame").
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use keepshot::timestamp;
//!
//! let ninety_seconds = Duration::from_secs(90);
//!
//! let offset = timestamp::resolve("01:02:15", 30.0, ninety_seconds)?;
//! assert_eq!(offset, Duration::from_millis(62_500));
//!
//! let resolved = timestamp::resolve_clamped("01:40", 30.0, ninety_seconds)?;
//! assert_eq!(resolved.offset, Duration::from_secs(89));
//! # Ok::<(), keepshot::KeepshotError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Duration;

use crate::error::KeepshotError;

/// Largest accepted frame offset (`FF`) in frame-accurate notations.
pub const MAX_FRAME_OFFSET: u64 = 120;

/// Frame rate assumed when the media does not report a usable one.
pub const DEFAULT_FRAME_RATE: f64 = 30.0;

/// Frame rates at or below this value are treated as unusable.
const MIN_USABLE_FRAME_RATE: f64 = 0.1;

const ONE_HOUR: Duration = Duration::from_secs(3600);
const ONE_SECOND: Duration = Duration::from_secs(1);
const MAX_FIELDS: usize = 4;

/// How a three-field timestamp (`A:B:C`) is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreeFieldMode {
    /// `MM:SS:FF` when the media is shorter than one hour, `HH:MM:SS`
    /// otherwise. This is the default.
    #[default]
    ByDuration,
    /// Always `HH:MM:SS`.
    HoursMinutesSeconds,
    /// Always `MM:SS:FF`.
    MinutesSecondsFrames,
}

impl ThreeFieldMode {
    /// Returns `true` if a three-field timestamp carries a frame offset for
    /// media of the given duration.
    pub fn has_frames(self, media_duration: Duration) -> bool {
        match self {
            ThreeFieldMode::ByDuration => media_duration < ONE_HOUR,
            ThreeFieldMode::HoursMinutesSeconds => false,
            ThreeFieldMode::MinutesSecondsFrames => true,
        }
    }
}

/// A parsed, unambiguous timestamp.
///
/// Fields are not normalised: `MM:SS` of `"0:75"` is kept as 75 seconds and
/// only folded together by [`to_offset`](TimeCode::to_offset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeCode {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    /// Sub-second correction in whole frames, at most [`MAX_FRAME_OFFSET`].
    pub frames: u64,
}

impl TimeCode {
    /// Build a time code, rejecting frame offsets above [`MAX_FRAME_OFFSET`].
    pub fn new(hours: u64, minutes: u64, seconds: u64, frames: u64) -> Result<Self, KeepshotError> {
        let time_code = Self {
            hours,
            minutes,
            seconds,
            frames,
        };
        time_code.validate(&time_code.to_string())?;
        Ok(time_code)
    }

    /// Parse a raw timestamp string.
    ///
    /// `media_duration` is only consulted for three-field input under
    /// [`ThreeFieldMode::ByDuration`].
    ///
    /// # Errors
    ///
    /// Returns [`KeepshotError::InvalidFormat`] if the string is blank, has
    /// an empty or non-numeric field, has more than four fields, or carries a
    /// frame offset above [`MAX_FRAME_OFFSET`].
    pub fn parse(
        raw: &str,
        media_duration: Duration,
        mode: ThreeFieldMode,
    ) -> Result<Self, KeepshotError> {
        let fields = split_fields(raw)?;

        let time_code = match fields.as_slice() {
            [seconds] => Self {
                seconds: *seconds,
                ..Self::default()
            },
            [minutes, seconds] => Self {
                minutes: *minutes,
                seconds: *seconds,
                ..Self::default()
            },
            [first, second, third] if mode.has_frames(media_duration) => Self {
                minutes: *first,
                seconds: *second,
                frames: *third,
                ..Self::default()
            },
            [hours, minutes, seconds] => Self {
                hours: *hours,
                minutes: *minutes,
                seconds: *seconds,
                frames: 0,
            },
            [hours, minutes, seconds, frames] => Self {
                hours: *hours,
                minutes: *minutes,
                seconds: *seconds,
                frames: *frames,
            },
            _ => return Err(KeepshotError::invalid_format(raw, "expected 1 to 4 fields")),
        };

        time_code.validate(raw)?;
        Ok(time_code)
    }

    /// Convert to an absolute offset, adding `frames / frame_rate` seconds.
    ///
    /// Unusable frame rates fall back to [`DEFAULT_FRAME_RATE`]. Returns
    /// `None` if the offset does not fit in a [`Duration`].
    pub fn to_offset(&self, frame_rate: f64) -> Option<Duration> {
        let whole_seconds = self
            .hours
            .checked_mul(3600)?
            .checked_add(self.minutes.checked_mul(60)?)?
            .checked_add(self.seconds)?;

        let base = Duration::from_secs(whole_seconds);
        if self.frames == 0 {
            return Some(base);
        }

        let fraction =
            Duration::from_secs_f64(self.frames as f64 / effective_frame_rate(frame_rate));
        base.checked_add(fraction)
    }

    fn validate(&self, raw: &str) -> Result<(), KeepshotError> {
        if self.frames > MAX_FRAME_OFFSET {
            return Err(KeepshotError::invalid_format(
                raw,
                format!(
                    "frame offset {} is outside 0..={MAX_FRAME_OFFSET}",
                    self.frames
                ),
            ));
        }
        Ok(())
    }
}

impl Display for TimeCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{:02}:{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds, self.frames
        )
    }
}

/// An offset that has been resolved and clamped against a media duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedOffset {
    /// The offset the timestamp asked for.
    pub requested: Duration,
    /// The offset to render, never past the media duration.
    pub offset: Duration,
}

impl ResolvedOffset {
    /// Returns `true` if the requested offset was redirected to the last
    /// safe frame.
    pub fn was_clamped(&self) -> bool {
        self.requested != self.offset
    }
}

/// Return `frame_rate` if it is usable, otherwise [`DEFAULT_FRAME_RATE`].
///
/// A rate is usable when it is finite and greater than 0.1.
pub fn effective_frame_rate(frame_rate: f64) -> f64 {
    if frame_rate.is_finite() && frame_rate > MIN_USABLE_FRAME_RATE {
        frame_rate
    } else {
        DEFAULT_FRAME_RATE
    }
}

/// Resolve a raw timestamp to an (unclamped) offset using the default
/// three-field heuristic.
///
/// # Errors
///
/// Returns [`KeepshotError::InvalidFormat`] when the string does not follow
/// the grammar described in the [module documentation](self).
pub fn resolve(
    raw: &str,
    frame_rate: f64,
    media_duration: Duration,
) -> Result<Duration, KeepshotError> {
    resolve_with(raw, frame_rate, media_duration, ThreeFieldMode::ByDuration)
}

/// Resolve a raw timestamp with an explicit [`ThreeFieldMode`].
pub fn resolve_with(
    raw: &str,
    frame_rate: f64,
    media_duration: Duration,
    mode: ThreeFieldMode,
) -> Result<Duration, KeepshotError> {
    TimeCode::parse(raw, media_duration, mode)?
        .to_offset(frame_rate)
        .ok_or_else(|| KeepshotError::invalid_format(raw, "timestamp is too large"))
}

/// Resolve a raw timestamp and clamp it to the media duration.
///
/// This is the single resolution path used by the extraction pipeline.
pub fn resolve_clamped(
    raw: &str,
    frame_rate: f64,
    media_duration: Duration,
) -> Result<ResolvedOffset, KeepshotError> {
    resolve_clamped_with(raw, frame_rate, media_duration, ThreeFieldMode::ByDuration)
}

/// [`resolve_clamped`] with an explicit [`ThreeFieldMode`].
pub fn resolve_clamped_with(
    raw: &str,
    frame_rate: f64,
    media_duration: Duration,
    mode: ThreeFieldMode,
) -> Result<ResolvedOffset, KeepshotError> {
    let requested = resolve_with(raw, frame_rate, media_duration, mode)?;
    Ok(ResolvedOffset {
        requested,
        offset: clamp_offset(requested, media_duration),
    })
}

/// Redirect offsets past the end of the media to one second before the end,
/// floored at zero. Offsets within the media are returned unchanged.
pub fn clamp_offset(offset: Duration, media_duration: Duration) -> Duration {
    if offset > media_duration {
        media_duration.saturating_sub(ONE_SECOND)
    } else {
        offset
    }
}

/// Returns `true` for inputs the pipeline skips instead of resolving.
pub fn is_blank(raw: &str) -> bool {
    raw.trim().is_empty()
}

fn split_fields(raw: &str) -> Result<Vec<u64>, KeepshotError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(KeepshotError::invalid_format(raw, "time is required"));
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() > MAX_FIELDS {
        return Err(KeepshotError::invalid_format(
            raw,
            format!("expected 1 to {MAX_FIELDS} fields, found {}", parts.len()),
        ));
    }

    parts
        .into_iter()
        .map(|part| {
            if part.is_empty() {
                return Err(KeepshotError::invalid_format(raw, "empty field"));
            }
            if !part.bytes().all(|byte| byte.is_ascii_digit()) {
                return Err(KeepshotError::invalid_format(
                    raw,
                    format!("{part:?} is not a non-negative integer"),
                ));
            }
            part.parse::<u64>().map_err(|_| {
                KeepshotError::invalid_format(raw, format!("{part:?} is too large"))
            })
        })
        .collect()
}
