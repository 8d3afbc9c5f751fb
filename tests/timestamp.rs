//! Timestamp grammar, disambiguation and clamping tests.

use std::time::Duration;

use keepshot::timestamp::{
    self, DEFAULT_FRAME_RATE, clamp_offset, effective_frame_rate, is_blank, resolve,
    resolve_clamped, resolve_with,
};
use keepshot::{KeepshotError, ThreeFieldMode, TimeCode};

const NINETY_SECONDS: Duration = Duration::from_secs(90);
const TWO_HOURS: Duration = Duration::from_secs(7200);

fn secs(seconds: u64) -> Duration {
    Duration::from_secs(seconds)
}

fn millis(milliseconds: u64) -> Duration {
    Duration::from_millis(milliseconds)
}

fn assert_invalid(raw: &str) {
    match resolve(raw, 30.0, NINETY_SECONDS) {
        Err(KeepshotError::InvalidFormat { input, .. }) => assert_eq!(input, raw),
        other => panic!("Expected InvalidFormat for {raw:?}, got: {other:?}"),
    }
}

// ── Field counts ───────────────────────────────────────────────────

#[test]
fn single_field_is_seconds() {
    for seconds in [0_u64, 1, 59, 60, 75, 3600, 86_400] {
        let offset = resolve(&seconds.to_string(), 30.0, NINETY_SECONDS).unwrap();
        assert_eq!(offset, secs(seconds));
    }
}

#[test]
fn two_fields_are_minutes_and_seconds() {
    assert_eq!(resolve("01:15", 30.0, NINETY_SECONDS).unwrap(), secs(75));
    assert_eq!(resolve("10:00", 30.0, NINETY_SECONDS).unwrap(), secs(600));
    // Seconds are not limited to 0..60.
    assert_eq!(resolve("00:75", 30.0, NINETY_SECONDS).unwrap(), secs(75));
}

#[test]
fn three_fields_carry_frames_on_short_media() {
    let offset = resolve("01:02:15", 30.0, NINETY_SECONDS).unwrap();
    assert_eq!(offset, millis(62_500));

    let just_under_an_hour = Duration::from_secs(3599);
    let offset = resolve("01:02:15", 30.0, just_under_an_hour).unwrap();
    assert_eq!(offset, millis(62_500));
}

#[test]
fn three_fields_are_hours_minutes_seconds_on_long_media() {
    let exactly_an_hour = Duration::from_secs(3600);
    assert_eq!(
        resolve("01:02:15", 30.0, exactly_an_hour).unwrap(),
        secs(3600 + 120 + 15)
    );
    assert_eq!(
        resolve("01:02:15", 30.0, TWO_HOURS).unwrap(),
        secs(3600 + 120 + 15)
    );
}

#[test]
fn three_field_frame_limit_applies_only_on_short_media() {
    assert_invalid("00:01:121");

    // On long media the last field is seconds, so 121 is fine.
    let offset = resolve("00:01:121", 30.0, TWO_HOURS).unwrap();
    assert_eq!(offset, secs(60 + 121));
}

#[test]
fn four_fields_are_hours_minutes_seconds_frames() {
    assert_eq!(
        resolve("01:02:03:15", 30.0, NINETY_SECONDS).unwrap(),
        millis(3_723_500)
    );
    assert_eq!(
        resolve("00:00:00:120", 30.0, NINETY_SECONDS).unwrap(),
        secs(4)
    );
    assert_eq!(resolve("00:00:10:0", 25.0, TWO_HOURS).unwrap(), secs(10));
}

#[test]
fn frame_offset_above_limit_is_rejected() {
    assert_invalid("00:00:00:121");

    let error = resolve("00:00:00:121", 30.0, NINETY_SECONDS).unwrap_err();
    assert!(
        error.to_string().contains("0..=120"),
        "Error should mention the frame range: {error}"
    );
}

// ── Frame rate ─────────────────────────────────────────────────────

#[test]
fn frames_use_the_given_frame_rate() {
    assert_eq!(
        resolve("00:00:00:25", 25.0, NINETY_SECONDS).unwrap(),
        secs(1)
    );
    assert_eq!(
        resolve("00:00:00:12", 24.0, NINETY_SECONDS).unwrap(),
        millis(500)
    );
}

#[test]
fn unusable_frame_rates_fall_back_to_thirty() {
    for frame_rate in [0.0, 0.1, -24.0, f64::NAN, f64::INFINITY] {
        assert_eq!(effective_frame_rate(frame_rate), DEFAULT_FRAME_RATE);
        assert_eq!(
            resolve("00:00:00:15", frame_rate, NINETY_SECONDS).unwrap(),
            millis(500),
            "frame rate {frame_rate} should fall back to 30"
        );
    }
}

#[test]
fn low_but_usable_frame_rate_is_kept() {
    assert_eq!(effective_frame_rate(0.2), 0.2);
    assert_eq!(
        resolve("00:00:00:15", 0.25, TWO_HOURS).unwrap(),
        secs(60)
    );
}

// ── Malformed input ────────────────────────────────────────────────

#[test]
fn malformed_inputs_are_rejected_with_the_input_attached() {
    for raw in [
        "12:xx", ":05", "05:", "1::2", "1:2:3:4:5", "-1", "+5", "1.5", "abc", "1 2", "", "   ",
    ] {
        assert_invalid(raw);
    }
}

#[test]
fn error_message_includes_offending_input() {
    let error = resolve("12:xx", 30.0, NINETY_SECONDS).unwrap_err();
    assert!(
        error.to_string().contains("12:xx"),
        "Error should include the input: {error}"
    );
}

#[test]
fn surrounding_whitespace_is_ignored() {
    assert_eq!(resolve(" 00:05 ", 30.0, NINETY_SECONDS).unwrap(), secs(5));
    assert_eq!(resolve("\t42\n", 30.0, NINETY_SECONDS).unwrap(), secs(42));
}

#[test]
fn oversized_values_are_rejected() {
    assert_invalid("99999999999999999999");
    assert_invalid("18446744073709551615:00:00:00");
}

// ── Clamping ───────────────────────────────────────────────────────

#[test]
fn offsets_past_the_end_move_to_one_second_before_it() {
    assert_eq!(clamp_offset(secs(100), NINETY_SECONDS), secs(89));
    assert_eq!(clamp_offset(secs(3600), NINETY_SECONDS), secs(89));
}

#[test]
fn offsets_within_the_media_are_untouched() {
    assert_eq!(clamp_offset(secs(0), NINETY_SECONDS), secs(0));
    assert_eq!(clamp_offset(secs(45), NINETY_SECONDS), secs(45));
    assert_eq!(clamp_offset(NINETY_SECONDS, NINETY_SECONDS), NINETY_SECONDS);
}

#[test]
fn clamping_never_goes_negative() {
    assert_eq!(clamp_offset(secs(5), millis(500)), Duration::ZERO);
    assert_eq!(clamp_offset(secs(2), Duration::ZERO), Duration::ZERO);
    assert_eq!(clamp_offset(Duration::ZERO, Duration::ZERO), Duration::ZERO);
}

#[test]
fn resolve_clamped_reports_redirection() {
    let resolved = resolve_clamped("01:40", 30.0, NINETY_SECONDS).unwrap();
    assert_eq!(resolved.requested, secs(100));
    assert_eq!(resolved.offset, secs(89));
    assert!(resolved.was_clamped());

    let resolved = resolve_clamped("00:10", 30.0, NINETY_SECONDS).unwrap();
    assert_eq!(resolved.offset, secs(10));
    assert!(!resolved.was_clamped());
}

// ── Typed alternatives ─────────────────────────────────────────────

#[test]
fn explicit_three_field_modes_override_the_heuristic() {
    assert_eq!(
        resolve_with("01:02:15", 30.0, NINETY_SECONDS, ThreeFieldMode::HoursMinutesSeconds)
            .unwrap(),
        secs(3735)
    );
    assert_eq!(
        resolve_with("01:02:15", 30.0, TWO_HOURS, ThreeFieldMode::MinutesSecondsFrames).unwrap(),
        millis(62_500)
    );
}

#[test]
fn time_code_round_trips_through_display() {
    let time_code = TimeCode::new(1, 2, 3, 4).unwrap();
    assert_eq!(time_code.to_string(), "01:02:03:04");
    assert_eq!(
        TimeCode::parse(&time_code.to_string(), TWO_HOURS, ThreeFieldMode::ByDuration).unwrap(),
        time_code
    );
}

#[test]
fn time_code_rejects_large_frame_offsets() {
    assert!(TimeCode::new(0, 0, 0, 120).is_ok());
    assert!(matches!(
        TimeCode::new(0, 0, 0, 121),
        Err(KeepshotError::InvalidFormat { .. })
    ));
}

#[test]
fn time_code_to_offset() {
    let time_code = TimeCode::new(0, 1, 2, 15).unwrap();
    assert_eq!(time_code.to_offset(30.0), Some(millis(62_500)));
    assert_eq!(time_code.to_offset(0.0), Some(millis(62_500)));

    let huge = TimeCode {
        hours: u64::MAX,
        ..TimeCode::default()
    };
    assert_eq!(huge.to_offset(30.0), None);
}

#[test]
fn blank_detection() {
    assert!(is_blank(""));
    assert!(is_blank("  \t"));
    assert!(!is_blank(" 0 "));
    assert!(timestamp::is_blank("\n"));
}
