use std::time::Duration;

/// Ticks per second of the timeline time base (microseconds).
pub const TICKS_PER_SECOND: i64 = 1_000_000;

/// Converts seconds to timeline ticks with nearest rounding.
///
/// Returns `None` for non-finite input or values outside the `i64` tick range.
///
/// # Example
/// ```
/// use sequencer::seconds_to_ticks;
///
/// assert_eq!(seconds_to_ticks(1.5), Some(1_500_000));
/// assert_eq!(seconds_to_ticks(f64::NAN), None);
/// ```
pub fn seconds_to_ticks(seconds: f64) -> Option<i64> {
    if !seconds.is_finite() {
        return None;
    }

    let ticks = (seconds * TICKS_PER_SECOND as f64).round();
    if ticks < i64::MIN as f64 || ticks > i64::MAX as f64 {
        return None;
    }
    Some(ticks as i64)
}

/// Converts timeline ticks to seconds.
pub fn ticks_to_seconds(ticks: i64) -> f64 {
    ticks as f64 / TICKS_PER_SECOND as f64
}

/// Converts non-negative timeline ticks to a [`Duration`]; negative ticks clamp to zero.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use sequencer::ticks_to_duration;
///
/// assert_eq!(ticks_to_duration(250_000), Duration::from_millis(250));
/// ```
pub fn ticks_to_duration(ticks: i64) -> Duration {
    Duration::from_micros(ticks.max(0) as u64)
}

/// Converts a [`Duration`] to timeline ticks, saturating at `i64::MAX`.
pub fn duration_to_ticks(duration: Duration) -> i64 {
    i64::try_from(duration.as_micros()).unwrap_or(i64::MAX)
}
