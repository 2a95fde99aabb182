//! Millisecond timecode formatting and parsing.
//!
//! Chapters and scenes carry integer milliseconds; this module renders them
//! as `HH:MM:SS.mmm` for logs and previews and parses the same shapes back
//! (`HH:MM:SS[.mmm]`, `MM:SS[.mmm]`, `SS[.mmm]`).

use thiserror::Error;

/// Timecode parsing error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimecodeError {
    #[error("Timecode cannot be empty")]
    Empty,

    #[error("Invalid {0} value: {1}")]
    InvalidValue(&'static str, String),

    #[error("Invalid timecode format '{0}'. Use HH:MM:SS.mmm, MM:SS.mmm, or SS.mmm")]
    InvalidFormat(String),
}

/// Format milliseconds as `HH:MM:SS.mmm`.
///
/// # Examples
/// ```
/// use tseg_models::timecode::format_timecode;
/// assert_eq!(format_timecode(0), "00:00:00.000");
/// assert_eq!(format_timecode(3_723_004), "01:02:03.004");
/// ```
pub fn format_timecode(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let millis = ms % 1000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}

/// Parse a timecode into milliseconds.
///
/// # Examples
/// ```
/// use tseg_models::timecode::parse_timecode;
/// assert_eq!(parse_timecode("01:30:00").unwrap(), 5_400_000);
/// assert_eq!(parse_timecode("05:30.250").unwrap(), 330_250);
/// assert_eq!(parse_timecode("90").unwrap(), 90_000);
/// ```
pub fn parse_timecode(tc: &str) -> Result<u64, TimecodeError> {
    let tc = tc.trim();
    if tc.is_empty() {
        return Err(TimecodeError::Empty);
    }

    let parts: Vec<&str> = tc.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [s] => (0, 0, *s),
        [m, s] => (0, parse_whole("minutes", m)?, *s),
        [h, m, s] => (parse_whole("hours", h)?, parse_whole("minutes", m)?, *s),
        _ => return Err(TimecodeError::InvalidFormat(tc.to_string())),
    };

    if parts.len() > 1 && minutes >= 60 {
        return Err(TimecodeError::InvalidValue("minutes", minutes.to_string()));
    }

    let seconds_ms = parse_seconds(seconds)?;
    let hours_ms = hours
        .checked_mul(3_600_000)
        .ok_or_else(|| TimecodeError::InvalidValue("hours", hours.to_string()))?;
    hours_ms
        .checked_add(minutes * 60_000)
        .and_then(|ms| ms.checked_add(seconds_ms))
        .ok_or_else(|| TimecodeError::InvalidValue("timecode", tc.to_string()))
}

fn parse_whole(component: &'static str, value: &str) -> Result<u64, TimecodeError> {
    value
        .parse()
        .map_err(|_| TimecodeError::InvalidValue(component, value.to_string()))
}

/// Parse `SS` or `SS.mmm` into milliseconds without going through floats.
fn parse_seconds(value: &str) -> Result<u64, TimecodeError> {
    let invalid = || TimecodeError::InvalidValue("seconds", value.to_string());
    let (whole, frac) = match value.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (value, ""),
    };

    let whole: u64 = whole.parse().map_err(|_| invalid())?;
    if frac.len() > 3 || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let millis = if frac.is_empty() {
        0
    } else {
        // "5" -> 500, "05" -> 50, "005" -> 5
        let padded = format!("{:0<3}", frac);
        padded.parse::<u64>().map_err(|_| invalid())?
    };

    whole
        .checked_mul(1000)
        .and_then(|ms| ms.checked_add(millis))
        .ok_or_else(invalid)
}
