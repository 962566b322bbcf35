use crate::CodexError;

const SECONDS_PER_HOUR: u64 = 3600;
const SECONDS_PER_MINUTE: u64 = 60;

/// Seconds spanned by `frames` samples per channel at `sample_rate`.
pub fn samples_to_seconds(frames: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    frames as f64 / sample_rate as f64
}

/// Formats seconds as `MM:SS`, or `HH:MM:SS` once an hour is reached.
///
/// Components are truncated, so `59.999` is `"00:59"`. Values that do not fit
/// a `u64` second count are rejected.
pub fn format_duration(seconds: f64) -> Result<String, CodexError> {
    if !seconds.is_finite() || seconds < 0.0 || seconds >= u64::MAX as f64 {
        return Err(CodexError::InvalidDuration(seconds));
    }

    let total = seconds.trunc() as u64;
    let hours = total / SECONDS_PER_HOUR;
    let minutes = total % SECONDS_PER_HOUR / SECONDS_PER_MINUTE;
    let secs = total % SECONDS_PER_MINUTE;

    if hours > 0 {
        Ok(format!("{:02}:{:02}:{:02}", hours, minutes, secs))
    } else {
        Ok(format!("{:02}:{:02}", minutes, secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_and_seconds() {
        assert_eq!(format_duration(0.0).unwrap(), "00:00");
        assert_eq!(format_duration(45.0).unwrap(), "00:45");
        assert_eq!(format_duration(600.5).unwrap(), "10:00");
        assert_eq!(format_duration(3599.9).unwrap(), "59:59");
    }

    #[test]
    fn test_hours_shown_only_when_nonzero() {
        assert_eq!(format_duration(3600.0).unwrap(), "01:00:00");
        assert_eq!(format_duration(3661.0).unwrap(), "01:01:01");
        assert_eq!(format_duration(360_000.0).unwrap(), "100:00:00");
    }

    #[test]
    fn test_truncates_instead_of_rounding() {
        assert_eq!(format_duration(59.999).unwrap(), "00:59");
        assert_eq!(format_duration(0.999).unwrap(), "00:00");
    }

    #[test]
    fn test_rejects_negative_and_non_finite() {
        assert!(matches!(
            format_duration(-1.0),
            Err(CodexError::InvalidDuration(_))
        ));
        assert!(format_duration(f64::NAN).is_err());
        assert!(format_duration(f64::INFINITY).is_err());
    }

    #[test]
    fn test_rejects_values_past_u64_seconds() {
        assert!(matches!(
            format_duration(1e20),
            Err(CodexError::InvalidDuration(_))
        ));
        assert!(format_duration(f64::MAX).is_err());
        assert_eq!(format_duration(1e15).unwrap(), "277777777777:46:40");
    }

    #[test]
    fn test_samples_to_seconds() {
        assert_eq!(samples_to_seconds(44100 * 3, 44100), 3.0);
        assert_eq!(samples_to_seconds(22050, 44100), 0.5);
        assert_eq!(samples_to_seconds(100, 0), 0.0);
    }
}
