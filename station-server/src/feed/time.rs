//! GTFS time-of-day values.
//!
//! GTFS writes times as `H:MM:SS` counted from the start of the service
//! day. Trips running past midnight keep counting, so `25:10:00` is a legal
//! value meaning 01:10 on the following calendar day.

/// Error returned when parsing an invalid GTFS time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid GTFS time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Parse a GTFS time into seconds since the start of the service day.
///
/// # Examples
///
/// ```
/// use station_server::feed::parse_gtfs_time;
///
/// assert_eq!(parse_gtfs_time("08:05:00"), Ok(8 * 3600 + 5 * 60));
/// assert_eq!(parse_gtfs_time("7:30:15"), Ok(7 * 3600 + 30 * 60 + 15));
///
/// // After midnight on the same service day
/// assert_eq!(parse_gtfs_time("25:00:00"), Ok(25 * 3600));
///
/// assert!(parse_gtfs_time("08:05").is_err());
/// assert!(parse_gtfs_time("08:61:00").is_err());
/// ```
pub fn parse_gtfs_time(s: &str) -> Result<u32, TimeError> {
    let mut parts = s.trim().split(':');
    let (Some(hours), Some(minutes), Some(seconds), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TimeError::new("expected H:MM:SS format"));
    };

    if hours.len() > 3 {
        return Err(TimeError::new("hour has too many digits"));
    }
    let hours = parse_digits(hours).ok_or_else(|| TimeError::new("invalid hour digits"))?;

    if minutes.len() != 2 {
        return Err(TimeError::new("minute must be two digits"));
    }
    let minutes = parse_digits(minutes).ok_or_else(|| TimeError::new("invalid minute digits"))?;
    if minutes > 59 {
        return Err(TimeError::new("minute must be 0-59"));
    }

    if seconds.len() != 2 {
        return Err(TimeError::new("second must be two digits"));
    }
    let seconds = parse_digits(seconds).ok_or_else(|| TimeError::new("invalid second digits"))?;
    if seconds > 59 {
        return Err(TimeError::new("second must be 0-59"));
    }

    Ok(hours * 3600 + minutes * 60 + seconds)
}

fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
