//! Time and timestamp helpers.
//!
//! Instants are always stored as UTC. Calendar days and wall-clock matching
//! are resolved in an explicit IANA timezone.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::ValidationError;

/// UTC timestamp used for event times, plan creation, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Parse an IANA timezone name such as `"Asia/Ho_Chi_Minh"`.
///
/// # Errors
///
/// Returns [`ValidationError::UnknownTimezone`] when the name is not in the
/// timezone database.
pub fn parse_timezone(name: &str) -> Result<Tz, ValidationError> {
    name.parse::<Tz>()
        .map_err(|_| ValidationError::UnknownTimezone(name.to_string()))
}

/// Calendar date of `instant` as seen in `tz`.
#[must_use]
pub fn local_date(instant: Timestamp, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// First instant of `date` in `tz`, as UTC.
///
/// Where local midnight falls in a DST gap, the first valid local instant of
/// the day is used instead.
#[must_use]
pub fn start_of_day(date: NaiveDate, tz: Tz) -> Timestamp {
    let mut local = date.and_time(NaiveTime::MIN);
    // DST gaps are at most a couple of hours; walk forward until the wall
    // clock exists.
    for _ in 0..=24 {
        if let Some(instant) = tz.from_local_datetime(&local).earliest() {
            return instant.with_timezone(&Utc);
        }
        local += Duration::minutes(15);
    }
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Convert a duration to fractional hours.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn hours(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 3_600_000.0
}
