//! Schedule: time-of-day / day-of-week actuation of a device.
//!
//! A schedule fires at `time_of_day` (minute precision) on each weekday in
//! its [`WeekdaySet`], evaluated on the wall clock of its own timezone.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{DeviceId, ScheduleId, UserId};
use crate::time::{Timestamp, parse_timezone};

const ORDER: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Set of weekdays, one bit per day (Monday = bit 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const EMPTY: Self = Self(0);
    pub const ALL: Self = Self(0b111_1111);

    #[must_use]
    pub fn with(self, day: Weekday) -> Self {
        Self(self.0 | Self::bit(day))
    }

    #[must_use]
    pub fn contains(self, day: Weekday) -> bool {
        self.0 & Self::bit(day) != 0
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Days in the set, Monday first.
    pub fn iter(self) -> impl Iterator<Item = Weekday> {
        ORDER.into_iter().filter(move |day| self.contains(*day))
    }

    fn bit(day: Weekday) -> u8 {
        1 << day.num_days_from_monday()
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl FromStr for WeekdaySet {
    type Err = ValidationError;

    /// Parse three-letter codes separated by commas and/or whitespace,
    /// e.g. `"Mon,Wed,Fri"` or `"mon tue"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .map(|token| {
                ORDER
                    .into_iter()
                    .find(|day| day.to_string().eq_ignore_ascii_case(token))
                    .ok_or_else(|| ValidationError::UnknownWeekday(token.to_string()))
            })
            .collect()
    }
}

impl fmt::Display for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<String> = self.iter().map(|day| day.to_string()).collect();
        f.write_str(&codes.join(","))
    }
}

impl Serialize for WeekdaySet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WeekdaySet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A recurring actuation of one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub device_id: DeviceId,
    pub user_id: UserId,
    /// Raw action, translated per device category when fired.
    pub action_value: String,
    pub time_of_day: NaiveTime,
    pub repeat_days: WeekdaySet,
    /// IANA timezone name the time of day is expressed in.
    pub timezone: String,
    pub active: bool,
}

impl Schedule {
    /// Create a builder for constructing a [`Schedule`].
    #[must_use]
    pub fn builder() -> ScheduleBuilder {
        ScheduleBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::NoRepeatDays`] when no weekday is selected
    /// - [`ValidationError::UnknownTimezone`] when the timezone does not parse
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.repeat_days.is_empty() {
            return Err(ValidationError::NoRepeatDays);
        }
        parse_timezone(&self.timezone)?;
        Ok(())
    }

    /// The local minute this schedule is due at, if `now` falls inside it.
    ///
    /// Returns `Ok(None)` when the wall clock in the schedule's timezone is
    /// not at `time_of_day` (seconds ignored) or today is not a repeat day.
    /// The returned local minute identifies the occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownTimezone`] for an invalid timezone.
    pub fn due_at(&self, now: Timestamp) -> Result<Option<NaiveDateTime>, ValidationError> {
        let tz = parse_timezone(&self.timezone)?;
        let local = now.with_timezone(&tz).naive_local();
        let same_minute = local.hour() == self.time_of_day.hour()
            && local.minute() == self.time_of_day.minute();
        if !same_minute || !self.repeat_days.contains(local.weekday()) {
            return Ok(None);
        }
        Ok(local.with_second(0).and_then(|t| t.with_nanosecond(0)))
    }
}

/// Parse `HH:MM` or `HH:MM:SS`.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidTimeOfDay`] for anything else.
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| ValidationError::InvalidTimeOfDay(raw.to_string()))
}

/// Step-by-step builder for [`Schedule`].
#[derive(Debug, Default)]
pub struct ScheduleBuilder {
    id: Option<ScheduleId>,
    device_id: Option<DeviceId>,
    user_id: Option<UserId>,
    action_value: Option<String>,
    time_of_day: Option<NaiveTime>,
    repeat_days: Option<WeekdaySet>,
    timezone: Option<String>,
    active: Option<bool>,
}

impl ScheduleBuilder {
    #[must_use]
    pub fn id(mut self, id: ScheduleId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn device_id(mut self, device_id: DeviceId) -> Self {
        self.device_id = Some(device_id);
        self
    }

    #[must_use]
    pub fn user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    #[must_use]
    pub fn action_value(mut self, action_value: impl Into<String>) -> Self {
        self.action_value = Some(action_value.into());
        self
    }

    #[must_use]
    pub fn time_of_day(mut self, time_of_day: NaiveTime) -> Self {
        self.time_of_day = Some(time_of_day);
        self
    }

    #[must_use]
    pub fn repeat_days(mut self, repeat_days: WeekdaySet) -> Self {
        self.repeat_days = Some(repeat_days);
        self
    }

    #[must_use]
    pub fn timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    #[must_use]
    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    /// Consume the builder, validate, and return a [`Schedule`].
    ///
    /// Defaults: every day, midnight, UTC, active.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if invariants fail.
    pub fn build(self) -> Result<Schedule, ValidationError> {
        let schedule = Schedule {
            id: self.id.unwrap_or_default(),
            device_id: self.device_id.unwrap_or_default(),
            user_id: self.user_id.unwrap_or_default(),
            action_value: self.action_value.unwrap_or_default(),
            time_of_day: self.time_of_day.unwrap_or(NaiveTime::MIN),
            repeat_days: self.repeat_days.unwrap_or(WeekdaySet::ALL),
            timezone: self.timezone.unwrap_or_else(|| "UTC".to_string()),
            active: self.active.unwrap_or(true),
        };
        schedule.validate()?;
        Ok(schedule)
    }
}
