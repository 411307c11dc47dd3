//! Usage reconstruction and aggregation.
//!
//! [`reconstruct_intervals`] turns a device's raw `onoff` event stream into
//! ON intervals; [`aggregate_usage`] splits intervals at local midnights and
//! sums them into a dense per-day map of ON hours. Both are pure and safe to
//! run in parallel over independent snapshots.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::device::DeviceCategory;
use crate::event::{Event, EventKind, Subject};
use crate::time::{Timestamp, hours, local_date, start_of_day};

/// Per-day totals keyed by local calendar date.
pub type DailyTotals = BTreeMap<NaiveDate, f64>;

/// A span during which a subject was on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub subject: Subject,
    pub start: Timestamp,
    pub end: Timestamp,
    /// The subject was still on at the boundary; `end` is the boundary,
    /// not an observed off event.
    pub open: bool,
}

impl Interval {
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    #[must_use]
    pub fn hours(&self) -> f64 {
        hours(self.duration())
    }
}

/// What reports do with intervals still open at the query boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenIntervalPolicy {
    /// Count the subject as on until the boundary.
    #[default]
    CloseAtBoundary,
    /// Drop intervals whose off time is unknown.
    Exclude,
}

impl OpenIntervalPolicy {
    #[must_use]
    pub fn apply(self, mut intervals: Vec<Interval>) -> Vec<Interval> {
        if self == Self::Exclude {
            intervals.retain(|interval| !interval.open);
        }
        intervals
    }
}

/// Rebuild ON intervals from one subject's events.
///
/// Events may arrive unordered and contain duplicates. They are sorted by
/// timestamp (stable, so ties keep their insertion order) and walked with an
/// on/off flag: a non-sentinel value while off opens an interval, the
/// sentinel while on closes it, everything else is a no-op. A subject still
/// on at the end is closed at `boundary` and flagged [`Interval::open`].
///
/// Only [`EventKind::OnOff`] events at or before `boundary` are considered.
#[must_use]
pub fn reconstruct_intervals(
    events: &[Event],
    off_sentinel: &str,
    boundary: Timestamp,
) -> Vec<Interval> {
    let mut ordered: Vec<&Event> = events
        .iter()
        .filter(|event| event.kind == EventKind::OnOff && event.timestamp <= boundary)
        .collect();
    ordered.sort_by_key(|event| event.timestamp);

    let mut intervals = Vec::new();
    let mut pending: Option<(Subject, Timestamp)> = None;

    for event in ordered {
        let is_off = event.value == off_sentinel;
        match pending {
            None if !is_off => pending = Some((event.subject, event.timestamp)),
            Some((subject, start)) if is_off => {
                if event.timestamp > start {
                    intervals.push(Interval {
                        subject,
                        start,
                        end: event.timestamp,
                        open: false,
                    });
                }
                pending = None;
            }
            _ => {}
        }
    }

    if let Some((subject, start)) = pending
        && start < boundary
    {
        intervals.push(Interval {
            subject,
            start,
            end: boundary,
            open: true,
        });
    }

    intervals
}

/// Every local date touched by `[start, end)`, each mapped to `0.0`.
#[must_use]
pub fn empty_days(start: Timestamp, end: Timestamp, tz: Tz) -> DailyTotals {
    let mut days = DailyTotals::new();
    if start >= end {
        return days;
    }
    let mut day = local_date(start, tz);
    loop {
        days.insert(day, 0.0);
        match day.succ_opt() {
            Some(next) if start_of_day(next, tz) < end => day = next,
            _ => break,
        }
    }
    days
}

/// Sum ON hours per local calendar day over `[start, end)`.
///
/// The map is dense: every day of the window is present, defaulting to
/// `0.0`. Intervals are clipped to the window and split exactly at local
/// midnights, so the buckets of one interval add up to its duration.
/// Intervals from different subjects accumulate into the same buckets.
#[must_use]
pub fn aggregate_usage(
    intervals: &[Interval],
    start: Timestamp,
    end: Timestamp,
    tz: Tz,
) -> DailyTotals {
    let mut usage = empty_days(start, end, tz);

    for interval in intervals {
        let stop = interval.end.min(end);
        let mut cursor = interval.start.max(start);
        while cursor < stop {
            let day = local_date(cursor, tz);
            let next_day = day
                .succ_opt()
                .map_or(stop, |next| start_of_day(next, tz));
            let segment_end = next_day.min(stop);
            *usage.entry(day).or_insert(0.0) += hours(segment_end - cursor);
            cursor = segment_end;
        }
    }

    usage
}

/// Average numeric reading per local calendar day over `[start, end)`.
///
/// Dense like [`aggregate_usage`]. Non-`data` events and values that do not
/// parse as numbers are skipped; days without readings stay at `0.0`.
#[must_use]
pub fn aggregate_readings(
    events: &[Event],
    start: Timestamp,
    end: Timestamp,
    tz: Tz,
) -> DailyTotals {
    let mut sums: BTreeMap<NaiveDate, (f64, u32)> = BTreeMap::new();
    for event in events {
        if event.kind != EventKind::Data || event.timestamp < start || event.timestamp >= end {
            continue;
        }
        let Ok(value) = event.value.trim().parse::<f64>() else {
            continue;
        };
        let slot = sums.entry(local_date(event.timestamp, tz)).or_default();
        slot.0 += value;
        slot.1 += 1;
    }

    let mut averages = empty_days(start, end, tz);
    for (day, (sum, count)) in sums {
        averages.insert(day, sum / f64::from(count));
    }
    averages
}

/// Sum of every bucket.
#[must_use]
pub fn total_hours(totals: &DailyTotals) -> f64 {
    totals.values().sum()
}

/// Energy drawn over `hours` of ON time, or `None` for categories without
/// a rate (doors and unknown devices).
#[must_use]
pub fn energy_kwh(hours: f64, category: DeviceCategory) -> Option<f64> {
    category.policy().energy_rate_kwh().map(|rate| rate * hours)
}
