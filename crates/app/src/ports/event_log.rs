//! Event log port: the append-only record of everything devices and sensors
//! reported.

use std::future::Future;

use chrono::Duration;
use hearth_domain::error::HearthError;
use hearth_domain::event::{Event, Subject};
use hearth_domain::time::Timestamp;

/// Append-only, time-ordered event storage.
pub trait EventLog: Send + Sync {
    /// Persist a new event. Events are immutable once written.
    fn append(&self, event: Event) -> impl Future<Output = Result<Event, HearthError>> + Send;

    /// Events of `subject` with `start <= timestamp < end`, ascending.
    ///
    /// Events sharing a timestamp come back in insertion order.
    fn query(
        &self,
        subject: Subject,
        start: Timestamp,
        end: Timestamp,
    ) -> impl Future<Output = Result<Vec<Event>, HearthError>> + Send;

    /// Events of `subject` over the trailing `window` ending at `now`.
    fn query_last(
        &self,
        subject: Subject,
        window: Duration,
        now: Timestamp,
    ) -> impl Future<Output = Result<Vec<Event>, HearthError>> + Send {
        self.query(subject, now - window, now)
    }
}
