//! Schedule store port.

use std::future::Future;

use hearth_domain::error::HearthError;
use hearth_domain::id::{DeviceId, ScheduleId};
use hearth_domain::schedule::Schedule;

/// Repository for persisting and querying [`Schedule`]s.
pub trait ScheduleStore: Send + Sync {
    /// All schedules currently marked active.
    fn list_active(&self) -> impl Future<Output = Result<Vec<Schedule>, HearthError>> + Send;

    /// Create a new schedule.
    fn create(
        &self,
        schedule: Schedule,
    ) -> impl Future<Output = Result<Schedule, HearthError>> + Send;

    /// Get a schedule by its unique identifier.
    fn get(
        &self,
        id: ScheduleId,
    ) -> impl Future<Output = Result<Option<Schedule>, HearthError>> + Send;

    /// Toggle a schedule on or off.
    ///
    /// Returns the updated schedule, or `None` when it does not exist.
    fn set_active(
        &self,
        id: ScheduleId,
        active: bool,
    ) -> impl Future<Output = Result<Option<Schedule>, HearthError>> + Send;

    /// Delete a schedule by its unique identifier.
    fn remove(&self, id: ScheduleId) -> impl Future<Output = Result<(), HearthError>> + Send;

    /// Every schedule (active or not) attached to a device.
    fn list_for_device(
        &self,
        device_id: DeviceId,
    ) -> impl Future<Output = Result<Vec<Schedule>, HearthError>> + Send;
}
