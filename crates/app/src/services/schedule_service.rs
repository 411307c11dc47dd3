//! Schedule service: use-cases for managing schedules.

use hearth_domain::error::{HearthError, NotFoundError};
use hearth_domain::id::{DeviceId, ScheduleId};
use hearth_domain::schedule::Schedule;

use crate::ports::{DeviceRepository, ScheduleStore};

/// Application service for schedule CRUD operations.
pub struct ScheduleService<S, D> {
    schedules: S,
    devices: D,
}

impl<S: ScheduleStore, D: DeviceRepository> ScheduleService<S, D> {
    /// Create a new service backed by the given store.
    pub fn new(schedules: S, devices: D) -> Self {
        Self { schedules, devices }
    }

    /// Create a new schedule after validating domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::Validation`] if invariants fail,
    /// [`HearthError::NotFound`] when the device does not exist, or a
    /// storage error.
    #[tracing::instrument(skip(self, schedule), fields(device = %schedule.device_id))]
    pub async fn create(&self, schedule: Schedule) -> Result<Schedule, HearthError> {
        schedule.validate()?;
        if self.devices.get(schedule.device_id).await?.is_none() {
            return Err(NotFoundError {
                entity: "Device",
                id: schedule.device_id.to_string(),
            }
            .into());
        }
        self.schedules.create(schedule).await
    }

    /// Look up a schedule by id.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::NotFound`] when no schedule with `id` exists,
    /// or a storage error.
    pub async fn get(&self, id: ScheduleId) -> Result<Schedule, HearthError> {
        self.schedules
            .get(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Turn a schedule on or off. Takes effect on the next tick.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::NotFound`] when no schedule with `id` exists,
    /// or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn set_active(&self, id: ScheduleId, active: bool) -> Result<Schedule, HearthError> {
        self.schedules
            .set_active(id, active)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Delete a schedule by id.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the store.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, id: ScheduleId) -> Result<(), HearthError> {
        self.schedules.remove(id).await
    }

    /// Every schedule attached to a device.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the store.
    pub async fn list_for_device(&self, device_id: DeviceId) -> Result<Vec<Schedule>, HearthError> {
        self.schedules.list_for_device(device_id).await
    }
}

fn not_found(id: ScheduleId) -> HearthError {
    NotFoundError {
        entity: "Schedule",
        id: id.to_string(),
    }
    .into()
}
