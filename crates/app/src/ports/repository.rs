//! Device and sensor descriptor repositories.

use std::future::Future;

use hearth_domain::device::Device;
use hearth_domain::error::HearthError;
use hearth_domain::id::{DeviceId, RoomId, SensorId};
use hearth_domain::sensor::Sensor;

/// Lookup of [`Device`] descriptors.
pub trait DeviceRepository: Send + Sync {
    /// Get a device by its unique identifier.
    fn get(&self, id: DeviceId)
    -> impl Future<Output = Result<Option<Device>, HearthError>> + Send;

    /// All devices located in a room.
    fn list_in_room(
        &self,
        room_id: RoomId,
    ) -> impl Future<Output = Result<Vec<Device>, HearthError>> + Send;

    /// Every registered device.
    fn list_all(&self) -> impl Future<Output = Result<Vec<Device>, HearthError>> + Send;

    /// Record the device's last reported value.
    fn set_value(
        &self,
        id: DeviceId,
        value: &str,
    ) -> impl Future<Output = Result<(), HearthError>> + Send;
}

/// Lookup of [`Sensor`] descriptors.
pub trait SensorRepository: Send + Sync {
    /// Get a sensor by its unique identifier.
    fn get(&self, id: SensorId)
    -> impl Future<Output = Result<Option<Sensor>, HearthError>> + Send;

    /// Every registered sensor.
    fn list_all(&self) -> impl Future<Output = Result<Vec<Sensor>, HearthError>> + Send;
}
