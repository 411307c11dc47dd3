//! Actuation ports: the way out to physical (or simulated) devices.
//!
//! Both are called from spawned dispatch tasks, hence the `'static` bound.

use std::future::Future;

use hearth_domain::device::Device;
use hearth_domain::error::HearthError;
use hearth_domain::id::DeviceId;

/// Pushes a new value to a device.
pub trait ActuationGateway: Send + Sync + 'static {
    /// Ask the device to take `value`.
    ///
    /// Implementations report unreachable endpoints as
    /// [`HearthError::Dispatch`].
    fn set_value(
        &self,
        device: &Device,
        value: &str,
    ) -> impl Future<Output = Result<(), HearthError>> + Send;
}

/// Stores door passcodes.
pub trait PasscodeStore: Send + Sync + 'static {
    /// Set (upsert) the passcode of a door. An empty string clears it.
    fn set(
        &self,
        device_id: DeviceId,
        passcode: &str,
    ) -> impl Future<Output = Result<(), HearthError>> + Send;
}
