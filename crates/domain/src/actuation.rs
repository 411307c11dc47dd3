//! Actuation intents: requests to change a device, carried out by adapters.

use serde::{Deserialize, Serialize};

use crate::device::Device;

/// What to do to the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Command {
    /// Set the device's externally reported value.
    SetValue(String),
    /// Clear the door passcode.
    ResetPasscode,
}

/// A request to act on one device.
///
/// Carries the full device descriptor so dispatch needs no further lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuationIntent {
    pub device: Device,
    pub command: Command,
}

impl ActuationIntent {
    #[must_use]
    pub fn set_value(device: Device, value: impl Into<String>) -> Self {
        Self {
            device,
            command: Command::SetValue(value.into()),
        }
    }

    #[must_use]
    pub fn reset_passcode(device: Device) -> Self {
        Self {
            device,
            command: Command::ResetPasscode,
        }
    }
}

impl std::fmt::Display for ActuationIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.command {
            Command::SetValue(value) => write!(f, "set_value({}, {value})", self.device.id),
            Command::ResetPasscode => write!(f, "reset_passcode({})", self.device.id),
        }
    }
}
