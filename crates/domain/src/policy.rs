//! Per-category device behaviour.
//!
//! Everything that depends on "what kind of device is this" lives here:
//! the off sentinel, how a schedule's raw action value maps to the value
//! sent to the device, what "on" means for counter-actuation, energy rates
//! and the wording of device log messages.

use crate::device::DeviceCategory;

/// Off sentinel for color-capable lights.
pub const LIGHT_OFF: &str = "#000000";
/// Off sentinel for every other category.
pub const GENERIC_OFF: &str = "0";

/// Static behaviour table for one [`DeviceCategory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceClassPolicy {
    category: DeviceCategory,
}

impl DeviceClassPolicy {
    #[must_use]
    pub fn for_category(category: DeviceCategory) -> Self {
        Self { category }
    }

    /// The value meaning "device is off".
    #[must_use]
    pub fn off_sentinel(&self) -> &'static str {
        match self.category {
            DeviceCategory::Light => LIGHT_OFF,
            DeviceCategory::Fan | DeviceCategory::Door | DeviceCategory::Other => GENERIC_OFF,
        }
    }

    /// Exact string comparison against the off sentinel.
    ///
    /// Anything that is not the sentinel, including garbage, counts as on.
    #[must_use]
    pub fn is_off(&self, value: &str) -> bool {
        value == self.off_sentinel()
    }

    /// Translate a schedule's raw action value into the device value.
    ///
    /// Fans take a level `1`–`3` mapped to a duty of 50/75/100; any other
    /// level turns the fan off.
    #[must_use]
    pub fn translate_action(&self, raw: &str) -> String {
        match self.category {
            DeviceCategory::Fan => match raw.trim() {
                "1" => "50",
                "2" => "75",
                "3" => "100",
                _ => GENERIC_OFF,
            }
            .to_string(),
            DeviceCategory::Light | DeviceCategory::Door | DeviceCategory::Other => {
                raw.to_string()
            }
        }
    }

    /// Value used to switch the device on in reaction to a breach.
    #[must_use]
    pub fn counter_on_value(&self) -> Option<&'static str> {
        match self.category {
            DeviceCategory::Fan => Some("75"),
            DeviceCategory::Light => Some("#FFFFFF"),
            DeviceCategory::Door | DeviceCategory::Other => None,
        }
    }

    /// Whether a scheduled actuation also clears the door passcode.
    #[must_use]
    pub fn resets_passcode(&self) -> bool {
        self.category == DeviceCategory::Door
    }

    /// Energy drawn per ON hour, in kWh. `None` means not metered.
    #[must_use]
    pub fn energy_rate_kwh(&self) -> Option<f64> {
        match self.category {
            DeviceCategory::Fan => Some(3.0),
            DeviceCategory::Light => Some(2.0),
            DeviceCategory::Door | DeviceCategory::Other => None,
        }
    }

    /// Log line recorded when a device reports `value`.
    #[must_use]
    pub fn describe(&self, name: &str, value: &str) -> String {
        match self.category {
            DeviceCategory::Door if self.is_off(value) => format!("[{name}] got closed"),
            DeviceCategory::Door => format!("[{name}] got opened"),
            DeviceCategory::Fan => format!("[{name}] set at level {value}"),
            DeviceCategory::Light => format!("[{name}] set color {value}"),
            DeviceCategory::Other => format!("[{name}] set to {value}"),
        }
    }
}
