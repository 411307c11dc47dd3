//! Device: an actuated thing (fan, light, door, …) with a reported value.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{DeviceId, RoomId, UserId};
use crate::policy::DeviceClassPolicy;

/// Device category, selecting its [`DeviceClassPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceCategory {
    Fan,
    Light,
    Door,
    #[default]
    Other,
}

impl DeviceCategory {
    /// Return the lowercase string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fan => "fan",
            Self::Light => "light",
            Self::Door => "door",
            Self::Other => "other",
        }
    }

    /// The static policy for this category.
    #[must_use]
    pub fn policy(self) -> DeviceClassPolicy {
        DeviceClassPolicy::for_category(self)
    }
}

impl std::str::FromStr for DeviceCategory {
    type Err = std::convert::Infallible;

    /// Unknown categories map to [`DeviceCategory::Other`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "fan" => Self::Fan,
            "light" => Self::Light,
            "door" => Self::Door,
            _ => Self::Other,
        })
    }
}

impl std::fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor of a registered device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    /// Key of the upstream feed the device publishes on.
    pub feed_key: String,
    pub category: DeviceCategory,
    pub room_id: RoomId,
    pub owner: UserId,
    /// Last reported value.
    pub value: String,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Whether the last reported value is the category's off sentinel.
    #[must_use]
    pub fn is_off(&self) -> bool {
        self.category.policy().is_off(&self.value)
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<DeviceId>,
    name: Option<String>,
    feed_key: Option<String>,
    category: DeviceCategory,
    room_id: Option<RoomId>,
    owner: Option<UserId>,
    value: Option<String>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: DeviceId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn feed_key(mut self, feed_key: impl Into<String>) -> Self {
        self.feed_key = Some(feed_key.into());
        self
    }

    #[must_use]
    pub fn category(mut self, category: DeviceCategory) -> Self {
        self.category = category;
        self
    }

    #[must_use]
    pub fn room_id(mut self, room_id: RoomId) -> Self {
        self.room_id = Some(room_id);
        self
    }

    #[must_use]
    pub fn owner(mut self, owner: UserId) -> Self {
        self.owner = Some(owner);
        self
    }

    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Consume the builder and return a [`Device`].
    ///
    /// A device without an explicit value starts at its off sentinel.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] if no name was given.
    pub fn build(self) -> Result<Device, ValidationError> {
        let name = self.name.unwrap_or_default();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let category = self.category;
        Ok(Device {
            id: self.id.unwrap_or_default(),
            feed_key: self.feed_key.unwrap_or_else(|| name.to_lowercase()),
            name,
            category,
            room_id: self.room_id.unwrap_or_default(),
            owner: self.owner.unwrap_or_default(),
            value: self
                .value
                .unwrap_or_else(|| category.policy().off_sentinel().to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_start_light_at_black_when_no_value_given() {
        let light = Device::builder()
            .name("Desk lamp")
            .category(DeviceCategory::Light)
            .build()
            .unwrap();
        assert_eq!(light.value, "#000000");
        assert!(light.is_off());
    }

    #[test]
    fn should_report_on_when_value_differs_from_sentinel() {
        let fan = Device::builder()
            .name("Ceiling fan")
            .category(DeviceCategory::Fan)
            .value("75")
            .build()
            .unwrap();
        assert!(!fan.is_off());
    }

    #[test]
    fn should_reject_empty_name() {
        let result = Device::builder().category(DeviceCategory::Door).build();
        assert_eq!(result, Err(ValidationError::EmptyName));
    }

    #[test]
    fn should_default_feed_key_to_lowercased_name() {
        let door = Device::builder().name("Front").build().unwrap();
        assert_eq!(door.feed_key, "front");
    }

    #[test]
    fn should_parse_unknown_category_as_other() {
        assert_eq!("Fan".parse::<DeviceCategory>(), Ok(DeviceCategory::Fan));
        assert_eq!("heater".parse::<DeviceCategory>(), Ok(DeviceCategory::Other));
    }
}
