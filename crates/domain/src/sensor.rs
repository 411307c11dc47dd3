//! Sensor: a read-only subject producing numeric readings.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{RoomId, SensorId, UserId};

/// What a sensor measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Temperature,
    Humidity,
    Brightness,
    #[default]
    Other,
}

impl SensorKind {
    /// Return the lowercase string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Brightness => "brightness",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for SensorKind {
    type Err = std::convert::Infallible;

    /// Unknown kinds map to [`SensorKind::Other`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "temperature" => Self::Temperature,
            "humidity" => Self::Humidity,
            "brightness" => Self::Brightness,
            _ => Self::Other,
        })
    }
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor of a registered sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: SensorId,
    pub name: String,
    pub feed_key: String,
    pub kind: SensorKind,
    pub room_id: RoomId,
    pub owner: UserId,
}

impl Sensor {
    /// Create a builder for constructing a [`Sensor`].
    #[must_use]
    pub fn builder() -> SensorBuilder {
        SensorBuilder::default()
    }
}

/// Step-by-step builder for [`Sensor`].
#[derive(Debug, Default)]
pub struct SensorBuilder {
    id: Option<SensorId>,
    name: Option<String>,
    feed_key: Option<String>,
    kind: SensorKind,
    room_id: Option<RoomId>,
    owner: Option<UserId>,
}

impl SensorBuilder {
    #[must_use]
    pub fn id(mut self, id: SensorId) -> Self {
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
    pub fn kind(mut self, kind: SensorKind) -> Self {
        self.kind = kind;
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

    /// Consume the builder and return a [`Sensor`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] if no name was given.
    pub fn build(self) -> Result<Sensor, ValidationError> {
        let name = self.name.unwrap_or_default();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(Sensor {
            id: self.id.unwrap_or_default(),
            feed_key: self.feed_key.unwrap_or_else(|| name.to_lowercase()),
            name,
            kind: self.kind,
            room_id: self.room_id.unwrap_or_default(),
            owner: self.owner.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_sensor_in_room() {
        let room = RoomId::new();
        let sensor = Sensor::builder()
            .name("Living temp")
            .kind(SensorKind::Temperature)
            .room_id(room)
            .build()
            .unwrap();
        assert_eq!(sensor.room_id, room);
        assert_eq!(sensor.kind, SensorKind::Temperature);
    }

    #[test]
    fn should_reject_sensor_without_name() {
        assert_eq!(
            Sensor::builder().build(),
            Err(ValidationError::EmptyName)
        );
    }

    #[test]
    fn should_parse_sensor_kind_case_insensitively() {
        assert_eq!(
            "Brightness".parse::<SensorKind>(),
            Ok(SensorKind::Brightness)
        );
        assert_eq!("co2".parse::<SensorKind>(), Ok(SensorKind::Other));
    }
}
