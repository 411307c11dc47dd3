//! Event: an immutable record of a state change on a device or sensor.
//!
//! Events are appended by ingestion (device reports, sensor readings) and by
//! the engines when they act (schedule firings, threshold warnings). The log
//! is append-only; total order is by timestamp, ties by insertion order.

use serde::{Deserialize, Serialize};

use crate::id::{DeviceId, EventId, SensorId, UserId};
use crate::time::Timestamp;

/// The device or sensor an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Subject {
    Device(DeviceId),
    Sensor(SensorId),
}

impl Subject {
    /// Short kind label, as stored by adapters.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Device(_) => "device",
            Self::Sensor(_) => "sensor",
        }
    }

    /// The subject's UUID regardless of kind.
    #[must_use]
    pub fn as_uuid(&self) -> uuid::Uuid {
        match self {
            Self::Device(id) => id.as_uuid(),
            Self::Sensor(id) => id.as_uuid(),
        }
    }
}

impl From<DeviceId> for Subject {
    fn from(id: DeviceId) -> Self {
        Self::Device(id)
    }
}

impl From<SensorId> for Subject {
    fn from(id: SensorId) -> Self {
        Self::Sensor(id)
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind(), self.as_uuid())
    }
}

/// What kind of change an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A device reported (or was driven to) a new value.
    #[serde(rename = "onoff")]
    OnOff,
    /// A sensor reading.
    Data,
    /// A threshold breach.
    Warning,
    /// The subject was registered.
    Creation,
}

impl EventKind {
    /// Return the `snake_case` string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnOff => "onoff",
            Self::Data => "data",
            Self::Warning => "warning",
            Self::Creation => "creation",
        }
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "onoff" => Ok(Self::OnOff),
            "data" => Ok(Self::Data),
            "warning" => Ok(Self::Warning),
            "creation" => Ok(Self::Creation),
            other => Err(format!("unknown event kind {other:?}")),
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable state-change record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub subject: Subject,
    pub kind: EventKind,
    /// Raw value: numeric string, hex color, or `"0"`/other.
    pub value: String,
    /// Human-readable description.
    pub message: String,
    pub actor: UserId,
    pub timestamp: Timestamp,
}

impl Event {
    /// Create a builder for constructing an [`Event`].
    #[must_use]
    pub fn builder(subject: impl Into<Subject>, kind: EventKind) -> EventBuilder {
        EventBuilder {
            subject: subject.into(),
            kind,
            value: String::new(),
            message: String::new(),
            actor: None,
            timestamp: None,
        }
    }
}

/// Step-by-step builder for [`Event`].
#[derive(Debug)]
pub struct EventBuilder {
    subject: Subject,
    kind: EventKind,
    value: String,
    message: String,
    actor: Option<UserId>,
    timestamp: Option<Timestamp>,
}

impl EventBuilder {
    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn actor(mut self, actor: UserId) -> Self {
        self.actor = Some(actor);
        self
    }

    #[must_use]
    pub fn timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Consume the builder and return an [`Event`] with a fresh id.
    #[must_use]
    pub fn build(self) -> Event {
        Event {
            id: EventId::new(),
            subject: self.subject,
            kind: self.kind,
            value: self.value,
            message: self.message,
            actor: self.actor.unwrap_or_default(),
            timestamp: self.timestamp.unwrap_or_else(crate::time::now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_event_with_all_fields() {
        let device = DeviceId::new();
        let actor = UserId::new();
        let ts = crate::time::now();

        let event = Event::builder(device, EventKind::OnOff)
            .value("75")
            .message("[Fan] set at level 75")
            .actor(actor)
            .timestamp(ts)
            .build();

        assert_eq!(event.subject, Subject::Device(device));
        assert_eq!(event.kind, EventKind::OnOff);
        assert_eq!(event.value, "75");
        assert_eq!(event.actor, actor);
        assert_eq!(event.timestamp, ts);
    }

    #[test]
    fn should_roundtrip_event_kind_through_str() {
        for kind in [
            EventKind::OnOff,
            EventKind::Data,
            EventKind::Warning,
            EventKind::Creation,
        ] {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
    }

    #[test]
    fn should_reject_unknown_event_kind() {
        assert!("restart".parse::<EventKind>().is_err());
    }

    #[test]
    fn should_display_subject_with_kind_prefix() {
        let sensor = SensorId::new();
        let subject = Subject::from(sensor);
        assert_eq!(subject.to_string(), format!("sensor:{sensor}"));
    }

    #[test]
    fn should_serialize_subject_as_tagged_object() {
        let device = DeviceId::new();
        let json = serde_json::to_value(Subject::Device(device)).unwrap();
        assert_eq!(json["kind"], "device");
        assert_eq!(json["id"], device.to_string());
    }
}
