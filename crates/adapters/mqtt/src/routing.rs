//! Topic routing: which subject a feed message belongs to.

use std::collections::HashMap;
use std::sync::Arc;

use hearth_domain::device::Device;
use hearth_domain::sensor::Sensor;

use crate::config::MqttConfig;

/// The subject a feed reports for.
///
/// Each route holds the descriptor snapshot taken when the table was built;
/// a message handler works on its own clone of that snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Device(Arc<Device>),
    Sensor(Arc<Sensor>),
}

/// Immutable map from feed topic to subject.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    routes: HashMap<String, Route>,
}

impl RoutingTable {
    /// Build the table for the given inventory.
    ///
    /// When a device and a sensor share a feed key, the sensor wins and a
    /// warning is logged.
    #[must_use]
    pub fn new(config: &MqttConfig, devices: Vec<Device>, sensors: Vec<Sensor>) -> Self {
        let mut routes = HashMap::with_capacity(devices.len() + sensors.len());
        for device in devices {
            routes.insert(
                config.feed_topic(&device.feed_key),
                Route::Device(Arc::new(device)),
            );
        }
        for sensor in sensors {
            let topic = config.feed_topic(&sensor.feed_key);
            if let Some(Route::Device(device)) =
                routes.insert(topic.clone(), Route::Sensor(Arc::new(sensor)))
            {
                tracing::warn!(%topic, device = %device.name, "feed shared by a device and a sensor");
            }
        }
        Self { routes }
    }

    #[must_use]
    pub fn resolve(&self, topic: &str) -> Option<Route> {
        self.routes.get(topic).cloned()
    }

    /// Every topic to subscribe to, sorted.
    #[must_use]
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.routes.keys().cloned().collect();
        topics.sort();
        topics
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Text value carried by a feed message, trimmed.
///
/// Returns `None` for payloads that are not UTF-8 or are blank.
#[must_use]
pub fn decode_payload(payload: &[u8]) -> Option<&str> {
    let text = std::str::from_utf8(payload).ok()?.trim();
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_domain::device::DeviceCategory;
    use hearth_domain::sensor::SensorKind;

    fn config() -> MqttConfig {
        MqttConfig {
            feed_prefix: "alice".to_string(),
            ..MqttConfig::default()
        }
    }

    fn fan(feed_key: &str) -> Device {
        Device::builder()
            .name("Fan")
            .feed_key(feed_key)
            .category(DeviceCategory::Fan)
            .build()
            .unwrap()
    }

    fn thermometer(feed_key: &str) -> Sensor {
        Sensor::builder()
            .name("Thermometer")
            .feed_key(feed_key)
            .kind(SensorKind::Temperature)
            .build()
            .unwrap()
    }

    #[test]
    fn should_resolve_topic_to_subject() {
        let device = fan("fan");
        let sensor = thermometer("temp");
        let table = RoutingTable::new(&config(), vec![device.clone()], vec![sensor.clone()]);

        assert_eq!(
            table.resolve("alice/feeds/fan"),
            Some(Route::Device(Arc::new(device)))
        );
        assert_eq!(
            table.resolve("alice/feeds/temp"),
            Some(Route::Sensor(Arc::new(sensor)))
        );
        assert!(table.resolve("alice/feeds/unknown").is_none());
        assert!(table.resolve("bob/feeds/fan").is_none());
    }

    #[test]
    fn should_list_sorted_topics() {
        let table = RoutingTable::new(
            &config(),
            vec![fan("fan"), fan("door")],
            vec![thermometer("temp")],
        );

        assert_eq!(
            table.topics(),
            vec!["alice/feeds/door", "alice/feeds/fan", "alice/feeds/temp"]
        );
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn should_prefer_sensor_on_shared_feed() {
        let table = RoutingTable::new(&config(), vec![fan("shared")], vec![thermometer("shared")]);

        assert_eq!(table.len(), 1);
        assert!(matches!(
            table.resolve("alice/feeds/shared"),
            Some(Route::Sensor(_))
        ));
    }

    #[test]
    fn should_share_snapshot_between_resolutions() {
        let table = RoutingTable::new(&config(), vec![fan("fan")], Vec::new());

        let (Some(Route::Device(a)), Some(Route::Device(b))) =
            (table.resolve("alice/feeds/fan"), table.resolve("alice/feeds/fan"))
        else {
            panic!("expected device routes");
        };
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn should_decode_trimmed_text_payload() {
        assert_eq!(decode_payload(b" 28.5\n"), Some("28.5"));
        assert_eq!(decode_payload(b"#FFAA00"), Some("#FFAA00"));
        assert_eq!(decode_payload(b"   "), None);
        assert_eq!(decode_payload(&[0xff, 0xfe]), None);
    }
}
