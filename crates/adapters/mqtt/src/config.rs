//! MQTT connection configuration.

use std::time::Duration;

use rumqttc::MqttOptions;
use serde::Deserialize;

/// Configuration for the MQTT bridge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Broker hostname or IP address.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Prefix of every feed topic: feeds live under `{feed_prefix}/feeds/{feed_key}`.
    pub feed_prefix: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// Delay before polling again after a connection error, in seconds.
    pub reconnect_delay_secs: u16,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: "hearthd".to_string(),
            username: None,
            password: None,
            feed_prefix: "hearth".to_string(),
            keep_alive_secs: 30,
            reconnect_delay_secs: 2,
        }
    }
}

impl MqttConfig {
    /// Topic of the feed identified by `feed_key`.
    #[must_use]
    pub fn feed_topic(&self, feed_key: &str) -> String {
        format!("{}/feeds/{feed_key}", self.feed_prefix)
    }

    pub(crate) fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port);
        options.set_keep_alive(Duration::from_secs(u64::from(self.keep_alive_secs)));
        if let Some(username) = &self.username {
            options.set_credentials(username, self.password.as_deref().unwrap_or_default());
        }
        options
    }

    pub(crate) fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(u64::from(self.reconnect_delay_secs))
    }
}
