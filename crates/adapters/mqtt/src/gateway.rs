//! Actuation over MQTT: a new value is published on the device's feed.

use hearth_app::ports::ActuationGateway;
use hearth_domain::device::Device;
use hearth_domain::error::HearthError;
use rumqttc::{AsyncClient, QoS};

use crate::config::MqttConfig;
use crate::error::MqttError;

/// Publishes device values to `{feed_prefix}/feeds/{feed_key}`.
///
/// The broker echoes the value back on the subscribed feed, which is how the
/// new value ends up in the event log.
#[derive(Clone)]
pub struct MqttGateway {
    client: AsyncClient,
    config: MqttConfig,
}

impl MqttGateway {
    pub(crate) fn new(client: AsyncClient, config: MqttConfig) -> Self {
        Self { client, config }
    }
}

impl ActuationGateway for MqttGateway {
    async fn set_value(&self, device: &Device, value: &str) -> Result<(), HearthError> {
        let topic = self.config.feed_topic(&device.feed_key);
        tracing::debug!(%topic, %value, "publishing device value");
        self.client
            .publish(topic, QoS::AtLeastOnce, false, value.as_bytes().to_vec())
            .await
            .map_err(MqttError::from)?;
        Ok(())
    }
}
