//! The gateway the daemon actuates through, chosen at startup.

use hearth_adapter_mqtt::MqttGateway;
use hearth_adapter_virtual::VirtualGateway;
use hearth_app::ports::ActuationGateway;
use hearth_domain::device::Device;
use hearth_domain::error::HearthError;

#[derive(Clone)]
pub enum HubGateway {
    /// Simulated devices, used when MQTT is disabled.
    Virtual(VirtualGateway),
    Mqtt(MqttGateway),
}

impl ActuationGateway for HubGateway {
    async fn set_value(&self, device: &Device, value: &str) -> Result<(), HearthError> {
        match self {
            Self::Virtual(gateway) => gateway.set_value(device, value).await,
            Self::Mqtt(gateway) => gateway.set_value(device, value).await,
        }
    }
}
