//! MQTT adapter error types.

use hearth_domain::error::{DispatchError, HearthError};

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The request could not be queued on the client.
    #[error("MQTT client error")]
    Client(#[from] rumqttc::ClientError),

    /// The connection to the broker failed.
    #[error("MQTT connection error")]
    Connection(#[from] rumqttc::ConnectionError),
}

impl From<MqttError> for HearthError {
    fn from(err: MqttError) -> Self {
        let detail = match &err {
            MqttError::Client(inner) => inner.to_string(),
            MqttError::Connection(inner) => inner.to_string(),
        };
        DispatchError::Unreachable(format!("{err}: {detail}")).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_connection_error_to_unreachable() {
        let err: HearthError = MqttError::Connection(rumqttc::ConnectionError::RequestsDone).into();
        assert!(matches!(
            err,
            HearthError::Dispatch(DispatchError::Unreachable(_))
        ));
    }

    #[test]
    fn should_display_connection_error() {
        let err = MqttError::Connection(rumqttc::ConnectionError::RequestsDone);
        assert_eq!(err.to_string(), "MQTT connection error");
    }
}
