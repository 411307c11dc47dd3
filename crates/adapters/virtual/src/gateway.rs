//! Virtual actuation gateway.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use hearth_app::ports::ActuationGateway;
use hearth_domain::device::Device;
use hearth_domain::error::{DispatchError, HearthError};
use hearth_domain::id::DeviceId;
use tokio::sync::mpsc;

/// A value the simulated device reports back after being actuated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub device: Device,
    pub value: String,
}

#[derive(Default)]
struct State {
    values: HashMap<DeviceId, String>,
    unreachable: HashSet<DeviceId>,
}

/// Simulated devices that accept every value instantly (or after a fixed
/// latency) and remember it.
#[derive(Clone, Default)]
pub struct VirtualGateway {
    state: Arc<Mutex<State>>,
    latency: Duration,
    feedback: Option<mpsc::UnboundedSender<Feedback>>,
}

impl VirtualGateway {
    /// A gateway that reports every accepted value on the returned channel,
    /// the way a real device would publish its new state on its feed.
    #[must_use]
    pub fn with_feedback() -> (Self, mpsc::UnboundedReceiver<Feedback>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let gateway = Self {
            feedback: Some(tx),
            ..Self::default()
        };
        (gateway, rx)
    }

    /// Delay every call by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make a device reject every call until [`reconnect`](Self::reconnect).
    pub fn disconnect(&self, device_id: DeviceId) {
        self.lock().unreachable.insert(device_id);
    }

    pub fn reconnect(&self, device_id: DeviceId) {
        self.lock().unreachable.remove(&device_id);
    }

    /// Last value the device accepted.
    #[must_use]
    pub fn value_of(&self, device_id: DeviceId) -> Option<String> {
        self.lock().values.get(&device_id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ActuationGateway for VirtualGateway {
    async fn set_value(&self, device: &Device, value: &str) -> Result<(), HearthError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        {
            let mut state = self.lock();
            if state.unreachable.contains(&device.id) {
                return Err(DispatchError::Unreachable(device.name.clone()).into());
            }
            state.values.insert(device.id, value.to_string());
        }
        tracing::info!(device = %device.id, name = %device.name, %value, "virtual device updated");

        if let Some(feedback) = &self.feedback {
            let report = Feedback {
                device: device.clone(),
                value: value.to_string(),
            };
            if feedback.send(report).is_err() {
                tracing::debug!("feedback receiver dropped");
            }
        }
        Ok(())
    }
}
