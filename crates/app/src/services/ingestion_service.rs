//! Ingestion service: turns raw feed values into log events.

use hearth_domain::device::Device;
use hearth_domain::error::HearthError;
use hearth_domain::event::{Event, EventKind};
use hearth_domain::sensor::Sensor;
use hearth_domain::threshold::{BreachVerdict, parse_reading};

use crate::dispatcher::ActuationSink;
use crate::ports::{DeviceRepository, EventLog, NotificationDispatcher, PlanRegistry};
use crate::threshold::ThresholdEvaluator;

/// Records device values and sensor readings as they arrive.
///
/// Callers pass the descriptor snapshot the value belongs to; the service
/// never looks descriptors up by itself.
pub struct IngestionService<P, L, D, N, A> {
    log: L,
    devices: D,
    evaluator: ThresholdEvaluator<P, L, D, N, A>,
}

impl<P, L, D, N, A> IngestionService<P, L, D, N, A>
where
    P: PlanRegistry,
    L: EventLog,
    D: DeviceRepository,
    N: NotificationDispatcher,
    A: ActuationSink,
{
    pub fn new(log: L, devices: D, evaluator: ThresholdEvaluator<P, L, D, N, A>) -> Self {
        Self {
            log,
            devices,
            evaluator,
        }
    }

    /// Record a value reported by a device and remember it as the device's
    /// current value.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the event or the value cannot be stored.
    #[tracing::instrument(skip(self, device), fields(device = %device.id))]
    pub async fn record_device_value(
        &self,
        device: &Device,
        raw: &str,
    ) -> Result<Event, HearthError> {
        let value = raw.trim();
        let policy = device.category.policy();
        let event = Event::builder(device.id, EventKind::OnOff)
            .value(value)
            .message(policy.describe(&device.name, value))
            .actor(device.owner)
            .build();
        let event = self.log.append(event).await?;
        self.devices.set_value(device.id, value).await?;
        tracing::debug!(%value, "device value recorded");
        Ok(event)
    }

    /// Record a sensor reading and evaluate it against the sensor's plan.
    ///
    /// Readings that are not numbers are logged and dropped.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the event cannot be stored or the plan
    /// lookup fails.
    #[tracing::instrument(skip(self, sensor), fields(sensor = %sensor.id))]
    pub async fn record_sensor_reading(
        &self,
        sensor: &Sensor,
        raw: &str,
    ) -> Result<Vec<BreachVerdict>, HearthError> {
        let reading = match parse_reading(raw) {
            Ok(reading) => reading,
            Err(err) => {
                tracing::warn!(error = %err, "dropping malformed reading");
                return Ok(Vec::new());
            }
        };
        let event = Event::builder(sensor.id, EventKind::Data)
            .value(reading.to_string())
            .message(format!("[{}] reported {reading}", sensor.name))
            .actor(sensor.owner)
            .build();
        self.log.append(event).await?;
        self.evaluator.evaluate_threshold(sensor, reading).await
    }
}
