//! Threshold evaluator: reacts to a sensor reading that crossed its plan.
//!
//! For every breach the evaluator records a warning event, switches on the
//! devices that counter the breach (lights when it gets dark, fans when it
//! gets hot) and notifies the sensor's owner. Each side effect is independent:
//! a failure is logged and the remaining ones still run.

use hearth_domain::actuation::ActuationIntent;
use hearth_domain::device::DeviceCategory;
use hearth_domain::error::HearthError;
use hearth_domain::event::{Event, EventKind};
use hearth_domain::sensor::{Sensor, SensorKind};
use hearth_domain::threshold::{self, BreachKind, BreachVerdict};

use crate::dispatcher::ActuationSink;
use crate::ports::{DeviceRepository, EventLog, NotificationDispatcher, PlanRegistry};

/// Device category switched on in reaction to a breach, if any.
#[must_use]
pub fn counter_category(sensor: SensorKind, breach: BreachKind) -> Option<DeviceCategory> {
    match (sensor, breach) {
        (SensorKind::Brightness, BreachKind::Low) => Some(DeviceCategory::Light),
        (SensorKind::Temperature, BreachKind::High) => Some(DeviceCategory::Fan),
        _ => None,
    }
}

/// Evaluates readings against the active plan of their sensor.
pub struct ThresholdEvaluator<P, L, D, N, A> {
    plans: P,
    log: L,
    devices: D,
    notifier: N,
    actuator: A,
}

impl<P, L, D, N, A> ThresholdEvaluator<P, L, D, N, A>
where
    P: PlanRegistry,
    L: EventLog,
    D: DeviceRepository,
    N: NotificationDispatcher,
    A: ActuationSink,
{
    pub fn new(plans: P, log: L, devices: D, notifier: N, actuator: A) -> Self {
        Self {
            plans,
            log,
            devices,
            notifier,
            actuator,
        }
    }

    /// Check `reading` against the sensor's active plan and react to breaches.
    ///
    /// A sensor without a plan yields no verdicts.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the plan lookup fails. Failures of the
    /// side effects are logged, never returned.
    #[tracing::instrument(skip(self, sensor), fields(sensor = %sensor.id, kind = %sensor.kind))]
    pub async fn evaluate_threshold(
        &self,
        sensor: &Sensor,
        reading: f64,
    ) -> Result<Vec<BreachVerdict>, HearthError> {
        let Some(plan) = self.plans.get_active(sensor.id).await? else {
            return Ok(Vec::new());
        };

        let verdicts = threshold::check(&plan, reading);
        for verdict in &verdicts {
            tracing::info!(breach = ?verdict.kind, bound = verdict.bound, "threshold breached");
            self.record_warning(sensor, verdict).await;
            if let Some(category) = counter_category(sensor.kind, verdict.kind) {
                self.counter_actuate(sensor, category).await;
            }
            self.notify_owner(sensor, verdict.kind).await;
        }
        Ok(verdicts)
    }

    async fn record_warning(&self, sensor: &Sensor, verdict: &BreachVerdict) {
        let event = Event::builder(sensor.id, EventKind::Warning)
            .value(verdict.value.to_string())
            .message(format!("[{}] {}", sensor.name, verdict.message))
            .actor(sensor.owner)
            .build();
        if let Err(err) = self.log.append(event).await {
            tracing::warn!(error = %err, "unable to record warning event");
        }
    }

    async fn counter_actuate(&self, sensor: &Sensor, category: DeviceCategory) {
        let devices = match self.devices.list_in_room(sensor.room_id).await {
            Ok(devices) => devices,
            Err(err) => {
                tracing::warn!(error = %err, room = %sensor.room_id, "unable to list room devices");
                return;
            }
        };
        let policy = category.policy();
        let Some(on_value) = policy.counter_on_value() else {
            return;
        };
        let intents: Vec<ActuationIntent> = devices
            .into_iter()
            .filter(|device| device.category == category && policy.is_off(&device.value))
            .map(|device| ActuationIntent::set_value(device, on_value))
            .collect();
        tracing::debug!(count = intents.len(), %category, "counter-actuating");
        self.actuator.submit_all(intents);
    }

    async fn notify_owner(&self, sensor: &Sensor, breach: BreachKind) {
        let target = match self.notifier.registered_target(sensor.owner).await {
            Ok(Some(target)) => target,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(error = %err, "unable to look up notification target");
                return;
            }
        };
        let message = threshold::notification_message(sensor.kind, breach);
        if let Err(err) = self.notifier.send(sensor.owner, &target, message).await {
            tracing::warn!(error = %err, "unable to send notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        InMemoryDevices, InMemoryEventLog, InMemoryPlans, RecordingNotifier, RecordingSink, fan,
        light, sensor,
    };
    use hearth_domain::actuation::Command;
    use hearth_domain::device::Device;
    use hearth_domain::id::{RoomId, UserId};
    use hearth_domain::plan::Plan;

    struct Fixture {
        plans: InMemoryPlans,
        log: InMemoryEventLog,
        notifier: RecordingNotifier,
        sink: RecordingSink,
        evaluator: ThresholdEvaluator<
            InMemoryPlans,
            InMemoryEventLog,
            InMemoryDevices,
            RecordingNotifier,
            RecordingSink,
        >,
    }

    fn fixture(devices: Vec<Device>) -> Fixture {
        let plans = InMemoryPlans::default();
        let log = InMemoryEventLog::default();
        let notifier = RecordingNotifier::default();
        let sink = RecordingSink::default();
        let evaluator = ThresholdEvaluator::new(
            plans.clone(),
            log.clone(),
            InMemoryDevices::with(devices),
            notifier.clone(),
            sink.clone(),
        );
        Fixture {
            plans,
            log,
            notifier,
            sink,
            evaluator,
        }
    }

    fn in_room(mut device: Device, room: RoomId) -> Device {
        device.room_id = room;
        device
    }

    #[tokio::test]
    async fn should_turn_on_dark_lights_when_brightness_is_low() {
        let room = RoomId::new();
        let owner = UserId::new();
        let off = in_room(light("Ceiling", "#000000"), room);
        let on = in_room(light("Lamp", "#FFAA00"), room);
        let elsewhere = light("Hall", "#000000");
        let fx = fixture(vec![off.clone(), on, elsewhere]);
        let brightness = sensor(SensorKind::Brightness, room, owner);
        fx.plans
            .replace(Plan::new(brightness.id, Some(20.0), Some(80.0)))
            .await
            .unwrap();
        fx.notifier.register(owner, "push-token");

        let verdicts = fx.evaluator.evaluate_threshold(&brightness, 12.0).await.unwrap();

        assert_eq!(verdicts.len(), 1);
        assert_eq!(verdicts[0].kind, BreachKind::Low);

        let warnings = fx.log.of_kind(EventKind::Warning);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].subject, brightness.id.into());

        let intents = fx.sink.intents();
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].device.id, off.id);
        assert_eq!(intents[0].command, Command::SetValue("#FFFFFF".to_string()));

        let sent = fx.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, owner);
        assert_eq!(sent[0].1, "push-token");
        assert_eq!(
            sent[0].2,
            "It's getting dark in here, turning the lights on"
        );
    }

    #[tokio::test]
    async fn should_turn_on_idle_fans_when_temperature_is_high() {
        let room = RoomId::new();
        let idle = in_room(fan("Ceiling fan", "0"), room);
        let running = in_room(fan("Desk fan", "50"), room);
        let fx = fixture(vec![idle.clone(), running]);
        let temperature = sensor(SensorKind::Temperature, room, UserId::new());
        fx.plans
            .replace(Plan::new(temperature.id, None, Some(30.0)))
            .await
            .unwrap();

        fx.evaluator.evaluate_threshold(&temperature, 31.5).await.unwrap();

        let intents = fx.sink.intents();
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].device.id, idle.id);
        assert_eq!(intents[0].command, Command::SetValue("75".to_string()));
    }

    #[tokio::test]
    async fn should_do_nothing_without_plan() {
        let fx = fixture(vec![]);
        let humidity = sensor(SensorKind::Humidity, RoomId::new(), UserId::new());

        let verdicts = fx.evaluator.evaluate_threshold(&humidity, 99.0).await.unwrap();

        assert!(verdicts.is_empty());
        assert!(fx.log.all().is_empty());
    }

    #[tokio::test]
    async fn should_not_breach_when_reading_equals_bound() {
        let fx = fixture(vec![]);
        let humidity = sensor(SensorKind::Humidity, RoomId::new(), UserId::new());
        fx.plans
            .replace(Plan::new(humidity.id, Some(40.0), Some(60.0)))
            .await
            .unwrap();

        assert!(fx.evaluator.evaluate_threshold(&humidity, 40.0).await.unwrap().is_empty());
        assert!(fx.evaluator.evaluate_threshold(&humidity, 60.0).await.unwrap().is_empty());
        assert!(fx.log.all().is_empty());
    }

    #[tokio::test]
    async fn should_skip_notification_when_owner_has_no_target() {
        let fx = fixture(vec![]);
        let humidity = sensor(SensorKind::Humidity, RoomId::new(), UserId::new());
        fx.plans
            .replace(Plan::new(humidity.id, Some(40.0), None))
            .await
            .unwrap();

        let verdicts = fx.evaluator.evaluate_threshold(&humidity, 10.0).await.unwrap();

        assert_eq!(verdicts.len(), 1);
        assert_eq!(fx.log.of_kind(EventKind::Warning).len(), 1);
        assert!(fx.notifier.sent().is_empty());
        assert!(fx.sink.intents().is_empty());
    }

    #[test]
    fn should_only_counter_dark_rooms_and_hot_rooms() {
        assert_eq!(
            counter_category(SensorKind::Brightness, BreachKind::Low),
            Some(DeviceCategory::Light)
        );
        assert_eq!(
            counter_category(SensorKind::Temperature, BreachKind::High),
            Some(DeviceCategory::Fan)
        );
        assert_eq!(counter_category(SensorKind::Brightness, BreachKind::High), None);
        assert_eq!(counter_category(SensorKind::Humidity, BreachKind::Low), None);
    }
}
