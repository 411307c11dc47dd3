//! In-memory port implementations shared by the unit tests of this crate.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hearth_domain::actuation::ActuationIntent;
use hearth_domain::device::{Device, DeviceCategory};
use hearth_domain::error::{DispatchError, HearthError};
use hearth_domain::event::{Event, EventKind, Subject};
use hearth_domain::id::{DeviceId, RoomId, ScheduleId, SensorId, UserId};
use hearth_domain::plan::Plan;
use hearth_domain::schedule::Schedule;
use hearth_domain::sensor::{Sensor, SensorKind};
use hearth_domain::time::Timestamp;

use crate::dispatcher::ActuationSink;
use crate::ports::{
    ActuationGateway, DeviceRepository, EventLog, NotificationDispatcher, PasscodeStore,
    PlanRegistry, ScheduleStore, SensorRepository,
};

pub fn light(name: &str, value: &str) -> Device {
    Device::builder()
        .name(name)
        .category(DeviceCategory::Light)
        .value(value)
        .build()
        .unwrap()
}

pub fn fan(name: &str, value: &str) -> Device {
    Device::builder()
        .name(name)
        .category(DeviceCategory::Fan)
        .value(value)
        .build()
        .unwrap()
}

pub fn door(name: &str) -> Device {
    Device::builder()
        .name(name)
        .category(DeviceCategory::Door)
        .build()
        .unwrap()
}

pub fn sensor(kind: SensorKind, room_id: RoomId, owner: UserId) -> Sensor {
    Sensor::builder()
        .name(kind.as_str())
        .kind(kind)
        .room_id(room_id)
        .owner(owner)
        .build()
        .unwrap()
}

#[derive(Clone, Default)]
pub struct InMemoryEventLog {
    events: Arc<Mutex<Vec<Event>>>,
}

impl InMemoryEventLog {
    pub fn all(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn of_kind(&self, kind: EventKind) -> Vec<Event> {
        self.all().into_iter().filter(|e| e.kind == kind).collect()
    }
}

impl EventLog for InMemoryEventLog {
    fn append(&self, event: Event) -> impl Future<Output = Result<Event, HearthError>> + Send {
        self.events.lock().unwrap().push(event.clone());
        async { Ok(event) }
    }

    fn query(
        &self,
        subject: Subject,
        start: Timestamp,
        end: Timestamp,
    ) -> impl Future<Output = Result<Vec<Event>, HearthError>> + Send {
        let mut result: Vec<Event> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.subject == subject && e.timestamp >= start && e.timestamp < end)
            .cloned()
            .collect();
        result.sort_by_key(|e| e.timestamp);
        async { Ok(result) }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryPlans {
    plans: Arc<Mutex<HashMap<SensorId, Plan>>>,
}

impl PlanRegistry for InMemoryPlans {
    fn get_active(
        &self,
        sensor_id: SensorId,
    ) -> impl Future<Output = Result<Option<Plan>, HearthError>> + Send {
        let result = self.plans.lock().unwrap().get(&sensor_id).cloned();
        async { Ok(result) }
    }

    fn replace(&self, plan: Plan) -> impl Future<Output = Result<Plan, HearthError>> + Send {
        self.plans
            .lock()
            .unwrap()
            .insert(plan.sensor_id, plan.clone());
        async { Ok(plan) }
    }

    fn remove(&self, sensor_id: SensorId) -> impl Future<Output = Result<(), HearthError>> + Send {
        self.plans.lock().unwrap().remove(&sensor_id);
        async { Ok(()) }
    }
}

#[derive(Clone, Default)]
pub struct InMemorySchedules {
    schedules: Arc<Mutex<Vec<Schedule>>>,
    list_calls: Arc<AtomicUsize>,
}

impl InMemorySchedules {
    pub fn with(schedules: Vec<Schedule>) -> Self {
        Self {
            schedules: Arc::new(Mutex::new(schedules)),
            list_calls: Arc::default(),
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

impl ScheduleStore for InMemorySchedules {
    fn list_active(&self) -> impl Future<Output = Result<Vec<Schedule>, HearthError>> + Send {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let result: Vec<Schedule> = self
            .schedules
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.active)
            .cloned()
            .collect();
        async { Ok(result) }
    }

    fn create(
        &self,
        schedule: Schedule,
    ) -> impl Future<Output = Result<Schedule, HearthError>> + Send {
        self.schedules.lock().unwrap().push(schedule.clone());
        async { Ok(schedule) }
    }

    fn get(
        &self,
        id: ScheduleId,
    ) -> impl Future<Output = Result<Option<Schedule>, HearthError>> + Send {
        let result = self
            .schedules
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned();
        async { Ok(result) }
    }

    fn set_active(
        &self,
        id: ScheduleId,
        active: bool,
    ) -> impl Future<Output = Result<Option<Schedule>, HearthError>> + Send {
        let mut schedules = self.schedules.lock().unwrap();
        let result = schedules.iter_mut().find(|s| s.id == id).map(|s| {
            s.active = active;
            s.clone()
        });
        async { Ok(result) }
    }

    fn remove(&self, id: ScheduleId) -> impl Future<Output = Result<(), HearthError>> + Send {
        self.schedules.lock().unwrap().retain(|s| s.id != id);
        async { Ok(()) }
    }

    fn list_for_device(
        &self,
        device_id: DeviceId,
    ) -> impl Future<Output = Result<Vec<Schedule>, HearthError>> + Send {
        let result: Vec<Schedule> = self
            .schedules
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.device_id == device_id)
            .cloned()
            .collect();
        async { Ok(result) }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryDevices {
    devices: Arc<Mutex<HashMap<DeviceId, Device>>>,
}

impl InMemoryDevices {
    pub fn with(devices: impl IntoIterator<Item = Device>) -> Self {
        let repo = Self::default();
        repo.devices
            .lock()
            .unwrap()
            .extend(devices.into_iter().map(|d| (d.id, d)));
        repo
    }

    pub fn value_of(&self, id: DeviceId) -> Option<String> {
        self.devices.lock().unwrap().get(&id).map(|d| d.value.clone())
    }
}

impl DeviceRepository for InMemoryDevices {
    fn get(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, HearthError>> + Send {
        let result = self.devices.lock().unwrap().get(&id).cloned();
        async { Ok(result) }
    }

    fn list_in_room(
        &self,
        room_id: RoomId,
    ) -> impl Future<Output = Result<Vec<Device>, HearthError>> + Send {
        let result: Vec<Device> = self
            .devices
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.room_id == room_id)
            .cloned()
            .collect();
        async { Ok(result) }
    }

    fn list_all(&self) -> impl Future<Output = Result<Vec<Device>, HearthError>> + Send {
        let result: Vec<Device> = self.devices.lock().unwrap().values().cloned().collect();
        async { Ok(result) }
    }

    fn set_value(
        &self,
        id: DeviceId,
        value: &str,
    ) -> impl Future<Output = Result<(), HearthError>> + Send {
        if let Some(device) = self.devices.lock().unwrap().get_mut(&id) {
            device.value = value.to_string();
        }
        async { Ok(()) }
    }
}

#[derive(Clone, Default)]
pub struct InMemorySensors {
    sensors: Arc<Mutex<HashMap<SensorId, Sensor>>>,
}

impl InMemorySensors {
    pub fn with(sensors: impl IntoIterator<Item = Sensor>) -> Self {
        let repo = Self::default();
        repo.sensors
            .lock()
            .unwrap()
            .extend(sensors.into_iter().map(|s| (s.id, s)));
        repo
    }
}

impl SensorRepository for InMemorySensors {
    fn get(
        &self,
        id: SensorId,
    ) -> impl Future<Output = Result<Option<Sensor>, HearthError>> + Send {
        let result = self.sensors.lock().unwrap().get(&id).cloned();
        async { Ok(result) }
    }

    fn list_all(&self) -> impl Future<Output = Result<Vec<Sensor>, HearthError>> + Send {
        let result: Vec<Sensor> = self.sensors.lock().unwrap().values().cloned().collect();
        async { Ok(result) }
    }
}

#[derive(Clone, Default)]
pub struct RecordingGateway {
    calls: Arc<Mutex<Vec<(DeviceId, String)>>>,
    delay: Option<Duration>,
    fail: bool,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl RecordingGateway {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(DeviceId, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ActuationGateway for RecordingGateway {
    async fn set_value(&self, device: &Device, value: &str) -> Result<(), HearthError> {
        let current = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = ActiveGuard(Arc::clone(&self.active));
        self.peak.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.calls
            .lock()
            .unwrap()
            .push((device.id, value.to_string()));
        if self.fail {
            return Err(DispatchError::Unreachable(device.name.clone()).into());
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct RecordingPasscodes {
    writes: Arc<Mutex<Vec<(DeviceId, String)>>>,
}

impl RecordingPasscodes {
    pub fn writes(&self) -> Vec<(DeviceId, String)> {
        self.writes.lock().unwrap().clone()
    }
}

impl PasscodeStore for RecordingPasscodes {
    fn set(
        &self,
        device_id: DeviceId,
        passcode: &str,
    ) -> impl Future<Output = Result<(), HearthError>> + Send {
        self.writes
            .lock()
            .unwrap()
            .push((device_id, passcode.to_string()));
        async { Ok(()) }
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    targets: Arc<Mutex<HashMap<UserId, String>>>,
    sent: Arc<Mutex<Vec<(UserId, String, String)>>>,
}

impl RecordingNotifier {
    pub fn register(&self, user: UserId, target: &str) {
        self.targets
            .lock()
            .unwrap()
            .insert(user, target.to_string());
    }

    pub fn sent(&self) -> Vec<(UserId, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl NotificationDispatcher for RecordingNotifier {
    fn registered_target(
        &self,
        user: UserId,
    ) -> impl Future<Output = Result<Option<String>, HearthError>> + Send {
        let result = self.targets.lock().unwrap().get(&user).cloned();
        async { Ok(result) }
    }

    fn send(
        &self,
        user: UserId,
        target: &str,
        message: &str,
    ) -> impl Future<Output = Result<(), HearthError>> + Send {
        self.sent
            .lock()
            .unwrap()
            .push((user, target.to_string(), message.to_string()));
        async { Ok(()) }
    }
}

#[derive(Clone, Default)]
pub struct RecordingSink {
    intents: Arc<Mutex<Vec<ActuationIntent>>>,
}

impl RecordingSink {
    pub fn intents(&self) -> Vec<ActuationIntent> {
        self.intents.lock().unwrap().clone()
    }
}

impl ActuationSink for RecordingSink {
    fn submit(&self, intent: ActuationIntent) {
        self.intents.lock().unwrap().push(intent);
    }
}
