//! Schedule engine: turns due schedules into actuation intents.
//!
//! [`ScheduleEngine::run_schedule_tick`] is one evaluation at a given instant;
//! [`ScheduleRunner`] drives it from a wall-clock interval until shutdown.
//!
//! A schedule fires at most once per local minute. The engine remembers the
//! last minute each schedule fired in; entries for schedules that are no
//! longer active are forgotten on the next tick.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::NaiveDateTime;
use hearth_domain::actuation::ActuationIntent;
use hearth_domain::error::HearthError;
use hearth_domain::event::{Event, EventKind};
use hearth_domain::id::ScheduleId;
use hearth_domain::schedule::Schedule;
use hearth_domain::time::Timestamp;
use tokio::time::MissedTickBehavior;

use crate::dispatcher::ActuationSink;
use crate::ports::{DeviceRepository, EventLog, ScheduleStore};

/// Evaluates active schedules against the current time.
pub struct ScheduleEngine<S, D, L, A> {
    schedules: S,
    devices: D,
    log: L,
    actuator: A,
    last_fired: Mutex<HashMap<ScheduleId, NaiveDateTime>>,
}

impl<S, D, L, A> ScheduleEngine<S, D, L, A>
where
    S: ScheduleStore,
    D: DeviceRepository,
    L: EventLog,
    A: ActuationSink,
{
    pub fn new(schedules: S, devices: D, log: L, actuator: A) -> Self {
        Self {
            schedules,
            devices,
            log,
            actuator,
            last_fired: Mutex::new(HashMap::new()),
        }
    }

    /// Fire every active schedule due at `now`.
    ///
    /// The returned intents have already been handed to the actuation sink;
    /// this method never waits for device I/O.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the active schedules cannot be listed.
    /// Per-schedule problems (bad timezone, missing device, audit write
    /// failure) are logged and skipped.
    #[tracing::instrument(skip(self))]
    pub async fn run_schedule_tick(
        &self,
        now: Timestamp,
    ) -> Result<Vec<ActuationIntent>, HearthError> {
        let active = self.schedules.list_active().await?;
        self.forget_inactive(&active);

        let mut intents = Vec::new();
        for schedule in &active {
            let minute = match schedule.due_at(now) {
                Ok(Some(minute)) => minute,
                Ok(None) => continue,
                Err(err) => {
                    tracing::warn!(schedule = %schedule.id, error = %err, "skipping schedule");
                    continue;
                }
            };
            if !self.claim(schedule.id, minute) {
                continue;
            }
            intents.extend(self.fire(schedule, now).await);
        }

        self.actuator.submit_all(intents.iter().cloned());
        Ok(intents)
    }

    /// Record that `id` fires in `minute`; `false` if it already did.
    fn claim(&self, id: ScheduleId, minute: NaiveDateTime) -> bool {
        let mut last_fired = self
            .last_fired
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        last_fired.insert(id, minute) != Some(minute)
    }

    fn forget_inactive(&self, active: &[Schedule]) {
        let ids: HashSet<ScheduleId> = active.iter().map(|s| s.id).collect();
        self.last_fired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|id, _| ids.contains(id));
    }

    async fn fire(&self, schedule: &Schedule, now: Timestamp) -> Vec<ActuationIntent> {
        let device = match self.devices.get(schedule.device_id).await {
            Ok(Some(device)) => device,
            Ok(None) => {
                tracing::warn!(schedule = %schedule.id, device = %schedule.device_id, "scheduled device is gone");
                return Vec::new();
            }
            Err(err) => {
                tracing::warn!(schedule = %schedule.id, error = %err, "unable to load scheduled device");
                return Vec::new();
            }
        };

        let policy = device.category.policy();
        let value = policy.translate_action(&schedule.action_value);
        tracing::info!(schedule = %schedule.id, device = %device.id, %value, "schedule fired");

        let audit = Event::builder(device.id, EventKind::OnOff)
            .value(value.clone())
            .message(policy.describe(&device.name, &value))
            .actor(schedule.user_id)
            .timestamp(now)
            .build();
        if let Err(err) = self.log.append(audit).await {
            tracing::warn!(schedule = %schedule.id, error = %err, "unable to record schedule audit event");
        }

        let mut intents = vec![ActuationIntent::set_value(device.clone(), value)];
        if policy.resets_passcode() {
            intents.push(ActuationIntent::reset_passcode(device));
        }
        intents
    }
}

/// Drives a [`ScheduleEngine`] from a periodic timer.
pub struct ScheduleRunner<S, D, L, A> {
    engine: ScheduleEngine<S, D, L, A>,
}

impl<S, D, L, A> ScheduleRunner<S, D, L, A>
where
    S: ScheduleStore,
    D: DeviceRepository,
    L: EventLog,
    A: ActuationSink,
{
    pub fn new(engine: ScheduleEngine<S, D, L, A>) -> Self {
        Self { engine }
    }

    /// Tick every `period` until `shutdown` resolves.
    ///
    /// The first tick happens immediately. Ticks missed while a slow tick is
    /// running are skipped rather than bunched up. A failing tick is logged
    /// and the loop carries on.
    pub async fn run(&self, period: Duration, shutdown: impl Future<Output = ()>) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        tracing::info!(period_secs = period.as_secs(), "scheduler started");
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                _ = ticker.tick() => {
                    match self.engine.run_schedule_tick(hearth_domain::time::now()).await {
                        Ok(intents) if !intents.is_empty() => {
                            tracing::debug!(count = intents.len(), "tick dispatched intents");
                        }
                        Ok(_) => {}
                        Err(err) => tracing::warn!(error = %err, "schedule tick failed"),
                    }
                }
            }
        }
        tracing::info!("scheduler stopped");
    }
}
