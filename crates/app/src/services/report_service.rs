//! Report service: usage, energy and reading summaries over the event log.

use chrono::Duration;
use chrono_tz::Tz;
use hearth_domain::device::{Device, DeviceCategory};
use hearth_domain::error::{HearthError, NotFoundError};
use hearth_domain::event::{Event, Subject};
use hearth_domain::id::{DeviceId, RoomId, SensorId};
use hearth_domain::sensor::Sensor;
use hearth_domain::time::{self, Timestamp};
use hearth_domain::usage::{
    self, DailyTotals, Interval, OpenIntervalPolicy, aggregate_readings, aggregate_usage,
    reconstruct_intervals, total_hours,
};

use crate::ports::{DeviceRepository, EventLog, SensorRepository};

/// How reports are computed.
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    /// Timezone whose local midnights delimit days.
    pub timezone: Tz,
    /// What to do with devices still on at the end of the window.
    pub open_intervals: OpenIntervalPolicy,
    /// How far before the window to look for the state a device was in when
    /// the window opened.
    pub lookback: Duration,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::UTC,
            open_intervals: OpenIntervalPolicy::default(),
            lookback: Duration::days(7),
        }
    }
}

/// Read-only reports over devices and sensors.
pub struct ReportService<L, D, S> {
    log: L,
    devices: D,
    sensors: S,
    options: ReportOptions,
}

impl<L, D, S> ReportService<L, D, S>
where
    L: EventLog,
    D: DeviceRepository,
    S: SensorRepository,
{
    pub fn new(log: L, devices: D, sensors: S, options: ReportOptions) -> Self {
        Self {
            log,
            devices,
            sensors,
            options,
        }
    }

    /// Hours the device was on, per local day of `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::NotFound`] for an unknown device, or a storage
    /// error from the log.
    #[tracing::instrument(skip(self))]
    pub async fn device_usage(
        &self,
        device_id: DeviceId,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<DailyTotals, HearthError> {
        let device = self.device(device_id).await?;
        let intervals = self.intervals_of(&device, start, end).await?;
        Ok(aggregate_usage(&intervals, start, end, self.options.timezone))
    }

    /// Total hours the device was on over `[start, end)`.
    ///
    /// # Errors
    ///
    /// Same as [`device_usage`](Self::device_usage).
    pub async fn device_total(
        &self,
        device_id: DeviceId,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<f64, HearthError> {
        let usage = self.device_usage(device_id, start, end).await?;
        Ok(total_hours(&usage))
    }

    /// Hours summed over every device of `category` in the room, per day.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the repository or the log.
    #[tracing::instrument(skip(self))]
    pub async fn room_usage(
        &self,
        room_id: RoomId,
        category: DeviceCategory,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<DailyTotals, HearthError> {
        let mut intervals = Vec::new();
        for device in self.devices.list_in_room(room_id).await? {
            if device.category == category {
                intervals.extend(self.intervals_of(&device, start, end).await?);
            }
        }
        Ok(aggregate_usage(&intervals, start, end, self.options.timezone))
    }

    /// Energy used by the room's metered devices over `[start, end)`, in kWh.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the repository or the log.
    #[tracing::instrument(skip(self))]
    pub async fn room_energy(
        &self,
        room_id: RoomId,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<f64, HearthError> {
        let mut kwh = 0.0;
        for device in self.devices.list_in_room(room_id).await? {
            if device.category.policy().energy_rate_kwh().is_none() {
                continue;
            }
            let intervals = self.intervals_of(&device, start, end).await?;
            let daily = aggregate_usage(&intervals, start, end, self.options.timezone);
            let hours = total_hours(&daily);
            kwh += usage::energy_kwh(hours, device.category).unwrap_or_default();
        }
        Ok(kwh)
    }

    /// Average reading of the sensor, per local day of `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::NotFound`] for an unknown sensor, or a storage
    /// error from the log.
    #[tracing::instrument(skip(self))]
    pub async fn sensor_daily_average(
        &self,
        sensor_id: SensorId,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<DailyTotals, HearthError> {
        let sensor = self.sensor(sensor_id).await?;
        let events = self.log.query(sensor.id.into(), start, end).await?;
        Ok(aggregate_readings(&events, start, end, self.options.timezone))
    }

    /// Events of a device or sensor over the trailing `window` ending at
    /// `now`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::NotFound`] for an unknown subject, or a storage
    /// error from the log.
    #[tracing::instrument(skip(self))]
    pub async fn recent_events(
        &self,
        subject: Subject,
        window: Duration,
        now: Timestamp,
    ) -> Result<Vec<Event>, HearthError> {
        match subject {
            Subject::Device(id) => {
                self.device(id).await?;
            }
            Subject::Sensor(id) => {
                self.sensor(id).await?;
            }
        }
        self.log.query_last(subject, window, now).await
    }

    async fn device(&self, id: DeviceId) -> Result<Device, HearthError> {
        self.devices.get(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Device",
                id: id.to_string(),
            }
            .into()
        })
    }

    async fn sensor(&self, id: SensorId) -> Result<Sensor, HearthError> {
        self.sensors.get(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Sensor",
                id: id.to_string(),
            }
            .into()
        })
    }

    async fn intervals_of(
        &self,
        device: &Device,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<Interval>, HearthError> {
        let boundary = end.min(time::now());
        let events = self
            .log
            .query(device.id.into(), start - self.options.lookback, boundary)
            .await?;
        let intervals = reconstruct_intervals(
            &events,
            device.category.policy().off_sentinel(),
            boundary,
        );
        Ok(self.options.open_intervals.apply(intervals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryDevices, InMemoryEventLog, InMemorySensors, door, fan, light};
    use chrono::{NaiveDate, TimeZone, Utc};
    use hearth_domain::event::EventKind;
    use hearth_domain::sensor::SensorKind;

    const EPS: f64 = 1e-9;

    fn at(d: u32, h: u32, m: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2025, 3, d, h, m, 0).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    async fn onoff(log: &InMemoryEventLog, device: &Device, ts: Timestamp, value: &str) {
        log.append(
            Event::builder(device.id, EventKind::OnOff)
                .value(value)
                .timestamp(ts)
                .build(),
        )
        .await
        .unwrap();
    }

    fn in_room(mut device: Device, room: RoomId) -> Device {
        device.room_id = room;
        device
    }

    fn service(
        log: InMemoryEventLog,
        devices: InMemoryDevices,
        options: ReportOptions,
    ) -> ReportService<InMemoryEventLog, InMemoryDevices, InMemorySensors> {
        ReportService::new(log, devices, InMemorySensors::default(), options)
    }

    #[tokio::test]
    async fn should_report_daily_usage_of_device() {
        let device = fan("Fan", "0");
        let log = InMemoryEventLog::default();
        onoff(&log, &device, at(1, 23, 0), "75").await;
        onoff(&log, &device, at(2, 1, 0), "0").await;
        let sut = service(
            log,
            InMemoryDevices::with([device.clone()]),
            ReportOptions::default(),
        );

        let usage = sut.device_usage(device.id, at(1, 0, 0), at(4, 0, 0)).await.unwrap();

        assert_eq!(usage.len(), 3);
        assert!((usage[&day(1)] - 1.0).abs() < EPS);
        assert!((usage[&day(2)] - 1.0).abs() < EPS);
        assert!(usage[&day(3)].abs() < EPS);
        let total = sut.device_total(device.id, at(1, 0, 0), at(4, 0, 0)).await.unwrap();
        assert!((total - 2.0).abs() < EPS);
    }

    #[tokio::test]
    async fn should_carry_state_from_before_the_window() {
        let device = light("Lamp", "#000000");
        let log = InMemoryEventLog::default();
        onoff(&log, &device, at(1, 20, 0), "#FFFFFF").await;
        onoff(&log, &device, at(2, 6, 0), "#000000").await;
        let sut = service(
            log,
            InMemoryDevices::with([device.clone()]),
            ReportOptions::default(),
        );

        let usage = sut.device_usage(device.id, at(2, 0, 0), at(3, 0, 0)).await.unwrap();

        assert!((usage[&day(2)] - 6.0).abs() < EPS);
    }

    #[tokio::test]
    async fn should_close_or_drop_device_still_on_per_policy() {
        let device = fan("Fan", "0");
        let log = InMemoryEventLog::default();
        onoff(&log, &device, at(5, 10, 0), "50").await;
        let devices = InMemoryDevices::with([device.clone()]);

        let closing = service(log.clone(), devices.clone(), ReportOptions::default());
        let usage = closing.device_usage(device.id, at(5, 0, 0), at(6, 0, 0)).await.unwrap();
        assert!((usage[&day(5)] - 14.0).abs() < EPS);

        let excluding = service(
            log,
            devices,
            ReportOptions {
                open_intervals: OpenIntervalPolicy::Exclude,
                ..ReportOptions::default()
            },
        );
        let usage = excluding.device_usage(device.id, at(5, 0, 0), at(6, 0, 0)).await.unwrap();
        assert!(usage[&day(5)].abs() < EPS);
    }

    #[tokio::test]
    async fn should_bucket_days_in_report_timezone() {
        let device = fan("Fan", "0");
        let log = InMemoryEventLog::default();
        onoff(&log, &device, at(3, 16, 0), "75").await;
        onoff(&log, &device, at(3, 18, 0), "0").await;
        let sut = service(
            log,
            InMemoryDevices::with([device.clone()]),
            ReportOptions {
                timezone: chrono_tz::Asia::Ho_Chi_Minh,
                ..ReportOptions::default()
            },
        );

        let usage = sut.device_usage(device.id, at(2, 17, 0), at(4, 17, 0)).await.unwrap();

        assert!((usage[&day(3)] - 1.0).abs() < EPS);
        assert!((usage[&day(4)] - 1.0).abs() < EPS);
    }

    #[tokio::test]
    async fn should_fail_for_unknown_device() {
        let sut = service(
            InMemoryEventLog::default(),
            InMemoryDevices::default(),
            ReportOptions::default(),
        );

        let result = sut.device_usage(DeviceId::new(), at(1, 0, 0), at(2, 0, 0)).await;

        assert!(matches!(result, Err(HearthError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_sum_room_usage_for_one_category() {
        let room = RoomId::new();
        let a = in_room(fan("A", "0"), room);
        let b = in_room(fan("B", "0"), room);
        let lamp = in_room(light("Lamp", "#000000"), room);
        let log = InMemoryEventLog::default();
        onoff(&log, &a, at(3, 8, 0), "50").await;
        onoff(&log, &a, at(3, 10, 0), "0").await;
        onoff(&log, &b, at(3, 9, 0), "100").await;
        onoff(&log, &b, at(3, 10, 30), "0").await;
        onoff(&log, &lamp, at(3, 8, 0), "#FFFFFF").await;
        onoff(&log, &lamp, at(3, 20, 0), "#000000").await;
        let sut = service(
            log,
            InMemoryDevices::with([a, b, lamp]),
            ReportOptions::default(),
        );

        let usage = sut
            .room_usage(room, DeviceCategory::Fan, at(3, 0, 0), at(4, 0, 0))
            .await
            .unwrap();

        assert!((usage[&day(3)] - 3.5).abs() < EPS);
    }

    #[tokio::test]
    async fn should_price_room_energy_by_category() {
        let room = RoomId::new();
        let f = in_room(fan("Fan", "0"), room);
        let l = in_room(light("Lamp", "#000000"), room);
        let d = in_room(door("Door"), room);
        let log = InMemoryEventLog::default();
        onoff(&log, &f, at(3, 8, 0), "50").await;
        onoff(&log, &f, at(3, 10, 0), "0").await;
        onoff(&log, &l, at(3, 18, 0), "#FFFFFF").await;
        onoff(&log, &l, at(3, 21, 0), "#000000").await;
        onoff(&log, &d, at(3, 7, 0), "1").await;
        onoff(&log, &d, at(3, 19, 0), "0").await;
        let sut = service(log, InMemoryDevices::with([f, l, d]), ReportOptions::default());

        let kwh = sut.room_energy(room, at(3, 0, 0), at(4, 0, 0)).await.unwrap();

        // fan 2h * 3 kWh + light 3h * 2 kWh, door not metered
        assert!((kwh - 12.0).abs() < EPS);
    }

    #[tokio::test]
    async fn should_average_sensor_readings_per_day() {
        let sensor = Sensor::builder()
            .name("Thermometer")
            .kind(SensorKind::Temperature)
            .build()
            .unwrap();
        let log = InMemoryEventLog::default();
        for (ts, value) in [(at(1, 8, 0), "20"), (at(1, 20, 0), "24"), (at(2, 8, 0), "19.5")] {
            log.append(
                Event::builder(sensor.id, EventKind::Data)
                    .value(value)
                    .timestamp(ts)
                    .build(),
            )
            .await
            .unwrap();
        }
        let sut = ReportService::new(
            log,
            InMemoryDevices::default(),
            InMemorySensors::with([sensor.clone()]),
            ReportOptions::default(),
        );

        let averages = sut
            .sensor_daily_average(sensor.id, at(1, 0, 0), at(3, 0, 0))
            .await
            .unwrap();

        assert!((averages[&day(1)] - 22.0).abs() < EPS);
        assert!((averages[&day(2)] - 19.5).abs() < EPS);
    }

    #[tokio::test]
    async fn should_list_recent_events_of_device() {
        let device = fan("Fan", "0");
        let log = InMemoryEventLog::default();
        onoff(&log, &device, at(4, 2, 0), "75").await;
        onoff(&log, &device, at(4, 9, 0), "0").await;
        onoff(&log, &device, at(4, 11, 0), "50").await;
        let sut = service(
            log,
            InMemoryDevices::with([device.clone()]),
            ReportOptions::default(),
        );

        let events = sut
            .recent_events(device.id.into(), Duration::hours(7), at(4, 12, 0))
            .await
            .unwrap();

        let values: Vec<_> = events.iter().map(|e| e.value.as_str()).collect();
        assert_eq!(values, vec!["0", "50"]);
    }

    #[tokio::test]
    async fn should_refuse_recent_events_of_unknown_sensor() {
        let sut = service(
            InMemoryEventLog::default(),
            InMemoryDevices::default(),
            ReportOptions::default(),
        );

        let result = sut
            .recent_events(SensorId::new().into(), Duration::hours(7), at(4, 12, 0))
            .await;

        assert!(matches!(result, Err(HearthError::NotFound(_))));
    }
}
