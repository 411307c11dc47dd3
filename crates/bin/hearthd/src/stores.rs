//! Storage wiring and inventory seeding.

use hearth_adapter_storage_sqlite_sqlx::{
    Config as DatabaseConfig, SqliteDeviceRepository, SqliteEventLog, SqliteNotificationStore,
    SqlitePasscodeStore, SqlitePlanRegistry, SqliteScheduleStore, SqliteSensorRepository,
};
use hearth_app::ports::EventLog;
use hearth_app::services::plan_service::PlanService;
use hearth_app::services::report_service::{ReportOptions, ReportService};
use hearth_app::services::schedule_service::ScheduleService;
use hearth_domain::device::Device;
use hearth_domain::error::HearthError;
use hearth_domain::event::{Event, EventKind, Subject};
use hearth_domain::id::UserId;
use hearth_domain::sensor::Sensor;

use crate::config::{Config, ConfigError};

/// Every `SQLite`-backed port, sharing one pool.
#[derive(Clone)]
pub struct Stores {
    pub log: SqliteEventLog,
    pub devices: SqliteDeviceRepository,
    pub sensors: SqliteSensorRepository,
    pub plans: SqlitePlanRegistry,
    pub schedules: SqliteScheduleStore,
    pub passcodes: SqlitePasscodeStore,
    pub notifications: SqliteNotificationStore,
}

/// The devices and sensors registered at startup, as stored.
#[derive(Debug, Default)]
pub struct Inventory {
    pub devices: Vec<Device>,
    pub sensors: Vec<Sensor>,
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to register inventory")]
    Storage(#[from] HearthError),
}

impl Stores {
    /// Open the database and run migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub async fn open(database_url: &str) -> Result<Self, HearthError> {
        let db = DatabaseConfig {
            database_url: database_url.to_string(),
        }
        .build()
        .await?;
        let pool = db.pool().clone();

        Ok(Self {
            log: SqliteEventLog::new(pool.clone()),
            devices: SqliteDeviceRepository::new(pool.clone()),
            sensors: SqliteSensorRepository::new(pool.clone()),
            plans: SqlitePlanRegistry::new(pool.clone()),
            schedules: SqliteScheduleStore::new(pool.clone()),
            passcodes: SqlitePasscodeStore::new(pool.clone()),
            notifications: SqliteNotificationStore::new(pool),
        })
    }

    /// Register the configured devices, sensors and notification targets.
    ///
    /// Entries already stored under the same feed keep their id and last
    /// value. A subject stored for the first time gets a `creation` event.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid entry or a failed write.
    pub async fn seed(&self, config: &Config) -> Result<Inventory, SeedError> {
        let mut inventory = Inventory::default();
        for entry in &config.devices {
            let candidate = entry.to_device()?;
            let device = self.devices.upsert(candidate.clone()).await?;
            if device.id == candidate.id {
                self.record_creation(device.id.into(), &device.name, device.owner).await?;
            }
            tracing::debug!(id = %device.id, feed = %device.feed_key, "device registered");
            inventory.devices.push(device);
        }
        for entry in &config.sensors {
            let candidate = entry.to_sensor()?;
            let sensor = self.sensors.upsert(candidate.clone()).await?;
            if sensor.id == candidate.id {
                self.record_creation(sensor.id.into(), &sensor.name, sensor.owner).await?;
            }
            tracing::debug!(id = %sensor.id, feed = %sensor.feed_key, "sensor registered");
            inventory.sensors.push(sensor);
        }
        for entry in &config.notify {
            self.notifications.register(entry.user, &entry.target).await?;
        }
        tracing::info!(
            devices = inventory.devices.len(),
            sensors = inventory.sensors.len(),
            "inventory registered"
        );
        Ok(inventory)
    }

    async fn record_creation(
        &self,
        subject: Subject,
        name: &str,
        owner: UserId,
    ) -> Result<(), HearthError> {
        let event = Event::builder(subject, EventKind::Creation)
            .value("0")
            .message(format!("[{name}] got added"))
            .actor(owner)
            .build();
        self.log.append(event).await?;
        Ok(())
    }

    pub fn plan_service(&self) -> PlanService<SqlitePlanRegistry, SqliteSensorRepository> {
        PlanService::new(self.plans.clone(), self.sensors.clone())
    }

    pub fn schedule_service(
        &self,
    ) -> ScheduleService<SqliteScheduleStore, SqliteDeviceRepository> {
        ScheduleService::new(self.schedules.clone(), self.devices.clone())
    }

    pub fn report_service(
        &self,
        options: ReportOptions,
    ) -> ReportService<SqliteEventLog, SqliteDeviceRepository, SqliteSensorRepository> {
        ReportService::new(
            self.log.clone(),
            self.devices.clone(),
            self.sensors.clone(),
            options,
        )
    }
}
