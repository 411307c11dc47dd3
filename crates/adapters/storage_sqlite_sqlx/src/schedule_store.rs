//! `SQLite` implementation of [`ScheduleStore`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use hearth_app::ports::ScheduleStore;
use hearth_domain::error::HearthError;
use hearth_domain::id::{DeviceId, ScheduleId, UserId};
use hearth_domain::schedule::{Schedule, WeekdaySet, parse_time_of_day};

use crate::error::{StorageError, decode, decode_each};

struct Wrapper(Schedule);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Schedule> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: uuid::Uuid = row.try_get("id")?;
        let device_id: uuid::Uuid = row.try_get("device_id")?;
        let user_id: uuid::Uuid = row.try_get("user_id")?;
        let action_value: String = row.try_get("action_value")?;
        let time_of_day: String = row.try_get("time_of_day")?;
        let repeat_days: String = row.try_get("repeat_days")?;
        let timezone: String = row.try_get("timezone")?;
        let active: bool = row.try_get("active")?;

        let time_of_day = parse_time_of_day(&time_of_day).map_err(decode)?;
        let repeat_days: WeekdaySet = repeat_days.parse().map_err(decode)?;

        Ok(Self(Schedule {
            id: ScheduleId::from_uuid(id),
            device_id: DeviceId::from_uuid(device_id),
            user_id: UserId::from_uuid(user_id),
            action_value,
            time_of_day,
            repeat_days,
            timezone,
            active,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO schedules (id, device_id, user_id, action_value, time_of_day, repeat_days, timezone, active)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
";
const SELECT_ACTIVE: &str = "SELECT * FROM schedules WHERE active = 1";
const SELECT_BY_ID: &str = "SELECT * FROM schedules WHERE id = ?";
const SELECT_BY_DEVICE: &str =
    "SELECT * FROM schedules WHERE device_id = ? ORDER BY time_of_day";
const UPDATE_ACTIVE: &str = "UPDATE schedules SET active = ? WHERE id = ?";
const DELETE_BY_ID: &str = "DELETE FROM schedules WHERE id = ?";

/// `SQLite`-backed schedule store.
#[derive(Clone)]
pub struct SqliteScheduleStore {
    pool: SqlitePool,
}

impl SqliteScheduleStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ScheduleStore for SqliteScheduleStore {
    async fn list_active(&self) -> Result<Vec<Schedule>, HearthError> {
        let rows = sqlx::query(SELECT_ACTIVE)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(decode_each::<Wrapper>(&rows, "schedules")
            .into_iter()
            .map(|w| w.0)
            .collect())
    }

    async fn create(&self, schedule: Schedule) -> Result<Schedule, HearthError> {
        sqlx::query(INSERT)
            .bind(schedule.id.as_uuid())
            .bind(schedule.device_id.as_uuid())
            .bind(schedule.user_id.as_uuid())
            .bind(&schedule.action_value)
            .bind(schedule.time_of_day.format("%H:%M:%S").to_string())
            .bind(schedule.repeat_days.to_string())
            .bind(&schedule.timezone)
            .bind(schedule.active)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(schedule)
    }

    async fn get(&self, id: ScheduleId) -> Result<Option<Schedule>, HearthError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn set_active(
        &self,
        id: ScheduleId,
        active: bool,
    ) -> Result<Option<Schedule>, HearthError> {
        let result = sqlx::query(UPDATE_ACTIVE)
            .bind(active)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    async fn remove(&self, id: ScheduleId) -> Result<(), HearthError> {
        sqlx::query(DELETE_BY_ID)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }

    async fn list_for_device(&self, device_id: DeviceId) -> Result<Vec<Schedule>, HearthError> {
        let rows = sqlx::query(SELECT_BY_DEVICE)
            .bind(device_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(decode_each::<Wrapper>(&rows, "schedules")
            .into_iter()
            .map(|w| w.0)
            .collect())
    }
}
