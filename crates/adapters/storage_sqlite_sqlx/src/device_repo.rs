//! `SQLite` implementation of [`DeviceRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use hearth_app::ports::DeviceRepository;
use hearth_domain::device::{Device, DeviceCategory};
use hearth_domain::error::HearthError;
use hearth_domain::id::{DeviceId, RoomId, UserId};

use crate::error::{StorageError, decode_each};

/// Wrapper for converting database rows into domain [`Device`].
struct Wrapper(Device);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Device> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: uuid::Uuid = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let feed_key: String = row.try_get("feed_key")?;
        let category: String = row.try_get("category")?;
        let room_id: uuid::Uuid = row.try_get("room_id")?;
        let owner_id: uuid::Uuid = row.try_get("owner_id")?;
        let value: String = row.try_get("value")?;

        let Ok(category) = category.parse::<DeviceCategory>();

        Ok(Self(Device {
            id: DeviceId::from_uuid(id),
            name,
            feed_key,
            category,
            room_id: RoomId::from_uuid(room_id),
            owner: UserId::from_uuid(owner_id),
            value,
        }))
    }
}

const UPSERT: &str = r"
    INSERT INTO devices (id, name, feed_key, category, room_id, owner_id, value)
    VALUES (?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT (feed_key) DO UPDATE SET
        name = excluded.name,
        category = excluded.category,
        room_id = excluded.room_id,
        owner_id = excluded.owner_id
";
const SELECT_BY_ID: &str = "SELECT * FROM devices WHERE id = ?";
const SELECT_BY_FEED_KEY: &str = "SELECT * FROM devices WHERE feed_key = ?";
const SELECT_BY_ROOM: &str = "SELECT * FROM devices WHERE room_id = ? ORDER BY name";
const SELECT_ALL: &str = "SELECT * FROM devices ORDER BY name";
const UPDATE_VALUE: &str = "UPDATE devices SET value = ? WHERE id = ?";

/// `SQLite`-backed device repository.
#[derive(Clone)]
pub struct SqliteDeviceRepository {
    pool: SqlitePool,
}

impl SqliteDeviceRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register a device, or refresh the descriptor already stored under
    /// the same feed key.
    ///
    /// An existing device keeps its id and last reported value.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the write fails.
    pub async fn upsert(&self, device: Device) -> Result<Device, HearthError> {
        sqlx::query(UPSERT)
            .bind(device.id.as_uuid())
            .bind(&device.name)
            .bind(&device.feed_key)
            .bind(device.category.as_str())
            .bind(device.room_id.as_uuid())
            .bind(device.owner.as_uuid())
            .bind(&device.value)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        let stored: Wrapper = sqlx::query_as(SELECT_BY_FEED_KEY)
            .bind(&device.feed_key)
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(stored.0)
    }
}

impl DeviceRepository for SqliteDeviceRepository {
    fn get(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, HearthError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
                .bind(id.as_uuid())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn list_in_room(
        &self,
        room_id: RoomId,
    ) -> impl Future<Output = Result<Vec<Device>, HearthError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows = sqlx::query(SELECT_BY_ROOM)
                .bind(room_id.as_uuid())
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(decode_each::<Wrapper>(&rows, "devices")
                .into_iter()
                .map(|w| w.0)
                .collect())
        }
    }

    fn list_all(&self) -> impl Future<Output = Result<Vec<Device>, HearthError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows = sqlx::query(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(decode_each::<Wrapper>(&rows, "devices")
                .into_iter()
                .map(|w| w.0)
                .collect())
        }
    }

    fn set_value(
        &self,
        id: DeviceId,
        value: &str,
    ) -> impl Future<Output = Result<(), HearthError>> + Send {
        let pool = self.pool.clone();
        let value = value.to_string();
        async move {
            sqlx::query(UPDATE_VALUE)
                .bind(value)
                .bind(id.as_uuid())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(())
        }
    }
}
