//! `SQLite` implementation of [`SensorRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use hearth_app::ports::SensorRepository;
use hearth_domain::error::HearthError;
use hearth_domain::id::{RoomId, SensorId, UserId};
use hearth_domain::sensor::{Sensor, SensorKind};

use crate::error::{StorageError, decode_each};

struct Wrapper(Sensor);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: uuid::Uuid = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let feed_key: String = row.try_get("feed_key")?;
        let kind: String = row.try_get("kind")?;
        let room_id: uuid::Uuid = row.try_get("room_id")?;
        let owner_id: uuid::Uuid = row.try_get("owner_id")?;

        let Ok(kind) = kind.parse::<SensorKind>();

        Ok(Self(Sensor {
            id: SensorId::from_uuid(id),
            name,
            feed_key,
            kind,
            room_id: RoomId::from_uuid(room_id),
            owner: UserId::from_uuid(owner_id),
        }))
    }
}

const UPSERT: &str = r"
    INSERT INTO sensors (id, name, feed_key, kind, room_id, owner_id)
    VALUES (?, ?, ?, ?, ?, ?)
    ON CONFLICT (feed_key) DO UPDATE SET
        name = excluded.name,
        kind = excluded.kind,
        room_id = excluded.room_id,
        owner_id = excluded.owner_id
";
const SELECT_BY_ID: &str = "SELECT * FROM sensors WHERE id = ?";
const SELECT_BY_FEED_KEY: &str = "SELECT * FROM sensors WHERE feed_key = ?";
const SELECT_ALL: &str = "SELECT * FROM sensors ORDER BY name";

/// `SQLite`-backed sensor repository.
#[derive(Clone)]
pub struct SqliteSensorRepository {
    pool: SqlitePool,
}

impl SqliteSensorRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register a sensor, or refresh the one stored under the same feed key
    /// (keeping its id).
    ///
    /// # Errors
    ///
    /// Returns a storage error if the write fails.
    pub async fn upsert(&self, sensor: Sensor) -> Result<Sensor, HearthError> {
        sqlx::query(UPSERT)
            .bind(sensor.id.as_uuid())
            .bind(&sensor.name)
            .bind(&sensor.feed_key)
            .bind(sensor.kind.as_str())
            .bind(sensor.room_id.as_uuid())
            .bind(sensor.owner.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        let stored: Wrapper = sqlx::query_as(SELECT_BY_FEED_KEY)
            .bind(&sensor.feed_key)
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(stored.0)
    }
}

impl SensorRepository for SqliteSensorRepository {
    async fn get(&self, id: SensorId) -> Result<Option<Sensor>, HearthError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }

    async fn list_all(&self) -> Result<Vec<Sensor>, HearthError> {
        let rows = sqlx::query(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(decode_each::<Wrapper>(&rows, "sensors")
            .into_iter()
            .map(|w| w.0)
            .collect())
    }
}
