//! `SQLite` implementation of [`EventLog`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use hearth_app::ports::EventLog;
use hearth_domain::error::HearthError;
use hearth_domain::event::{Event, EventKind, Subject};
use hearth_domain::id::{DeviceId, EventId, SensorId, UserId};
use hearth_domain::time::Timestamp;

use crate::error::{StorageError, decode, decode_each};

#[derive(Debug, thiserror::Error)]
#[error("unknown {column} {value:?}")]
struct UnknownValue {
    column: &'static str,
    value: String,
}

struct Wrapper(Event);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: uuid::Uuid = row.try_get("id")?;
        let subject_kind: String = row.try_get("subject_kind")?;
        let subject_id: uuid::Uuid = row.try_get("subject_id")?;
        let kind: String = row.try_get("kind")?;
        let value: String = row.try_get("value")?;
        let message: String = row.try_get("message")?;
        let actor_id: uuid::Uuid = row.try_get("actor_id")?;
        let timestamp_us: i64 = row.try_get("timestamp_us")?;

        let subject = match subject_kind.as_str() {
            "device" => Subject::Device(DeviceId::from_uuid(subject_id)),
            "sensor" => Subject::Sensor(SensorId::from_uuid(subject_id)),
            _ => {
                return Err(decode(UnknownValue {
                    column: "subject_kind",
                    value: subject_kind,
                }));
            }
        };
        let kind: EventKind = kind.parse().map_err(|value| {
            decode(UnknownValue {
                column: "kind",
                value,
            })
        })?;
        let timestamp = from_micros(timestamp_us)?;

        Ok(Self(Event {
            id: EventId::from_uuid(id),
            subject,
            kind,
            value,
            message,
            actor: UserId::from_uuid(actor_id),
            timestamp,
        }))
    }
}

fn from_micros(micros: i64) -> Result<Timestamp, sqlx::Error> {
    chrono::DateTime::from_timestamp_micros(micros).ok_or_else(|| {
        decode(UnknownValue {
            column: "timestamp_us",
            value: micros.to_string(),
        })
    })
}

const INSERT: &str = r"
    INSERT INTO events (id, subject_kind, subject_id, kind, value, message, actor_id, timestamp_us)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
";

const SELECT_RANGE: &str = r"
    SELECT * FROM events
    WHERE subject_kind = ? AND subject_id = ? AND timestamp_us >= ? AND timestamp_us < ?
    ORDER BY timestamp_us ASC, seq ASC
";

/// `SQLite`-backed event log.
///
/// Timestamps are stored as microseconds since the Unix epoch.
#[derive(Clone)]
pub struct SqliteEventLog {
    pool: SqlitePool,
}

impl SqliteEventLog {
    /// Create a new event log using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl EventLog for SqliteEventLog {
    async fn append(&self, event: Event) -> Result<Event, HearthError> {
        sqlx::query(INSERT)
            .bind(event.id.as_uuid())
            .bind(event.subject.kind())
            .bind(event.subject.as_uuid())
            .bind(event.kind.as_str())
            .bind(&event.value)
            .bind(&event.message)
            .bind(event.actor.as_uuid())
            .bind(event.timestamp.timestamp_micros())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(event)
    }

    async fn query(
        &self,
        subject: Subject,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<Event>, HearthError> {
        let rows = sqlx::query(SELECT_RANGE)
            .bind(subject.kind())
            .bind(subject.as_uuid())
            .bind(start.timestamp_micros())
            .bind(end.timestamp_micros())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(decode_each::<Wrapper>(&rows, "events")
            .into_iter()
            .map(|w| w.0)
            .collect())
    }
}
