//! `SQLite` implementation of [`NotificationDispatcher`].
//!
//! Sending a notification records it; push delivery to the target is left to
//! whatever consumes the `notifications` table.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use hearth_app::ports::NotificationDispatcher;
use hearth_domain::error::HearthError;
use hearth_domain::id::UserId;
use hearth_domain::notification::Notification;
use hearth_domain::time::now;

use crate::error::{StorageError, decode, decode_each};

#[derive(Debug, thiserror::Error)]
#[error("sent_at_us {0} is out of range")]
struct OutOfRange(i64);

struct Wrapper(Notification);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let user_id: uuid::Uuid = row.try_get("user_id")?;
        let target: String = row.try_get("target")?;
        let message: String = row.try_get("message")?;
        let sent_at_us: i64 = row.try_get("sent_at_us")?;

        let sent_at = chrono::DateTime::from_timestamp_micros(sent_at_us)
            .ok_or_else(|| decode(OutOfRange(sent_at_us)))?;

        Ok(Self(Notification {
            user: UserId::from_uuid(user_id),
            target,
            message,
            sent_at,
        }))
    }
}

const UPSERT_TARGET: &str = r"
    INSERT INTO notify_targets (user_id, target, updated_at)
    VALUES (?, ?, ?)
    ON CONFLICT (user_id) DO UPDATE SET
        target = excluded.target,
        updated_at = excluded.updated_at
";
const SELECT_TARGET: &str = "SELECT target FROM notify_targets WHERE user_id = ?";
const INSERT: &str = r"
    INSERT INTO notifications (user_id, target, message, sent_at_us)
    VALUES (?, ?, ?, ?)
";
const SELECT_LATEST: &str = r"
    SELECT * FROM notifications
    WHERE user_id = ?
    ORDER BY seq DESC
    LIMIT ?
";

/// `SQLite`-backed notification targets and sent-message history.
#[derive(Clone)]
pub struct SqliteNotificationStore {
    pool: SqlitePool,
}

impl SqliteNotificationStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register (or replace) the target a user's notifications go to.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the write fails.
    pub async fn register(&self, user: UserId, target: &str) -> Result<(), HearthError> {
        sqlx::query(UPSERT_TARGET)
            .bind(user.as_uuid())
            .bind(target)
            .bind(now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }

    /// The `limit` most recent notifications of a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub async fn list_for_user(
        &self,
        user: UserId,
        limit: u32,
    ) -> Result<Vec<Notification>, HearthError> {
        let rows = sqlx::query(SELECT_LATEST)
            .bind(user.as_uuid())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(decode_each::<Wrapper>(&rows, "notifications")
            .into_iter()
            .map(|w| w.0)
            .collect())
    }
}

impl NotificationDispatcher for SqliteNotificationStore {
    async fn registered_target(&self, user: UserId) -> Result<Option<String>, HearthError> {
        let row: Option<(String,)> = sqlx::query_as(SELECT_TARGET)
            .bind(user.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|(target,)| target))
    }

    async fn send(&self, user: UserId, target: &str, message: &str) -> Result<(), HearthError> {
        sqlx::query(INSERT)
            .bind(user.as_uuid())
            .bind(target)
            .bind(message)
            .bind(now().timestamp_micros())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        tracing::info!(%user, target, message, "notification sent");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;

    async fn setup() -> SqliteNotificationStore {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqliteNotificationStore::new(db.pool().clone())
    }

    #[tokio::test]
    async fn should_resolve_registered_target_only() {
        let store = setup().await;
        let alice = UserId::new();

        store.register(alice, "token-a").await.unwrap();
        store.register(alice, "token-b").await.unwrap();

        assert_eq!(
            store.registered_target(alice).await.unwrap().as_deref(),
            Some("token-b")
        );
        assert!(
            store
                .registered_target(UserId::new())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn should_list_latest_notifications_of_user_first() {
        let store = setup().await;
        let user = UserId::new();
        store.send(user, "token", "It's getting cold").await.unwrap();
        store.send(user, "token", "The air is very dry").await.unwrap();
        store.send(user, "token", "It's getting hot").await.unwrap();
        store.send(UserId::new(), "other", "Not yours").await.unwrap();

        let latest = store.list_for_user(user, 2).await.unwrap();

        let messages: Vec<_> = latest.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["It's getting hot", "The air is very dry"]);
        assert!(latest.iter().all(|n| n.user == user && n.target == "token"));
    }
}
