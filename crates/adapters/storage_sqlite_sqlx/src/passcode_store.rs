//! `SQLite` implementation of [`PasscodeStore`].

use sqlx::SqlitePool;

use hearth_app::ports::PasscodeStore;
use hearth_domain::error::HearthError;
use hearth_domain::id::DeviceId;

use crate::error::StorageError;

const UPSERT: &str = r"
    INSERT INTO door_passcodes (device_id, passcode, updated_at)
    VALUES (?, ?, ?)
    ON CONFLICT (device_id) DO UPDATE SET
        passcode = excluded.passcode,
        updated_at = excluded.updated_at
";
const SELECT_BY_DEVICE: &str = "SELECT passcode FROM door_passcodes WHERE device_id = ?";

/// `SQLite`-backed door passcode store.
#[derive(Clone)]
pub struct SqlitePasscodeStore {
    pool: SqlitePool,
}

impl SqlitePasscodeStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Current passcode of a door, if one was ever set.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub async fn get(&self, device_id: DeviceId) -> Result<Option<String>, HearthError> {
        let row: Option<(String,)> = sqlx::query_as(SELECT_BY_DEVICE)
            .bind(device_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|(passcode,)| passcode))
    }
}

impl PasscodeStore for SqlitePasscodeStore {
    async fn set(&self, device_id: DeviceId, passcode: &str) -> Result<(), HearthError> {
        sqlx::query(UPSERT)
            .bind(device_id.as_uuid())
            .bind(passcode)
            .bind(hearth_domain::time::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }
}
