//! Storage-specific error type wrapping sqlx errors.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use hearth_domain::error::HearthError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StorageError> for HearthError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}

/// Wrap a column decoding failure the way sqlx reports its own.
pub(crate) fn decode<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

/// Decode every row on its own. A row that fails to decode is logged and
/// left out so one bad record never hides the rest of a listing.
pub(crate) fn decode_each<W>(rows: &[SqliteRow], table: &'static str) -> Vec<W>
where
    W: for<'r> FromRow<'r, SqliteRow>,
{
    rows.iter()
        .filter_map(|row| match W::from_row(row) {
            Ok(item) => Some(item),
            Err(err) => {
                let id = row.try_get::<uuid::Uuid, _>("id").ok();
                tracing::warn!(table, ?id, error = %err, "skipping undecodable row");
                None
            }
        })
        .collect()
}
