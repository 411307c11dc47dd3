//! `SQLite` implementation of [`PlanRegistry`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use hearth_app::ports::PlanRegistry;
use hearth_domain::error::HearthError;
use hearth_domain::id::SensorId;
use hearth_domain::plan::Plan;

use crate::error::{StorageError, decode};

struct Wrapper(Plan);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let sensor_id: uuid::Uuid = row.try_get("sensor_id")?;
        let lower: Option<f64> = row.try_get("lower")?;
        let upper: Option<f64> = row.try_get("upper")?;
        let created_at: String = row.try_get("created_at")?;

        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
            .map_err(decode)?
            .to_utc();

        Ok(Self(Plan {
            sensor_id: SensorId::from_uuid(sensor_id),
            lower,
            upper,
            created_at,
        }))
    }
}

// A single upsert statement: readers see the old plan or the new one.
const REPLACE: &str = r"
    INSERT INTO plans (sensor_id, lower, upper, created_at)
    VALUES (?, ?, ?, ?)
    ON CONFLICT (sensor_id) DO UPDATE SET
        lower = excluded.lower,
        upper = excluded.upper,
        created_at = excluded.created_at
";
const SELECT_BY_SENSOR: &str = "SELECT * FROM plans WHERE sensor_id = ?";
const DELETE_BY_SENSOR: &str = "DELETE FROM plans WHERE sensor_id = ?";

/// `SQLite`-backed plan registry.
#[derive(Clone)]
pub struct SqlitePlanRegistry {
    pool: SqlitePool,
}

impl SqlitePlanRegistry {
    /// Create a new registry using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl PlanRegistry for SqlitePlanRegistry {
    async fn get_active(&self, sensor_id: SensorId) -> Result<Option<Plan>, HearthError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_SENSOR)
            .bind(sensor_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }

    async fn replace(&self, plan: Plan) -> Result<Plan, HearthError> {
        sqlx::query(REPLACE)
            .bind(plan.sensor_id.as_uuid())
            .bind(plan.lower)
            .bind(plan.upper)
            .bind(plan.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(plan)
    }

    async fn remove(&self, sensor_id: SensorId) -> Result<(), HearthError> {
        sqlx::query(DELETE_BY_SENSOR)
            .bind(sensor_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;

    async fn setup() -> SqlitePlanRegistry {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqlitePlanRegistry::new(db.pool().clone())
    }

    #[tokio::test]
    async fn should_return_none_without_plan() {
        let registry = setup().await;
        assert!(registry.get_active(SensorId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_replace_plan_in_place() {
        let registry = setup().await;
        let sensor = SensorId::new();

        registry
            .replace(Plan::new(sensor, Some(18.0), Some(26.0)))
            .await
            .unwrap();
        registry
            .replace(Plan::new(sensor, None, Some(30.5)))
            .await
            .unwrap();

        let plan = registry.get_active(sensor).await.unwrap().unwrap();
        assert_eq!(plan.lower, None);
        assert_eq!(plan.upper, Some(30.5));
    }

    #[tokio::test]
    async fn should_remove_plan_and_tolerate_missing_one() {
        let registry = setup().await;
        let sensor = SensorId::new();
        registry
            .replace(Plan::new(sensor, Some(1.0), None))
            .await
            .unwrap();

        registry.remove(sensor).await.unwrap();
        registry.remove(sensor).await.unwrap();

        assert!(registry.get_active(sensor).await.unwrap().is_none());
    }
}
