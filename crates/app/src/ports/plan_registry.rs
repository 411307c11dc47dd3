//! Plan registry port: the active threshold plan per sensor.

use std::future::Future;

use hearth_domain::error::HearthError;
use hearth_domain::id::SensorId;
use hearth_domain::plan::Plan;

/// Storage for at most one active [`Plan`] per sensor.
pub trait PlanRegistry: Send + Sync {
    /// The sensor's active plan, if any.
    fn get_active(
        &self,
        sensor_id: SensorId,
    ) -> impl Future<Output = Result<Option<Plan>, HearthError>> + Send;

    /// Install `plan` as the sensor's active plan.
    ///
    /// Must be atomic: a concurrent reader sees either the previous plan or
    /// the new one, never no plan.
    fn replace(&self, plan: Plan) -> impl Future<Output = Result<Plan, HearthError>> + Send;

    /// Drop the sensor's plan. Removing a missing plan is not an error.
    fn remove(&self, sensor_id: SensorId) -> impl Future<Output = Result<(), HearthError>> + Send;
}
