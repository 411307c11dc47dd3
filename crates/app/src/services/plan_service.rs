//! Plan service: use-cases for managing threshold plans.

use hearth_domain::error::{HearthError, NotFoundError};
use hearth_domain::id::SensorId;
use hearth_domain::plan::Plan;

use crate::ports::{PlanRegistry, SensorRepository};

/// Application service for installing and removing sensor plans.
pub struct PlanService<P, S> {
    plans: P,
    sensors: S,
}

impl<P: PlanRegistry, S: SensorRepository> PlanService<P, S> {
    /// Create a new service backed by the given registry.
    pub fn new(plans: P, sensors: S) -> Self {
        Self { plans, sensors }
    }

    /// Install `plan` as its sensor's active plan, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::Validation`] if the bounds are invalid,
    /// [`HearthError::NotFound`] for an unknown sensor, or a storage error.
    #[tracing::instrument(skip(self, plan), fields(sensor = %plan.sensor_id))]
    pub async fn set_plan(&self, plan: Plan) -> Result<Plan, HearthError> {
        plan.validate()?;
        if self.sensors.get(plan.sensor_id).await?.is_none() {
            return Err(NotFoundError {
                entity: "Sensor",
                id: plan.sensor_id.to_string(),
            }
            .into());
        }
        let plan = self.plans.replace(plan).await?;
        tracing::info!(lower = ?plan.lower, upper = ?plan.upper, "plan installed");
        Ok(plan)
    }

    /// The sensor's active plan.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::NotFound`] when the sensor has no plan, or a
    /// storage error.
    pub async fn get_plan(&self, sensor_id: SensorId) -> Result<Plan, HearthError> {
        self.plans.get_active(sensor_id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Plan",
                id: sensor_id.to_string(),
            }
            .into()
        })
    }

    /// Drop the sensor's plan, if any.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the registry.
    #[tracing::instrument(skip(self))]
    pub async fn remove_plan(&self, sensor_id: SensorId) -> Result<(), HearthError> {
        self.plans.remove(sensor_id).await
    }
}
