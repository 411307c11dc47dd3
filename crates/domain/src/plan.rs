//! Plan: the active threshold rule for one sensor.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::SensorId;
use crate::time::Timestamp;

/// Optional lower/upper bounds a sensor's readings should stay within.
///
/// At most one plan is active per sensor; installing a new one replaces the
/// previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub sensor_id: SensorId,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub created_at: Timestamp,
}

impl Plan {
    /// Create a plan stamped with the current time.
    #[must_use]
    pub fn new(sensor_id: SensorId, lower: Option<f64>, upper: Option<f64>) -> Self {
        Self {
            sensor_id,
            lower,
            upper,
            created_at: crate::time::now(),
        }
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::PlanWithoutBounds`] when neither bound is set
    /// - [`ValidationError::InvertedBounds`] when `lower > upper`
    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.lower, self.upper) {
            (None, None) => Err(ValidationError::PlanWithoutBounds),
            (Some(lower), Some(upper)) if lower > upper => {
                Err(ValidationError::InvertedBounds { lower, upper })
            }
            _ => Ok(()),
        }
    }
}
