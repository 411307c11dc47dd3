//! Threshold checks of sensor readings against a [`Plan`].
//!
//! The lower and upper checks are independent and strict: a reading equal
//! to a bound never breaches.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::plan::Plan;
use crate::sensor::SensorKind;

/// Which bound was crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreachKind {
    Low,
    High,
}

/// Outcome of a single failed bound check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreachVerdict {
    pub kind: BreachKind,
    pub value: f64,
    pub bound: f64,
    pub message: String,
}

/// Parse a raw reading and round it to one decimal place.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidReading`] when `raw` is not a finite
/// number.
pub fn parse_reading(raw: &str) -> Result<f64, ValidationError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidReading(raw.to_string()))?;
    if !value.is_finite() {
        return Err(ValidationError::InvalidReading(raw.to_string()));
    }
    Ok((value * 10.0).round() / 10.0)
}

/// Compare `reading` against both bounds of `plan`.
///
/// Returns zero, one or (with inverted bounds) two verdicts, low first.
#[must_use]
pub fn check(plan: &Plan, reading: f64) -> Vec<BreachVerdict> {
    let mut verdicts = Vec::new();
    if let Some(lower) = plan.lower
        && reading < lower
    {
        verdicts.push(BreachVerdict {
            kind: BreachKind::Low,
            value: reading,
            bound: lower,
            message: format!("{reading} is below the lower bound {lower}"),
        });
    }
    if let Some(upper) = plan.upper
        && reading > upper
    {
        verdicts.push(BreachVerdict {
            kind: BreachKind::High,
            value: reading,
            bound: upper,
            message: format!("{reading} exceeds the upper bound {upper}"),
        });
    }
    verdicts
}

/// Push notification text for a breach on a sensor of `kind`.
#[must_use]
pub fn notification_message(kind: SensorKind, breach: BreachKind) -> &'static str {
    match (kind, breach) {
        (SensorKind::Brightness, BreachKind::Low) => {
            "It's getting dark in here, turning the lights on"
        }
        (SensorKind::Brightness, BreachKind::High) => "It's way too bright in here",
        (SensorKind::Humidity, BreachKind::Low) => "The air is very dry",
        (SensorKind::Humidity, BreachKind::High) => "It's very humid, mind the mould",
        (SensorKind::Temperature, BreachKind::Low) => "It's getting cold",
        (SensorKind::Temperature, BreachKind::High) => "It's getting hot, turning the fans on",
        (SensorKind::Other, BreachKind::Low) => "A reading dropped below its lower bound",
        (SensorKind::Other, BreachKind::High) => "A reading exceeded its upper bound",
    }
}
