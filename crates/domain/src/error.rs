//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`HearthError`]
//! via `#[from]`. Adapters box their storage errors into
//! [`HearthError::Storage`].

/// Top-level error for every port and use-case.
#[derive(Debug, thiserror::Error)]
pub enum HearthError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("dispatch error")]
    Dispatch(#[from] DispatchError),
}

/// A payload or domain object failed an invariant check.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("reading {0:?} is not a number")]
    InvalidReading(String),

    #[error("plan must define at least one bound")]
    PlanWithoutBounds,

    #[error("lower bound {lower} is above upper bound {upper}")]
    InvertedBounds { lower: f64, upper: f64 },

    #[error("unknown weekday {0:?}")]
    UnknownWeekday(String),

    #[error("repeat days must not be empty")]
    NoRepeatDays,

    #[error("unknown timezone {0:?}")]
    UnknownTimezone(String),

    #[error("time of day {0:?} is not HH:MM or HH:MM:SS")]
    InvalidTimeOfDay(String),
}

/// A lookup by identifier found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// An outbound actuation or notification call failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("dispatch timed out after {0} ms")]
    Timeout(u64),

    #[error("endpoint unreachable: {0}")]
    Unreachable(String),
}
