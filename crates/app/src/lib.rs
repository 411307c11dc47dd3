//! # hearth-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `EventLog`: append & range-query events
//!   - `PlanRegistry`: the active plan per sensor
//!   - `ScheduleStore`: CRUD for schedules
//!   - `DeviceRepository` / `SensorRepository`: descriptor lookups
//!   - `ActuationGateway` / `PasscodeStore`: changing devices
//!   - `NotificationDispatcher`: pushing messages to owners
//! - Define **driving/inbound** use-cases:
//!   - `ThresholdEvaluator`: react to readings that breach a plan
//!   - `ScheduleEngine`: fire due schedules, driven by `ScheduleRunner`
//!   - `IngestionService`, `ReportService`, `PlanService`, `ScheduleService`
//! - Provide **in-process infrastructure** (the actuation dispatcher) that
//!   doesn't need IO of its own
//!
//! ## Dependency rule
//! Depends on `hearth-domain` only (plus `tokio` for tasks and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod dispatcher;
pub mod ports;
pub mod schedule_engine;
pub mod services;
pub mod threshold;

#[cfg(test)]
mod testing;
