//! Application services: use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod ingestion_service;
pub mod plan_service;
pub mod report_service;
pub mod schedule_service;
