//! # hearth-domain
//!
//! Pure domain model for the hearth device/sensor event-log engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Devices** and **Sensors** and the per-category rules that apply to them
//! - Define **Events** (the append-only log record) and **Plans** (threshold rules)
//! - Define **Schedules** and their due-ness check
//! - Describe the **Notifications** sent to owners
//! - Reconstruct ON intervals and aggregate them into per-day usage
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod actuation;
pub mod device;
pub mod event;
pub mod notification;
pub mod plan;
pub mod policy;
pub mod schedule;
pub mod sensor;
pub mod threshold;
pub mod usage;
