//! # hearth-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the store port traits defined in `hearth-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `hearth-app` (for port traits) and `hearth-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod device_repo;
mod error;
mod event_log;
mod notification_store;
mod passcode_store;
mod plan_registry;
mod pool;
mod schedule_store;
mod sensor_repo;

pub use device_repo::SqliteDeviceRepository;
pub use error::StorageError;
pub use event_log::SqliteEventLog;
pub use notification_store::SqliteNotificationStore;
pub use passcode_store::SqlitePasscodeStore;
pub use plan_registry::SqlitePlanRegistry;
pub use pool::{Config, Database};
pub use schedule_store::SqliteScheduleStore;
pub use sensor_repo::SqliteSensorRepository;
