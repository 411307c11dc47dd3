//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod actuation;
pub mod event_log;
pub mod notification;
pub mod plan_registry;
pub mod repository;
pub mod schedule_store;

pub use actuation::{ActuationGateway, PasscodeStore};
pub use event_log::EventLog;
pub use notification::NotificationDispatcher;
pub use plan_registry::PlanRegistry;
pub use repository::{DeviceRepository, SensorRepository};
pub use schedule_store::ScheduleStore;
