//! # hearth-adapter-virtual
//!
//! Simulated actuation, for demos and for running the daemon without real
//! hardware.
//!
//! | Port | Implementation | Behaviour |
//! |------|----------------|-----------|
//! | `ActuationGateway` | [`VirtualGateway`] | Keeps device values in memory, optionally echoes them back as feed reports |
//!
//! ## Dependency rule
//!
//! Depends on `hearth-app` (port traits) and `hearth-domain` only.

mod gateway;

pub use gateway::{Feedback, VirtualGateway};
