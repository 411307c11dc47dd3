//! # hearth-adapter-mqtt
//!
//! MQTT adapter: bridges feed-based devices and sensors into hearth.
//!
//! ## Responsibilities
//! - Connect to the broker and subscribe to every registered feed
//!   (`{feed_prefix}/feeds/{feed_key}`), again after each reconnection
//! - Route each message through an immutable [`RoutingTable`] to the
//!   `IngestionService`
//! - Implement the `ActuationGateway` port by publishing on the device feed
//!
//! ## Dependency rule
//! Same as other adapters: depends on `hearth-app` and `hearth-domain`.

mod bridge;
mod config;
mod error;
mod gateway;
mod routing;

pub use bridge::{MqttBridge, connect, deliver};
pub use config::MqttConfig;
pub use error::MqttError;
pub use gateway::MqttGateway;
pub use routing::{Route, RoutingTable, decode_payload};
