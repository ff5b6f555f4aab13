//! # MQTT Broker Connection
//!
//! Owns the one broker session the relay publishes through. The car subscribes
//! to a single control topic; every accepted HTTP command ends up here as one
//! QoS 0, non-retained publish.
//!
//! ## Module Layout
//!
//! ```text
//! mqtt/
//! ├── config.rs        - [mqtt] config section and broker URL parsing
//! ├── error.rs         - ConnectionError / PublishError
//! ├── message.rs       - DeliveryOptions and the local Ack
//! └── mqtt_handler.rs  - MqttHandle, event loop task, CommandPublisher seam
//! ```
//!
//! ## Connection Lifecycle
//!
//! ```text
//! Connecting ──► Connected ──► Disconnected ──► Connected ...
//!      │              │              │
//!      └──────────────┴──────────────┴──► Closed (shutdown)
//! ```
//!
//! `MqttHandle::connect` never waits for the broker. Transitions are written
//! to the log and mirrored into a watch channel; `publish` consults it and
//! fails with `PublishError::NotConnected` instead of queueing commands for a
//! session that is not there. Re-dialing is left to the rumqttc event loop with
//! a fixed pause between attempts.
//!
//! ## Delivery Guarantees
//!
//! An `Ack` only means the transport accepted the message. There is no
//! confirmation from the car itself.

pub mod config;
pub mod error;
pub mod message;
pub mod mqtt_handler;

pub use config::MqttConfig;
pub use error::{ConnectionError, PublishError};
pub use message::{Ack, DeliveryOptions};
pub use mqtt_handler::{CommandPublisher, ConnectionState, MqttHandle};
