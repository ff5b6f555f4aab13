use chrono::{DateTime, Local};
use rumqttc::QoS;
use std::fmt;

/// Per-message delivery settings handed to the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryOptions {
    pub qos: QoS,
    pub retain: bool,
}

impl DeliveryOptions {
    /// QoS 0 and no retain: only subscribers online right now see the message.
    pub const fn fire_and_forget() -> Self {
        Self {
            qos: QoS::AtMostOnce,
            retain: false,
        }
    }
}

impl Default for DeliveryOptions {
    fn default() -> Self {
        Self::fire_and_forget()
    }
}

/// Local acknowledgment that the transport accepted a message.
///
/// Says nothing about whether the car received or executed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub topic: String,
    pub payload: String,
    pub published_at: DateTime<Local>,
}

impl Ack {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            published_at: Local::now(),
        }
    }
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} - {} -> {}",
            self.published_at.format("%H:%M:%S%.3f"),
            self.payload,
            self.topic
        )
    }
}
