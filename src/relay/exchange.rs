//! One HTTP command, from raw body to response, as a statum state machine
//!
//! ```text
//! Validating ──► Publishing ──► Responded
//!      │                           ▲
//!      └───────────────────────────┘
//!            (rejected body)
//! ```
//!
//! There is no way back: a rejected body is never published and a failed
//! publish is never retried.

use statum::{machine, state};
use tracing::{error, info, warn};

use super::command::{CommandRequest, PayloadFormat, ValidationError};
use super::response::RelayResponse;
use crate::mqtt::{CommandPublisher, DeliveryOptions};

#[state]
#[derive(Debug, Clone)]
pub enum ExchangeState {
    Validating,
    Publishing,
    Responded,
}

#[machine]
pub struct CommandExchange<S: ExchangeState> {
    topic: String,
    payload_format: PayloadFormat,
    /// Wire payload, filled in once the body is accepted
    payload: String,
    /// Answer for the client; starts as the generic 400
    response: RelayResponse,
}

/// Outcome of the validation step
pub enum Validated {
    Accepted(CommandExchange<Publishing>),
    Rejected(CommandExchange<Responded>),
}

impl<S: ExchangeState> CommandExchange<S> {
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl CommandExchange<Validating> {
    pub fn begin(topic: impl Into<String>, payload_format: PayloadFormat) -> Self {
        Self::new(
            topic.into(),
            payload_format,
            String::new(),
            RelayResponse::rejected(&ValidationError::MissingField),
        )
    }

    pub fn validate(mut self, body: &[u8]) -> Validated {
        match CommandRequest::from_body(body) {
            Ok(request) => {
                self.payload = self.payload_format.encode(&request);
                Validated::Accepted(self.transition())
            }
            Err(e) => {
                warn!("Rejected command request: {}", e);
                self.response = RelayResponse::rejected(&e);
                Validated::Rejected(self.transition())
            }
        }
    }
}

impl CommandExchange<Publishing> {
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Publishes once with QoS 0 / no retain and records the answer.
    pub async fn publish(mut self, publisher: &dyn CommandPublisher) -> CommandExchange<Responded> {
        match publisher
            .publish(&self.topic, &self.payload, DeliveryOptions::fire_and_forget())
            .await
        {
            Ok(ack) => {
                info!("Published: {}", ack);
                self.response = RelayResponse::sent(ack.payload);
            }
            Err(e) => {
                error!("MQTT publish error on {}: {}", self.topic, e);
                self.response = RelayResponse::publish_failed();
            }
        }
        self.transition()
    }
}

impl CommandExchange<Responded> {
    pub fn into_response(self) -> RelayResponse {
        self.response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mqtt::PublishError;
    use crate::relay::response::ResponseBody;
    use crate::relay::test_support::RecordingPublisher;
    use axum::http::StatusCode;

    const TOPIC: &str = "/internet-controlled-car/car/control";

    fn accepted(body: &[u8], format: PayloadFormat) -> CommandExchange<Publishing> {
        match CommandExchange::begin(TOPIC, format).validate(body) {
            Validated::Accepted(exchange) => exchange,
            Validated::Rejected(exchange) => {
                panic!("unexpected rejection: {:?}", exchange.into_response())
            }
        }
    }

    #[test]
    fn rejected_body_goes_straight_to_responded() {
        match CommandExchange::begin(TOPIC, PayloadFormat::Command).validate(br#"{"speed":150}"#) {
            Validated::Rejected(exchange) => {
                let response = exchange.into_response();
                assert_eq!(response.status, StatusCode::BAD_REQUEST);
                assert_eq!(
                    response.body,
                    ResponseBody::Error {
                        message: "Missing command or speed".to_string()
                    }
                );
            }
            Validated::Accepted(_) => panic!("body without command must be rejected"),
        }
    }

    #[test]
    fn malformed_json_is_reported_separately() {
        match CommandExchange::begin(TOPIC, PayloadFormat::Command).validate(b"{not json") {
            Validated::Rejected(exchange) => assert_eq!(
                exchange.into_response(),
                RelayResponse::rejected(&ValidationError::InvalidJson)
            ),
            Validated::Accepted(_) => panic!("malformed JSON must be rejected"),
        }
    }

    #[test]
    fn accepted_body_carries_encoded_payload() {
        let exchange = accepted(br#"{"command":"F","speed":150}"#, PayloadFormat::CommandWithSpeed);
        assert_eq!(exchange.payload(), "F,150");
        assert_eq!(exchange.topic(), TOPIC);
    }

    #[tokio::test]
    async fn publishes_with_fire_and_forget_options() {
        let publisher = RecordingPublisher::default();
        let exchange = accepted(br#"{"command":"F","speed":150}"#, PayloadFormat::Command);

        let response = exchange.publish(&publisher).await.into_response();

        assert_eq!(response, RelayResponse::sent("F"));
        let published = publisher.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].topic, TOPIC);
        assert_eq!(published[0].payload, "F");
        assert_eq!(published[0].options, DeliveryOptions::fire_and_forget());
    }

    #[tokio::test]
    async fn publish_failure_becomes_500() {
        let publisher = RecordingPublisher::failing(PublishError::NotConnected);
        let exchange = accepted(br#"{"command":"S","speed":0}"#, PayloadFormat::Command);

        let response = exchange.publish(&publisher).await.into_response();

        assert_eq!(response, RelayResponse::publish_failed());
        assert_eq!(publisher.attempts(), 1);
    }
}
