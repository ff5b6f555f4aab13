use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, Method};
use axum::routing::post;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use super::command::PayloadFormat;
use super::exchange::{CommandExchange, Validated};
use super::response::RelayResponse;
use crate::mqtt::CommandPublisher;

pub const COMMAND_ROUTE: &str = "/api/command";

/// Shared by every request; holds the one broker publisher
#[derive(Clone)]
pub struct RelayState {
    publisher: Arc<dyn CommandPublisher>,
    topic: Arc<str>,
    payload_format: PayloadFormat,
}

impl RelayState {
    pub fn new(
        publisher: Arc<dyn CommandPublisher>,
        topic: impl Into<Arc<str>>,
        payload_format: PayloadFormat,
    ) -> Self {
        Self {
            publisher,
            topic: topic.into(),
            payload_format,
        }
    }
}

/// `POST /api/command`
///
/// Takes the raw body so malformed or non-JSON input still gets the JSON
/// error payload instead of axum's plain-text rejection.
pub async fn handle_command(State(state): State<RelayState>, body: Bytes) -> RelayResponse {
    match CommandExchange::begin(state.topic.as_ref(), state.payload_format).validate(&body) {
        Validated::Accepted(exchange) => exchange
            .publish(state.publisher.as_ref())
            .await
            .into_response(),
        Validated::Rejected(exchange) => exchange.into_response(),
    }
}

/// Builds the relay router: one route plus a CORS layer allowing any origin,
/// the `POST` method and the `Content-Type` header.
pub fn router(state: RelayState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route(COMMAND_ROUTE, post(handle_command))
        .layer(cors)
        .with_state(state)
}
