use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use super::command::ValidationError;

pub const PUBLISH_FAILED_MESSAGE: &str = "Failed to publish command to car";

/// JSON body returned to the web client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ResponseBody {
    Ok { sent: String },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResponse {
    pub status: StatusCode,
    pub body: ResponseBody,
}

impl RelayResponse {
    pub fn sent(payload: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: ResponseBody::Ok {
                sent: payload.into(),
            },
        }
    }

    pub fn rejected(err: &ValidationError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ResponseBody::Error {
                message: err.to_string(),
            },
        }
    }

    pub fn publish_failed() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ResponseBody::Error {
                message: PUBLISH_FAILED_MESSAGE.to_string(),
            },
        }
    }
}

impl IntoResponse for RelayResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
