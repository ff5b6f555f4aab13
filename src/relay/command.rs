//! Inbound command shape and its wire encoding

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use thiserror::Error;

pub const MISSING_FIELDS_MESSAGE: &str = "Missing command or speed";
pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON body";

/// Reasons a request body is turned away before anything is published
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `command` is absent, empty or not a string, or `speed` is absent or not a number
    #[error("Missing command or speed")]
    MissingField,

    /// The body is not JSON at all
    #[error("Invalid JSON body")]
    InvalidJson,
}

/// A command as sent by the web client, e.g. `{"command":"F","speed":150}`.
///
/// Lives for one request only.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    pub command: String,
    /// Kept as the original JSON number so `150` is not re-rendered as `150.0`
    pub speed: Number,
}

impl CommandRequest {
    /// Decodes and shape-checks a request body.
    ///
    /// An empty body counts as `{}`. No bounds are enforced on `speed`.
    pub fn from_body(body: &[u8]) -> Result<Self, ValidationError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(ValidationError::MissingField);
        }

        let value: Value = serde_json::from_slice(body).map_err(|_| ValidationError::InvalidJson)?;
        match value {
            Value::Object(fields) => Self::from_fields(&fields),
            _ => Err(ValidationError::MissingField),
        }
    }

    fn from_fields(fields: &Map<String, Value>) -> Result<Self, ValidationError> {
        let command = match fields.get("command") {
            Some(Value::String(command)) if !command.is_empty() => command.clone(),
            _ => return Err(ValidationError::MissingField),
        };

        let speed = match fields.get("speed") {
            Some(Value::Number(speed)) => speed.clone(),
            _ => return Err(ValidationError::MissingField),
        };

        Ok(Self { command, speed })
    }
}

/// What goes on the wire for an accepted command.
///
/// The car firmware reads the bare command code; `CommandWithSpeed` is for
/// firmware that also parses a speed suffix.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PayloadFormat {
    /// `F`
    #[default]
    Command,
    /// `F,150`
    CommandWithSpeed,
}

impl PayloadFormat {
    pub fn encode(&self, request: &CommandRequest) -> String {
        match self {
            PayloadFormat::Command => request.command.clone(),
            PayloadFormat::CommandWithSpeed => format!("{},{}", request.command, request.speed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_command_and_speed() {
        let request = CommandRequest::from_body(br#"{"command":"F","speed":150}"#).unwrap();
        assert_eq!(request.command, "F");
        assert_eq!(request.speed.as_u64(), Some(150));
    }

    #[test]
    fn ignores_unknown_fields_and_accepts_zero_speed() {
        let request =
            CommandRequest::from_body(br#"{"command":"S","speed":0,"client":"web"}"#).unwrap();
        assert_eq!(request.command, "S");
        assert_eq!(request.speed.as_u64(), Some(0));
    }

    #[test]
    fn whitespace_command_is_still_a_command() {
        for command in [" ", "  "] {
            let body = format!(r#"{{"command":"{command}","speed":150}}"#);
            let request = CommandRequest::from_body(body.as_bytes()).unwrap();
            assert_eq!(request.command, command);
            assert_eq!(PayloadFormat::Command.encode(&request), command);
        }
    }

    #[test]
    fn rejects_missing_fields() {
        for body in [
            r#"{"speed":150}"#,
            r#"{"command":"F"}"#,
            r#"{}"#,
            r#"{"command":"","speed":150}"#,
            r#"{"command":null,"speed":150}"#,
            r#"{"command":"F","speed":null}"#,
            r#"{"command":"F","speed":"fast"}"#,
            r#"{"command":7,"speed":150}"#,
            r#"["F",150]"#,
            "",
        ] {
            assert_eq!(
                CommandRequest::from_body(body.as_bytes()),
                Err(ValidationError::MissingField),
                "{body:?} should be rejected as missing fields"
            );
        }
    }

    #[test]
    fn rejects_malformed_json() {
        assert_eq!(
            CommandRequest::from_body(b"{\"command\":"),
            Err(ValidationError::InvalidJson)
        );
        assert_eq!(
            CommandRequest::from_body(b"command=F&speed=150"),
            Err(ValidationError::InvalidJson)
        );
    }

    #[test]
    fn error_messages_match_the_http_contract() {
        assert_eq!(ValidationError::MissingField.to_string(), MISSING_FIELDS_MESSAGE);
        assert_eq!(ValidationError::InvalidJson.to_string(), INVALID_JSON_MESSAGE);
    }

    #[test]
    fn encodes_payload_per_format() {
        let request = CommandRequest::from_body(br#"{"command":"L","speed":120}"#).unwrap();
        assert_eq!(PayloadFormat::Command.encode(&request), "L");
        assert_eq!(PayloadFormat::CommandWithSpeed.encode(&request), "L,120");

        let fractional = CommandRequest::from_body(br#"{"command":"R","speed":0.5}"#).unwrap();
        assert_eq!(PayloadFormat::CommandWithSpeed.encode(&fractional), "R,0.5");
    }
}
