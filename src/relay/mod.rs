//! # Command Relay Endpoint
//!
//! The HTTP side of the relay. A browser posts `{"command": "F", "speed": 150}`
//! to `/api/command`; the body is shape-checked, turned into a wire payload and
//! published once to the car's control topic.
//!
//! ## Request Flow
//!
//! ```text
//! POST /api/command
//!       │
//!       ▼
//!  [Validating] ──(bad body)──────────────► 400 Missing command or speed
//!       │
//!       ▼
//!  [Publishing] ──(PublishError)──────────► 500 Failed to publish command to car
//!       │
//!       ▼
//!  [Responded] ───────────────────────────► 200 {"status":"ok","sent":"F"}
//! ```
//!
//! Requests share nothing but the publisher. Two commands racing each other
//! reach the broker in whichever order they were validated; the car decides
//! what to make of them.

pub mod command;
pub mod exchange;
pub mod handler;
pub mod response;
pub mod server;

#[cfg(test)]
pub(crate) mod test_support;

pub use command::{CommandRequest, PayloadFormat, ValidationError};
pub use handler::{router, RelayState};
pub use response::RelayResponse;
