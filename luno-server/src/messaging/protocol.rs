use serde::{Deserialize, Serialize};
use uuid::Uuid;

use luno_types::DirectMessage;

/// Reason sent when a token is rejected
pub const AUTH_FAILED: &str = "auth_failed";
/// Reason sent when a message could not be persisted
pub const SEND_FAILED: &str = "send_failed";

/// Frames a client sends over the socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Auth {
        token: String,
    },
    Dm {
        to: Uuid,
        #[serde(default)]
        content: String,
    },
}

/// Events pushed to a connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayEvent {
    Authed { id: Uuid, username: String },
    Error { reason: String },
    Dm(DirectMessage),
}

impl RelayEvent {
    pub fn error(reason: &str) -> Self {
        RelayEvent::Error {
            reason: reason.to_string(),
        }
    }
}
