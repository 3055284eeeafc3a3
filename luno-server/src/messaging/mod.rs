//! Real-time direct messaging.
//!
//! Each live connection runs a [`RelaySession`] state machine
//! (`Unauthenticated -> Authenticated -> Closed`). Authenticated sessions are
//! registered per user in a [`ConnectionRegistry`]; the [`MessagingRelay`]
//! persists every message before pushing it to the connections of both
//! participants.

mod protocol;
mod registry;
mod relay;

pub use protocol::{ClientFrame, RelayEvent, AUTH_FAILED, SEND_FAILED};
pub use registry::{ConnectionId, ConnectionRegistry, EventSender};
pub use relay::{MessagingRelay, RelaySession, SessionState};
