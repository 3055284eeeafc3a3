use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use luno_types::DirectMessage;

use crate::clock::MonotonicClock;
use crate::db::repositories::MessageRepository;
use crate::db::{DbPool, InsertOutcome};
use crate::error::{SocialError, SocialResult};
use crate::identity::{Identity, IdentityStore};

use super::protocol::{ClientFrame, RelayEvent, AUTH_FAILED, SEND_FAILED};
use super::registry::{ConnectionId, ConnectionRegistry, EventSender};

/// Shared side of the relay: persistence, identity and the connection registry.
#[derive(Clone)]
pub struct MessagingRelay {
    pool: DbPool,
    identity: Arc<dyn IdentityStore>,
    registry: ConnectionRegistry,
    clock: Arc<MonotonicClock>,
}

impl MessagingRelay {
    pub fn new(
        pool: DbPool,
        identity: Arc<dyn IdentityStore>,
        registry: ConnectionRegistry,
        clock: Arc<MonotonicClock>,
    ) -> Self {
        Self {
            pool,
            identity,
            registry,
            clock,
        }
    }

    fn messages(&self) -> MessageRepository {
        MessageRepository::new(self.pool.clone())
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Open a new unauthenticated session. Events for the connection arrive
    /// on the returned receiver.
    pub fn connect(&self) -> (RelaySession, mpsc::UnboundedReceiver<RelayEvent>) {
        let (outbox, inbox) = mpsc::unbounded_channel();
        let session = RelaySession {
            connection: self.registry.next_connection_id(),
            state: SessionState::Unauthenticated,
            outbox,
            relay: self.clone(),
        };
        (session, inbox)
    }

    /// Every message exchanged between two users, oldest first
    pub fn conversation(&self, a: &Uuid, b: &Uuid) -> SocialResult<Vec<DirectMessage>> {
        Ok(self.messages().get_conversation(a, b)?)
    }

    fn persist(&self, from: &Uuid, to: &Uuid, content: String) -> SocialResult<DirectMessage> {
        let message = DirectMessage {
            id: Uuid::new_v4(),
            from: *from,
            to: *to,
            content,
            created_at: self.clock.now(),
        };

        match self.messages().create(&message)? {
            InsertOutcome::MissingReference => Err(SocialError::not_found("Recipient")),
            _ => Ok(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated(Identity),
    Closed,
}

/// One live connection.
///
/// Dropping the session closes it and removes it from the registry.
pub struct RelaySession {
    connection: ConnectionId,
    state: SessionState,
    outbox: EventSender,
    relay: MessagingRelay,
}

impl RelaySession {
    pub fn connection_id(&self) -> ConnectionId {
        self.connection
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.state {
            SessionState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    fn emit(&self, event: RelayEvent) {
        // The receiving half is gone once the socket task ends
        let _ = self.outbox.send(event);
    }

    pub fn handle_frame(&mut self, frame: ClientFrame) {
        match frame {
            ClientFrame::Auth { token } => {
                self.authenticate(&token);
            }
            ClientFrame::Dm { to, content } => {
                // The failure was already reported to this connection
                if let Err(e) = self.send_message(to, content) {
                    tracing::debug!(connection = self.connection, to = %to, error = %e, "Dropped direct message frame");
                }
            }
        }
    }

    /// Bind the session to the token's identity. Authenticating again
    /// rebinds the connection; a rejected token leaves the state unchanged.
    pub fn authenticate(&mut self, token: &str) -> bool {
        if self.state == SessionState::Closed {
            return false;
        }

        let identity = match self.relay.identity.verify_token(token) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::debug!(connection = self.connection, error = %e, "Relay authentication failed");
                self.emit(RelayEvent::error(AUTH_FAILED));
                return false;
            }
        };

        if let SessionState::Authenticated(previous) = &self.state {
            self.relay.registry.unsubscribe(&previous.id, self.connection);
        }
        self.relay
            .registry
            .subscribe(identity.id, self.connection, self.outbox.clone());

        tracing::debug!(connection = self.connection, user = %identity.id, "Relay session authenticated");
        self.emit(RelayEvent::Authed {
            id: identity.id,
            username: identity.username.clone(),
        });
        self.state = SessionState::Authenticated(identity);
        true
    }

    /// Persist a message and push it to every connection of both parties.
    ///
    /// Returns `Ok(None)` without side effects when the session is not
    /// authenticated. A persistence failure is reported to this connection
    /// only and nothing is delivered.
    pub fn send_message(&mut self, to: Uuid, content: String) -> SocialResult<Option<DirectMessage>> {
        let Some(sender) = self.identity().map(|identity| identity.id) else {
            tracing::debug!(connection = self.connection, "Ignored message from unauthenticated connection");
            return Ok(None);
        };

        let message = match self.relay.persist(&sender, &to, content) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(from = %sender, to = %to, error = %e, "Failed to persist direct message");
                self.emit(RelayEvent::error(SEND_FAILED));
                return Err(e);
            }
        };

        let delivered = self
            .relay
            .registry
            .deliver(&[message.to, message.from], &RelayEvent::Dm(message.clone()));
        tracing::debug!(message_id = %message.id, delivered, "Relayed direct message");

        Ok(Some(message))
    }

    pub fn close(&mut self) {
        if let SessionState::Authenticated(identity) = &self.state {
            self.relay.registry.unsubscribe(&identity.id, self.connection);
        }
        self.state = SessionState::Closed;
    }
}

impl Drop for RelaySession {
    fn drop(&mut self) {
        self.close();
    }
}
