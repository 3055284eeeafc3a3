use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc;
use uuid::Uuid;

use super::protocol::RelayEvent;

pub type ConnectionId = u64;
pub type EventSender = mpsc::UnboundedSender<RelayEvent>;

/// Live connections per user.
///
/// A user's channel is the set of their authenticated connections; pushing
/// to the channel reaches every open session of that user.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    channels: Arc<RwLock<HashMap<Uuid, HashMap<ConnectionId, EventSender>>>>,
    next_id: Arc<AtomicU64>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_connection_id(&self) -> ConnectionId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn subscribe(&self, user: Uuid, connection: ConnectionId, sender: EventSender) {
        let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
        channels.entry(user).or_default().insert(connection, sender);
    }

    pub fn unsubscribe(&self, user: &Uuid, connection: ConnectionId) {
        let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(connections) = channels.get_mut(user) {
            connections.remove(&connection);
            if connections.is_empty() {
                channels.remove(user);
            }
        }
    }

    pub fn connection_count(&self, user: &Uuid) -> usize {
        let channels = self.channels.read().unwrap_or_else(PoisonError::into_inner);
        channels.get(user).map_or(0, HashMap::len)
    }

    /// Push `event` to every connection of every listed user, each at most
    /// once. Closed connections are skipped. Returns how many sends succeeded.
    pub fn deliver(&self, users: &[Uuid], event: &RelayEvent) -> usize {
        let channels = self.channels.read().unwrap_or_else(PoisonError::into_inner);
        let mut seen = HashSet::new();
        let mut delivered = 0;

        for user in users {
            if !seen.insert(*user) {
                continue;
            }
            let Some(connections) = channels.get(user) else {
                continue;
            };
            for (connection, sender) in connections {
                if sender.send(event.clone()).is_ok() {
                    delivered += 1;
                } else {
                    tracing::debug!(user = %user, connection, "Skipped closed connection");
                }
            }
        }

        delivered
    }
}
