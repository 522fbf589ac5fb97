//! Registry of open realtime connections.
//!
//! Each connection is represented by the sending half of a bounded channel
//! of [`OUTBOUND_CAPACITY`] messages; a per-connection writer task drains the
//! receiving half into the socket. Sends never wait: a peer whose queue is
//! full misses the message instead of stalling the sender or growing memory.
//!
//! [`ConnectionRegistry::broadcast_except`] takes a snapshot of the live
//! set under a read lock and delivers outside it, so connections may come
//! and go while a broadcast is in flight. A failed delivery to one peer is
//! logged and skipped; it never stops delivery to the others.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::ws::Message;
use canvas_types::ConnectionId;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};

/// Messages buffered per connection before further ones are dropped.
pub const OUTBOUND_CAPACITY: usize = 256;

/// Liveness of a registered connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Accepting outbound messages.
    Open,
    /// The peer sent a close frame; no further broadcasts.
    Closing,
    /// The transport failed; waiting to be unregistered.
    Closed,
}

/// Failure to deliver a message to one connection.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// No connection with this id is registered.
    #[error("connection {0} is not registered")]
    Unknown(ConnectionId),

    /// The connection is closing or closed.
    #[error("connection {0} is not open")]
    NotOpen(ConnectionId),

    /// The connection's writer has gone away.
    #[error("connection {0} outbound channel is closed")]
    ChannelClosed(ConnectionId),

    /// The connection is not draining its queue fast enough.
    #[error("connection {0} outbound queue is full")]
    Full(ConnectionId),
}

impl DeliveryError {
    fn from_try_send<T>(id: ConnectionId, err: &TrySendError<T>) -> Self {
        match err {
            TrySendError::Full(_) => Self::Full(id),
            TrySendError::Closed(_) => Self::ChannelClosed(id),
        }
    }
}

struct ConnectionHandle {
    state: ConnectionState,
    tx: mpsc::Sender<Message>,
}

/// Shared set of open connections. Clones share the same set.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<RwLock<BTreeMap<ConnectionId, ConnectionHandle>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new open connection.
    ///
    /// Returns its id and the receiver its writer task must drain.
    pub async fn register(&self) -> (ConnectionId, mpsc::Receiver<Message>) {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        self.connections.write().await.insert(
            id,
            ConnectionHandle {
                state: ConnectionState::Open,
                tx,
            },
        );
        (id, rx)
    }

    /// Remove a connection.
    ///
    /// Returns `true` if it was registered. Dropping the entry closes the
    /// outbound channel, which ends the connection's writer task.
    pub async fn unregister(&self, id: ConnectionId) -> bool {
        self.connections.write().await.remove(&id).is_some()
    }

    /// Move a connection to a new liveness state.
    ///
    /// Returns `false` if the connection is not registered.
    pub async fn set_state(&self, id: ConnectionId, state: ConnectionState) -> bool {
        match self.connections.write().await.get_mut(&id) {
            Some(handle) => {
                handle.state = state;
                true
            }
            None => false,
        }
    }

    /// Current liveness state of a connection, if registered.
    pub async fn state_of(&self, id: ConnectionId) -> Option<ConnectionState> {
        self.connections.read().await.get(&id).map(|h| h.state)
    }

    /// Number of registered connections.
    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Whether no connections are registered.
    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }

    /// Queue a message for one connection.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] if the connection is unknown, not open, its
    /// queue is full, or its writer has gone away.
    pub async fn send_to(&self, id: ConnectionId, message: Message) -> Result<(), DeliveryError> {
        let tx = {
            let connections = self.connections.read().await;
            let handle = connections.get(&id).ok_or(DeliveryError::Unknown(id))?;
            if handle.state != ConnectionState::Open {
                return Err(DeliveryError::NotOpen(id));
            }
            handle.tx.clone()
        };
        tx.try_send(message)
            .map_err(|e| DeliveryError::from_try_send(id, &e))
    }

    /// Deliver `message` to every open connection except `sender`.
    ///
    /// Iterates a snapshot taken at call time; connections registered
    /// afterwards are not included. Peers with a full queue are skipped for
    /// this message. Returns the number of connections the message was
    /// queued for.
    pub async fn broadcast_except(&self, sender: ConnectionId, message: &Message) -> usize {
        let peers: Vec<(ConnectionId, ConnectionState, mpsc::Sender<Message>)> = self
            .connections
            .read()
            .await
            .iter()
            .filter(|(id, _)| **id != sender)
            .map(|(id, handle)| (*id, handle.state, handle.tx.clone()))
            .collect();

        let mut delivered: usize = 0;
        for (id, state, tx) in peers {
            if state != ConnectionState::Open {
                debug!(connection_id = %id, ?state, "Skipping connection that is not open");
                continue;
            }
            if let Err(e) = tx.try_send(message.clone()) {
                let err = DeliveryError::from_try_send(id, &e);
                warn!(connection_id = %id, error = %err, "Broadcast delivery failed");
                continue;
            }
            delivered = delivered.saturating_add(1);
        }
        delivered
    }
}
