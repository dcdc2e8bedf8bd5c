use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use events::{Id, Identity};
use log::*;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Why a push over a transport did not go through.
#[derive(Debug, PartialEq)]
pub enum TransportError {
    /// The peer is gone; the disconnect path will unregister it.
    Closed,
    Other(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TransportError::Closed => write!(f, "transport closed"),
            TransportError::Other(reason) => write!(f, "transport error: {reason}"),
        }
    }
}

impl StdError for TransportError {}

/// The outbound half of a client's live channel.
///
/// Implementations own their own synchronization: `send` may be called while the
/// connection is concurrently being unregistered.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, payload: String) -> Result<(), TransportError>;
}

/// A registered connection: who owns it and how to reach them.
#[derive(Clone)]
pub struct Connection {
    id: ConnectionId,
    identity: Identity,
    transport: Arc<dyn Transport>,
}

impl Connection {
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub async fn send(&self, payload: String) -> Result<(), TransportError> {
        self.transport.send(payload).await
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

/// Live push connections keyed by the owning user's id, at most one per user.
///
/// Every mutation goes through a single DashMap shard lock, so readers never
/// observe a half-inserted or half-removed entry. Fan-out works on
/// [`ConnectionRegistry::snapshot`] so no lock is held while awaiting a push.
pub struct ConnectionRegistry {
    connections: DashMap<Id, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Register `transport` as the live connection of `identity`.
    ///
    /// Returns `false` without touching the registry when the identity has no id
    /// or already holds a connection. The caller is expected to close the
    /// rejected transport.
    pub fn register(&self, identity: Identity, transport: Arc<dyn Transport>) -> bool {
        let Some(user_id) = identity.id else {
            warn!("Refusing connection for {}: identity has no id", identity.username);
            return false;
        };

        match self.connections.entry(user_id) {
            Entry::Occupied(_) => {
                debug!("Refusing second connection for user {user_id}");
                false
            }
            Entry::Vacant(vacant) => {
                let connection = Connection {
                    id: ConnectionId::new(),
                    identity,
                    transport,
                };
                debug!(
                    "Registered connection {} for user {user_id}",
                    connection.id.as_str()
                );
                vacant.insert(connection);
                true
            }
        }
    }

    /// Remove the connection owned by `identity`. Returns whether one was removed.
    pub fn unregister(&self, identity: &Identity) -> bool {
        let Some(user_id) = identity.id else {
            return false;
        };

        match self.connections.remove(&user_id) {
            Some((_, connection)) => {
                debug!(
                    "Unregistered connection {} for user {user_id}",
                    connection.id.as_str()
                );
                true
            }
            None => false,
        }
    }

    /// Copy of every registered connection at this instant.
    pub fn snapshot(&self) -> Vec<Connection> {
        self.connections
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Whether `connection` (not merely its owner) is still registered.
    pub fn is_live(&self, connection: &Connection) -> bool {
        connection.identity.id.is_some_and(|user_id| {
            self.connections
                .get(&user_id)
                .is_some_and(|current| current.id == connection.id)
        })
    }

    pub fn contains(&self, user_id: &Id) -> bool {
        self.connections.contains_key(user_id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
