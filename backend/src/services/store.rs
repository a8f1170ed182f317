use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Connection, ConnectionRequest, canonical_pair};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Outcome of a create-if-absent insert. The uniqueness constraint decides;
/// losing the race is a normal outcome, not an error.
#[derive(Debug)]
pub enum Claim<T> {
    Created(T),
    Existing,
}

/// Outcome of the atomic accept step: consume the request, then claim the
/// connection row.
#[derive(Debug)]
pub enum AcceptClaim {
    /// Request consumed and a new connection created.
    Connected(Connection),
    /// Request consumed, but a connection already existed for the pair.
    AlreadyConnected,
    /// No outstanding request from that sender.
    NoRequest,
}

/// Persistence surface for the relationship tables. Mutations that span
/// both tables (accept) are atomic in every implementation, so no pair can
/// end up with both a connection and a leftover request.
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    async fn connection_between(&self, a: i32, b: i32) -> Result<Option<Connection>, StoreError>;

    async fn request_between(
        &self,
        sender: i32,
        receiver: i32,
    ) -> Result<Option<ConnectionRequest>, StoreError>;

    /// Insert a request unless one already exists for the ordered pair.
    async fn create_request(
        &self,
        sender: i32,
        receiver: i32,
    ) -> Result<Claim<ConnectionRequest>, StoreError>;

    /// Delete the request for the ordered pair. Returns whether a row existed.
    async fn delete_request(&self, sender: i32, receiver: i32) -> Result<bool, StoreError>;

    /// Atomically consume the request requester -> accepter and create the
    /// connection for the pair.
    async fn accept_request(&self, requester: i32, accepter: i32)
    -> Result<AcceptClaim, StoreError>;

    /// Delete the connection between the pair (either order). Returns whether
    /// a row existed.
    async fn delete_connection(&self, a: i32, b: i32) -> Result<bool, StoreError>;

    async fn connections_of(&self, user: i32) -> Result<Vec<Connection>, StoreError>;

    async fn incoming_requests(&self, user: i32) -> Result<Vec<ConnectionRequest>, StoreError>;

    async fn outgoing_requests(&self, user: i32) -> Result<Vec<ConnectionRequest>, StoreError>;
}

/// In-memory store backed by a single mutex over both tables, which makes
/// every operation atomic. Used by the unit tests and as a dev backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryTables>>,
}

#[derive(Debug, Default)]
struct MemoryTables {
    requests: Vec<ConnectionRequest>,
    connections: Vec<Connection>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_count(&self) -> usize {
        self.inner.lock().unwrap().requests.len()
    }

    pub fn connection_count(&self) -> usize {
        self.inner.lock().unwrap().connections.len()
    }
}

fn new_connection(a: i32, b: i32) -> Connection {
    let (lo, hi) = canonical_pair(a, b);
    Connection {
        id: Uuid::new_v4(),
        user_id_1: lo,
        user_id_2: hi,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl RelationshipStore for MemoryStore {
    async fn connection_between(&self, a: i32, b: i32) -> Result<Option<Connection>, StoreError> {
        let (lo, hi) = canonical_pair(a, b);
        let tables = self.inner.lock().unwrap();
        Ok(tables
            .connections
            .iter()
            .find(|c| c.user_id_1 == lo && c.user_id_2 == hi)
            .cloned())
    }

    async fn request_between(
        &self,
        sender: i32,
        receiver: i32,
    ) -> Result<Option<ConnectionRequest>, StoreError> {
        let tables = self.inner.lock().unwrap();
        Ok(tables
            .requests
            .iter()
            .find(|r| r.sender_id == sender && r.receiver_id == receiver)
            .cloned())
    }

    async fn create_request(
        &self,
        sender: i32,
        receiver: i32,
    ) -> Result<Claim<ConnectionRequest>, StoreError> {
        let mut tables = self.inner.lock().unwrap();
        if tables
            .requests
            .iter()
            .any(|r| r.sender_id == sender && r.receiver_id == receiver)
        {
            return Ok(Claim::Existing);
        }
        let request = ConnectionRequest {
            id: Uuid::new_v4(),
            sender_id: sender,
            receiver_id: receiver,
            created_at: Utc::now(),
        };
        tables.requests.push(request.clone());
        Ok(Claim::Created(request))
    }

    async fn delete_request(&self, sender: i32, receiver: i32) -> Result<bool, StoreError> {
        let mut tables = self.inner.lock().unwrap();
        let before = tables.requests.len();
        tables
            .requests
            .retain(|r| !(r.sender_id == sender && r.receiver_id == receiver));
        Ok(tables.requests.len() < before)
    }

    async fn accept_request(
        &self,
        requester: i32,
        accepter: i32,
    ) -> Result<AcceptClaim, StoreError> {
        let mut tables = self.inner.lock().unwrap();
        let position = tables
            .requests
            .iter()
            .position(|r| r.sender_id == requester && r.receiver_id == accepter);
        let Some(position) = position else {
            return Ok(AcceptClaim::NoRequest);
        };
        tables.requests.remove(position);

        let (lo, hi) = canonical_pair(requester, accepter);
        if tables
            .connections
            .iter()
            .any(|c| c.user_id_1 == lo && c.user_id_2 == hi)
        {
            return Ok(AcceptClaim::AlreadyConnected);
        }
        let connection = new_connection(requester, accepter);
        tables.connections.push(connection.clone());
        Ok(AcceptClaim::Connected(connection))
    }

    async fn delete_connection(&self, a: i32, b: i32) -> Result<bool, StoreError> {
        let (lo, hi) = canonical_pair(a, b);
        let mut tables = self.inner.lock().unwrap();
        let before = tables.connections.len();
        tables
            .connections
            .retain(|c| !(c.user_id_1 == lo && c.user_id_2 == hi));
        Ok(tables.connections.len() < before)
    }

    async fn connections_of(&self, user: i32) -> Result<Vec<Connection>, StoreError> {
        let tables = self.inner.lock().unwrap();
        Ok(tables
            .connections
            .iter()
            .filter(|c| c.involves(user))
            .cloned()
            .collect())
    }

    async fn incoming_requests(&self, user: i32) -> Result<Vec<ConnectionRequest>, StoreError> {
        let tables = self.inner.lock().unwrap();
        Ok(tables
            .requests
            .iter()
            .filter(|r| r.receiver_id == user)
            .cloned()
            .collect())
    }

    async fn outgoing_requests(&self, user: i32) -> Result<Vec<ConnectionRequest>, StoreError> {
        let tables = self.inner.lock().unwrap();
        Ok(tables
            .requests
            .iter()
            .filter(|r| r.sender_id == user)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Force a connection row into place, bypassing the accept path. Lets
    /// tests stage the request-plus-connection race artifact.
    pub fn force_connection(&self, a: i32, b: i32) {
        let connection = new_connection(a, b);
        self.inner.lock().unwrap().connections.push(connection);
    }
}
