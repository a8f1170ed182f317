use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::{Connection, ConnectionRequest, canonical_pair};
use crate::services::store::{AcceptClaim, Claim, RelationshipStore, StoreError};

/// Postgres-backed relationship store. Per-pair uniqueness lives in the
/// schema (ordered pair for requests, canonical unordered pair for
/// connections); insert conflicts surface as `Claim::Existing` rather than
/// errors, and the accept path runs in one transaction.
#[derive(Debug, Clone)]
pub struct PgRelationshipStore {
    pool: PgPool,
}

impl PgRelationshipStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RelationshipStore for PgRelationshipStore {
    async fn connection_between(&self, a: i32, b: i32) -> Result<Option<Connection>, StoreError> {
        let (lo, hi) = canonical_pair(a, b);
        let connection = sqlx::query_as::<_, Connection>(
            r#"
            SELECT id, user_id_1, user_id_2, created_at
            FROM connections
            WHERE user_id_1 = $1 AND user_id_2 = $2
            "#,
        )
        .bind(lo)
        .bind(hi)
        .fetch_optional(&self.pool)
        .await?;

        Ok(connection)
    }

    async fn request_between(
        &self,
        sender: i32,
        receiver: i32,
    ) -> Result<Option<ConnectionRequest>, StoreError> {
        let request = sqlx::query_as::<_, ConnectionRequest>(
            r#"
            SELECT id, sender_id, receiver_id, created_at
            FROM connection_requests
            WHERE sender_id = $1 AND receiver_id = $2
            "#,
        )
        .bind(sender)
        .bind(receiver)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn create_request(
        &self,
        sender: i32,
        receiver: i32,
    ) -> Result<Claim<ConnectionRequest>, StoreError> {
        let inserted = sqlx::query_as::<_, ConnectionRequest>(
            r#"
            INSERT INTO connection_requests (sender_id, receiver_id)
            VALUES ($1, $2)
            ON CONFLICT (sender_id, receiver_id) DO NOTHING
            RETURNING id, sender_id, receiver_id, created_at
            "#,
        )
        .bind(sender)
        .bind(receiver)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match inserted {
            Some(request) => Claim::Created(request),
            None => Claim::Existing,
        })
    }

    async fn delete_request(&self, sender: i32, receiver: i32) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM connection_requests
            WHERE sender_id = $1 AND receiver_id = $2
            "#,
        )
        .bind(sender)
        .bind(receiver)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn accept_request(
        &self,
        requester: i32,
        accepter: i32,
    ) -> Result<AcceptClaim, StoreError> {
        let mut tx = self.pool.begin().await?;

        let consumed = sqlx::query_as::<_, ConnectionRequest>(
            r#"
            DELETE FROM connection_requests
            WHERE sender_id = $1 AND receiver_id = $2
            RETURNING id, sender_id, receiver_id, created_at
            "#,
        )
        .bind(requester)
        .bind(accepter)
        .fetch_optional(&mut *tx)
        .await?;

        if consumed.is_none() {
            tx.rollback().await?;
            return Ok(AcceptClaim::NoRequest);
        }

        let (lo, hi) = canonical_pair(requester, accepter);
        let inserted = sqlx::query_as::<_, Connection>(
            r#"
            INSERT INTO connections (user_id_1, user_id_2)
            VALUES ($1, $2)
            ON CONFLICT (user_id_1, user_id_2) DO NOTHING
            RETURNING id, user_id_1, user_id_2, created_at
            "#,
        )
        .bind(lo)
        .bind(hi)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(match inserted {
            Some(connection) => AcceptClaim::Connected(connection),
            // Connection already existed; the stale request is gone now.
            None => AcceptClaim::AlreadyConnected,
        })
    }

    async fn delete_connection(&self, a: i32, b: i32) -> Result<bool, StoreError> {
        let (lo, hi) = canonical_pair(a, b);
        let result = sqlx::query(
            r#"
            DELETE FROM connections
            WHERE user_id_1 = $1 AND user_id_2 = $2
            "#,
        )
        .bind(lo)
        .bind(hi)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn connections_of(&self, user: i32) -> Result<Vec<Connection>, StoreError> {
        let connections = sqlx::query_as::<_, Connection>(
            r#"
            SELECT id, user_id_1, user_id_2, created_at
            FROM connections
            WHERE user_id_1 = $1 OR user_id_2 = $1
            "#,
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        Ok(connections)
    }

    async fn incoming_requests(&self, user: i32) -> Result<Vec<ConnectionRequest>, StoreError> {
        let requests = sqlx::query_as::<_, ConnectionRequest>(
            r#"
            SELECT id, sender_id, receiver_id, created_at
            FROM connection_requests
            WHERE receiver_id = $1
            "#,
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn outgoing_requests(&self, user: i32) -> Result<Vec<ConnectionRequest>, StoreError> {
        let requests = sqlx::query_as::<_, ConnectionRequest>(
            r#"
            SELECT id, sender_id, receiver_id, created_at
            FROM connection_requests
            WHERE sender_id = $1
            "#,
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }
}
