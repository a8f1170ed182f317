use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An outstanding connection request. Ordered pair: sender -> receiver.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConnectionRequest {
    pub id: Uuid,
    pub sender_id: i32,
    pub receiver_id: i32,
    pub created_at: DateTime<Utc>,
}

/// An established connection. Unordered pair, stored canonically with
/// `user_id_1 < user_id_2` so one row covers both directions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Connection {
    pub id: Uuid,
    pub user_id_1: i32,
    pub user_id_2: i32,
    pub created_at: DateTime<Utc>,
}

impl Connection {
    /// The counterpart of `user` in this connection.
    pub fn other(&self, user: i32) -> i32 {
        if self.user_id_1 == user {
            self.user_id_2
        } else {
            self.user_id_1
        }
    }

    pub fn involves(&self, user: i32) -> bool {
        self.user_id_1 == user || self.user_id_2 == user
    }
}

/// Canonical unordered-pair key: smaller id first.
pub fn canonical_pair(a: i32, b: i32) -> (i32, i32) {
    if a < b { (a, b) } else { (b, a) }
}

/// Relationship between two users from the viewer's perspective. Derived
/// from the request/connection tables, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    None,
    RequestSent,
    RequestReceived,
    Connected,
}

impl ConnectionStatus {
    /// The same relationship as seen from the other side.
    pub fn mirrored(self) -> Self {
        match self {
            ConnectionStatus::RequestSent => ConnectionStatus::RequestReceived,
            ConnectionStatus::RequestReceived => ConnectionStatus::RequestSent,
            other => other,
        }
    }
}

/// The closed set of relationship mutations. Boundary payloads deserialize
/// into this enum, so an unknown action is rejected before any dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionAction {
    Create,
    Accept,
    Cancel,
    Remove,
    Ignore,
}

/// Notification vocabulary shared with the feed features that live outside
/// this service. Relationship mutations only ever emit `Connection`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Like,
    Comment,
    Share,
    Connection,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Like => "like",
            NotificationKind::Comment => "comment",
            NotificationKind::Share => "share",
            NotificationKind::Connection => "connection",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_pair_orders_ids() {
        assert_eq!(canonical_pair(2, 7), (2, 7));
        assert_eq!(canonical_pair(7, 2), (2, 7));
    }

    #[test]
    fn test_status_mirror() {
        assert_eq!(
            ConnectionStatus::RequestSent.mirrored(),
            ConnectionStatus::RequestReceived
        );
        assert_eq!(
            ConnectionStatus::RequestReceived.mirrored(),
            ConnectionStatus::RequestSent
        );
        assert_eq!(ConnectionStatus::Connected.mirrored(), ConnectionStatus::Connected);
        assert_eq!(ConnectionStatus::None.mirrored(), ConnectionStatus::None);
    }

    #[test]
    fn test_action_parses_from_lowercase() {
        let action: ConnectionAction = serde_json::from_value(json!("accept")).unwrap();
        assert_eq!(action, ConnectionAction::Accept);

        let unknown = serde_json::from_value::<ConnectionAction>(json!("poke"));
        assert!(unknown.is_err());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let value = serde_json::to_value(ConnectionStatus::RequestSent).unwrap();
        assert_eq!(value, json!("request_sent"));
    }
}
