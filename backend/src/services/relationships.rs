use serde::Serialize;
use thiserror::Error;

use crate::constants::SUGGESTION_LIMIT;
use crate::models::{
    AnnotatedProfile, ConnectionAction, ConnectionStatus, NotificationKind, SearchMode,
    UserProfile,
};
use crate::services::directory::ProfileDirectory;
use crate::services::notifier::Notifier;
use crate::services::store::{AcceptClaim, Claim, RelationshipStore, StoreError};

#[derive(Debug, Error)]
pub enum RelationError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
}

/// User-facing outcome of a mutation that completed (possibly as a no-op).
#[derive(Debug, Clone, Serialize)]
pub struct Feedback {
    pub severity: Severity,
    pub message: String,
}

impl Feedback {
    fn success(message: String) -> Self {
        Self { severity: Severity::Success, message }
    }

    fn info(message: String) -> Self {
        Self { severity: Severity::Info, message }
    }

    fn warning(message: String) -> Self {
        Self { severity: Severity::Warning, message }
    }
}

/// Data behind the "my network" view: current connections, incoming
/// requesters, and suggested new contacts.
#[derive(Debug, Serialize)]
pub struct NetworkOverview {
    pub profile: UserProfile,
    pub connections: Vec<UserProfile>,
    pub pending_requests: Vec<UserProfile>,
    pub suggestions: Vec<AnnotatedProfile>,
}

fn profile_link(id: i32) -> String {
    format!("/profiles/{id}")
}

/// The connection relationship manager. Owns the transition rules between
/// "unconnected", "request sent", "request received" and "connected" for
/// every pair of users; persistence, profile lookup and notification
/// delivery are pluggable collaborators.
pub struct RelationshipManager<S, D, N> {
    store: S,
    directory: D,
    notifier: N,
}

impl<S, D, N> RelationshipManager<S, D, N>
where
    S: RelationshipStore,
    D: ProfileDirectory,
    N: Notifier,
{
    pub fn new(store: S, directory: D, notifier: N) -> Self {
        Self { store, directory, notifier }
    }

    async fn profile(&self, id: i32) -> Result<UserProfile, RelationError> {
        self.directory
            .lookup(id)
            .await?
            .ok_or_else(|| RelationError::NotFound(format!("profile {id} not found")))
    }

    /// Relationship status as seen by `viewer`. Read-only; connection wins
    /// over an outstanding request in either direction.
    pub async fn status(&self, viewer: i32, other: i32) -> Result<ConnectionStatus, RelationError> {
        if self.store.connection_between(viewer, other).await?.is_some() {
            return Ok(ConnectionStatus::Connected);
        }
        if self.store.request_between(viewer, other).await?.is_some() {
            return Ok(ConnectionStatus::RequestSent);
        }
        if self.store.request_between(other, viewer).await?.is_some() {
            return Ok(ConnectionStatus::RequestReceived);
        }
        Ok(ConnectionStatus::None)
    }

    /// Send a connection request. Duplicate sends, existing connections and
    /// a pending reverse request are all reported as no-ops; only the fresh
    /// request notifies the receiver.
    pub async fn request_connection(
        &self,
        sender: i32,
        receiver: i32,
    ) -> Result<Feedback, RelationError> {
        if sender == receiver {
            return Err(RelationError::InvalidState(
                "you cannot send a connection request to yourself".to_string(),
            ));
        }

        let sender_profile = self.profile(sender).await?;
        let target = self.profile(receiver).await?;

        if self.store.request_between(sender, receiver).await?.is_some() {
            return Ok(Feedback::info(format!(
                "Connection request already sent to {}.",
                target.full_name
            )));
        }
        if self.store.connection_between(sender, receiver).await?.is_some() {
            return Ok(Feedback::info(format!(
                "You are already connected with {}.",
                target.full_name
            )));
        }
        if self.store.request_between(receiver, sender).await?.is_some() {
            return Ok(Feedback::info(format!(
                "{} has already sent you a connection request. Please check your pending requests.",
                target.full_name
            )));
        }

        match self.store.create_request(sender, receiver).await? {
            // Lost an insert race; same outcome as the duplicate check above.
            Claim::Existing => Ok(Feedback::info(format!(
                "Connection request already sent to {}.",
                target.full_name
            ))),
            Claim::Created(_) => {
                self.notifier
                    .send(
                        receiver,
                        NotificationKind::Connection,
                        &format!("{} sent you a connection request", sender_profile.full_name),
                        &profile_link(sender),
                    )
                    .await;
                Ok(Feedback::success(format!(
                    "Connection request sent to {}!",
                    target.full_name
                )))
            }
        }
    }

    /// Accept an incoming request. A missing request is an error; finding a
    /// connection already in place consumes the stale request and reports
    /// the connection as established.
    pub async fn accept_request(
        &self,
        accepter: i32,
        requester: i32,
    ) -> Result<Feedback, RelationError> {
        let accepter_profile = self.profile(accepter).await?;
        let requester_profile = self.profile(requester).await?;

        match self.store.accept_request(requester, accepter).await? {
            AcceptClaim::NoRequest => Err(RelationError::NotFound(format!(
                "no connection request found from {}",
                requester_profile.full_name
            ))),
            AcceptClaim::AlreadyConnected => Ok(Feedback::info(format!(
                "You are already connected with {}.",
                requester_profile.full_name
            ))),
            AcceptClaim::Connected(_) => {
                self.notifier
                    .send(
                        requester,
                        NotificationKind::Connection,
                        &format!(
                            "{} accepted your connection request",
                            accepter_profile.full_name
                        ),
                        &profile_link(accepter),
                    )
                    .await;
                Ok(Feedback::success(format!(
                    "You are now connected with {}!",
                    requester_profile.full_name
                )))
            }
        }
    }

    /// Withdraw an outgoing request. No notification either way.
    pub async fn cancel_request(
        &self,
        sender: i32,
        receiver: i32,
    ) -> Result<Feedback, RelationError> {
        let target = self.profile(receiver).await?;
        if self.store.delete_request(sender, receiver).await? {
            Ok(Feedback::info(format!(
                "Connection request to {} cancelled.",
                target.full_name
            )))
        } else {
            Ok(Feedback::warning(format!(
                "No connection request found to {}.",
                target.full_name
            )))
        }
    }

    /// Dismiss an incoming request. No notification either way.
    pub async fn ignore_request(
        &self,
        receiver: i32,
        sender: i32,
    ) -> Result<Feedback, RelationError> {
        let from = self.profile(sender).await?;
        if self.store.delete_request(sender, receiver).await? {
            Ok(Feedback::info(format!(
                "Connection request from {} ignored.",
                from.full_name
            )))
        } else {
            Ok(Feedback::warning(format!(
                "No connection request found from {}.",
                from.full_name
            )))
        }
    }

    /// Sever an established connection. No notification either way.
    pub async fn remove_connection(&self, a: i32, b: i32) -> Result<Feedback, RelationError> {
        let other = self.profile(b).await?;
        if self.store.delete_connection(a, b).await? {
            Ok(Feedback::info(format!(
                "Connection with {} removed.",
                other.full_name
            )))
        } else {
            Ok(Feedback::warning(format!(
                "No connection found with {}.",
                other.full_name
            )))
        }
    }

    /// Single funnel for the boundary layer: several pages mutate
    /// relationships through one endpoint carrying an action tag. Pure
    /// routing; each arm is also callable directly.
    pub async fn apply(
        &self,
        action: ConnectionAction,
        actor: i32,
        target: i32,
    ) -> Result<Feedback, RelationError> {
        match action {
            ConnectionAction::Create => self.request_connection(actor, target).await,
            ConnectionAction::Accept => self.accept_request(actor, target).await,
            ConnectionAction::Cancel => self.cancel_request(actor, target).await,
            ConnectionAction::Remove => self.remove_connection(actor, target).await,
            ConnectionAction::Ignore => self.ignore_request(actor, target).await,
        }
    }

    /// One button serves "cancel my outgoing request" and "ignore their
    /// incoming request": cancel wins when an outgoing request exists.
    pub async fn dismiss_request(&self, me: i32, other: i32) -> Result<Feedback, RelationError> {
        if self.store.request_between(me, other).await?.is_some() {
            self.cancel_request(me, other).await
        } else {
            self.ignore_request(me, other).await
        }
    }

    /// Data for the "my network" page: connected profiles, incoming
    /// requesters, and up to `SUGGESTION_LIMIT` suggested contacts. The
    /// suggestion list never contains the user, privileged accounts,
    /// existing connections, or anyone with a pending request in either
    /// direction.
    pub async fn network_overview(&self, user: i32) -> Result<NetworkOverview, RelationError> {
        let profile = self.profile(user).await?;

        let mut connections = Vec::new();
        let mut exclude = Vec::new();
        for connection in self.store.connections_of(user).await? {
            let other_id = connection.other(user);
            exclude.push(other_id);
            if let Some(other) = self.directory.lookup(other_id).await? {
                if !other.is_privileged() {
                    connections.push(other);
                }
            }
        }

        let mut pending_requests = Vec::new();
        for request in self.store.incoming_requests(user).await? {
            exclude.push(request.sender_id);
            if let Some(sender) = self.directory.lookup(request.sender_id).await? {
                if !sender.is_privileged() {
                    pending_requests.push(sender);
                }
            }
        }

        for request in self.store.outgoing_requests(user).await? {
            exclude.push(request.receiver_id);
        }

        let candidates = self
            .directory
            .suggestions(user, &exclude, SUGGESTION_LIMIT)
            .await?;
        let mut suggestions = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let connection_status = self.status(user, candidate.id).await?;
            suggestions.push(AnnotatedProfile { profile: candidate, connection_status });
        }

        Ok(NetworkOverview { profile, connections, pending_requests, suggestions })
    }

    /// Search the directory by name or university, annotating each hit with
    /// its status relative to the viewer. Blank input short-circuits to an
    /// empty result set.
    pub async fn search_profiles(
        &self,
        viewer: i32,
        query: &str,
        mode: SearchMode,
    ) -> Result<Vec<AnnotatedProfile>, RelationError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let hits = self.directory.search(viewer, trimmed, mode).await?;
        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            let connection_status = self.status(viewer, hit.id).await?;
            results.push(AnnotatedProfile { profile: hit, connection_status });
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::directory::MemoryDirectory;
    use crate::services::notifier::RecordingNotifier;
    use crate::services::store::MemoryStore;
    use chrono::Utc;

    fn profile(id: i32, full_name: &str, university: &str) -> UserProfile {
        UserProfile {
            id,
            username: format!("user{id}"),
            full_name: full_name.to_string(),
            university: if university.is_empty() {
                None
            } else {
                Some(university.to_string())
            },
            is_staff: false,
            is_superuser: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn staff_profile(id: i32, full_name: &str) -> UserProfile {
        UserProfile {
            is_staff: true,
            ..profile(id, full_name, "")
        }
    }

    fn manager() -> (
        RelationshipManager<MemoryStore, MemoryDirectory, RecordingNotifier>,
        MemoryStore,
        RecordingNotifier,
    ) {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::default();
        let directory = MemoryDirectory::new(vec![
            profile(1, "Alice Ahmed", "Aalto University"),
            profile(2, "Bob Berg", "TU Berlin"),
            profile(3, "Carol Costa", "Aalto University"),
            profile(4, "Dan Dorn", "TU Berlin"),
            profile(5, "Eve Eriksen", "Lund University"),
            staff_profile(6, "Site Admin"),
        ]);
        (
            RelationshipManager::new(store.clone(), directory, notifier.clone()),
            store,
            notifier,
        )
    }

    #[tokio::test]
    async fn test_status_is_mirrored_between_both_sides() {
        let (manager, _store, _notifier) = manager();

        assert_eq!(manager.status(1, 2).await.unwrap(), ConnectionStatus::None);
        assert_eq!(manager.status(2, 1).await.unwrap(), ConnectionStatus::None);

        manager.request_connection(1, 2).await.unwrap();
        assert_eq!(manager.status(1, 2).await.unwrap(), ConnectionStatus::RequestSent);
        assert_eq!(manager.status(2, 1).await.unwrap(), ConnectionStatus::RequestReceived);
        assert_eq!(
            manager.status(1, 2).await.unwrap().mirrored(),
            manager.status(2, 1).await.unwrap()
        );

        manager.accept_request(2, 1).await.unwrap();
        assert_eq!(manager.status(1, 2).await.unwrap(), ConnectionStatus::Connected);
        assert_eq!(manager.status(2, 1).await.unwrap(), ConnectionStatus::Connected);
    }

    #[tokio::test]
    async fn test_mutual_requests_do_not_duplicate() {
        let (manager, store, notifier) = manager();

        let first = manager.request_connection(1, 2).await.unwrap();
        assert_eq!(first.severity, Severity::Success);

        let second = manager.request_connection(2, 1).await.unwrap();
        assert_eq!(second.severity, Severity::Info);
        assert!(second.message.contains("already sent you a connection request"));

        assert_eq!(store.request_count(), 1);
        assert_eq!(store.connection_count(), 0);
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_accept_consumes_request_and_notifies_requester() {
        let (manager, store, notifier) = manager();

        manager.request_connection(1, 2).await.unwrap();
        let accepted = manager.accept_request(2, 1).await.unwrap();
        assert_eq!(accepted.severity, Severity::Success);

        assert_eq!(store.connection_count(), 1);
        assert_eq!(store.request_count(), 0);
        assert_eq!(manager.status(1, 2).await.unwrap(), ConnectionStatus::Connected);
        assert_eq!(manager.status(2, 1).await.unwrap(), ConnectionStatus::Connected);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].recipient, 1);
        assert_eq!(sent[1].kind, NotificationKind::Connection);
        assert!(sent[1].message.contains("accepted your connection request"));
        assert_eq!(sent[1].link, "/profiles/2");
    }

    #[tokio::test]
    async fn test_duplicate_request_is_a_noop() {
        let (manager, store, notifier) = manager();

        manager.request_connection(1, 2).await.unwrap();
        let repeat = manager.request_connection(1, 2).await.unwrap();

        assert_eq!(repeat.severity, Severity::Info);
        assert!(repeat.message.contains("already sent"));
        assert_eq!(store.request_count(), 1);
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_request_to_self_is_rejected() {
        let (manager, store, _notifier) = manager();

        let err = manager.request_connection(1, 1).await.unwrap_err();
        assert!(matches!(err, RelationError::InvalidState(_)));
        assert_eq!(store.request_count(), 0);
    }

    #[tokio::test]
    async fn test_request_between_connected_users_is_a_noop() {
        let (manager, store, notifier) = manager();

        manager.request_connection(1, 2).await.unwrap();
        manager.accept_request(2, 1).await.unwrap();

        let again = manager.request_connection(1, 2).await.unwrap();
        assert_eq!(again.severity, Severity::Info);
        assert!(again.message.contains("already connected"));
        assert_eq!(store.request_count(), 0);
        assert_eq!(store.connection_count(), 1);
        assert_eq!(notifier.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_accept_without_request_is_not_found() {
        let (manager, _store, notifier) = manager();

        let err = manager.accept_request(2, 1).await.unwrap_err();
        assert!(matches!(err, RelationError::NotFound(_)));
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_accept_with_stale_connection_consumes_request_leniently() {
        let (manager, store, notifier) = manager();

        // Race artifact: a connection landed while the request still exists.
        manager.request_connection(1, 2).await.unwrap();
        store.force_connection(1, 2);

        let outcome = manager.accept_request(2, 1).await.unwrap();
        assert_eq!(outcome.severity, Severity::Info);
        assert!(outcome.message.contains("already connected"));
        assert_eq!(store.request_count(), 0);
        assert_eq!(store.connection_count(), 1);
        // Only the original request notification; no acceptance notice.
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_twice_reports_not_found_without_state_change() {
        let (manager, store, _notifier) = manager();

        manager.request_connection(1, 2).await.unwrap();
        let first = manager.cancel_request(1, 2).await.unwrap();
        assert_eq!(first.severity, Severity::Info);
        assert_eq!(store.request_count(), 0);

        let second = manager.cancel_request(1, 2).await.unwrap();
        assert_eq!(second.severity, Severity::Warning);
        assert_eq!(store.request_count(), 0);
    }

    #[tokio::test]
    async fn test_ignore_dismisses_incoming_request_silently() {
        let (manager, store, notifier) = manager();

        manager.request_connection(1, 2).await.unwrap();
        let ignored = manager.ignore_request(2, 1).await.unwrap();
        assert_eq!(ignored.severity, Severity::Info);
        assert_eq!(store.request_count(), 0);
        // The sender is never told.
        assert_eq!(notifier.sent().len(), 1);

        let repeat = manager.ignore_request(2, 1).await.unwrap();
        assert_eq!(repeat.severity, Severity::Warning);
    }

    #[tokio::test]
    async fn test_remove_connection_reverts_both_sides_to_none() {
        let (manager, store, _notifier) = manager();

        manager.request_connection(1, 2).await.unwrap();
        manager.accept_request(2, 1).await.unwrap();
        assert_eq!(store.connection_count(), 1);

        let removed = manager.remove_connection(2, 1).await.unwrap();
        assert_eq!(removed.severity, Severity::Info);
        assert_eq!(store.connection_count(), 0);
        assert_eq!(manager.status(1, 2).await.unwrap(), ConnectionStatus::None);
        assert_eq!(manager.status(2, 1).await.unwrap(), ConnectionStatus::None);

        let repeat = manager.remove_connection(2, 1).await.unwrap();
        assert_eq!(repeat.severity, Severity::Warning);
    }

    #[tokio::test]
    async fn test_apply_routes_every_action() {
        let (manager, store, _notifier) = manager();

        manager.apply(ConnectionAction::Create, 1, 2).await.unwrap();
        assert_eq!(store.request_count(), 1);

        manager.apply(ConnectionAction::Accept, 2, 1).await.unwrap();
        assert_eq!(store.connection_count(), 1);

        manager.apply(ConnectionAction::Remove, 1, 2).await.unwrap();
        assert_eq!(store.connection_count(), 0);

        manager.apply(ConnectionAction::Create, 3, 1).await.unwrap();
        manager.apply(ConnectionAction::Ignore, 1, 3).await.unwrap();
        assert_eq!(store.request_count(), 0);

        manager.apply(ConnectionAction::Create, 1, 3).await.unwrap();
        manager.apply(ConnectionAction::Cancel, 1, 3).await.unwrap();
        assert_eq!(store.request_count(), 0);
    }

    #[tokio::test]
    async fn test_dismiss_prefers_cancelling_own_outgoing_request() {
        let (manager, store, _notifier) = manager();

        manager.request_connection(1, 2).await.unwrap();
        let outcome = manager.dismiss_request(1, 2).await.unwrap();
        assert!(outcome.message.contains("cancelled"));
        assert_eq!(store.request_count(), 0);

        manager.request_connection(2, 1).await.unwrap();
        let outcome = manager.dismiss_request(1, 2).await.unwrap();
        assert!(outcome.message.contains("ignored"));
        assert_eq!(store.request_count(), 0);
    }

    #[tokio::test]
    async fn test_suggestions_exclude_self_staff_connected_and_pending() {
        let (manager, _store, _notifier) = manager();

        // 1 <-> 2 connected, 1 -> 3 outgoing, 4 -> 1 incoming.
        manager.request_connection(1, 2).await.unwrap();
        manager.accept_request(2, 1).await.unwrap();
        manager.request_connection(1, 3).await.unwrap();
        manager.request_connection(4, 1).await.unwrap();

        let overview = manager.network_overview(1).await.unwrap();

        assert_eq!(overview.connections.len(), 1);
        assert_eq!(overview.connections[0].id, 2);
        assert_eq!(overview.pending_requests.len(), 1);
        assert_eq!(overview.pending_requests[0].id, 4);

        let suggested: Vec<i32> = overview.suggestions.iter().map(|s| s.profile.id).collect();
        assert_eq!(suggested, vec![5]);
        assert_eq!(overview.suggestions[0].connection_status, ConnectionStatus::None);
    }

    #[tokio::test]
    async fn test_search_annotates_results_with_status() {
        let (manager, _store, _notifier) = manager();

        manager.request_connection(1, 3).await.unwrap();

        let results = manager
            .search_profiles(1, "aalto", SearchMode::University)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].profile.id, 3);
        assert_eq!(results[0].connection_status, ConnectionStatus::RequestSent);

        let by_name = manager.search_profiles(1, "BERG", SearchMode::Name).await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].profile.id, 2);
        assert_eq!(by_name[0].connection_status, ConnectionStatus::None);
    }

    #[tokio::test]
    async fn test_search_excludes_self_and_staff_and_blank_input() {
        let (manager, _store, _notifier) = manager();

        let blank = manager.search_profiles(1, "   ", SearchMode::Name).await.unwrap();
        assert!(blank.is_empty());

        let admin = manager.search_profiles(1, "admin", SearchMode::Name).await.unwrap();
        assert!(admin.is_empty());

        let me = manager.search_profiles(1, "Alice", SearchMode::Name).await.unwrap();
        assert!(me.is_empty());
    }

    #[tokio::test]
    async fn test_request_to_unknown_profile_is_not_found() {
        let (manager, store, _notifier) = manager();

        let err = manager.request_connection(1, 99).await.unwrap_err();
        assert!(matches!(err, RelationError::NotFound(_)));
        assert_eq!(store.request_count(), 0);
    }
}
