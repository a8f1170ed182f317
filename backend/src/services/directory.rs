use async_trait::async_trait;

use crate::models::{SearchMode, UserProfile};
use crate::services::store::StoreError;

/// Read-only view of the profile directory. Search and suggestions exclude
/// the viewer and privileged (staff/superuser) accounts at the source.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn lookup(&self, id: i32) -> Result<Option<UserProfile>, StoreError>;

    /// Case-insensitive substring match on the attribute selected by `mode`.
    async fn search(
        &self,
        viewer: i32,
        query: &str,
        mode: SearchMode,
    ) -> Result<Vec<UserProfile>, StoreError>;

    /// Up to `limit` candidate profiles, excluding the viewer, privileged
    /// accounts, and every id in `exclude`. Ordering is store-default;
    /// callers must not depend on it.
    async fn suggestions(
        &self,
        viewer: i32,
        exclude: &[i32],
        limit: i64,
    ) -> Result<Vec<UserProfile>, StoreError>;
}

/// In-memory directory seeded at construction. Used by the unit tests and
/// as a dev backend alongside `MemoryStore`.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    profiles: Vec<UserProfile>,
}

impl MemoryDirectory {
    pub fn new(profiles: Vec<UserProfile>) -> Self {
        Self { profiles }
    }
}

fn attribute<'a>(profile: &'a UserProfile, mode: SearchMode) -> Option<&'a str> {
    match mode {
        SearchMode::Name => Some(profile.full_name.as_str()),
        SearchMode::University => profile.university.as_deref(),
    }
}

#[async_trait]
impl ProfileDirectory for MemoryDirectory {
    async fn lookup(&self, id: i32) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn search(
        &self,
        viewer: i32,
        query: &str,
        mode: SearchMode,
    ) -> Result<Vec<UserProfile>, StoreError> {
        let needle = query.to_lowercase();
        Ok(self
            .profiles
            .iter()
            .filter(|p| p.id != viewer && !p.is_privileged())
            .filter(|p| {
                attribute(p, mode)
                    .map(|value| value.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn suggestions(
        &self,
        viewer: i32,
        exclude: &[i32],
        limit: i64,
    ) -> Result<Vec<UserProfile>, StoreError> {
        Ok(self
            .profiles
            .iter()
            .filter(|p| p.id != viewer && !p.is_privileged() && !exclude.contains(&p.id))
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
