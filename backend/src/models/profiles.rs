use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::connections::ConnectionStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub id: i32,
    pub username: String,
    pub full_name: String,
    pub university: Option<String>,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Staff and superuser accounts never appear in search or suggestions.
    pub fn is_privileged(&self) -> bool {
        self.is_staff || self.is_superuser
    }
}

/// A profile annotated with its relationship status relative to a viewer,
/// as rendered in search results and suggestion lists.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotatedProfile {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub connection_status: ConnectionStatus,
}

/// Which profile attribute a search matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Name,
    University,
}
