use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::{SearchMode, UserProfile};
use crate::services::directory::ProfileDirectory;
use crate::services::store::StoreError;

const PROFILE_COLUMNS: &str =
    "id, username, full_name, university, is_staff, is_superuser, created_at, updated_at";

pub async fn get_profile_by_id(pool: &PgPool, id: i32) -> Result<Option<UserProfile>, StoreError> {
    let profile = sqlx::query_as::<_, UserProfile>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(profile)
}

pub async fn create_profile(
    pool: &PgPool,
    username: &str,
    full_name: &str,
    university: Option<&str>,
) -> Result<UserProfile, StoreError> {
    let profile = sqlx::query_as::<_, UserProfile>(&format!(
        r#"
        INSERT INTO user_profiles (username, full_name, university)
        VALUES ($1, $2, $3)
        RETURNING {PROFILE_COLUMNS}
        "#
    ))
    .bind(username)
    .bind(full_name)
    .bind(university)
    .fetch_one(pool)
    .await?;

    Ok(profile)
}

/// Escapes LIKE/ILIKE metacharacters so the query input matches as a
/// literal substring, mirroring the in-memory directory's `contains`.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Postgres-backed profile directory.
#[derive(Debug, Clone)]
pub struct PgProfileDirectory {
    pool: PgPool,
}

impl PgProfileDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileDirectory for PgProfileDirectory {
    async fn lookup(&self, id: i32) -> Result<Option<UserProfile>, StoreError> {
        get_profile_by_id(&self.pool, id).await
    }

    async fn search(
        &self,
        viewer: i32,
        query: &str,
        mode: SearchMode,
    ) -> Result<Vec<UserProfile>, StoreError> {
        let column = match mode {
            SearchMode::Name => "full_name",
            SearchMode::University => "university",
        };
        let profiles = sqlx::query_as::<_, UserProfile>(&format!(
            r#"
            SELECT {PROFILE_COLUMNS}
            FROM user_profiles
            WHERE id <> $1
              AND NOT is_staff
              AND NOT is_superuser
              AND {column} ILIKE '%' || $2 || '%' ESCAPE '\'
            "#
        ))
        .bind(viewer)
        .bind(escape_like(query))
        .fetch_all(&self.pool)
        .await?;

        Ok(profiles)
    }

    async fn suggestions(
        &self,
        viewer: i32,
        exclude: &[i32],
        limit: i64,
    ) -> Result<Vec<UserProfile>, StoreError> {
        let profiles = sqlx::query_as::<_, UserProfile>(&format!(
            r#"
            SELECT {PROFILE_COLUMNS}
            FROM user_profiles
            WHERE id <> $1
              AND NOT is_staff
              AND NOT is_superuser
              AND id <> ALL($2)
            LIMIT $3
            "#
        ))
        .bind(viewer)
        .bind(exclude)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_handles_wildcards_literally() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain text"), "plain text");
    }

    #[test]
    fn test_escape_like_escapes_every_occurrence() {
        assert_eq!(escape_like("%_%"), "\\%\\_\\%");
    }
}
