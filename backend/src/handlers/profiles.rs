use axum::{extract::State, http::StatusCode, response::Json};
use serde::Deserialize;

use crate::db::profiles;
use crate::handlers::{ApiError, AppState};
use crate::models::UserProfile;
use crate::services::StoreError;

#[derive(Debug, Deserialize)]
pub struct CreateProfileBody {
    pub username: String,
    pub full_name: String,
    pub university: Option<String>,
}

pub async fn create_profile(
    State(state): State<AppState>,
    Json(body): Json<CreateProfileBody>,
) -> Result<(StatusCode, Json<UserProfile>), (StatusCode, Json<ApiError>)> {
    let username = body.username.trim();
    let full_name = body.full_name.trim();
    if username.is_empty() || full_name.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError { error: "username and full_name are required".to_string() }),
        ));
    }

    let university = body.university.as_deref().map(str::trim).filter(|u| !u.is_empty());

    match profiles::create_profile(&state.pool, username, full_name, university).await {
        Ok(profile) => Ok((StatusCode::CREATED, Json(profile))),
        Err(StoreError::Database(err)) if is_unique_violation(&err) => Err((
            StatusCode::CONFLICT,
            Json(ApiError { error: format!("username {username} is already taken") }),
        )),
        Err(err) => {
            tracing::error!(error = %err, "failed to create profile");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError { error: "internal error".to_string() }),
            ))
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
