pub mod connections;
pub mod profiles;
pub mod search;

pub use connections::{
    accept_request, apply_action, connection_status, dismiss_request, network_overview,
    remove_connection, request_connection,
};
pub use profiles::create_profile;
pub use search::search_profiles;

use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;

use crate::db::{PgProfileDirectory, PgRelationshipStore};
use crate::services::{RelationError, RelationshipManager, WebhookNotifier};

pub type AppService =
    RelationshipManager<PgRelationshipStore, PgProfileDirectory, WebhookNotifier>;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub service: Arc<AppService>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

pub(crate) fn error_response(err: RelationError) -> (StatusCode, Json<ApiError>) {
    let (status, message) = match &err {
        RelationError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        RelationError::AlreadyExists(_) => (StatusCode::CONFLICT, err.to_string()),
        RelationError::InvalidState(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        RelationError::PermissionDenied(_) => (StatusCode::FORBIDDEN, err.to_string()),
        RelationError::Store(store_err) => {
            tracing::error!(error = %store_err, "relationship store failure");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
        }
    };
    (status, Json(ApiError { error: message }))
}
