use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::handlers::{ApiError, AppState, error_response};
use crate::models::{ConnectionAction, ConnectionStatus};
use crate::services::{Feedback, NetworkOverview};

#[derive(Debug, Deserialize)]
pub struct PairBody {
    pub actor_id: i32,
    pub target_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct ActionBody {
    pub action: ConnectionAction,
    pub actor_id: i32,
    pub target_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub viewer_id: i32,
    pub other_id: i32,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: ConnectionStatus,
}

type HandlerResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

pub async fn connection_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> HandlerResult<StatusResponse> {
    let status = state
        .service
        .status(query.viewer_id, query.other_id)
        .await
        .map_err(error_response)?;
    Ok(Json(StatusResponse { status }))
}

/// Single relationship-mutation funnel: several pages post here with an
/// action tag instead of hitting the dedicated endpoints.
pub async fn apply_action(
    State(state): State<AppState>,
    Json(body): Json<ActionBody>,
) -> HandlerResult<Feedback> {
    let feedback = state
        .service
        .apply(body.action, body.actor_id, body.target_id)
        .await
        .map_err(error_response)?;
    Ok(Json(feedback))
}

pub async fn request_connection(
    State(state): State<AppState>,
    Json(body): Json<PairBody>,
) -> HandlerResult<Feedback> {
    let feedback = state
        .service
        .request_connection(body.actor_id, body.target_id)
        .await
        .map_err(error_response)?;
    Ok(Json(feedback))
}

pub async fn accept_request(
    State(state): State<AppState>,
    Json(body): Json<PairBody>,
) -> HandlerResult<Feedback> {
    let feedback = state
        .service
        .accept_request(body.actor_id, body.target_id)
        .await
        .map_err(error_response)?;
    Ok(Json(feedback))
}

/// Cancels the actor's outgoing request if one exists, otherwise ignores
/// the target's incoming request.
pub async fn dismiss_request(
    State(state): State<AppState>,
    Json(body): Json<PairBody>,
) -> HandlerResult<Feedback> {
    let feedback = state
        .service
        .dismiss_request(body.actor_id, body.target_id)
        .await
        .map_err(error_response)?;
    Ok(Json(feedback))
}

pub async fn remove_connection(
    State(state): State<AppState>,
    Json(body): Json<PairBody>,
) -> HandlerResult<Feedback> {
    let feedback = state
        .service
        .remove_connection(body.actor_id, body.target_id)
        .await
        .map_err(error_response)?;
    Ok(Json(feedback))
}

pub async fn network_overview(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> HandlerResult<NetworkOverview> {
    let overview = state
        .service
        .network_overview(user_id)
        .await
        .map_err(error_response)?;
    Ok(Json(overview))
}
