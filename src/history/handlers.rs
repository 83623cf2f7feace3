use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::CreateHistoryRequest,
    repo_types::{NewHistory, PredictionHistory},
};
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    state::AppState,
};

pub fn history_routes() -> Router<AppState> {
    Router::new().route("/history", get(list_history).post(create_history))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<CreateHistoryRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<PredictionHistory>)> {
    let Json(payload) = payload?;
    let (inputs, predicted_quality) = payload.validate()?;

    let created = state
        .history
        .insert(NewHistory {
            user_id: user.id,
            inputs,
            predicted_quality,
        })
        .await
        .map_err(|e| AppError::server("Error saving history", e))?;

    info!(history_id = %created.id, "prediction history saved");
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<PredictionHistory>>> {
    let rows = state
        .history
        .list_by_user(user.id)
        .await
        .map_err(|e| AppError::server("Error fetching history", e))?;
    Ok(Json(rows))
}
