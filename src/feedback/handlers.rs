use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument};

use super::{dto::CreateFeedbackRequest, repo_types::NewFeedback};
use crate::{
    auth::{dto::MessageResponse, extractors::AuthUser},
    error::{AppError, AppResult},
    state::AppState,
};

pub fn feedback_routes() -> Router<AppState> {
    Router::new().route("/feedback", post(submit_feedback))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn submit_feedback(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<CreateFeedbackRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let Json(payload) = payload?;
    let valid = payload.validate()?;

    let saved = state
        .feedback
        .insert(NewFeedback {
            user_id: user.id,
            user_name: user.name.clone(),
            user_email: user.email.clone(),
            rating: valid.rating,
            feedback: valid.feedback,
            prediction_score: valid.prediction_score,
        })
        .await
        .map_err(|e| AppError::server("Error submitting feedback", e))?;

    info!(feedback_id = %saved.id, rating = saved.rating, "feedback submitted");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Feedback submitted",
        }),
    ))
}
