use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{PredictRequest, PredictResponse, QualityLabel};
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    history::{
        dto::{is_valid_quality, MAX_QUALITY, MIN_QUALITY},
        repo_types::NewHistory,
    },
    state::AppState,
};

pub fn predict_routes() -> Router<AppState> {
    Router::new().route("/predict", post(predict))
}

/// Scores the form with the external model and stores the snapshot.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn predict(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<PredictResponse>)> {
    let Json(payload) = payload?;
    let input = payload.validate()?;

    let score = state
        .predictor
        .predict(&input)
        .await
        .map_err(|e| AppError::server("Prediction service unavailable", e))?;
    if !is_valid_quality(score) {
        return Err(AppError::server(
            "Prediction service unavailable",
            anyhow::anyhow!("model score {score} outside {MIN_QUALITY}..={MAX_QUALITY}"),
        ));
    }

    let history = state
        .history
        .insert(NewHistory {
            user_id: user.id,
            inputs: input.sleep_inputs(),
            predicted_quality: score,
        })
        .await
        .map_err(|e| AppError::server("Error saving history", e))?;

    let quality = QualityLabel::from_score(score);
    info!(history_id = %history.id, score, ?quality, "prediction stored");
    Ok((
        StatusCode::CREATED,
        Json(PredictResponse {
            prediction: score,
            quality,
            history,
        }),
    ))
}
