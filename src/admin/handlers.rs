use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{AdminFeedbackEntry, AdminHistoryEntry, AdminStats};
use crate::{
    auth::{dto::MessageResponse, extractors::AdminUser, repo_types::User},
    error::{AppError, AppResult},
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id", delete(delete_user))
        .route("/admin/history", get(list_history))
        .route("/admin/feedback", get(list_feedback))
        .route("/admin/stats", get(stats))
}

#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> AppResult<Json<Vec<User>>> {
    let users = state
        .users
        .list()
        .await
        .map_err(|e| AppError::server("Error fetching users", e))?;
    Ok(Json(users))
}

/// Removes a user and, through the store, their history and feedback.
/// Admin accounts cannot be removed this way.
#[instrument(skip_all, fields(admin_id = %admin.id, user_id = %id))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    const NOT_FOUND: &str = "User not found";
    let id = Uuid::parse_str(&id).map_err(|_| AppError::not_found(NOT_FOUND))?;

    let target = state
        .users
        .find_by_id(id)
        .await
        .map_err(|e| AppError::server("Error deleting user", e))?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    if target.is_admin() {
        warn!(target_id = %target.id, "refusing to delete admin account");
        return Err(AppError::forbidden("Cannot delete admin"));
    }

    let removed = state
        .users
        .delete(target.id)
        .await
        .map_err(|e| AppError::server("Error deleting user", e))?;
    if !removed {
        return Err(AppError::not_found(NOT_FOUND));
    }

    info!(target_id = %target.id, email = %target.email, "user removed");
    Ok(Json(MessageResponse {
        message: "User removed",
    }))
}

#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn list_history(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> AppResult<Json<Vec<AdminHistoryEntry>>> {
    let rows = state
        .history
        .list_all()
        .await
        .map_err(|e| AppError::server("Error fetching history", e))?;
    Ok(Json(rows.into_iter().map(AdminHistoryEntry::from).collect()))
}

#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn list_feedback(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> AppResult<Json<Vec<AdminFeedbackEntry>>> {
    let rows = state
        .feedback
        .list_all()
        .await
        .map_err(|e| AppError::server("Error fetching feedback", e))?;
    Ok(Json(rows.into_iter().map(AdminFeedbackEntry::from).collect()))
}

#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn stats(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> AppResult<Json<AdminStats>> {
    let (users, history, feedback) = tokio::try_join!(
        state.users.list(),
        state.history.list_all(),
        state.feedback.list_all(),
    )
    .map_err(|e| AppError::server("Error computing stats", e))?;

    Ok(Json(AdminStats::compute(
        users.len(),
        history.iter().map(|h| &h.history),
        feedback.iter().map(|f| f.feedback.rating),
    )))
}
