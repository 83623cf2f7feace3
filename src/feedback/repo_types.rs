use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub rating: i32,
    pub feedback: String,
    pub user_name: String,  // copied at submission time
    pub user_email: String, // copied at submission time
    pub prediction_score: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Feedback joined with the submitter's current name.
#[derive(Debug, Clone, FromRow)]
pub struct FeedbackWithUser {
    #[sqlx(flatten)]
    pub feedback: Feedback,
    pub owner_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub rating: i32,
    pub feedback: String,
    pub prediction_score: Option<f64>,
}
