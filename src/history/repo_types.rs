use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Form inputs of one prediction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SleepInputs {
    pub age: i32,
    pub gender: String,
    pub occupation: String,
    pub sleep_duration: f64,
    pub activity_level: i32,
    pub stress_level: i32,
    pub bmi_category: String,
    pub heart_rate: i32,
    pub daily_steps: i32,
    pub blood_pressure: String, // "<systolic>/<diastolic>"
    pub sleep_disorder: String,
}

/// Immutable snapshot of one prediction and its score.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PredictionHistory {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub inputs: SleepInputs,
    #[serde(rename = "predicted_quality")]
    pub predicted_quality: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Snapshot joined with its owner's current name and email.
#[derive(Debug, Clone, FromRow)]
pub struct HistoryWithUser {
    #[sqlx(flatten)]
    pub history: PredictionHistory,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewHistory {
    pub user_id: Uuid,
    pub inputs: SleepInputs,
    pub predicted_quality: f64,
}
