use anyhow::Context;
use axum::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{HistoryWithUser, NewHistory, PredictionHistory};

#[async_trait]
pub trait HistoryRepo: Send + Sync {
    async fn insert(&self, entry: NewHistory) -> anyhow::Result<PredictionHistory>;
    /// Newest first.
    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<PredictionHistory>>;
    /// Every snapshot, newest first, with owner name/email.
    async fn list_all(&self) -> anyhow::Result<Vec<HistoryWithUser>>;
}

const HISTORY_COLUMNS: &str = r#"
    h.id, h.user_id, h.age, h.gender, h.occupation, h.sleep_duration, h.activity_level,
    h.stress_level, h.bmi_category, h.heart_rate, h.daily_steps, h.blood_pressure,
    h.sleep_disorder, h.predicted_quality, h.created_at, h.updated_at
"#;

#[derive(Clone)]
pub struct PgHistoryRepo {
    db: PgPool,
}

impl PgHistoryRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl HistoryRepo for PgHistoryRepo {
    async fn insert(&self, entry: NewHistory) -> anyhow::Result<PredictionHistory> {
        let NewHistory {
            user_id,
            inputs: i,
            predicted_quality,
        } = entry;
        let row = sqlx::query_as::<_, PredictionHistory>(&format!(
            r#"
            INSERT INTO prediction_history AS h (
                id, user_id, age, gender, occupation, sleep_duration, activity_level,
                stress_level, bmi_category, heart_rate, daily_steps, blood_pressure,
                sleep_disorder, predicted_quality
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {HISTORY_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(i.age)
        .bind(&i.gender)
        .bind(&i.occupation)
        .bind(i.sleep_duration)
        .bind(i.activity_level)
        .bind(i.stress_level)
        .bind(&i.bmi_category)
        .bind(i.heart_rate)
        .bind(i.daily_steps)
        .bind(&i.blood_pressure)
        .bind(&i.sleep_disorder)
        .bind(predicted_quality)
        .fetch_one(&self.db)
        .await
        .context("insert prediction history")?;
        Ok(row)
    }

    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<PredictionHistory>> {
        let rows = sqlx::query_as::<_, PredictionHistory>(&format!(
            r#"
            SELECT {HISTORY_COLUMNS}
              FROM prediction_history h
             WHERE h.user_id = $1
             ORDER BY h.created_at DESC, h.seq DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list history by user")?;
        Ok(rows)
    }

    async fn list_all(&self) -> anyhow::Result<Vec<HistoryWithUser>> {
        let rows = sqlx::query_as::<_, HistoryWithUser>(&format!(
            r#"
            SELECT {HISTORY_COLUMNS}, u.name AS user_name, u.email AS user_email
              FROM prediction_history h
              LEFT JOIN users u ON u.id = h.user_id
             ORDER BY h.created_at DESC, h.seq DESC
            "#
        ))
        .fetch_all(&self.db)
        .await
        .context("list all history")?;
        Ok(rows)
    }
}
