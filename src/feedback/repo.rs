use anyhow::Context;
use axum::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Feedback, FeedbackWithUser, NewFeedback};

#[async_trait]
pub trait FeedbackRepo: Send + Sync {
    async fn insert(&self, entry: NewFeedback) -> anyhow::Result<Feedback>;
    /// Every entry, newest first.
    async fn list_all(&self) -> anyhow::Result<Vec<FeedbackWithUser>>;
}

const FEEDBACK_COLUMNS: &str = r#"
    f.id, f.user_id, f.rating, f.feedback, f.user_name, f.user_email,
    f.prediction_score, f.created_at, f.updated_at
"#;

#[derive(Clone)]
pub struct PgFeedbackRepo {
    db: PgPool,
}

impl PgFeedbackRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FeedbackRepo for PgFeedbackRepo {
    async fn insert(&self, entry: NewFeedback) -> anyhow::Result<Feedback> {
        let row = sqlx::query_as::<_, Feedback>(&format!(
            r#"
            INSERT INTO feedback AS f
                (id, user_id, rating, feedback, user_name, user_email, prediction_score)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {FEEDBACK_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(entry.user_id)
        .bind(entry.rating)
        .bind(&entry.feedback)
        .bind(&entry.user_name)
        .bind(&entry.user_email)
        .bind(entry.prediction_score)
        .fetch_one(&self.db)
        .await
        .context("insert feedback")?;
        Ok(row)
    }

    async fn list_all(&self) -> anyhow::Result<Vec<FeedbackWithUser>> {
        let rows = sqlx::query_as::<_, FeedbackWithUser>(&format!(
            r#"
            SELECT {FEEDBACK_COLUMNS}, u.name AS owner_name
              FROM feedback f
              LEFT JOIN users u ON u.id = f.user_id
             ORDER BY f.created_at DESC, f.seq DESC
            "#
        ))
        .fetch_all(&self.db)
        .await
        .context("list feedback")?;
        Ok(rows)
    }
}
