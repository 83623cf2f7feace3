//! In-memory stand-ins for the Postgres stores and the prediction service.

use std::sync::Mutex;

use axum::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::{
        repo::{UserRepo, UserRepoError},
        repo_types::{NewUser, User},
    },
    feedback::{
        repo::FeedbackRepo,
        repo_types::{Feedback, FeedbackWithUser, NewFeedback},
    },
    history::{
        repo::HistoryRepo,
        repo_types::{HistoryWithUser, NewHistory, PredictionHistory},
    },
    predict::{client::Predictor, dto::ModelInput},
};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    history: Vec<PredictionHistory>, // insertion order
    feedback: Vec<Feedback>,         // insertion order
}

/// Mirrors the schema: unique emails, cascade on user delete.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, UserRepoError> {
        let mut inner = self.lock();
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(UserRepoError::EmailTaken);
        }
        let now = OffsetDateTime::now_utc();
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            reset_nonce: None,
            created_at: now,
            updated_at: now,
        };
        inner.users.push(created.clone());
        Ok(created)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, UserRepoError> {
        let mut inner = self.lock();
        if let Some(email) = email {
            if inner.users.iter().any(|u| u.email == email && u.id != id) {
                return Err(UserRepoError::EmailTaken);
            }
        }
        let Some(user) = inner.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = name {
            user.name = name.to_string();
        }
        if let Some(email) = email {
            user.email = email.to_string();
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn set_reset_nonce(&self, id: Uuid, nonce: Option<Uuid>) -> anyhow::Result<()> {
        if let Some(user) = self.lock().users.iter_mut().find(|u| u.id == id) {
            user.reset_nonce = nonce;
        }
        Ok(())
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        nonce: Uuid,
    ) -> anyhow::Result<bool> {
        let mut inner = self.lock();
        let Some(user) = inner
            .users
            .iter_mut()
            .find(|u| u.id == id && u.reset_nonce == Some(nonce))
        else {
            return Ok(false);
        };
        user.password_hash = password_hash.to_string();
        user.reset_nonce = None;
        user.updated_at = OffsetDateTime::now_utc();
        Ok(true)
    }

    async fn list(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.lock().users.clone())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut inner = self.lock();
        let before = inner.users.len();
        inner.users.retain(|u| u.id != id);
        if inner.users.len() == before {
            return Ok(false);
        }
        inner.history.retain(|h| h.user_id != id);
        inner.feedback.retain(|f| f.user_id != id);
        Ok(true)
    }
}

#[async_trait]
impl HistoryRepo for MemoryStore {
    async fn insert(&self, entry: NewHistory) -> anyhow::Result<PredictionHistory> {
        let now = OffsetDateTime::now_utc();
        let row = PredictionHistory {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            inputs: entry.inputs,
            predicted_quality: entry.predicted_quality,
            created_at: now,
            updated_at: now,
        };
        self.lock().history.push(row.clone());
        Ok(row)
    }

    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<PredictionHistory>> {
        Ok(self
            .lock()
            .history
            .iter()
            .rev()
            .filter(|h| h.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> anyhow::Result<Vec<HistoryWithUser>> {
        let inner = self.lock();
        Ok(inner
            .history
            .iter()
            .rev()
            .map(|h| {
                let owner = inner.users.iter().find(|u| u.id == h.user_id);
                HistoryWithUser {
                    history: h.clone(),
                    user_name: owner.map(|u| u.name.clone()),
                    user_email: owner.map(|u| u.email.clone()),
                }
            })
            .collect())
    }
}

#[async_trait]
impl FeedbackRepo for MemoryStore {
    async fn insert(&self, entry: NewFeedback) -> anyhow::Result<Feedback> {
        let now = OffsetDateTime::now_utc();
        let row = Feedback {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            rating: entry.rating,
            feedback: entry.feedback,
            user_name: entry.user_name,
            user_email: entry.user_email,
            prediction_score: entry.prediction_score,
            created_at: now,
            updated_at: now,
        };
        self.lock().feedback.push(row.clone());
        Ok(row)
    }

    async fn list_all(&self) -> anyhow::Result<Vec<FeedbackWithUser>> {
        let inner = self.lock();
        Ok(inner
            .feedback
            .iter()
            .rev()
            .map(|f| FeedbackWithUser {
                feedback: f.clone(),
                owner_name: inner
                    .users
                    .iter()
                    .find(|u| u.id == f.user_id)
                    .map(|u| u.name.clone()),
            })
            .collect())
    }
}

/// Answers every request with the same score, or fails when `None`.
pub struct FixedPredictor(pub Option<f64>);

#[async_trait]
impl Predictor for FixedPredictor {
    async fn predict(&self, _input: &ModelInput) -> anyhow::Result<f64> {
        self.0
            .ok_or_else(|| anyhow::anyhow!("prediction service offline"))
    }
}
