use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    feedback::repo_types::FeedbackWithUser,
    history::repo_types::{HistoryWithUser, PredictionHistory, SleepInputs},
};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserRef {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Snapshot with its owner populated; `user` is null once the owner is gone.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminHistoryEntry {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user: Option<UserRef>,
    #[serde(flatten)]
    pub inputs: SleepInputs,
    #[serde(rename = "predicted_quality")]
    pub predicted_quality: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<HistoryWithUser> for AdminHistoryEntry {
    fn from(row: HistoryWithUser) -> Self {
        let HistoryWithUser {
            history:
                PredictionHistory {
                    id,
                    user_id,
                    inputs,
                    predicted_quality,
                    created_at,
                    updated_at,
                },
            user_name,
            user_email,
        } = row;
        Self {
            id,
            user: user_name.map(|name| UserRef {
                id: user_id,
                name,
                email: user_email,
            }),
            inputs,
            predicted_quality,
            created_at,
            updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminFeedbackEntry {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user: Option<UserRef>,
    pub rating: i32,
    pub feedback: String,
    pub user_name: String,
    pub user_email: String,
    pub prediction_score: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<FeedbackWithUser> for AdminFeedbackEntry {
    fn from(row: FeedbackWithUser) -> Self {
        let f = row.feedback;
        Self {
            id: f.id,
            user: row.owner_name.map(|name| UserRef {
                id: f.user_id,
                name,
                email: None,
            }),
            rating: f.rating,
            feedback: f.feedback,
            user_name: f.user_name,
            user_email: f.user_email,
            prediction_score: f.prediction_score,
            created_at: f.created_at,
            updated_at: f.updated_at,
        }
    }
}

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct GenderBreakdown {
    pub male: usize,
    pub female: usize,
    pub other: usize,
}

/// Score buckets: poor < 6, normal 6..8, good >= 8.
#[derive(Debug, Default, Serialize, PartialEq)]
pub struct ScoreDistribution {
    pub poor: usize,
    pub normal: usize,
    pub good: usize,
}

#[derive(Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_users: usize,
    pub total_predictions: usize,
    pub total_feedback: usize,
    pub avg_rating: f64,
    pub gender_breakdown: GenderBreakdown,
    pub score_distribution: ScoreDistribution,
}

impl AdminStats {
    pub fn compute<'a>(
        total_users: usize,
        history: impl IntoIterator<Item = &'a PredictionHistory>,
        ratings: impl IntoIterator<Item = i32>,
    ) -> Self {
        let mut stats = AdminStats {
            total_users,
            ..Default::default()
        };

        for h in history {
            stats.total_predictions += 1;
            match h.inputs.gender.trim().to_ascii_lowercase().as_str() {
                "male" => stats.gender_breakdown.male += 1,
                "female" => stats.gender_breakdown.female += 1,
                _ => stats.gender_breakdown.other += 1,
            }
            let q = h.predicted_quality;
            if q < 6.0 {
                stats.score_distribution.poor += 1;
            } else if q < 8.0 {
                stats.score_distribution.normal += 1;
            } else {
                stats.score_distribution.good += 1;
            }
        }

        let mut sum = 0i64;
        for r in ratings {
            stats.total_feedback += 1;
            sum += i64::from(r);
        }
        if stats.total_feedback > 0 {
            let avg = sum as f64 / stats.total_feedback as f64;
            stats.avg_rating = (avg * 10.0).round() / 10.0;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::dto::sample_inputs;

    fn snapshot(gender: &str, quality: f64) -> PredictionHistory {
        let mut inputs = sample_inputs().validate().unwrap();
        inputs.gender = gender.into();
        let now = OffsetDateTime::now_utc();
        PredictionHistory {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            inputs,
            predicted_quality: quality,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn empty_stores_give_zeroes() {
        let stats = AdminStats::compute(0, std::iter::empty(), std::iter::empty());
        assert_eq!(stats, AdminStats::default());
    }

    #[test]
    fn aggregates_history_and_ratings() {
        let history = vec![
            snapshot("Male", 5.9),
            snapshot("female", 6.0),
            snapshot("FEMALE", 7.99),
            snapshot("Other", 8.0),
        ];
        let stats = AdminStats::compute(3, &history, [5, 4, 4]);
        assert_eq!(stats.total_users, 3);
        assert_eq!(stats.total_predictions, 4);
        assert_eq!(stats.total_feedback, 3);
        assert_eq!(stats.avg_rating, 4.3);
        assert_eq!(
            stats.gender_breakdown,
            GenderBreakdown { male: 1, female: 2, other: 1 }
        );
        assert_eq!(
            stats.score_distribution,
            ScoreDistribution { poor: 1, normal: 2, good: 1 }
        );
    }

    #[test]
    fn admin_history_entry_populates_user() {
        let h = snapshot("Male", 7.0);
        let owner = h.user_id;
        let entry = AdminHistoryEntry::from(HistoryWithUser {
            history: h,
            user_name: Some("A".into()),
            user_email: Some("a@x.com".into()),
        });
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["user"]["_id"], owner.to_string());
        assert_eq!(json["_id"], entry.id.to_string());
        assert!(json.get("id").is_none());
        assert_eq!(json["user"]["name"], "A");
        assert_eq!(json["user"]["email"], "a@x.com");
        assert_eq!(json["gender"], "Male");
        assert_eq!(json["predicted_quality"], 7.0);
    }
}
