use serde::Deserialize;

use crate::error::AppError;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedbackRequest {
    pub rating: Option<i32>,
    pub feedback: Option<String>,
    pub prediction_score: Option<f64>,
}

pub struct ValidFeedback {
    pub rating: i32,
    pub feedback: String,
    pub prediction_score: Option<f64>,
}

impl CreateFeedbackRequest {
    pub fn validate(self) -> Result<ValidFeedback, AppError> {
        let text = self
            .feedback
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());
        let (Some(rating), Some(feedback)) = (self.rating, text) else {
            return Err(AppError::validation("Please provide both a rating and a comment"));
        };
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(AppError::validation(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}"
            )));
        }
        Ok(ValidFeedback {
            rating,
            feedback,
            prediction_score: self.prediction_score,
        })
    }
}
