use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    history::{
        dto::{parse_blood_pressure, RawSleepInputs},
        repo_types::{PredictionHistory, SleepInputs},
    },
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictRequest {
    #[serde(flatten)]
    pub inputs: RawSleepInputs,
    pub body_temperature: Option<f64>,
}

impl PredictRequest {
    pub fn validate(self) -> Result<ModelInput, AppError> {
        let inputs = self.inputs.validate()?;
        let body_temperature = self
            .body_temperature
            .ok_or_else(|| AppError::validation("Missing required fields: bodyTemperature"))?;
        if !(30.0..=45.0).contains(&body_temperature) {
            return Err(AppError::validation("bodyTemperature must be between 30 and 45 °C"));
        }
        Ok(ModelInput::new(inputs, body_temperature))
    }
}

/// Body sent to the prediction service, keyed by the names its model was trained on.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ModelInput {
    #[serde(rename = "Age")]
    pub age: i32,
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "Occupation")]
    pub occupation: String,
    #[serde(rename = "Sleep Duration")]
    pub sleep_duration: f64,
    #[serde(rename = "Physical Activity Level")]
    pub activity_level: i32,
    #[serde(rename = "Stress Level")]
    pub stress_level: i32,
    #[serde(rename = "BMI Category")]
    pub bmi_category: String,
    #[serde(rename = "Heart Rate")]
    pub heart_rate: i32,
    #[serde(rename = "Daily Steps")]
    pub daily_steps: i32,
    #[serde(rename = "Blood Pressure")]
    pub blood_pressure: String,
    #[serde(rename = "Sleep Disorder")]
    pub sleep_disorder: String,
    #[serde(rename = "Body Temperature")]
    pub body_temperature: f64,
}

impl ModelInput {
    pub fn new(inputs: SleepInputs, body_temperature: f64) -> Self {
        // validated upstream, so this only normalizes spacing
        let blood_pressure = parse_blood_pressure(&inputs.blood_pressure)
            .map(|(s, d)| format!("{s}/{d}"))
            .unwrap_or(inputs.blood_pressure);
        Self {
            age: inputs.age,
            gender: inputs.gender,
            occupation: inputs.occupation,
            sleep_duration: inputs.sleep_duration,
            activity_level: inputs.activity_level,
            stress_level: inputs.stress_level,
            bmi_category: inputs.bmi_category,
            heart_rate: inputs.heart_rate,
            daily_steps: inputs.daily_steps,
            blood_pressure,
            sleep_disorder: inputs.sleep_disorder,
            body_temperature,
        }
    }

    pub fn sleep_inputs(&self) -> SleepInputs {
        SleepInputs {
            age: self.age,
            gender: self.gender.clone(),
            occupation: self.occupation.clone(),
            sleep_duration: self.sleep_duration,
            activity_level: self.activity_level,
            stress_level: self.stress_level,
            bmi_category: self.bmi_category.clone(),
            heart_rate: self.heart_rate,
            daily_steps: self.daily_steps,
            blood_pressure: self.blood_pressure.clone(),
            sleep_disorder: self.sleep_disorder.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ModelOutput {
    pub prediction: f64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum QualityLabel {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl QualityLabel {
    pub fn from_score(score: f64) -> Self {
        if score >= 8.5 {
            QualityLabel::Excellent
        } else if score >= 7.0 {
            QualityLabel::Good
        } else if score >= 5.0 {
            QualityLabel::Fair
        } else {
            QualityLabel::Poor
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: f64,
    pub quality: QualityLabel,
    pub history: PredictionHistory,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::dto::sample_inputs;

    #[test]
    fn quality_label_thresholds() {
        assert_eq!(QualityLabel::from_score(9.1), QualityLabel::Excellent);
        assert_eq!(QualityLabel::from_score(8.5), QualityLabel::Excellent);
        assert_eq!(QualityLabel::from_score(8.49), QualityLabel::Good);
        assert_eq!(QualityLabel::from_score(7.0), QualityLabel::Good);
        assert_eq!(QualityLabel::from_score(5.0), QualityLabel::Fair);
        assert_eq!(QualityLabel::from_score(4.99), QualityLabel::Poor);
    }

    #[test]
    fn model_input_uses_service_field_names() {
        let mut raw = sample_inputs();
        raw.blood_pressure = Some(" 120 / 80 ".into());
        let input = PredictRequest {
            inputs: raw,
            body_temperature: Some(36.6),
        }
        .validate()
        .unwrap();

        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["Age"], 34);
        assert_eq!(json["Sleep Duration"], 7.5);
        assert_eq!(json["Physical Activity Level"], 60);
        assert_eq!(json["Blood Pressure"], "120/80");
        assert_eq!(json["Body Temperature"], 36.6);
        assert_eq!(json.as_object().unwrap().len(), 12);
    }

    #[test]
    fn body_temperature_is_required() {
        let err = PredictRequest {
            inputs: sample_inputs(),
            body_temperature: None,
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("bodyTemperature")));
    }
}
