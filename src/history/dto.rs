use serde::Deserialize;

use super::repo_types::SleepInputs;
use crate::error::AppError;

/// Sleep form fields as they arrive; every one is required.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSleepInputs {
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub occupation: Option<String>,
    pub sleep_duration: Option<f64>,
    pub activity_level: Option<i32>,
    pub stress_level: Option<i32>,
    pub bmi_category: Option<String>,
    pub heart_rate: Option<i32>,
    pub daily_steps: Option<i32>,
    pub blood_pressure: Option<String>,
    pub sleep_disorder: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateHistoryRequest {
    #[serde(flatten)]
    pub inputs: RawSleepInputs,
    pub predicted_quality: Option<f64>,
}

/// Splits `"120/80"` into systolic and diastolic readings.
pub fn parse_blood_pressure(raw: &str) -> Option<(u16, u16)> {
    let (sys, dia) = raw.trim().split_once('/')?;
    let sys = sys.trim().parse::<u16>().ok()?;
    let dia = dia.trim().parse::<u16>().ok()?;
    (sys > 0 && dia > 0).then_some((sys, dia))
}

fn text(field: Option<String>, name: &'static str, missing: &mut Vec<&'static str>) -> String {
    match field.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
        Some(s) => s,
        None => {
            missing.push(name);
            String::new()
        }
    }
}

fn number<T: Default>(field: Option<T>, name: &'static str, missing: &mut Vec<&'static str>) -> T {
    field.unwrap_or_else(|| {
        missing.push(name);
        T::default()
    })
}

impl RawSleepInputs {
    pub fn validate(self) -> Result<SleepInputs, AppError> {
        let mut missing = Vec::new();
        let inputs = SleepInputs {
            age: number(self.age, "age", &mut missing),
            gender: text(self.gender, "gender", &mut missing),
            occupation: text(self.occupation, "occupation", &mut missing),
            sleep_duration: number(self.sleep_duration, "sleepDuration", &mut missing),
            activity_level: number(self.activity_level, "activityLevel", &mut missing),
            stress_level: number(self.stress_level, "stressLevel", &mut missing),
            bmi_category: text(self.bmi_category, "bmiCategory", &mut missing),
            heart_rate: number(self.heart_rate, "heartRate", &mut missing),
            daily_steps: number(self.daily_steps, "dailySteps", &mut missing),
            blood_pressure: text(self.blood_pressure, "bloodPressure", &mut missing),
            sleep_disorder: text(self.sleep_disorder, "sleepDisorder", &mut missing),
        };
        if !missing.is_empty() {
            return Err(AppError::validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        if inputs.age < 0
            || inputs.activity_level < 0
            || inputs.stress_level < 0
            || inputs.heart_rate < 0
            || inputs.daily_steps < 0
        {
            return Err(AppError::validation("Numeric fields must not be negative"));
        }
        if !inputs.sleep_duration.is_finite() || !(0.0..=24.0).contains(&inputs.sleep_duration) {
            return Err(AppError::validation("sleepDuration must be between 0 and 24 hours"));
        }
        if parse_blood_pressure(&inputs.blood_pressure).is_none() {
            return Err(AppError::validation(
                "bloodPressure must look like <systolic>/<diastolic>",
            ));
        }
        Ok(inputs)
    }
}

pub const MIN_QUALITY: f64 = 0.0;
pub const MAX_QUALITY: f64 = 10.0;

pub fn is_valid_quality(score: f64) -> bool {
    (MIN_QUALITY..=MAX_QUALITY).contains(&score)
}

impl CreateHistoryRequest {
    pub fn validate(self) -> Result<(SleepInputs, f64), AppError> {
        let Some(quality) = self.predicted_quality else {
            return Err(AppError::validation("Missing required fields: predicted_quality"));
        };
        if !is_valid_quality(quality) {
            return Err(AppError::validation(format!(
                "predicted_quality must be between {MIN_QUALITY} and {MAX_QUALITY}"
            )));
        }
        Ok((self.inputs.validate()?, quality))
    }
}

#[cfg(test)]
pub(crate) fn sample_inputs() -> RawSleepInputs {
    RawSleepInputs {
        age: Some(34),
        gender: Some("Male".into()),
        occupation: Some("Engineer".into()),
        sleep_duration: Some(7.5),
        activity_level: Some(60),
        stress_level: Some(4),
        bmi_category: Some("Normal".into()),
        heart_rate: Some(68),
        daily_steps: Some(8000),
        blood_pressure: Some("120/80".into()),
        sleep_disorder: Some("None".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_bounds_are_inclusive() {
        assert!(is_valid_quality(0.0));
        assert!(is_valid_quality(10.0));
        assert!(!is_valid_quality(-0.1));
        assert!(!is_valid_quality(10.5));
        assert!(!is_valid_quality(f64::NAN));
    }

    #[test]
    fn blood_pressure_shapes() {
        assert_eq!(parse_blood_pressure("120/80"), Some((120, 80)));
        assert_eq!(parse_blood_pressure(" 135 / 90 "), Some((135, 90)));
        assert_eq!(parse_blood_pressure("120"), None);
        assert_eq!(parse_blood_pressure("120/"), None);
        assert_eq!(parse_blood_pressure("abc/80"), None);
        assert_eq!(parse_blood_pressure("0/0"), None);
    }

    #[test]
    fn complete_inputs_validate() {
        let inputs = sample_inputs().validate().unwrap();
        assert_eq!(inputs.age, 34);
        assert_eq!(inputs.blood_pressure, "120/80");
    }

    #[test]
    fn missing_fields_are_listed() {
        let mut raw = sample_inputs();
        raw.gender = Some("   ".into());
        raw.daily_steps = None;
        let err = raw.validate().unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert!(msg.contains("gender"));
                assert!(msg.contains("dailySteps"));
                assert!(!msg.contains("age"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut raw = sample_inputs();
        raw.sleep_duration = Some(30.0);
        assert!(raw.validate().is_err());

        let mut raw = sample_inputs();
        raw.heart_rate = Some(-1);
        assert!(raw.validate().is_err());

        let mut raw = sample_inputs();
        raw.blood_pressure = Some("high".into());
        assert!(raw.validate().is_err());
    }

    #[test]
    fn create_request_reads_wire_names() {
        let req: CreateHistoryRequest = serde_json::from_value(serde_json::json!({
            "user": "ignored",
            "age": 34, "gender": "Female", "occupation": "Nurse",
            "sleepDuration": 6.1, "activityLevel": 30, "stressLevel": 7,
            "bmiCategory": "Overweight", "heartRate": 77, "dailySteps": 4200,
            "bloodPressure": "130/85", "sleepDisorder": "Insomnia",
            "predicted_quality": 5.8
        }))
        .unwrap();
        let (inputs, quality) = req.validate().unwrap();
        assert_eq!(inputs.occupation, "Nurse");
        assert_eq!(inputs.stress_level, 7);
        assert_eq!(quality, 5.8);
    }

    #[test]
    fn create_request_requires_score() {
        let req = CreateHistoryRequest {
            inputs: sample_inputs(),
            predicted_quality: None,
        };
        let err = req.validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("predicted_quality")));
    }
}
