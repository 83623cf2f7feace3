//! Client for the external sleep-quality model.
//!
//! The model is an opaque HTTP service: `POST {base}/predict` with the form
//! fields, answering `{ "prediction": <score> }`.

use std::time::Duration;

use anyhow::Context;
use axum::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::dto::{ModelInput, ModelOutput};
use crate::config::PredictConfig;

#[async_trait]
pub trait Predictor: Send + Sync {
    async fn predict(&self, input: &ModelInput) -> anyhow::Result<f64>;
}

#[derive(Debug, Clone)]
pub struct HttpPredictor {
    client: Client,
    predict_url: String,
}

impl HttpPredictor {
    pub fn new(cfg: &PredictConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("build prediction http client")?;
        Ok(Self::with_client(client, &cfg.base_url))
    }

    /// Create with a custom reqwest [`Client`].
    pub fn with_client(client: Client, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            client,
            predict_url: format!("{base}/predict"),
        }
    }

    pub fn predict_url(&self) -> &str {
        &self.predict_url
    }
}

#[async_trait]
impl Predictor for HttpPredictor {
    async fn predict(&self, input: &ModelInput) -> anyhow::Result<f64> {
        let resp = self
            .client
            .post(&self.predict_url)
            .json(input)
            .send()
            .await
            .context("send prediction request")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, body = %body, "prediction service refused request");
            anyhow::bail!("prediction service returned {status}");
        }

        let out: ModelOutput = resp.json().await.context("decode prediction response")?;
        if !out.prediction.is_finite() {
            anyhow::bail!("prediction service returned a non-finite score");
        }
        debug!(score = out.prediction, "prediction received");
        Ok(out.prediction)
    }
}
