//! Optional cloud deepfake-detection client: submit a file, then poll the job
//! on a backoff schedule until it completes or fails.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::error::LensError;

pub const POLL_INITIAL_MS: u64 = 2_000;
pub const POLL_BACKOFF_FACTOR: f64 = 1.5;
pub const POLL_MAX_INTERVAL_MS: u64 = 10_000;
pub const POLL_MAX_ATTEMPTS: u32 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepfakeConfig {
    pub enabled: bool,
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for DeepfakeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: String::new(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Final verdict consumed by the video analyzer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeepfakeVerdict {
    pub prob_fake: f64,
    pub confidence: f64,
    pub label: String,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    job_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    prob_fake: Option<f64>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct DeepfakeClient {
    client: reqwest::Client,
    base_url: String,
}

impl DeepfakeClient {
    pub fn new(cfg: &DeepfakeConfig) -> Result<Self, LensError> {
        let client = reqwest::Client::builder()
            .user_agent("scamlens/1.0")
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(LensError::from)?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Upload the file and return the provider's job id.
    pub async fn submit(&self, file_bytes: Vec<u8>, filename: &str) -> Result<String, LensError> {
        let part = reqwest::multipart::Part::bytes(file_bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let resp = self
            .client
            .post(format!("{}/analyze", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(LensError::from)?;
        if !resp.status().is_success() {
            return Err(LensError::Http(format!(
                "deepfake submit returned {}",
                resp.status()
            )));
        }
        let parsed: SubmitResponse = resp.json().await.map_err(LensError::from)?;
        Ok(parsed.job_id)
    }

    /// Poll until the job completes or fails. Intervals start at 2s and grow
    /// by 1.5x up to 10s, bounded to 30 attempts, so an unresponsive provider
    /// cannot hang the caller indefinitely.
    pub async fn poll(&self, job_id: &str) -> Result<DeepfakeVerdict, LensError> {
        let mut interval_ms = POLL_INITIAL_MS;
        for attempt in 1..=POLL_MAX_ATTEMPTS {
            tokio::time::sleep(Duration::from_millis(interval_ms)).await;
            interval_ms =
                ((interval_ms as f64 * POLL_BACKOFF_FACTOR) as u64).min(POLL_MAX_INTERVAL_MS);

            let resp = self
                .client
                .post(format!("{}/status", self.base_url))
                .json(&serde_json::json!({ "job_id": job_id }))
                .send()
                .await
                .map_err(LensError::from)?;
            if !resp.status().is_success() {
                warn!("deepfake status returned {}", resp.status());
                continue;
            }
            let parsed: StatusResponse = resp.json().await.map_err(LensError::from)?;
            match parsed.status.as_str() {
                "completed" => {
                    return Ok(DeepfakeVerdict {
                        prob_fake: parsed.prob_fake.unwrap_or(0.0),
                        confidence: parsed.confidence.unwrap_or(0.0),
                        label: parsed.label.unwrap_or_else(|| "unknown".to_string()),
                    });
                }
                "failed" => {
                    return Err(LensError::Provider(
                        parsed
                            .error
                            .unwrap_or_else(|| "analysis failed".to_string()),
                    ));
                }
                other => {
                    debug!("deepfake job {} pending ({}), attempt {}", job_id, other, attempt);
                }
            }
        }
        Err(LensError::Timeout)
    }

    /// Submit-then-poll convenience wrapper. Callers treat any error as
    /// "deepfake signal unavailable" and keep the video evidence usable.
    pub async fn analyze(
        &self,
        file_bytes: Vec<u8>,
        filename: &str,
    ) -> Result<DeepfakeVerdict, LensError> {
        let job_id = self.submit(file_bytes, filename).await?;
        self.poll(&job_id).await
    }
}
