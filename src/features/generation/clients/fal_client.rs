use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::core::config::GenerationConfig;
use crate::core::error::{AppError, Result};

/// Enhancement model invoked for every job
const MODEL_PATH: &str = "models/fal-ai/fast-sdxl/run";

/// Fixed professional-headshot prompt set
const PROMPT: &str = "professional headshot, high quality, clean background, studio lighting";
const NEGATIVE_PROMPT: &str = "blurry, low quality, distorted, nsfw, inappropriate";

/// Lifecycle states of a generation job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Queued,
    InProgress,
    Completed,
    Failed,
}

/// Provider-side view of a generation job
#[derive(Debug, Clone)]
pub struct JobStatus {
    pub state: JobState,
    pub result_url: Option<String>,
    pub error: Option<String>,
}

/// Image generation provider contract
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Upload the source image to provider-side temporary storage
    async fn upload_source(&self, data: Vec<u8>, content_type: &str) -> Result<String>;

    /// Submit a generation job for an uploaded source image
    async fn start_job(&self, source_url: &str) -> Result<String>;

    /// Fetch the current state of a job
    async fn poll_job(&self, job_id: &str) -> Result<JobStatus>;

    /// Download the finished image
    async fn fetch_result(&self, result_url: &str) -> Result<Vec<u8>>;
}

#[derive(Debug, Deserialize)]
struct FalUploadResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
struct FalRunResponse {
    request_id: String,
}

#[derive(Debug, Deserialize)]
struct FalStatusResponse {
    status: String,
    #[serde(default)]
    result: Option<FalResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FalResult {
    #[serde(default)]
    images: Vec<FalImage>,
}

#[derive(Debug, Deserialize)]
struct FalImage {
    url: String,
}

/// fal.ai client over the queue-based REST API
pub struct FalClient {
    client: reqwest::Client,
    config: GenerationConfig,
}

impl FalClient {
    pub fn new(config: GenerationConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .build()
                .expect("Failed to build HTTP client"),
            config,
        }
    }

    fn auth_header(&self) -> String {
        format!("Key {}", self.config.api_key)
    }

    /// Seed drawn per job; the provider treats equal seeds as cache keys
    fn random_seed() -> u32 {
        let bytes = Uuid::new_v4().into_bytes();
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) % 1_000_000
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        operation: &str,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("fal {} returned {}: {}", operation, status, body);
            if status.is_client_error() {
                return Err(AppError::Internal(format!(
                    "Generation provider rejected the {} request",
                    operation
                )));
            }
            return Err(AppError::ExternalServiceError(format!(
                "fal {} returned {}",
                operation, status
            )));
        }

        response.json().await.map_err(|e| {
            tracing::error!("Failed to parse fal {} response: {:?}", operation, e);
            AppError::ExternalServiceError(format!("Failed to parse {} response: {}", operation, e))
        })
    }

    fn map_status(response: FalStatusResponse) -> JobStatus {
        let state = match response.status.as_str() {
            "IN_QUEUE" => JobState::Queued,
            "IN_PROGRESS" => JobState::InProgress,
            "COMPLETED" => JobState::Completed,
            "FAILED" => JobState::Failed,
            other => {
                // Unknown states keep the poll loop alive instead of
                // wedging the session.
                tracing::warn!("Unknown fal job status {:?}, treating as in progress", other);
                JobState::InProgress
            }
        };

        let result_url = response
            .result
            .and_then(|r| r.images.into_iter().next())
            .map(|image| image.url);

        JobStatus {
            state,
            result_url,
            error: response.error,
        }
    }
}

#[async_trait]
impl GenerationProvider for FalClient {
    async fn upload_source(&self, data: Vec<u8>, content_type: &str) -> Result<String> {
        let part = reqwest::multipart::Part::bytes(data)
            .file_name("upload.jpg")
            .mime_str(content_type)
            .map_err(|e| {
                AppError::ExternalServiceError(format!("Invalid upload content type: {}", e))
            })?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/files/upload", self.config.base_url))
            .header("Authorization", self.auth_header())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("fal upload request failed: {:?}", e);
                AppError::ExternalServiceError(format!("Source upload failed: {}", e))
            })?;

        let upload: FalUploadResponse = Self::read_json(response, "source upload").await?;
        Ok(upload.url)
    }

    async fn start_job(&self, source_url: &str) -> Result<String> {
        let body = json!({
            "image_url": source_url,
            "prompt": PROMPT,
            "negative_prompt": NEGATIVE_PROMPT,
            "num_inference_steps": 25,
            "guidance_scale": 7.5,
            "strength": 0.8,
            "seed": Self::random_seed(),
        });

        let response = self
            .client
            .post(format!("{}/{}", self.config.base_url, MODEL_PATH))
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("fal job submission failed: {:?}", e);
                AppError::ExternalServiceError(format!("Job submission failed: {}", e))
            })?;

        let run: FalRunResponse = Self::read_json(response, "job submission").await?;

        tracing::info!("Submitted fal job {}", run.request_id);
        Ok(run.request_id)
    }

    async fn poll_job(&self, job_id: &str) -> Result<JobStatus> {
        let response = self
            .client
            .get(format!(
                "{}/queue/requests/{}/status",
                self.config.base_url, job_id
            ))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| {
                tracing::error!("fal status check failed: {:?}", e);
                AppError::ExternalServiceError(format!("Status check failed: {}", e))
            })?;

        let status: FalStatusResponse = Self::read_json(response, "status check").await?;
        Ok(Self::map_status(status))
    }

    async fn fetch_result(&self, result_url: &str) -> Result<Vec<u8>> {
        // Result URLs are pre-signed by the provider; no auth header.
        let response = self.client.get(result_url).send().await.map_err(|e| {
            tracing::error!("Generated image download failed: {:?}", e);
            AppError::ExternalServiceError(format!("Result download failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("Generated image download returned {}", status);
            return Err(AppError::ExternalServiceError(format!(
                "Result download returned {}",
                status
            )));
        }

        let bytes = response.bytes().await.map_err(|e| {
            tracing::error!("Generated image body read failed: {:?}", e);
            AppError::ExternalServiceError(format!("Result download failed: {}", e))
        })?;

        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_status_completed_extracts_first_image() {
        let response = FalStatusResponse {
            status: "COMPLETED".to_string(),
            result: Some(FalResult {
                images: vec![
                    FalImage {
                        url: "https://cdn.fal.ai/result/1.jpg".to_string(),
                    },
                    FalImage {
                        url: "https://cdn.fal.ai/result/2.jpg".to_string(),
                    },
                ],
            }),
            error: None,
        };

        let status = FalClient::map_status(response);
        assert_eq!(status.state, JobState::Completed);
        assert_eq!(
            status.result_url.as_deref(),
            Some("https://cdn.fal.ai/result/1.jpg")
        );
        assert!(status.error.is_none());
    }

    #[test]
    fn test_map_status_failed_carries_error() {
        let response = FalStatusResponse {
            status: "FAILED".to_string(),
            result: None,
            error: Some("content policy violation".to_string()),
        };

        let status = FalClient::map_status(response);
        assert_eq!(status.state, JobState::Failed);
        assert!(status.result_url.is_none());
        assert_eq!(status.error.as_deref(), Some("content policy violation"));
    }

    #[test]
    fn test_map_status_unknown_state_keeps_polling() {
        let response = FalStatusResponse {
            status: "SOMETHING_NEW".to_string(),
            result: None,
            error: None,
        };

        assert_eq!(FalClient::map_status(response).state, JobState::InProgress);
    }

    #[test]
    fn test_random_seed_stays_in_provider_range() {
        for _ in 0..100 {
            assert!(FalClient::random_seed() < 1_000_000);
        }
    }

    #[test]
    fn test_status_response_parses_queue_payload() {
        let raw = r#"{"status":"IN_QUEUE","queue_position":3}"#;
        let parsed: FalStatusResponse = serde_json::from_str(raw).unwrap();

        let status = FalClient::map_status(parsed);
        assert_eq!(status.state, JobState::Queued);
        assert!(status.result_url.is_none());
    }
}
