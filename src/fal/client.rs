//! FalClient - handles communication with the fal.ai queue API.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::generation::{GenerationMode, GenerationRequest, SourceImage};

/// The environment variable name for the fal.ai API key.
pub const FAL_API_KEY_ENV: &str = "FAL_KEY";

/// Default base URL for the fal.ai queue API.
pub const FAL_API_BASE_URL: &str = "https://queue.fal.run";

/// LongCat-Video text-to-video endpoint (720p).
pub const TEXT_TO_VIDEO_ENDPOINT: &str = "fal-ai/longcat-video/text-to-video/720p";

/// LongCat-Video image-to-video endpoint (720p).
pub const IMAGE_TO_VIDEO_ENDPOINT: &str = "fal-ai/longcat-video/image-to-video/720p";

/// Default timeout for a single HTTP request (30 seconds).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default time to wait for a queued generation (10 minutes).
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(600);

/// Default polling interval for status checks (2 seconds).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Tunable endpoint and timing settings for [`FalClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct FalSettings {
    pub base_url: String,
    pub text_to_video_endpoint: String,
    pub image_to_video_endpoint: String,
    pub request_timeout: Duration,
    pub generation_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for FalSettings {
    fn default() -> Self {
        Self {
            base_url: FAL_API_BASE_URL.to_string(),
            text_to_video_endpoint: TEXT_TO_VIDEO_ENDPOINT.to_string(),
            image_to_video_endpoint: IMAGE_TO_VIDEO_ENDPOINT.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Response from queue submission.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueResponse {
    /// The unique request ID for polling.
    pub request_id: String,
    /// URL to check status.
    #[serde(default)]
    pub status_url: Option<String>,
    /// URL to fetch the finished output.
    #[serde(default)]
    pub response_url: Option<String>,
}

/// Response from the status endpoint.
#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    error: Option<String>,
}

/// Status of a queued generation request.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationStatus {
    /// Request is waiting in the queue.
    Pending,
    /// Video is being generated.
    InProgress,
    /// Output is ready to fetch.
    Completed,
    /// Generation failed with an error.
    Failed { error: String },
}

/// Encode an uploaded image as a `data:` URI accepted in `image_url`.
pub fn image_data_uri(image: &SourceImage) -> String {
    format!(
        "data:{};base64,{}",
        image.content_type,
        STANDARD.encode(&image.bytes)
    )
}

/// The fal app id (`owner/app`) of an endpoint path. Queue status and result
/// routes live under the app id, not the full endpoint path.
pub fn app_id(endpoint: &str) -> &str {
    let trimmed = endpoint.trim_matches('/');
    match trimmed.match_indices('/').nth(1) {
        Some((idx, _)) => &trimmed[..idx],
        None => trimmed,
    }
}

/// Pull the video URL out of a result payload.
///
/// Accepts `{"video": {"url": ..}}` and the wrapped `{"data": {"video": {"url": ..}}}`.
pub fn extract_video_url(result: &serde_json::Value) -> Option<String> {
    let direct = result.get("video");
    let wrapped = result.get("data").and_then(|d| d.get("video"));
    direct
        .or(wrapped)
        .and_then(|video| video.get("url"))
        .and_then(|url| url.as_str())
        .map(str::to_string)
}

/// Client for communicating with the fal.ai API.
pub struct FalClient {
    api_key: String,
    settings: FalSettings,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for FalClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FalClient")
            .field("api_key", &"<redacted>")
            .field("settings", &self.settings)
            .finish()
    }
}

impl FalClient {
    /// Create a new FalClient by reading the API key from the environment.
    ///
    /// # Errors
    ///
    /// Returns `FalError::MissingApiKey` if `FAL_KEY` is unset or empty.
    pub fn new() -> Result<Self, FalError> {
        Self::from_env(FalSettings::default())
    }

    /// Like [`FalClient::new`], with explicit settings.
    pub fn from_env(settings: FalSettings) -> Result<Self, FalError> {
        let api_key = std::env::var(FAL_API_KEY_ENV).map_err(|_| FalError::MissingApiKey)?;
        Self::with_settings(api_key, settings)
    }

    /// Create a new FalClient with an explicit API key.
    pub fn with_api_key(api_key: String) -> Result<Self, FalError> {
        Self::with_settings(api_key, FalSettings::default())
    }

    /// Create a new FalClient with a custom base URL.
    ///
    /// Useful for testing against a mock server.
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, FalError> {
        Self::with_settings(
            api_key,
            FalSettings {
                base_url,
                ..FalSettings::default()
            },
        )
    }

    pub fn with_settings(api_key: String, settings: FalSettings) -> Result<Self, FalError> {
        if api_key.trim().is_empty() {
            return Err(FalError::MissingApiKey);
        }

        let http_client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            api_key,
            settings: FalSettings {
                base_url: settings.base_url.trim_end_matches('/').to_string(),
                ..settings
            },
            http_client,
        })
    }

    /// Get the API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.settings.base_url
    }

    pub fn settings(&self) -> &FalSettings {
        &self.settings
    }

    /// Endpoint path for a generation mode.
    pub fn endpoint_for(&self, mode: GenerationMode) -> &str {
        match mode {
            GenerationMode::TextToVideo => &self.settings.text_to_video_endpoint,
            GenerationMode::ImageToVideo => &self.settings.image_to_video_endpoint,
        }
    }

    fn status_url(&self, endpoint: &str, queued: &QueueResponse) -> String {
        queued.status_url.clone().unwrap_or_else(|| {
            format!(
                "{}/{}/requests/{}/status",
                self.settings.base_url,
                app_id(endpoint),
                queued.request_id
            )
        })
    }

    fn response_url(&self, endpoint: &str, queued: &QueueResponse) -> String {
        queued.response_url.clone().unwrap_or_else(|| {
            format!(
                "{}/{}/requests/{}",
                self.settings.base_url,
                app_id(endpoint),
                queued.request_id
            )
        })
    }

    /// Submit arguments to an endpoint's queue.
    ///
    /// # Errors
    ///
    /// Returns `FalError::ApiError` with the vendor's response body if the
    /// API rejects the request, or `FalError::HttpError` if the request fails.
    pub async fn submit<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        arguments: &T,
    ) -> Result<QueueResponse, FalError> {
        let url = format!("{}/{}", self.settings.base_url, endpoint);

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Key {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(arguments)
            .send()
            .await?;

        let response = error_for_status(response).await?;
        let queued: QueueResponse = response.json().await?;
        Ok(queued)
    }

    /// Check the status of a queued request.
    pub async fn poll_status(
        &self,
        endpoint: &str,
        queued: &QueueResponse,
    ) -> Result<GenerationStatus, FalError> {
        let url = self.status_url(endpoint, queued);

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", format!("Key {}", self.api_key))
            .send()
            .await?;

        let response = error_for_status(response).await?;
        let status: StatusResponse = response.json().await?;

        match status.status.to_uppercase().as_str() {
            "IN_QUEUE" | "PENDING" => Ok(GenerationStatus::Pending),
            "IN_PROGRESS" | "PROCESSING" => Ok(GenerationStatus::InProgress),
            "COMPLETED" | "OK" => match status.error {
                Some(error) => Ok(GenerationStatus::Failed { error }),
                None => Ok(GenerationStatus::Completed),
            },
            "FAILED" | "ERROR" => Ok(GenerationStatus::Failed {
                error: status
                    .error
                    .unwrap_or_else(|| "Unknown error occurred during generation".to_string()),
            }),
            unknown => Err(FalError::UnexpectedResponse(format!(
                "unknown generation status: {}",
                unknown
            ))),
        }
    }

    /// Fetch the output of a completed request and return its video URL.
    pub async fn fetch_result(
        &self,
        endpoint: &str,
        queued: &QueueResponse,
    ) -> Result<String, FalError> {
        let url = self.response_url(endpoint, queued);

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", format!("Key {}", self.api_key))
            .send()
            .await?;

        let response = error_for_status(response).await?;
        let result: serde_json::Value = response.json().await?;

        extract_video_url(&result).ok_or_else(|| {
            FalError::UnexpectedResponse("missing video URL".to_string())
        })
    }

    /// Generate a video and return its URL.
    ///
    /// Submits the request, waits on the queue until the vendor reports
    /// completion or the generation timeout elapses, then fetches the output.
    /// Failures are returned as-is; nothing is resubmitted.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String, FalError> {
        use tokio::time::Instant;

        let endpoint = self.endpoint_for(request.mode).to_string();
        let image_url = request.image.as_ref().map(image_data_uri);
        let arguments = request.to_payload(image_url);

        log::info!(
            "Submitting {} request ({} frames, guidance {}, {} steps): {}",
            request.mode,
            arguments.num_frames,
            arguments.guidance_scale,
            arguments.num_inference_steps,
            request.prompt
        );
        let queued = self.submit(&endpoint, &arguments).await?;
        log::info!("Generation submitted, request_id: {}", queued.request_id);

        let timeout = self.settings.generation_timeout;
        let start_time = Instant::now();
        loop {
            if start_time.elapsed() > timeout {
                log::error!(
                    "Generation {} timed out after {:?}",
                    queued.request_id,
                    timeout
                );
                return Err(FalError::Timeout(timeout));
            }

            match self.poll_status(&endpoint, &queued).await? {
                GenerationStatus::Pending => log::debug!("Status: in queue, waiting..."),
                GenerationStatus::InProgress => log::debug!("Status: generating..."),
                GenerationStatus::Completed => break,
                GenerationStatus::Failed { error } => {
                    log::warn!("Generation {} failed: {}", queued.request_id, error);
                    return Err(FalError::GenerationFailed(error));
                }
            }

            tokio::time::sleep(self.settings.poll_interval).await;
        }

        let video_url = self.fetch_result(&endpoint, &queued).await?;
        log::info!("Generation complete: {}", video_url);
        Ok(video_url)
    }
}

/// Turn a non-success response into `FalError::ApiError`, keeping the body verbatim.
async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, FalError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    log::warn!("fal.ai returned {}: {}", status, message);
    Err(FalError::ApiError {
        status: status.as_u16(),
        message,
    })
}

/// Errors that can occur during fal.ai operations.
#[derive(Debug, thiserror::Error)]
pub enum FalError {
    #[error("Fal API key not found. Set the `FAL_KEY` environment variable.")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API request failed with status {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("{0}")]
    GenerationFailed(String),

    #[error("Unexpected response format from fal API: {0}")]
    UnexpectedResponse(String),

    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),
}
