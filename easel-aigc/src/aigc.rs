//! AIGC image generation client.
//!
//! Submitting a prompt either returns the finished image directly (legacy
//! backends) or a prompt id whose status the caller polls via
//! [`AigcClient::get_task_status`]. The client never loops on its own; see
//! [`crate::poll`] for an explicit polling policy.

use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::{
    build_http, endpoint, ensure_success, null_as_default, parse_base_url, DEFAULT_USER_AGENT,
    SUCCESS_CODE,
};
use crate::error::{ClientError, ClientResult};
use crate::poll::{poll_task, PollPolicy};
use crate::task::{parse_task_status, TaskStatusResponse};

const PROMPT_PATH: &[&str] = &["api", "v2", "image_generation", "prompt"];
const HISTORY_PATH: &[&str] = &["api", "v2", "image_generation", "history"];

/// Task name the generation backend expects for image prompts.
pub const TASK_NAME: &str = "text2imgv2";

/// Maximum number of reference images per request.
pub const MAX_REFERENCE_IMAGES: usize = 6;

/// Target aspect ratio of the generated image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    /// `1:1`
    #[default]
    #[serde(rename = "1:1")]
    Square,
    /// `3:4`
    #[serde(rename = "3:4")]
    Portrait3x4,
    /// `4:3`
    #[serde(rename = "4:3")]
    Landscape4x3,
    /// `9:16`
    #[serde(rename = "9:16")]
    Portrait9x16,
    /// `16:9`
    #[serde(rename = "16:9")]
    Landscape16x9,
}

impl AspectRatio {
    /// Wire name, e.g. `16:9`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait3x4 => "3:4",
            Self::Landscape4x3 => "4:3",
            Self::Portrait9x16 => "9:16",
            Self::Landscape16x9 => "16:9",
        }
    }
}

impl std::str::FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1:1" => Ok(Self::Square),
            "3:4" => Ok(Self::Portrait3x4),
            "4:3" => Ok(Self::Landscape4x3),
            "9:16" => Ok(Self::Portrait9x16),
            "16:9" => Ok(Self::Landscape16x9),
            other => Err(format!(
                "unsupported aspect ratio {other:?} (expected 1:1, 3:4, 4:3, 9:16 or 16:9)"
            )),
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target resolution class of the generated image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageSize {
    /// `1K`
    #[default]
    #[serde(rename = "1K")]
    OneK,
    /// `2K`
    #[serde(rename = "2K")]
    TwoK,
    /// `4K`
    #[serde(rename = "4K")]
    FourK,
}

impl ImageSize {
    /// Wire name, e.g. `2K`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneK => "1K",
            Self::TwoK => "2K",
            Self::FourK => "4K",
        }
    }
}

impl std::str::FromStr for ImageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "1K" => Ok(Self::OneK),
            "2K" => Ok(Self::TwoK),
            "4K" => Ok(Self::FourK),
            _ => Err(format!("unsupported image size {s:?} (expected 1K, 2K or 4K)")),
        }
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prompt text keyed by language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptText {
    /// Chinese prompt, the only language the backend reads.
    pub zh: String,
}

impl PromptText {
    /// Wrap prompt text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { zh: text.into() }
    }
}

/// Reference images and output shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceOptions {
    /// Reference image URLs, at most [`MAX_REFERENCE_IMAGES`].
    pub img_urls: Vec<String>,
    /// Output aspect ratio.
    pub aspect_ratio: AspectRatio,
    /// Output resolution class.
    pub image_size: ImageSize,
}

/// One EXIF label attached to the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExifLabel {
    /// Label value.
    pub label: i64,
}

/// An image generation request, in the backend's wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Caller-side task id.
    #[serde(rename = "taskId")]
    pub task_id: i64,
    /// Always [`TASK_NAME`].
    #[serde(rename = "taskName")]
    pub task_name: String,
    /// Free-text prompt.
    pub prompt: PromptText,
    /// Style (LoRA) identifier.
    pub lora: String,
    /// Prefix prompt the style expects.
    pub trigger_prompt: PromptText,
    /// Reference images and output shape.
    pub nano_pro: ReferenceOptions,
    /// Storage path for the generated image.
    #[serde(rename = "cosPath")]
    pub cos_path: String,
    /// EXIF labels for the result.
    #[serde(rename = "exifContent")]
    pub exif_content: Vec<ExifLabel>,
}

impl GenerationRequest {
    /// Start building a request for a task and prompt.
    #[must_use]
    pub fn builder(task_id: i64, prompt: impl Into<String>) -> GenerationRequestBuilder {
        GenerationRequestBuilder {
            request: Self {
                task_id,
                task_name: TASK_NAME.to_string(),
                prompt: PromptText::new(prompt),
                lora: String::new(),
                trigger_prompt: PromptText::default(),
                nano_pro: ReferenceOptions::default(),
                cos_path: String::new(),
                exif_content: Vec::new(),
            },
        }
    }

    /// Check request limits before sending.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::TooManyReferenceImages`] for more than
    /// [`MAX_REFERENCE_IMAGES`] reference images.
    pub fn validate(&self) -> ClientResult<()> {
        let count = self.nano_pro.img_urls.len();
        if count > MAX_REFERENCE_IMAGES {
            return Err(ClientError::TooManyReferenceImages {
                count,
                max: MAX_REFERENCE_IMAGES,
            });
        }
        Ok(())
    }
}

/// Builder for [`GenerationRequest`].
#[derive(Debug, Clone)]
pub struct GenerationRequestBuilder {
    request: GenerationRequest,
}

impl GenerationRequestBuilder {
    /// Set the style (LoRA) identifier.
    #[must_use]
    pub fn lora(mut self, lora: impl Into<String>) -> Self {
        self.request.lora = lora.into();
        self
    }

    /// Set the style's trigger prompt.
    #[must_use]
    pub fn trigger_prompt(mut self, trigger: impl Into<String>) -> Self {
        self.request.trigger_prompt = PromptText::new(trigger);
        self
    }

    /// Add a reference image URL.
    #[must_use]
    pub fn reference_image(mut self, url: impl Into<String>) -> Self {
        self.request.nano_pro.img_urls.push(url.into());
        self
    }

    /// Replace the reference image URLs.
    #[must_use]
    pub fn reference_images<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request.nano_pro.img_urls = urls.into_iter().map(Into::into).collect();
        self
    }

    /// Set the output aspect ratio.
    #[must_use]
    pub fn aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.request.nano_pro.aspect_ratio = ratio;
        self
    }

    /// Set the output resolution class.
    #[must_use]
    pub fn image_size(mut self, size: ImageSize) -> Self {
        self.request.nano_pro.image_size = size;
        self
    }

    /// Set the storage path for the result.
    #[must_use]
    pub fn cos_path(mut self, path: impl Into<String>) -> Self {
        self.request.cos_path = path.into();
        self
    }

    /// Attach an EXIF label.
    #[must_use]
    pub fn exif_label(mut self, label: i64) -> Self {
        self.request.exif_content.push(ExifLabel { label });
        self
    }

    /// Finish the request.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::TooManyReferenceImages`] if the limit is exceeded.
    pub fn build(self) -> ClientResult<GenerationRequest> {
        self.request.validate()?;
        Ok(self.request)
    }
}

/// Raw submission response, covering both backend generations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Application code, 200 on success.
    pub code: i64,
    /// Server message.
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    /// Prompt id to poll (current backends).
    #[serde(default)]
    pub prompt_id: Option<String>,
    /// Finished image (legacy backends).
    #[serde(default)]
    pub data: Option<GeneratedImage>,
}

/// A finished image returned inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    /// Result image URL.
    pub image_url: String,
    /// Caller-side task id.
    pub task_id: i64,
}

/// What a successful submission produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationOutcome {
    /// The task was queued; poll its status with this prompt id.
    Queued {
        /// Prompt id for [`AigcClient::get_task_status`].
        prompt_id: String,
    },
    /// The image is already available.
    Ready {
        /// Result image URL.
        image_url: String,
        /// Caller-side task id.
        task_id: i64,
    },
}

impl GenerateResponse {
    /// Classify the response.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Rejected`] for a non-200 code and
    /// [`ClientError::UnexpectedResponse`] if neither a prompt id nor an image
    /// is present.
    pub fn into_outcome(self) -> ClientResult<GenerationOutcome> {
        if self.code != SUCCESS_CODE {
            return Err(ClientError::Rejected {
                code: self.code,
                message: self.message,
            });
        }
        if let Some(prompt_id) = self.prompt_id.filter(|id| !id.is_empty()) {
            return Ok(GenerationOutcome::Queued { prompt_id });
        }
        if let Some(image) = self.data {
            return Ok(GenerationOutcome::Ready {
                image_url: image.image_url,
                task_id: image.task_id,
            });
        }
        Err(ClientError::UnexpectedResponse(
            "generation response has neither prompt_id nor data".into(),
        ))
    }
}

/// Client for the AIGC generation service.
#[derive(Clone)]
pub struct AigcClient {
    inner: Arc<InnerClient>,
}

struct InnerClient {
    http: Client,
    base: Url,
}

impl AigcClient {
    /// Create a client for the AIGC service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the URL is malformed.
    /// Returns [`ClientError::Http`] if the HTTP client fails to build.
    pub fn new(base_url: impl AsRef<str>) -> ClientResult<Self> {
        Self::with_http(base_url, build_http(DEFAULT_USER_AGENT, None)?)
    }

    /// Create a client that reuses an existing HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the URL is malformed.
    pub fn with_http(base_url: impl AsRef<str>, http: Client) -> ClientResult<Self> {
        let base = parse_base_url(base_url.as_ref())?;
        Ok(Self {
            inner: Arc::new(InnerClient { http, base }),
        })
    }

    /// Submit an image generation request.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Status`] for any non-2xx response regardless of
    /// body, [`ClientError::Rejected`] for a non-200 envelope code, request
    /// validation errors, and transport or parse errors unchanged.
    pub async fn generate_image(
        &self,
        request: &GenerationRequest,
    ) -> ClientResult<GenerationOutcome> {
        request.validate()?;
        let url = endpoint(&self.inner.base, PROMPT_PATH)?;
        debug!(
            task_id = request.task_id,
            references = request.nano_pro.img_urls.len(),
            aspect_ratio = %request.nano_pro.aspect_ratio,
            image_size = %request.nano_pro.image_size,
            "Submitting image generation request"
        );

        self.submit(url, request).await.inspect_err(|e| {
            warn!(task_id = request.task_id, error = %e, "Image generation request failed");
        })
    }

    async fn submit(&self, url: Url, request: &GenerationRequest) -> ClientResult<GenerationOutcome> {
        let response = self.inner.http.post(url).json(request).send().await?;
        ensure_success(&response)?;

        let body = response.bytes().await?;
        let parsed: GenerateResponse = serde_json::from_slice(&body)?;
        debug!(code = parsed.code, message = %parsed.message, "Generation response received");
        parsed.into_outcome()
    }

    /// Fetch the current status of a queued prompt. Issues exactly one request.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Status`] for non-2xx responses,
    /// [`ClientError::Rejected`] for an enveloped failure, and transport or
    /// parse errors unchanged.
    pub async fn get_task_status(&self, prompt_id: &str) -> ClientResult<TaskStatusResponse> {
        let segments: Vec<&str> = HISTORY_PATH
            .iter()
            .copied()
            .chain(std::iter::once(prompt_id))
            .collect();
        let url = endpoint(&self.inner.base, &segments)?;

        self.fetch_status(url).await.inspect_err(|e| {
            warn!(prompt_id, error = %e, "Task status request failed");
        })
    }

    async fn fetch_status(&self, url: Url) -> ClientResult<TaskStatusResponse> {
        let response = self.inner.http.get(url).send().await?;
        ensure_success(&response)?;

        let body = response.bytes().await?;
        let value: Value = serde_json::from_slice(&body)?;
        let status = parse_task_status(value)?;
        debug!(
            prompt_id = %status.prompt_id,
            status = ?status.status,
            progress = status.progress,
            pending = status.pending_numbers,
            "Task status received"
        );
        Ok(status)
    }

    /// Poll a prompt until it reaches a terminal status, without cancellation.
    ///
    /// # Errors
    ///
    /// See [`poll_task`].
    pub async fn wait_for_task(
        &self,
        prompt_id: &str,
        policy: &PollPolicy,
    ) -> ClientResult<TaskStatusResponse> {
        poll_task(self, prompt_id, policy, std::future::pending(), |_| {}).await
    }
}
