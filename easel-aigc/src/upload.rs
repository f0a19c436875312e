//! Presigned uploads to object storage (COS).
//!
//! An upload is two sequential calls: the business backend hands out a
//! presigned destination, then the raw bytes are `PUT` straight to storage.
//! Nothing is retried or cached.

use std::path::Path;
use std::sync::Arc;

use easel_core::{ImageFormat, OCTET_STREAM};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{
    build_http, endpoint, ensure_success, null_as_default, parse_base_url, DEFAULT_USER_AGENT,
    SUCCESS_CODE,
};
use crate::error::{ClientError, ClientResult};

const PRESIGN_PATH: &[&str] = &["backend", "aigc", "common", "cos", "getPresignedUrl"];

/// Business category an upload belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BizType {
    /// Text-to-image style reference.
    Text2ImgStyle,
    /// Audio style reference.
    AudioStyle,
    /// Segmentation mask.
    SegmentMask,
    /// Face swap source.
    FaceSwap,
    /// Role editing image.
    EditRole,
    /// Cooperator material.
    Cooperator,
    /// Generic attachment, used by [`UploadClient::upload_file`].
    Attachment,
    /// Any other category the backend accepts.
    Other(String),
}

impl BizType {
    /// Wire name of the category.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text2ImgStyle => "text2img_style",
            Self::AudioStyle => "audio_style",
            Self::SegmentMask => "segment_mask",
            Self::FaceSwap => "face_swap",
            Self::EditRole => "gcimg-editrole",
            Self::Cooperator => "cooperator",
            Self::Attachment => "attachment",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for BizType {
    fn from(name: &str) -> Self {
        match name {
            "text2img_style" => Self::Text2ImgStyle,
            "audio_style" => Self::AudioStyle,
            "segment_mask" => Self::SegmentMask,
            "face_swap" => Self::FaceSwap,
            "gcimg-editrole" => Self::EditRole,
            "cooperator" => Self::Cooperator,
            "attachment" => Self::Attachment,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::str::FromStr for BizType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl std::fmt::Display for BizType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for a presigned-URL request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignRequest {
    /// Business category.
    pub biz_type: BizType,
    /// Name of the file to store.
    pub filename: String,
    /// Owning task, when there is one.
    pub task_id: Option<String>,
}

impl PresignRequest {
    /// Create a request without a task id.
    #[must_use]
    pub fn new(biz_type: BizType, filename: impl Into<String>) -> Self {
        Self {
            biz_type,
            filename: filename.into(),
            task_id: None,
        }
    }

    /// Create an `attachment` request, as used for plain uploads.
    #[must_use]
    pub fn attachment(filename: impl Into<String>) -> Self {
        Self::new(BizType::Attachment, filename)
    }

    /// Attach the request to a task.
    #[must_use]
    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }
}

/// A presigned upload destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUpload {
    /// Storage path of the object.
    pub cos_path: String,
    /// URL the stored object can be viewed at.
    pub preview_url: String,
    /// Presigned URL to `PUT` the bytes to.
    pub upload_url: String,
}

#[derive(Debug, Deserialize)]
struct PresignEnvelope {
    code: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    msg: String,
    #[serde(default)]
    data: Option<PresignedUpload>,
}

/// File contents to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// MIME type sent as `content-type`.
    pub content_type: String,
    /// Raw bytes.
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Wrap bytes with an explicit MIME type.
    #[must_use]
    pub fn new(content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Wrap bytes, deriving the MIME type from a file name.
    #[must_use]
    pub fn for_filename(filename: &str, bytes: Vec<u8>) -> Self {
        Self::new(content_type_for(Path::new(filename)), bytes)
    }

    /// Read a file from disk, deriving the MIME type from its extension.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] if the file cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(content_type_for(path), bytes))
    }
}

fn content_type_for(path: &Path) -> &'static str {
    ImageFormat::from_path(path).map_or(OCTET_STREAM, ImageFormat::mime_type)
}

/// Build the presign URL, including exactly the non-empty parameters.
///
/// # Errors
///
/// Returns [`ClientError::InvalidUrl`] if `base` cannot carry a path.
pub fn presign_url(base: &Url, request: &PresignRequest) -> ClientResult<Url> {
    let mut url = endpoint(base, PRESIGN_PATH)?;
    {
        let mut query = url.query_pairs_mut();
        let params = [
            ("bizType", Some(request.biz_type.as_str())),
            ("filename", Some(request.filename.as_str())),
            ("taskId", request.task_id.as_deref()),
        ];
        for (name, value) in params {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                query.append_pair(name, value);
            }
        }
    }
    if url.query() == Some("") {
        url.set_query(None);
    }
    Ok(url)
}

/// Client for the backend's presign endpoint and the storage `PUT`.
#[derive(Clone)]
pub struct UploadClient {
    inner: Arc<InnerClient>,
}

struct InnerClient {
    http: Client,
    base: Url,
}

impl UploadClient {
    /// Create an upload client for the business backend at `backend_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the URL is malformed.
    /// Returns [`ClientError::Http`] if the HTTP client fails to build.
    pub fn new(backend_url: impl AsRef<str>) -> ClientResult<Self> {
        Self::with_http(backend_url, build_http(DEFAULT_USER_AGENT, None)?)
    }

    /// Create an upload client that reuses an existing HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the URL is malformed.
    pub fn with_http(backend_url: impl AsRef<str>, http: Client) -> ClientResult<Self> {
        let base = parse_base_url(backend_url.as_ref())?;
        Ok(Self {
            inner: Arc::new(InnerClient { http, base }),
        })
    }

    /// Ask the backend for a presigned upload destination.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Rejected`] with the server message when the
    /// envelope code is not 200, [`ClientError::Status`] on a non-2xx
    /// response, and transport or parse errors unchanged.
    pub async fn get_presigned_url(&self, request: &PresignRequest) -> ClientResult<PresignedUpload> {
        let url = presign_url(&self.inner.base, request)?;
        debug!(%url, "Requesting presigned upload URL");

        self.fetch_presigned(url).await.inspect_err(|e| {
            warn!(
                biz_type = %request.biz_type,
                filename = %request.filename,
                error = %e,
                "Failed to obtain presigned upload URL"
            );
        })
    }

    async fn fetch_presigned(&self, url: Url) -> ClientResult<PresignedUpload> {
        let response = self
            .inner
            .http
            .get(url)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;
        ensure_success(&response)?;

        let body = response.bytes().await?;
        let envelope: PresignEnvelope = serde_json::from_slice(&body)?;
        if envelope.code != SUCCESS_CODE {
            return Err(ClientError::Rejected {
                code: envelope.code,
                message: envelope.msg,
            });
        }
        envelope
            .data
            .ok_or_else(|| ClientError::UnexpectedResponse("presign response missing data".into()))
    }

    /// Upload a file as an `attachment`.
    ///
    /// # Errors
    ///
    /// See [`UploadClient::upload_file_with`].
    pub async fn upload_file(&self, filename: &str, file: UploadFile) -> ClientResult<PresignedUpload> {
        self.upload_file_with(&PresignRequest::attachment(filename), file)
            .await
    }

    /// Obtain a presigned destination for `request`, then `PUT` the bytes to it.
    ///
    /// The transfer is never attempted if the presign step fails.
    ///
    /// # Errors
    ///
    /// Returns any presign error, [`ClientError::InvalidUrl`] for a malformed
    /// upload URL, and [`ClientError::Status`] if storage rejects the transfer.
    pub async fn upload_file_with(
        &self,
        request: &PresignRequest,
        file: UploadFile,
    ) -> ClientResult<PresignedUpload> {
        let upload = self.get_presigned_url(request).await?;

        let upload_url = Url::parse(&upload.upload_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {e}", upload.upload_url)))?;
        let size = file.bytes.len();
        debug!(
            cos_path = %upload.cos_path,
            content_type = %file.content_type,
            size,
            "Uploading file to presigned URL"
        );

        if let Err(e) = self.transfer(upload_url, file).await {
            warn!(cos_path = %upload.cos_path, error = %e, "File upload failed");
            return Err(e);
        }

        info!(cos_path = %upload.cos_path, size, "File uploaded");
        Ok(upload)
    }

    async fn transfer(&self, upload_url: Url, file: UploadFile) -> ClientResult<()> {
        let response = self
            .inner
            .http
            .put(upload_url)
            .header(CONTENT_TYPE, file.content_type)
            .body(file.bytes)
            .send()
            .await?;
        ensure_success(&response)
    }
}
