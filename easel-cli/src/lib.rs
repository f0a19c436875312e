//! # Easel CLI
//!
//! Command-line host for the Easel asset model and AIGC clients.
//!
//! ## Usage
//!
//! ```bash
//! easel assets --demo
//! easel upload ./pose.png --biz-type face_swap --task-id 42
//! easel generate --task-id 42 --prompt "watercolor" --image https://cdn/ref.png --wait
//! easel status p-123
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `CliConfig` - Service endpoints resolved from flags and environment
//! - `run` - Executes one command and returns its JSON result

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use easel_aigc::{
    poll_task, AigcClient, AspectRatio, BizType, ClientConfig, GenerationOutcome,
    GenerationRequest, ImageSize, PollPolicy, PresignRequest, TaskStatusResponse, UploadClient,
    UploadFile,
};
use easel_core::AssetCatalog;
use serde_json::{json, Value};

/// Default AIGC service URL.
pub const DEFAULT_AIGC_URL: &str = "http://localhost:9890";

/// Default business backend URL.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8056";

/// Command-line arguments for easel.
#[derive(Debug, Clone, Parser)]
#[command(name = "easel")]
#[command(about = "Easel canvas assets and AIGC image generation")]
#[command(version)]
pub struct CliArgs {
    /// AIGC service base URL
    #[arg(long, env = "EASEL_AIGC_URL", default_value = DEFAULT_AIGC_URL, global = true)]
    pub aigc_url: String,

    /// Business backend base URL
    #[arg(long, env = "EASEL_BACKEND_URL", default_value = DEFAULT_BACKEND_URL, global = true)]
    pub backend_url: String,

    /// Per-request timeout in seconds (no timeout when unset)
    #[arg(long, env = "EASEL_TIMEOUT_SECS", global = true)]
    pub timeout_secs: Option<u64>,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Easel subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List the asset library (poses first, then images)
    Assets {
        /// Seed the library with demo poses and images
        #[arg(long)]
        demo: bool,
    },

    /// Upload a local file through a presigned URL
    Upload {
        /// File to upload
        path: PathBuf,
        /// Business category of the upload
        #[arg(long, default_value = "attachment")]
        biz_type: BizType,
        /// Owning task id
        #[arg(long)]
        task_id: Option<String>,
    },

    /// Request a presigned upload URL without uploading
    Presign {
        /// Name of the file to store
        filename: String,
        /// Business category of the upload
        #[arg(long, default_value = "attachment")]
        biz_type: BizType,
        /// Owning task id
        #[arg(long)]
        task_id: Option<String>,
    },

    /// Submit an image generation request
    Generate(GenerateArgs),

    /// Fetch the status of a queued generation task once
    Status {
        /// Prompt id returned by `generate`
        prompt_id: String,
    },

    /// Poll a queued generation task until it finishes
    Wait {
        /// Prompt id returned by `generate`
        prompt_id: String,
        /// Polling cadence
        #[command(flatten)]
        poll: PollArgs,
    },
}

/// Arguments for `easel generate`.
#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Caller-side task id
    #[arg(long)]
    pub task_id: i64,

    /// Prompt text
    #[arg(long)]
    pub prompt: String,

    /// Style (LoRA) identifier
    #[arg(long)]
    pub lora: Option<String>,

    /// Trigger prompt for the style
    #[arg(long)]
    pub trigger: Option<String>,

    /// Reference image URL (repeatable, at most 6)
    #[arg(long = "image")]
    pub images: Vec<String>,

    /// Output aspect ratio (1:1, 3:4, 4:3, 9:16, 16:9)
    #[arg(long, default_value = "1:1")]
    pub aspect_ratio: AspectRatio,

    /// Output resolution class (1K, 2K, 4K)
    #[arg(long, default_value = "1K")]
    pub size: ImageSize,

    /// Storage path for the result
    #[arg(long)]
    pub cos_path: Option<String>,

    /// Poll the queued task until it finishes
    #[arg(long)]
    pub wait: bool,

    /// Polling cadence when waiting
    #[command(flatten)]
    pub poll: PollArgs,
}

impl GenerateArgs {
    /// Build the generation request.
    ///
    /// # Errors
    ///
    /// Returns an error if more than six reference images are given.
    pub fn to_request(&self) -> anyhow::Result<GenerationRequest> {
        let mut builder = GenerationRequest::builder(self.task_id, self.prompt.clone())
            .reference_images(self.images.iter().cloned())
            .aspect_ratio(self.aspect_ratio)
            .image_size(self.size);
        if let Some(lora) = &self.lora {
            builder = builder.lora(lora.clone());
        }
        if let Some(trigger) = &self.trigger {
            builder = builder.trigger_prompt(trigger.clone());
        }
        if let Some(cos_path) = &self.cos_path {
            builder = builder.cos_path(cos_path.clone());
        }
        Ok(builder.build()?)
    }
}

/// Polling cadence flags.
#[derive(Debug, Clone, Copy, Args)]
pub struct PollArgs {
    /// Delay between status requests in milliseconds
    #[arg(long, default_value = "2000")]
    pub interval_ms: u64,

    /// Maximum number of status requests
    #[arg(long, default_value = "150")]
    pub max_attempts: u32,

    /// Multiply the delay by this factor after each request
    #[arg(long)]
    pub backoff: Option<f64>,

    /// Upper bound on the delay in milliseconds when backing off
    #[arg(long, default_value = "10000")]
    pub max_interval_ms: u64,
}

impl PollArgs {
    /// The poll policy these flags describe.
    #[must_use]
    pub fn policy(&self) -> PollPolicy {
        let policy = PollPolicy::new(self.max_attempts, Duration::from_millis(self.interval_ms));
        match self.backoff {
            Some(multiplier) => {
                policy.with_backoff(multiplier, Duration::from_millis(self.max_interval_ms))
            }
            None => policy,
        }
    }
}

/// Resolved service configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// AIGC service base URL.
    pub aigc_url: String,
    /// Business backend base URL.
    pub backend_url: String,
    /// Per-request timeout.
    pub request_timeout: Option<Duration>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CliConfig {
    /// Create a configuration pointing at the local development services.
    #[must_use]
    pub fn new() -> Self {
        Self {
            aigc_url: DEFAULT_AIGC_URL.to_string(),
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout: None,
        }
    }

    /// Client configuration for these endpoints.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::new(&self.aigc_url, &self.backend_url);
        match self.request_timeout {
            Some(timeout) => config.with_request_timeout(timeout),
            None => config,
        }
    }

    fn clients(&self) -> anyhow::Result<(AigcClient, UploadClient)> {
        self.client_config()
            .clients()
            .context("Failed to create service clients")
    }
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        Self {
            aigc_url: args.aigc_url.clone(),
            backend_url: args.backend_url.clone(),
            request_timeout: args.timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Run one command and return its result as JSON.
///
/// `cancel` resolving stops any task polling the command performs.
///
/// # Errors
///
/// Returns any client error with context describing the failed step.
pub async fn run<C>(command: Command, config: &CliConfig, cancel: C) -> anyhow::Result<Value>
where
    C: Future<Output = ()>,
{
    match command {
        Command::Assets { demo } => {
            let catalog = if demo {
                AssetCatalog::demo()
            } else {
                AssetCatalog::new()
            };
            let entries: Vec<_> = catalog.combined().collect();
            Ok(serde_json::to_value(entries)?)
        }
        Command::Upload {
            path,
            biz_type,
            task_id,
        } => {
            let (_, upload) = config.clients()?;
            let request = presign_request(biz_type, file_name(&path)?, task_id);
            let file = UploadFile::from_path(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let uploaded = upload
                .upload_file_with(&request, file)
                .await
                .with_context(|| format!("Failed to upload {}", path.display()))?;
            Ok(serde_json::to_value(uploaded)?)
        }
        Command::Presign {
            filename,
            biz_type,
            task_id,
        } => {
            let (_, upload) = config.clients()?;
            let request = presign_request(biz_type, filename, task_id);
            let presigned = upload
                .get_presigned_url(&request)
                .await
                .context("Failed to obtain presigned URL")?;
            Ok(serde_json::to_value(presigned)?)
        }
        Command::Generate(args) => {
            let (aigc, _) = config.clients()?;
            let request = args.to_request()?;
            let outcome = aigc
                .generate_image(&request)
                .await
                .context("Image generation request failed")?;

            match (&outcome, args.wait) {
                (GenerationOutcome::Queued { prompt_id }, true) => {
                    let status = wait(&aigc, prompt_id, &args.poll.policy(), cancel).await?;
                    Ok(json!({ "outcome": outcome, "status": status }))
                }
                _ => Ok(serde_json::to_value(outcome)?),
            }
        }
        Command::Status { prompt_id } => {
            let (aigc, _) = config.clients()?;
            let status = aigc
                .get_task_status(&prompt_id)
                .await
                .with_context(|| format!("Failed to fetch status of {prompt_id}"))?;
            Ok(serde_json::to_value(status)?)
        }
        Command::Wait { prompt_id, poll } => {
            let (aigc, _) = config.clients()?;
            let status = wait(&aigc, &prompt_id, &poll.policy(), cancel).await?;
            Ok(serde_json::to_value(status)?)
        }
    }
}

async fn wait<C>(
    aigc: &AigcClient,
    prompt_id: &str,
    policy: &PollPolicy,
    cancel: C,
) -> anyhow::Result<TaskStatusResponse>
where
    C: Future<Output = ()>,
{
    tracing::info!(
        prompt_id,
        max_attempts = policy.max_attempts,
        "Waiting for generation task"
    );
    poll_task(aigc, prompt_id, policy, cancel, |status| {
        tracing::info!(
            prompt_id = %status.prompt_id,
            progress = status.progress,
            pending = status.pending_numbers,
            "Task progress"
        );
    })
    .await
    .with_context(|| format!("Failed waiting for task {prompt_id}"))
}

fn presign_request(biz_type: BizType, filename: String, task_id: Option<String>) -> PresignRequest {
    let request = PresignRequest::new(biz_type, filename);
    match task_id {
        Some(task_id) => request.with_task_id(task_id),
        None => request,
    }
}

fn file_name(path: &Path) -> anyhow::Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow::anyhow!("{} has no file name", path.display()))
}
