//! # Easel AIGC
//!
//! HTTP clients for the services behind the Easel canvas editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  getPresignedUrl   ┌──────────────────┐
//! │ UploadClient │ ─────────────────► │ Business backend │
//! │              │  PUT bytes         ├──────────────────┤
//! │              │ ─────────────────► │ Object storage   │
//! └──────────────┘                    └──────────────────┘
//! ┌──────────────┐  prompt / history  ┌──────────────────┐
//! │ AigcClient   │ ◄────────────────► │ AIGC service     │
//! └──────┬───────┘                    └──────────────────┘
//!        │ poll_task / spawn_task_poll
//!        ▼
//!   PollPolicy + cancellation
//! ```
//!
//! Both clients are cheap to clone and safe to share between tasks. No
//! operation retries on its own; callers decide via
//! [`ClientError::is_retryable`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod aigc;
pub mod config;
pub mod error;
pub mod poll;
pub mod task;
pub mod upload;

pub use aigc::{
    AigcClient, AspectRatio, ExifLabel, GenerateResponse, GeneratedImage, GenerationOutcome,
    GenerationRequest, GenerationRequestBuilder, ImageSize, PromptText, ReferenceOptions,
    MAX_REFERENCE_IMAGES, TASK_NAME,
};
pub use config::{ClientConfig, DEFAULT_USER_AGENT};
pub use error::{ClientError, ClientResult};
pub use poll::{poll_task, spawn_task_poll, PollHandle, PollPolicy};
pub use task::{TaskState, TaskStatusResponse};
pub use upload::{
    presign_url, BizType, PresignRequest, PresignedUpload, UploadClient, UploadFile,
};
