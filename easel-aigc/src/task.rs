//! AIGC task status snapshots.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::config::{null_as_default, SUCCESS_CODE};
use crate::error::{ClientError, ClientResult};

/// Lifecycle state of a generation task, encoded as `0..=3` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TaskState {
    /// Queued, not picked up yet (`0`).
    NotStarted,
    /// Being generated (`1`).
    InProgress,
    /// Finished with a result (`2`).
    Completed,
    /// Finished without a result (`3`).
    Failed,
}

impl TaskState {
    /// Whether no further transitions will happen.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl TryFrom<u8> for TaskState {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::NotStarted),
            1 => Ok(Self::InProgress),
            2 => Ok(Self::Completed),
            3 => Ok(Self::Failed),
            other => Err(format!("unknown task status {other}")),
        }
    }
}

impl From<TaskState> for u8 {
    fn from(state: TaskState) -> Self {
        match state {
            TaskState::NotStarted => 0,
            TaskState::InProgress => 1,
            TaskState::Completed => 2,
            TaskState::Failed => 3,
        }
    }
}

/// Current status of a generation task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusResponse {
    /// Caller-side task id.
    #[serde(default, deserialize_with = "null_as_default")]
    pub task_id: i64,
    /// Prompt id returned at submission.
    #[serde(default, deserialize_with = "null_as_default")]
    pub prompt_id: String,
    /// Lifecycle state.
    pub status: TaskState,
    /// Completion percentage, 0 to 100. Fractional values are rounded.
    #[serde(default, deserialize_with = "percent")]
    pub progress: u8,
    /// Tasks queued ahead of this one.
    #[serde(default, deserialize_with = "count")]
    pub pending_numbers: u32,
    /// Estimated processing time in seconds.
    #[serde(default, deserialize_with = "null_as_default")]
    pub predict_process_sec: f64,
    /// Failure reason when the task failed.
    #[serde(default)]
    pub failed_reason: Option<String>,
    /// Storage path of the result.
    #[serde(default)]
    pub cos_path: Option<String>,
    /// URL of the result image.
    #[serde(default)]
    pub preview_url: Option<String>,
}

impl TaskStatusResponse {
    /// Whether polling can stop.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Result image URL, once the task completed.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        match self.status {
            TaskState::Completed => self.preview_url.as_deref().filter(|url| !url.is_empty()),
            _ => None,
        }
    }

    /// Failure reason, once the task failed.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        match self.status {
            TaskState::Failed => Some(self.failed_reason.as_deref().unwrap_or("unknown failure")),
            _ => None,
        }
    }
}

/// Read a numeric percentage, rounded and clamped to `0..=100`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value: f64 = null_as_default(deserializer)?;
    Ok(if value.is_finite() {
        value.round().clamp(0.0, 100.0) as u8
    } else {
        0
    })
}

/// Read a numeric count, rounded and clamped to `u32`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value: f64 = null_as_default(deserializer)?;
    Ok(if value.is_finite() {
        value.round().clamp(0.0, f64::from(u32::MAX)) as u32
    } else {
        0
    })
}

/// Parse a history response, bare or wrapped in a `{code, message, data}` envelope.
pub(crate) fn parse_task_status(value: Value) -> ClientResult<TaskStatusResponse> {
    if let Some(data) = value.get("data").filter(|data| data.is_object()) {
        let code = value.get("code").and_then(Value::as_i64).unwrap_or(SUCCESS_CODE);
        if code != SUCCESS_CODE {
            let message = value
                .get("message")
                .or_else(|| value.get("msg"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Err(ClientError::Rejected { code, message });
        }
        return Ok(serde_json::from_value(data.clone())?);
    }

    if let Some(code) = value.get("code").and_then(Value::as_i64) {
        if code != SUCCESS_CODE && value.get("status").is_none() {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Err(ClientError::Rejected { code, message });
        }
    }

    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_codes() {
        assert_eq!(TaskState::try_from(2u8), Ok(TaskState::Completed));
        assert!(TaskState::try_from(4u8).is_err());
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::Failed.is_terminal());
        assert!(!TaskState::NotStarted.is_terminal());
        assert!(!TaskState::InProgress.is_terminal());
        assert_eq!(u8::from(TaskState::Failed), 3);
    }

    #[test]
    fn test_parse_bare_completed_status() {
        let status = parse_task_status(json!({
            "taskId": 7,
            "promptId": "p123",
            "status": 2,
            "progress": 100,
            "pendingNumbers": 0,
            "predictProcessSec": 12.5,
            "failedReason": "",
            "cosPath": "gen/p123.png",
            "previewUrl": "https://x/y.png"
        }))
        .expect("status");
        assert!(status.is_terminal());
        assert_eq!(status.image_url(), Some("https://x/y.png"));
        assert_eq!(status.failure(), None);
    }

    #[test]
    fn test_parse_enveloped_status() {
        let status = parse_task_status(json!({
            "code": 200,
            "message": "ok",
            "data": {"promptId": "p1", "status": 1, "progress": 40, "pendingNumbers": 2}
        }))
        .expect("status");
        assert_eq!(status.status, TaskState::InProgress);
        assert_eq!(status.progress, 40);
        assert_eq!(status.pending_numbers, 2);
        assert_eq!(status.image_url(), None);
    }

    #[test]
    fn test_parse_enveloped_rejection() {
        let err = parse_task_status(json!({
            "code": 404,
            "message": "prompt not found",
            "data": {}
        }))
        .unwrap_err();
        assert!(matches!(err, ClientError::Rejected { code: 404, .. }));
    }

    #[test]
    fn test_parse_bare_rejection_without_status() {
        let err = parse_task_status(json!({"code": 500, "message": "busy"})).unwrap_err();
        assert!(matches!(err, ClientError::Rejected { code: 500, .. }));
    }

    #[test]
    fn test_failed_status_reports_reason() {
        let status = parse_task_status(json!({
            "promptId": "p9",
            "status": 3,
            "failedReason": null
        }))
        .expect("status");
        assert_eq!(status.failure(), Some("unknown failure"));
        assert_eq!(status.image_url(), None);
    }

    #[test]
    fn test_fractional_progress_is_rounded() {
        let status = parse_task_status(json!({
            "promptId": "p",
            "status": 1,
            "progress": 42.5,
            "pendingNumbers": 2.0
        }))
        .expect("status");
        assert_eq!(status.progress, 43);
        assert_eq!(status.pending_numbers, 2);

        let over = parse_task_status(json!({"status": 1, "progress": 130.2, "pendingNumbers": -1}))
            .expect("status");
        assert_eq!(over.progress, 100);
        assert_eq!(over.pending_numbers, 0);
    }

    #[test]
    fn test_null_numeric_fields_default() {
        let status = parse_task_status(json!({
            "taskId": null,
            "promptId": null,
            "status": 0,
            "progress": null,
            "pendingNumbers": null,
            "predictProcessSec": null,
            "cosPath": null,
            "previewUrl": null
        }))
        .expect("status");
        assert_eq!(status.task_id, 0);
        assert_eq!(status.prompt_id, "");
        assert_eq!(status.progress, 0);
        assert_eq!(status.pending_numbers, 0);
        assert!(status.predict_process_sec.abs() < f64::EPSILON);
        assert_eq!(status.preview_url, None);
    }

    #[test]
    fn test_bare_snapshot_with_status_ignores_code() {
        // A body carrying `status` is a snapshot; its `code` is informational.
        let status = parse_task_status(json!({"code": 500, "message": "boom", "status": 1}))
            .expect("status");
        assert_eq!(status.status, TaskState::InProgress);
    }

    #[test]
    fn test_unknown_status_is_parse_error() {
        let err = parse_task_status(json!({"promptId": "p", "status": 9})).unwrap_err();
        assert!(matches!(err, ClientError::Json(_)));
    }
}
