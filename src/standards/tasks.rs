//! Long-running task documents.
//!
//! Vendors answer image/video/speech jobs with "accepted, check back later". Each
//! family names its job id and status differently; `TaskFamily` maps both the submit
//! response and every poll response onto `TaskState`.

use serde_json::Value;

use super::{error_message, str_at};
use crate::error::LlmError;
use crate::types::TaskState;

/// Static identifier of a task-document shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskFamily {
    /// `google.longrunning.Operation`: `name`, `done`, `error`, `response`.
    GeminiOperation,
    /// OpenAI video jobs: `id`, `status`, `error`.
    OpenAiVideo,
    /// MiniMax video tasks: `task_id`, `status`, `file_id`, `base_resp`.
    MiniMaxVideo,
}

impl TaskFamily {
    /// Poll path template relative to the base URL; `{id}` is replaced by the task id.
    pub fn default_poll_path(self) -> &'static str {
        match self {
            TaskFamily::GeminiOperation => "{id}",
            TaskFamily::OpenAiVideo => "videos/{id}",
            TaskFamily::MiniMaxVideo => "query/video_generation?task_id={id}",
        }
    }

    /// Extract the task id from a submit response.
    pub fn submit_id(self, document: &Value) -> Result<String, LlmError> {
        if self == TaskFamily::MiniMaxVideo {
            check_base_resp(document)?;
        }
        let key = match self {
            TaskFamily::GeminiOperation => "name",
            TaskFamily::OpenAiVideo => "id",
            TaskFamily::MiniMaxVideo => "task_id",
        };
        str_at(document, key)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                LlmError::ParseError(format!("submit response has no `{key}`: {document}"))
            })
    }

    /// Map a status document onto `TaskState`. `fallback_id` is used when the
    /// document does not repeat the id.
    pub fn parse(self, document: &Value, fallback_id: &str) -> Result<TaskState, LlmError> {
        if !document.is_object() {
            return Err(LlmError::ParseError(format!(
                "task status document is not an object: {document}"
            )));
        }
        let state = match self {
            TaskFamily::GeminiOperation => parse_gemini_operation(document, fallback_id),
            TaskFamily::OpenAiVideo => parse_openai_video(document, fallback_id),
            TaskFamily::MiniMaxVideo => parse_minimax_video(document, fallback_id),
        };
        tracing::debug!(family = ?self, id = %state.id, status = %state.status, "parsed task status");
        Ok(state)
    }
}

fn id_or(document: &Value, key: &str, fallback: &str) -> String {
    str_at(document, key)
        .filter(|id| !id.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

fn parse_gemini_operation(document: &Value, fallback_id: &str) -> TaskState {
    let id = id_or(document, "name", fallback_id);
    let done = document.get("done").and_then(Value::as_bool).unwrap_or(false);
    if !done {
        return TaskState::running(id);
    }
    match document.get("error").filter(|e| !e.is_null()) {
        Some(error) => TaskState::failed(id, error_message(error)),
        None => TaskState::succeeded(
            id,
            document.get("response").cloned().unwrap_or(Value::Null),
        ),
    }
}

fn parse_openai_video(document: &Value, fallback_id: &str) -> TaskState {
    let id = id_or(document, "id", fallback_id);
    match str_at(document, "status").unwrap_or_default() {
        "queued" => TaskState::pending(id),
        "completed" => TaskState::succeeded(id, document.clone()),
        "failed" | "cancelled" => {
            let reason = document
                .get("error")
                .filter(|e| !e.is_null())
                .map(error_message)
                .unwrap_or_else(|| "video generation failed".to_string());
            TaskState::failed(id, reason)
        }
        // in_progress and statuses added later
        _ => TaskState::running(id),
    }
}

fn parse_minimax_video(document: &Value, fallback_id: &str) -> TaskState {
    let id = id_or(document, "task_id", fallback_id);
    if let Err(e) = check_base_resp(document) {
        return TaskState::failed(id, e.to_string());
    }
    match str_at(document, "status").unwrap_or_default() {
        "Preparing" | "Queueing" => TaskState::pending(id),
        "Success" => TaskState::succeeded(id, document.clone()),
        "Fail" => TaskState::failed(id, "video generation failed"),
        _ => TaskState::running(id),
    }
}

fn check_base_resp(document: &Value) -> Result<(), LlmError> {
    let Some(base) = document.get("base_resp") else {
        return Ok(());
    };
    let code = base.get("status_code").and_then(Value::as_i64).unwrap_or(0);
    if code == 0 {
        return Ok(());
    }
    Err(LlmError::ApiError {
        code: 400,
        message: str_at(base, "status_msg")
            .unwrap_or("request rejected")
            .to_string(),
        details: Some(base.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskStatus;
    use serde_json::json;

    #[test]
    fn gemini_operation_lifecycle() {
        let family = TaskFamily::GeminiOperation;
        let running = family
            .parse(&json!({"name": "models/veo/operations/op1"}), "x")
            .expect("parse");
        assert_eq!(running.status, TaskStatus::Running);
        assert_eq!(running.id, "models/veo/operations/op1");

        let done = family
            .parse(
                &json!({"name": "op1", "done": true, "response": {"generatedVideos": []}}),
                "x",
            )
            .expect("parse");
        assert_eq!(done.status, TaskStatus::Succeeded);
        assert_eq!(done.result, Some(json!({"generatedVideos": []})));

        let failed = family
            .parse(
                &json!({"name": "op1", "done": true, "error": {"code": 3, "message": "bad prompt"}}),
                "x",
            )
            .expect("parse");
        assert_eq!(failed.status, TaskStatus::Failed);
        assert_eq!(failed.failure_reason.as_deref(), Some("bad prompt"));
    }

    #[test]
    fn openai_video_statuses() {
        let family = TaskFamily::OpenAiVideo;
        let parse = |status: &str| {
            family
                .parse(&json!({"id": "video_1", "status": status}), "x")
                .expect("parse")
                .status
        };
        assert_eq!(parse("queued"), TaskStatus::Pending);
        assert_eq!(parse("in_progress"), TaskStatus::Running);
        assert_eq!(parse("completed"), TaskStatus::Succeeded);
        assert_eq!(parse("failed"), TaskStatus::Failed);
    }

    #[test]
    fn minimax_base_resp_error_fails_the_task() {
        let family = TaskFamily::MiniMaxVideo;
        let state = family
            .parse(
                &json!({"task_id": "t1", "status": "Processing",
                        "base_resp": {"status_code": 1004, "status_msg": "auth failed"}}),
                "x",
            )
            .expect("parse");
        assert_eq!(state.status, TaskStatus::Failed);
        assert!(state.failure_reason.unwrap_or_default().contains("auth failed"));

        let ok = family
            .parse(
                &json!({"status": "Success", "file_id": "f1", "base_resp": {"status_code": 0}}),
                "t1",
            )
            .expect("parse");
        assert_eq!(ok.id, "t1");
        assert_eq!(ok.status, TaskStatus::Succeeded);
    }

    #[test]
    fn submit_id_per_family() {
        assert_eq!(
            TaskFamily::OpenAiVideo
                .submit_id(&json!({"id": "video_1", "status": "queued"}))
                .expect("id"),
            "video_1"
        );
        assert!(matches!(
            TaskFamily::MiniMaxVideo.submit_id(&json!({"base_resp": {"status_code": 2013, "status_msg": "invalid params"}})),
            Err(LlmError::ApiError { .. })
        ));
        assert!(matches!(
            TaskFamily::GeminiOperation.submit_id(&json!({})),
            Err(LlmError::ParseError(_))
        ));
    }

    #[test]
    fn non_object_documents_are_rejected() {
        assert!(TaskFamily::OpenAiVideo.parse(&json!("queued"), "x").is_err());
    }
}
