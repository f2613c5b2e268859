//! HTTP-backed task client

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;

use crate::error::LlmError;
use crate::execution::{RequestContext, classify_error_response};
use crate::polling::TaskClient;
use crate::standards::TaskFamily;
use crate::types::TaskState;

/// `TaskClient` over a vendor task API: POST to submit, GET to poll.
#[derive(Debug, Clone)]
pub struct HttpTaskClient {
    client: Client,
    context: RequestContext,
    family: TaskFamily,
    submit_path: String,
    poll_path: String,
}

impl HttpTaskClient {
    pub fn new(
        client: Client,
        context: RequestContext,
        family: TaskFamily,
        submit_path: impl Into<String>,
    ) -> Self {
        Self {
            client,
            context,
            family,
            submit_path: submit_path.into(),
            poll_path: family.default_poll_path().to_string(),
        }
    }

    /// Override the poll path template; `{id}` is replaced by the task id.
    pub fn with_poll_path(mut self, template: impl Into<String>) -> Self {
        self.poll_path = template.into();
        self
    }

    pub fn family(&self) -> TaskFamily {
        self.family
    }

    fn poll_path_for(&self, task_id: &str) -> String {
        self.poll_path.replace("{id}", task_id)
    }

    async fn send_json(&self, request: RequestBuilder) -> Result<Value, LlmError> {
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(classify_error_response(response).await);
        }
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            LlmError::ParseError(format!("task response is not JSON: {e}"))
        })
    }
}

#[async_trait]
impl TaskClient for HttpTaskClient {
    async fn submit(&self, request: &Value) -> Result<TaskState, LlmError> {
        let builder = self
            .context
            .build(&self.client, Method::POST, &self.submit_path)?
            .json(request);
        let document = self.send_json(builder).await?;
        let id = self.family.submit_id(&document)?;
        self.family.parse(&document, &id)
    }

    async fn poll(&self, task_id: &str) -> Result<TaskState, LlmError> {
        let path = self.poll_path_for(task_id);
        let builder = self.context.build(&self.client, Method::GET, &path)?;
        let document = self.send_json(builder).await?;
        self.family.parse(&document, task_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standards::ProviderFamily;

    #[test]
    fn poll_path_templates_the_task_id() {
        let ctx = RequestContext::new(ProviderFamily::OpenAiChat, "https://api.minimax.io/v1");
        let client = HttpTaskClient::new(
            Client::new(),
            ctx,
            TaskFamily::MiniMaxVideo,
            "video_generation",
        );
        assert_eq!(
            client.poll_path_for("123"),
            "query/video_generation?task_id=123"
        );
        let client = client.with_poll_path("tasks/{id}/status");
        assert_eq!(client.poll_path_for("abc"), "tasks/abc/status");
    }
}
