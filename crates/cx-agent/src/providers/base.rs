use async_trait::async_trait;
use serde::Serialize;

use crate::errors::ClientResult;
use crate::models::feedback::FeedbackData;
use crate::models::response::ApiResponse;

/// One chat prompt bound for a backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptRequest {
    #[serde(rename = "prompt")]
    pub content: String,
    pub conversation_id: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<FeedbackData>,
}

impl PromptRequest {
    pub fn new<C: Into<String>, S: Into<String>, M: Into<String>>(
        conversation_id: C,
        content: S,
        model: M,
    ) -> Self {
        Self {
            content: content.into(),
            conversation_id: conversation_id.into(),
            model: model.into(),
            user_id: None,
            feedback: None,
        }
    }

    pub fn with_user_id(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id.filter(|id| !id.is_empty());
        self
    }

    pub fn with_feedback(mut self, feedback: FeedbackData) -> Self {
        self.feedback = Some(feedback);
        self
    }
}

/// A backend the chat view can talk to (conversation API, agent runtime, ...)
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Short name for diagnostics.
    fn name(&self) -> &'static str;

    /// Send a prompt and return the normalized reply.
    ///
    /// An `Err` means the send failed outright; backends that report failures
    /// in-band return `Ok` with an error status instead.
    async fn send_message(&self, request: &PromptRequest) -> ClientResult<ApiResponse>;

    /// Submit a feedback score. Failures are logged and reported as `false`.
    async fn submit_feedback(&self, feedback: &FeedbackData) -> bool;
}
