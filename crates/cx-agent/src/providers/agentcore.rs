use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};

use super::base::{ChatClient, PromptRequest};
use super::configs::AgentCoreClientConfig;
use crate::errors::{ClientError, ClientResult};
use crate::models::feedback::FeedbackData;
use crate::models::response::{AgentRuntimeReply, ApiResponse};

pub const SESSION_ID_HEADER: &str = "X-Amzn-Bedrock-AgentCore-Runtime-Session-Id";

/// Client for a hosted agent runtime invoked directly by its ARN.
///
/// `send_message` never fails: HTTP and transport errors come back as an
/// [`ApiResponse`] with an error status and the details in the reply text.
pub struct AgentCoreClient {
    client: Client,
    config: AgentCoreClientConfig,
}

impl AgentCoreClient {
    pub fn new(config: AgentCoreClientConfig) -> ClientResult<Self> {
        Self::with_client(Client::builder().build()?, config)
    }

    pub fn with_client(client: Client, config: AgentCoreClientConfig) -> ClientResult<Self> {
        if config.runtime_arn.trim().is_empty() {
            return Err(ClientError::Configuration(
                "agent runtime ARN is empty".to_string(),
            ));
        }
        Ok(Self { client, config })
    }

    fn invocation(&self, session_id: &str, payload: &Value) -> RequestBuilder {
        let request = self
            .client
            .post(self.config.invocations_url())
            .header(SESSION_ID_HEADER, session_id)
            .json(payload);

        match &self.config.auth_token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn try_send(&self, request: &PromptRequest) -> ClientResult<ApiResponse> {
        let mut input = json!({
            "prompt": request.content,
            "conversation_id": request.conversation_id,
        });
        if let Some(user_id) = &request.user_id {
            input["user_id"] = json!(user_id);
        }

        let response = self
            .invocation(&request.conversation_id, &json!({ "input": input }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let reply: AgentRuntimeReply = response.json().await?;
            Ok(reply.into_response())
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Ok(ApiResponse::error(format!(
                "Error ({}): {}",
                status.as_u16(),
                error_text
            )))
        }
    }
}

#[async_trait]
impl ChatClient for AgentCoreClient {
    fn name(&self) -> &'static str {
        "agent-runtime"
    }

    async fn send_message(&self, request: &PromptRequest) -> ClientResult<ApiResponse> {
        Ok(self.try_send(request).await.unwrap_or_else(|e| {
            tracing::error!(error = %e, "agent runtime invocation failed");
            ApiResponse::error(format!("Error: {}", e))
        }))
    }

    async fn submit_feedback(&self, feedback: &FeedbackData) -> bool {
        let payload = json!({ "input": { "feedback": feedback } });
        match self.invocation(&feedback.session_id, &payload).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::error!(error = %e, "failed to submit feedback");
                false
            }
        }
    }
}
