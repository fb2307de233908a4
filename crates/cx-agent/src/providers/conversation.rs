use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::{json, Value};

use super::base::{ChatClient, PromptRequest};
use super::configs::ConversationClientConfig;
use crate::auth::{AuthTokens, SessionProvider};
use crate::errors::{ClientError, ClientResult};
use crate::models::feedback::FeedbackData;
use crate::models::response::{ApiResponse, UpstreamReply};

pub const ACCESS_TOKEN_HEADER: &str = "X-Access-Token";

/// Client for the REST conversation API fronting the agent.
pub struct ConversationClient {
    client: Client,
    config: ConversationClientConfig,
    sessions: Arc<dyn SessionProvider>,
}

impl ConversationClient {
    pub fn new(
        config: ConversationClientConfig,
        sessions: Arc<dyn SessionProvider>,
    ) -> ClientResult<Self> {
        Self::with_client(Client::builder().build()?, config, sessions)
    }

    /// Reuse an existing connection pool.
    pub fn with_client(
        client: Client,
        config: ConversationClientConfig,
        sessions: Arc<dyn SessionProvider>,
    ) -> ClientResult<Self> {
        if config.base_url.trim().is_empty() {
            return Err(ClientError::Configuration(
                "conversation API base URL is empty".to_string(),
            ));
        }
        Ok(Self {
            client,
            config,
            sessions,
        })
    }

    async fn tokens(&self) -> ClientResult<AuthTokens> {
        let session = self.sessions.fetch_session().await?;
        let tokens = session.bearer_tokens().cloned();
        tracing::debug!(tokens_available = tokens.is_some(), "resolved auth session");
        tokens.ok_or(ClientError::MissingAuthentication)
    }

    async fn post_invocation(&self, input: Value) -> ClientResult<Response> {
        let tokens = self.tokens().await?;
        let response = self
            .client
            .post(self.config.invocations_url())
            .header("Authorization", format!("Bearer {}", tokens.id_token))
            .header(ACCESS_TOKEN_HEADER, tokens.access_token)
            .json(&json!({ "input": input }))
            .send()
            .await?;
        Ok(response)
    }

    async fn try_send(&self, request: &PromptRequest) -> ClientResult<ApiResponse> {
        let response = self.post_invocation(serde_json::to_value(request)?).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let reply: UpstreamReply = response.json().await?;
        Ok(reply.normalize())
    }

    async fn try_submit_feedback(&self, feedback: &FeedbackData) -> ClientResult<bool> {
        let response = self
            .post_invocation(json!({ "feedback": feedback }))
            .await?;
        Ok(response.status().is_success())
    }

    /// Fetch a stored conversation. The endpoint takes no credentials.
    pub async fn get_conversation(&self, conversation_id: &str) -> ClientResult<Value> {
        let response = self
            .client
            .get(self.config.conversation_url(conversation_id))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ChatClient for ConversationClient {
    fn name(&self) -> &'static str {
        "conversation-api"
    }

    async fn send_message(&self, request: &PromptRequest) -> ClientResult<ApiResponse> {
        self.try_send(request).await.map_err(|e| {
            tracing::error!(error = %e, "failed to send message");
            e
        })
    }

    async fn submit_feedback(&self, feedback: &FeedbackData) -> bool {
        match self.try_submit_feedback(feedback).await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::error!(error = %e, "failed to submit feedback");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthSession, StaticSessionProvider};
    use crate::models::feedback::FeedbackScore;
    use anyhow::Result;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn signed_in() -> Arc<dyn SessionProvider> {
        Arc::new(StaticSessionProvider::new(AuthSession {
            tokens: Some(AuthTokens::new("id-token", "access-token")),
            user_id: None,
            username: None,
        }))
    }

    fn signed_out() -> Arc<dyn SessionProvider> {
        Arc::new(StaticSessionProvider::default())
    }

    fn client(server: &MockServer, sessions: Arc<dyn SessionProvider>) -> ConversationClient {
        ConversationClient::new(ConversationClientConfig::new(server.uri()), sessions).unwrap()
    }

    #[tokio::test]
    async fn test_send_message_unwraps_output() -> Result<()> {
        let mock_server = MockServer::start().await;

        let expected_request_body = json!({
            "input": {
                "prompt": "Where is my order?",
                "conversation_id": "conv-1",
                "model": "model-a",
                "user_id": "u-1"
            }
        });

        Mock::given(method("POST"))
            .and(path("/api/v1/invocations"))
            .and(header("Authorization", "Bearer id-token"))
            .and(header("X-Access-Token", "access-token"))
            .and(body_json(expected_request_body))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "output": {"message": "hi", "metadata": {"a": 1}, "tools_used": ["x"]}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let request = PromptRequest::new("conv-1", "Where is my order?", "model-a")
            .with_user_id(Some("u-1".to_string()));
        let response = client(&mock_server, signed_in())
            .send_message(&request)
            .await?;

        assert_eq!(
            serde_json::to_value(&response)?,
            json!({"response": "hi", "metadata": {"a": 1}, "tools_used": ["x"]})
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_send_message_returns_raw_body() -> Result<()> {
        let mock_server = MockServer::start().await;
        let body = json!({"response": "plain", "status": "success", "trace": "t-1"});

        Mock::given(method("POST"))
            .and(path("/api/v1/invocations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .mount(&mock_server)
            .await;

        let response = client(&mock_server, signed_in())
            .send_message(&PromptRequest::new("conv-1", "hi", "model-a"))
            .await?;

        assert_eq!(serde_json::to_value(&response)?, body);
        Ok(())
    }

    #[tokio::test]
    async fn test_send_message_without_tokens_makes_no_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let result = client(&mock_server, signed_out())
            .send_message(&PromptRequest::new("conv-1", "hi", "model-a"))
            .await;

        assert!(matches!(result, Err(ClientError::MissingAuthentication)));
    }

    #[tokio::test]
    async fn test_send_message_http_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/invocations"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&mock_server)
            .await;

        let result = client(&mock_server, signed_in())
            .send_message(&PromptRequest::new("conv-1", "hi", "model-a"))
            .await;

        match result {
            Err(ClientError::Http { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "unavailable");
            }
            other => panic!("Expected HTTP error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_feedback() -> Result<()> {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/invocations"))
            .and(header("Authorization", "Bearer id-token"))
            .and(body_json(json!({
                "input": {
                    "feedback": {
                        "run_id": "run-1",
                        "session_id": "conv-1",
                        "score": 1.0,
                        "comment": "great"
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let feedback = FeedbackData::new(
            "run-1",
            "conv-1",
            FeedbackScore::Helpful,
            Some("great".to_string()),
        );
        assert!(
            client(&mock_server, signed_in())
                .submit_feedback(&feedback)
                .await
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_submit_feedback_failures_are_swallowed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let feedback = FeedbackData::new("run-1", "conv-1", FeedbackScore::NotHelpful, None);
        assert!(
            !client(&mock_server, signed_in())
                .submit_feedback(&feedback)
                .await
        );
        assert!(
            !client(&mock_server, signed_out())
                .submit_feedback(&feedback)
                .await
        );
    }

    #[tokio::test]
    async fn test_get_conversation() -> Result<()> {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/conv-1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"conversation_id": "conv-1"})),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = client(&mock_server, signed_out());
        let conversation = client.get_conversation("conv-1").await?;
        assert_eq!(conversation["conversation_id"], json!("conv-1"));

        let missing = client.get_conversation("missing").await;
        assert!(matches!(missing, Err(ClientError::Http { status: 404, .. })));
        Ok(())
    }
}
