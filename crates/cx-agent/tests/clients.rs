use std::sync::Arc;

use anyhow::Result;
use cx_agent::{
    auth::{AuthSession, AuthTokens, SessionProvider, StaticSessionProvider},
    chat::{ChatSession, ChatSettings, FeedbackOutcome, GENERIC_ERROR_MESSAGE},
    models::{feedback::FeedbackScore, message::Role},
    providers::{
        configs::ConversationClientConfig,
        factory::{select_client, ClientFactory, HttpClientFactory},
    },
};
use serde_json::json;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Generic harness driving a chat session through real HTTP clients
struct ChatTester {
    server: MockServer,
    sessions: Arc<StaticSessionProvider>,
}

impl ChatTester {
    async fn new() -> Self {
        Self {
            server: MockServer::start().await,
            sessions: Arc::new(StaticSessionProvider::new(AuthSession {
                tokens: Some(AuthTokens::new("id-token", "access-token")),
                user_id: Some("u-1".to_string()),
                username: None,
            })),
        }
    }

    fn factory(&self) -> Arc<HttpClientFactory> {
        let factory = HttpClientFactory::new(
            ConversationClientConfig::new(self.server.uri()),
            self.sessions.clone(),
        )
        .expect("http client");
        Arc::new(factory)
    }

    fn agent_core_settings(&self) -> ChatSettings {
        ChatSettings {
            use_agent_core: true,
            agent_runtime_arn: "arn:aws:bedrock-agentcore:us-east-1:1:runtime/cx".to_string(),
            auth_token: "runtime-token".to_string(),
            agent_core_endpoint: Some(self.server.uri()),
            ..Default::default()
        }
    }

    fn session(&self, settings: ChatSettings) -> ChatSession {
        ChatSession::new(settings, self.factory())
    }
}

#[tokio::test]
async fn test_rest_round_trip_and_feedback() -> Result<()> {
    let tester = ChatTester::new().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/invocations"))
        .and(header("X-Access-Token", "access-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": {
                "message": "Your refund was issued.",
                "metadata": {"message_id": "run-42"},
                "tools_used": ["refunds"]
            }
        })))
        .mount(&tester.server)
        .await;

    let mut session = tester.session(ChatSettings {
        user_id: Some("u-1".to_string()),
        ..Default::default()
    });

    let reply = session.submit("Did my refund go through?").await.unwrap();
    assert_eq!(reply.content, "Your refund was issued.");
    assert_eq!(reply.tools(), vec!["refunds"]);

    assert_eq!(
        session.submit_feedback(1, FeedbackScore::Helpful).await,
        FeedbackOutcome::Accepted
    );

    let requests = tester.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    let send: serde_json::Value = serde_json::from_slice(&requests[0].body)?;
    assert_eq!(send["input"]["user_id"], json!("u-1"));
    let feedback: serde_json::Value = serde_json::from_slice(&requests[1].body)?;
    assert_eq!(feedback["input"]["feedback"]["run_id"], json!("run-42"));
    assert_eq!(feedback["input"]["feedback"]["score"], json!(1.0));
    Ok(())
}

#[tokio::test]
async fn test_signed_out_rest_send_shows_generic_error() -> Result<()> {
    let tester = ChatTester::new().await;
    tester.sessions.sign_out().await?;

    let mut session = tester.session(ChatSettings::default());
    let reply = session.submit("hello").await.unwrap();

    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.content, GENERIC_ERROR_MESSAGE);
    assert!(reply.is_error());
    assert!(tester.server.received_requests().await.unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_agent_runtime_error_is_reported_in_band() -> Result<()> {
    let tester = ChatTester::new().await;

    Mock::given(method("POST"))
        .and(path_regex(r"^/runtimes/.+/invocations$"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&tester.server)
        .await;

    let mut session = tester.session(tester.agent_core_settings());
    let reply = session.submit("hello").await.unwrap();

    assert!(reply.is_error());
    assert!(reply.content.contains("500"));
    assert!(reply.content.contains("boom"));
    assert_eq!(session.messages().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_switching_backends_mid_conversation() -> Result<()> {
    let tester = ChatTester::new().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/invocations"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"output": {"message": "from rest"}})),
        )
        .mount(&tester.server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/runtimes/.+/invocations$"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"output": {"message": "from runtime"}})),
        )
        .mount(&tester.server)
        .await;

    let mut session = tester.session(ChatSettings::default());
    assert_eq!(session.submit("one").await.unwrap().content, "from rest");

    *session.settings_mut() = tester.agent_core_settings();
    assert_eq!(session.submit("two").await.unwrap().content, "from runtime");

    let requests = tester.server.received_requests().await.unwrap();
    let session_header = requests[1]
        .headers
        .get("X-Amzn-Bedrock-AgentCore-Runtime-Session-Id")
        .and_then(|value| value.to_str().ok());
    assert_eq!(session_header, session.conversation_id());
    Ok(())
}

#[tokio::test]
async fn test_factory_follows_selection() -> Result<()> {
    let tester = ChatTester::new().await;
    let factory = tester.factory();

    let client = factory.create(select_client(&tester.agent_core_settings()))?;
    assert_eq!(client.name(), "agent-runtime");

    let mut without_token = tester.agent_core_settings();
    without_token.auth_token.clear();
    let client = factory.create(select_client(&without_token))?;
    assert_eq!(client.name(), "conversation-api");
    Ok(())
}
