use std::sync::Arc;

use reqwest::Client;

use super::agentcore::AgentCoreClient;
use super::base::ChatClient;
use super::configs::{AgentCoreClientConfig, ConversationClientConfig};
use super::conversation::ConversationClient;
use crate::auth::SessionProvider;
use crate::chat::ChatSettings;
use crate::errors::ClientResult;

/// Which backend the next send goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientSelection {
    Conversation,
    AgentCore(AgentCoreClientConfig),
}

/// The agent runtime is only used when it is enabled and both the runtime ARN
/// and the auth token are non-blank. Everything else goes to the REST API.
pub fn select_client(settings: &ChatSettings) -> ClientSelection {
    let arn = settings.agent_runtime_arn.trim();
    let token = settings.auth_token.trim();
    if settings.use_agent_core && !arn.is_empty() && !token.is_empty() {
        ClientSelection::AgentCore(
            AgentCoreClientConfig::new(
                settings.agent_runtime_arn.clone(),
                settings.region.clone(),
                Some(settings.auth_token.clone()),
            )
            .with_endpoint(settings.agent_core_endpoint.clone()),
        )
    } else {
        ClientSelection::Conversation
    }
}

pub trait ClientFactory: Send + Sync {
    fn create(&self, selection: ClientSelection) -> ClientResult<Box<dyn ChatClient>>;
}

/// Builds real HTTP clients for each selection over one shared connection pool.
pub struct HttpClientFactory {
    http: Client,
    conversation: ConversationClientConfig,
    sessions: Arc<dyn SessionProvider>,
}

impl HttpClientFactory {
    pub fn new(
        conversation: ConversationClientConfig,
        sessions: Arc<dyn SessionProvider>,
    ) -> ClientResult<Self> {
        Ok(Self {
            http: Client::builder().build()?,
            conversation,
            sessions,
        })
    }
}

impl ClientFactory for HttpClientFactory {
    fn create(&self, selection: ClientSelection) -> ClientResult<Box<dyn ChatClient>> {
        match selection {
            ClientSelection::Conversation => Ok(Box::new(ConversationClient::with_client(
                self.http.clone(),
                self.conversation.clone(),
                Arc::clone(&self.sessions),
            )?)),
            ClientSelection::AgentCore(config) => Ok(Box::new(AgentCoreClient::with_client(
                self.http.clone(),
                config,
            )?)),
        }
    }
}
