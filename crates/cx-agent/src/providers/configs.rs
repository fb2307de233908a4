pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_REGION: &str = "us-east-1";
pub const AGENT_RUNTIME_QUALIFIER: &str = "DEFAULT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationClientConfig {
    pub base_url: String,
}

impl Default for ConversationClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

impl ConversationClientConfig {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn invocations_url(&self) -> String {
        format!("{}/api/v1/invocations", self.base_url.trim_end_matches('/'))
    }

    pub fn conversation_url(&self, conversation_id: &str) -> String {
        format!(
            "{}/api/v1/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(conversation_id)
        )
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct AgentCoreClientConfig {
    pub runtime_arn: String,
    pub region: String,
    pub auth_token: Option<String>,
    /// Replaces `https://bedrock-agentcore.{region}.amazonaws.com` when set.
    pub endpoint: Option<String>,
}

impl AgentCoreClientConfig {
    pub fn new<A: Into<String>, R: Into<String>>(
        runtime_arn: A,
        region: R,
        auth_token: Option<String>,
    ) -> Self {
        Self {
            runtime_arn: runtime_arn.into(),
            region: region.into(),
            auth_token: auth_token.filter(|token| !token.trim().is_empty()),
            endpoint: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.endpoint = endpoint.filter(|endpoint| !endpoint.trim().is_empty());
        self
    }

    pub fn host(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://bedrock-agentcore.{}.amazonaws.com", self.region),
        }
    }

    pub fn invocations_url(&self) -> String {
        format!(
            "{}/runtimes/{}/invocations?qualifier={}",
            self.host(),
            urlencoding::encode(&self.runtime_arn),
            AGENT_RUNTIME_QUALIFIER
        )
    }
}

impl std::fmt::Debug for AgentCoreClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentCoreClientConfig")
            .field("runtime_arn", &self.runtime_arn)
            .field("region", &self.region)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
