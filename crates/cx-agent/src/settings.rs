use config::{Config, Environment};
use serde::Deserialize;

use crate::chat::{ChatSettings, DEFAULT_MODEL};
use crate::errors::{to_env_var, SettingsError};
use crate::providers::configs::{ConversationClientConfig, DEFAULT_API_BASE_URL, DEFAULT_REGION};

#[derive(Debug, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Identity settings. The pool identifiers belong to the sign-in provider and
/// are carried through untouched; tokens come from a [`SessionProvider`].
///
/// [`SessionProvider`]: crate::auth::SessionProvider
#[derive(Debug, Default, Deserialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub user_pool_id: Option<String>,
    #[serde(default)]
    pub user_pool_client_id: Option<String>,
    #[serde(default)]
    pub identity_pool_id: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
}

#[derive(Deserialize)]
pub struct ChatDefaults {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub use_agent_core: bool,
    #[serde(default)]
    pub agent_runtime_arn: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub auth_token: String,
    #[serde(default)]
    pub agent_core_endpoint: Option<String>,
}

impl Default for ChatDefaults {
    fn default() -> Self {
        Self {
            model: default_model(),
            use_agent_core: false,
            agent_runtime_arn: String::new(),
            region: default_region(),
            auth_token: String::new(),
            agent_core_endpoint: None,
        }
    }
}

impl std::fmt::Debug for ChatDefaults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatDefaults")
            .field("model", &self.model)
            .field("use_agent_core", &self.use_agent_core)
            .field("agent_runtime_arn", &self.agent_runtime_arn)
            .field("region", &self.region)
            .field("auth_token_set", &!self.auth_token.is_empty())
            .field("agent_core_endpoint", &self.agent_core_endpoint)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub chat: ChatDefaults,
}

impl Settings {
    pub fn new() -> Result<Self, SettingsError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, SettingsError> {
        let config = Config::builder()
            .set_default("api.base_url", default_base_url())?
            .set_default("auth.region", default_region())?
            .set_default("chat.model", default_model())?
            .set_default("chat.region", default_region())?
            .add_source(
                Environment::with_prefix("CX_AGENT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Self = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.api.base_url.trim().is_empty() {
            return Err(SettingsError::MissingEnvVar {
                env_var: to_env_var("api.base_url"),
            });
        }
        Ok(())
    }

    pub fn conversation_config(&self) -> ConversationClientConfig {
        ConversationClientConfig::new(self.api.base_url.clone())
    }

    pub fn chat_settings(&self) -> ChatSettings {
        ChatSettings {
            model: self.chat.model.clone(),
            user_id: None,
            use_agent_core: self.chat.use_agent_core,
            agent_runtime_arn: self.chat.agent_runtime_arn.clone(),
            region: self.chat.region.clone(),
            auth_token: self.chat.auth_token.clone(),
            agent_core_endpoint: self.chat.agent_core_endpoint.clone(),
        }
    }

    /// Emit the effective configuration at debug level. Secrets are reported
    /// only as present or absent.
    pub fn log_summary(&self) {
        tracing::debug!(
            api_base_url = %self.api.base_url,
            auth_region = %self.auth.region,
            user_pool_configured = self.auth.user_pool_id.is_some(),
            identity_pool_configured = self.auth.identity_pool_id.is_some(),
            model = %self.chat.model,
            use_agent_core = self.chat.use_agent_core,
            agent_runtime_configured = !self.chat.agent_runtime_arn.is_empty(),
            agent_token_set = !self.chat.auth_token.is_empty(),
            "loaded settings"
        );
    }
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
