use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Authentication required")]
    MissingAuthentication,

    #[error("HTTP error! status: {status}")]
    Http { status: u16, body: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid client configuration: {0}")]
    Configuration(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },

    #[error(transparent)]
    Other(#[from] config::ConfigError),
}

/// Map a dotted settings key like `chat.auth_token` to `CX_AGENT_CHAT__AUTH_TOKEN`.
pub fn to_env_var(field: &str) -> String {
    format!("CX_AGENT_{}", field.replace('.', "__").to_uppercase())
}
