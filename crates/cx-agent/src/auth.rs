//! Seam between the chat client and whatever signs the user in.
//!
//! The REST client asks a [`SessionProvider`] for tokens on every call, so a
//! provider that refreshes credentials behind the scenes is picked up without
//! rebuilding the client.

use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use uuid::Uuid;

use crate::errors::ClientResult;

pub const ID_TOKEN_VAR: &str = "CX_AGENT_ID_TOKEN";
pub const ACCESS_TOKEN_VAR: &str = "CX_AGENT_ACCESS_TOKEN";
pub const USER_ID_VAR: &str = "CX_AGENT_USER_ID";
pub const USERNAME_VAR: &str = "CX_AGENT_USERNAME";

#[derive(Clone, PartialEq, Eq)]
pub struct AuthTokens {
    pub id_token: String,
    pub access_token: String,
}

impl AuthTokens {
    pub fn new<I: Into<String>, A: Into<String>>(id_token: I, access_token: A) -> Self {
        Self {
            id_token: id_token.into(),
            access_token: access_token.into(),
        }
    }
}

// Token material must never end up in logs.
impl std::fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTokens")
            .field("id_token", &"<redacted>")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSession {
    pub tokens: Option<AuthTokens>,
    pub user_id: Option<String>,
    pub username: Option<String>,
}

impl AuthSession {
    /// Both tokens, or `None` if either is missing or blank.
    pub fn bearer_tokens(&self) -> Option<&AuthTokens> {
        self.tokens
            .as_ref()
            .filter(|tokens| !tokens.id_token.is_empty() && !tokens.access_token.is_empty())
    }

    /// User id, then username, then a generated `user_xxxxxxxx`.
    pub fn resolve_user_id(&self) -> String {
        self.user_id
            .clone()
            .filter(|id| !id.is_empty())
            .or_else(|| self.username.clone().filter(|name| !name.is_empty()))
            .unwrap_or_else(|| {
                let id = Uuid::new_v4().to_string();
                format!("user_{}", &id[..8])
            })
    }
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn fetch_session(&self) -> ClientResult<AuthSession>;

    async fn sign_out(&self) -> ClientResult<()> {
        Ok(())
    }
}

/// A session handed over up front, e.g. from command line flags.
#[derive(Debug, Default)]
pub struct StaticSessionProvider {
    session: RwLock<AuthSession>,
}

impl StaticSessionProvider {
    pub fn new(session: AuthSession) -> Self {
        Self {
            session: RwLock::new(session),
        }
    }
}

#[async_trait]
impl SessionProvider for StaticSessionProvider {
    async fn fetch_session(&self) -> ClientResult<AuthSession> {
        Ok(self
            .session
            .read()
            .map(|session| session.clone())
            .unwrap_or_default())
    }

    async fn sign_out(&self) -> ClientResult<()> {
        if let Ok(mut session) = self.session.write() {
            session.tokens = None;
        }
        tracing::debug!("signed out, cached tokens cleared");
        Ok(())
    }
}

#[cfg_attr(test, automock)]
pub trait Environment: Send + Sync {
    fn get_var(&self, key: &str) -> Result<String, env::VarError>;
}

pub struct RealEnvironment;

impl Environment for RealEnvironment {
    fn get_var(&self, key: &str) -> Result<String, env::VarError> {
        env::var(key)
    }
}

/// Reads tokens from the process environment on every fetch.
///
/// After `sign_out` no tokens are handed out for the rest of the process.
pub struct EnvSessionProvider<E: Environment = RealEnvironment> {
    env: E,
    signed_out: AtomicBool,
}

impl EnvSessionProvider<RealEnvironment> {
    pub fn from_process_env() -> Self {
        Self::new(RealEnvironment)
    }
}

impl<E: Environment> EnvSessionProvider<E> {
    pub fn new(env: E) -> Self {
        Self {
            env,
            signed_out: AtomicBool::new(false),
        }
    }

    fn var(&self, key: &str) -> Option<String> {
        self.env
            .get_var(key)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

#[async_trait]
impl<E: Environment> SessionProvider for EnvSessionProvider<E> {
    async fn fetch_session(&self) -> ClientResult<AuthSession> {
        let tokens = if self.signed_out.load(Ordering::SeqCst) {
            None
        } else {
            match (self.var(ID_TOKEN_VAR), self.var(ACCESS_TOKEN_VAR)) {
                (Some(id_token), Some(access_token)) => Some(AuthTokens {
                    id_token,
                    access_token,
                }),
                _ => None,
            }
        };
        tracing::debug!(tokens_available = tokens.is_some(), "fetched session from environment");

        Ok(AuthSession {
            tokens,
            user_id: self.var(USER_ID_VAR),
            username: self.var(USERNAME_VAR),
        })
    }

    async fn sign_out(&self) -> ClientResult<()> {
        self.signed_out.store(true, Ordering::SeqCst);
        Ok(())
    }
}
