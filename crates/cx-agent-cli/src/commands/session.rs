use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use cx_agent::auth::{AuthSession, AuthTokens, EnvSessionProvider, SessionProvider, StaticSessionProvider};
use cx_agent::chat::{ChatSession, ChatSettings};
use cx_agent::providers::factory::HttpClientFactory;
use cx_agent::settings::Settings;

use crate::prompt::rustyline::RustylinePrompt;
use crate::session::Session;
use crate::ChatArgs;

/// Everything a session needs except the terminal.
pub struct Backend {
    pub factory: Arc<HttpClientFactory>,
    pub sessions: Arc<dyn SessionProvider>,
    pub settings: ChatSettings,
}

pub async fn build_backend(settings: &Settings, args: &ChatArgs) -> Result<Backend> {
    let sessions = session_provider(args);
    let mut conversation = settings.conversation_config();
    if let Some(api_url) = &args.api_url {
        conversation.base_url = api_url.clone();
    }
    let factory = Arc::new(HttpClientFactory::new(conversation, Arc::clone(&sessions))?);

    let mut chat_settings = settings.chat_settings();
    apply_args(&mut chat_settings, args);
    if chat_settings.user_id.is_none() {
        let session = sessions.fetch_session().await?;
        chat_settings.user_id = Some(session.resolve_user_id());
    }
    tracing::debug!(settings = ?chat_settings, "chat settings resolved");

    Ok(Backend {
        factory,
        sessions,
        settings: chat_settings,
    })
}

pub async fn build_session(settings: &Settings, args: &ChatArgs) -> Result<Session<'static>> {
    let backend = build_backend(settings, args).await?;
    let prompt = RustylinePrompt::new(history_file())?;
    let chat = ChatSession::new(backend.settings, backend.factory);
    Ok(Session::new(chat, Box::new(prompt), backend.sessions))
}

fn history_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cx-agent").join("history.txt"))
}

/// Tokens given on the command line win over the environment.
fn session_provider(args: &ChatArgs) -> Arc<dyn SessionProvider> {
    match (&args.id_token, &args.access_token) {
        (Some(id_token), Some(access_token)) => {
            Arc::new(StaticSessionProvider::new(AuthSession {
                tokens: Some(AuthTokens::new(id_token.clone(), access_token.clone())),
                user_id: args.user_id.clone(),
                username: None,
            }))
        }
        (None, None) => Arc::new(EnvSessionProvider::from_process_env()),
        _ => {
            tracing::warn!("--id-token and --access-token must be given together, reading tokens from the environment");
            Arc::new(EnvSessionProvider::from_process_env())
        }
    }
}

fn apply_args(settings: &mut ChatSettings, args: &ChatArgs) {
    if let Some(model) = &args.model {
        settings.model = model.clone();
    }
    if args.use_agent_core {
        settings.use_agent_core = true;
    }
    if let Some(arn) = &args.agent_runtime_arn {
        settings.agent_runtime_arn = arn.clone();
    }
    if let Some(region) = &args.region {
        settings.region = region.clone();
    }
    if let Some(token) = &args.auth_token {
        settings.auth_token = token.clone();
    }
    if let Some(user_id) = args.user_id.as_ref().filter(|id| !id.trim().is_empty()) {
        settings.user_id = Some(user_id.clone());
    }
}
