use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use cx_agent::models::feedback::{FeedbackData, FeedbackScore};
use cx_agent::settings::Settings;

mod commands;
mod logging;
mod prompt;
mod session;

use commands::session::build_session;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    chat: ChatArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

/// Overrides for the settings read from `CX_AGENT_*` environment variables.
#[derive(Args, Debug, Default)]
pub struct ChatArgs {
    /// Model identifier sent with every prompt
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Base URL of the conversation API
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Send prompts to the agent runtime when an ARN and token are available
    #[arg(long, global = true)]
    pub use_agent_core: bool,

    #[arg(long, global = true)]
    pub agent_runtime_arn: Option<String>,

    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Bearer token for the agent runtime
    #[arg(long, global = true)]
    pub auth_token: Option<String>,

    #[arg(long, global = true)]
    pub user_id: Option<String>,

    /// ID token for the conversation API (falls back to CX_AGENT_ID_TOKEN)
    #[arg(long, global = true)]
    pub id_token: Option<String>,

    /// Access token for the conversation API (falls back to CX_AGENT_ACCESS_TOKEN)
    #[arg(long, global = true)]
    pub access_token: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Start an interactive chat (default)
    Session,

    /// Send one message, print the reply and exit
    Run {
        #[arg(short, long)]
        text: String,
    },

    /// Rate an earlier reply
    Feedback {
        #[arg(long)]
        run_id: String,

        /// Conversation the reply belongs to
        #[arg(long)]
        session_id: String,

        /// helpful (up) or not-helpful (down)
        #[arg(long)]
        score: FeedbackScore,

        #[arg(long)]
        comment: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::setup_logging();

    let cli = Cli::parse();
    let settings = Settings::new()?;
    settings.log_summary();

    match cli.command {
        Some(Command::Run { text }) => {
            let mut session = build_session(&settings, &cli.chat).await?;
            session.headless_start(&text).await?;
        }
        Some(Command::Feedback {
            run_id,
            session_id,
            score,
            comment,
        }) => {
            let feedback = FeedbackData::new(run_id, session_id, score, comment);
            commands::feedback::execute(&settings, &cli.chat, feedback).await?;
        }
        Some(Command::Session) | None => {
            let mut session = build_session(&settings, &cli.chat).await?;
            session.start().await?;
        }
    }
    Ok(())
}
