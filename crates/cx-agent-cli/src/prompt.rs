use anyhow::Result;
use cx_agent::models::feedback::FeedbackScore;
use cx_agent::models::message::Message;

pub mod rustyline;

pub trait Prompt {
    /// Render a history entry. `number` is the 1-based position shown to the user.
    fn render(&mut self, message: &Message, number: usize);
    fn render_details(&mut self, number: usize, details: &str);
    fn notify(&mut self, text: &str);
    fn get_input(&mut self) -> Result<Input>;
    fn show_busy(&mut self);
    fn hide_busy(&self);
    fn close(&mut self);
    fn ready(&self) {
        println!("\nSigned in. Type a message, /help for commands or exit to quit.\n");
    }
}

pub struct Input {
    pub input_type: InputType,
    pub content: Option<String>, // Only set for messages
}

impl Input {
    pub fn message<S: Into<String>>(content: S) -> Self {
        Self {
            input_type: InputType::Message,
            content: Some(content.into()),
        }
    }

    pub fn of(input_type: InputType) -> Self {
        Self {
            input_type,
            content: None,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum InputType {
    AskAgain, // Ask the user for input again. Control flow command.
    Message,  // User sent a message
    Command(SlashCommand),
    Exit, // User wants to exit the session
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlashCommand {
    Help,
    New,
    Details(usize),
    Feedback {
        number: usize,
        score: FeedbackScore,
        comment: Option<String>,
    },
    Comment {
        number: usize,
        text: String,
    },
    Config,
    Set {
        key: SettingKey,
        value: String,
    },
    SignOut,
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    Model,
    AgentCore,
    Arn,
    Region,
    Token,
    User,
}

impl std::str::FromStr for SettingKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "model" => Ok(SettingKey::Model),
            "agentcore" => Ok(SettingKey::AgentCore),
            "arn" => Ok(SettingKey::Arn),
            "region" => Ok(SettingKey::Region),
            "token" => Ok(SettingKey::Token),
            "user" => Ok(SettingKey::User),
            other => Err(format!(
                "unknown setting '{}' (model, agentcore, arn, region, token, user)",
                other
            )),
        }
    }
}

pub const HELP: &str = "\
Available Commands:
  /help                          - Show this help message
  /new                           - Start a new conversation
  /details <n>                   - Toggle the metadata of message n
  /feedback <n> up|down [text]   - Rate reply n, with an optional comment
  /comment <n> <text>            - Draft a feedback comment for reply n
  /config                        - Show the current configuration
  /set <key> <value>             - Change model, agentcore, arn, region, token or user
  /signout                       - Sign out and end the session
  exit                           - Exit";

/// Turn one line typed by the user into an [`Input`].
pub fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case("exit") {
        return Input::of(InputType::Exit);
    }
    if trimmed.is_empty() {
        return Input::of(InputType::AskAgain);
    }
    match trimmed.strip_prefix('/') {
        Some(command) => Input::of(InputType::Command(parse_command(command))),
        None => Input::message(line),
    }
}

fn parse_number(raw: Option<&str>) -> Result<usize, String> {
    raw.and_then(|n| n.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .ok_or_else(|| "expected a message number starting at 1".to_string())
}

fn parse_command(command: &str) -> SlashCommand {
    let mut parts = command.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or_default().trim();

    let parsed = match name {
        "help" => Ok(SlashCommand::Help),
        "new" => Ok(SlashCommand::New),
        "config" => Ok(SlashCommand::Config),
        "signout" => Ok(SlashCommand::SignOut),
        "details" => parse_number(Some(rest)).map(SlashCommand::Details),
        "feedback" => {
            let mut args = rest.splitn(3, char::is_whitespace);
            parse_number(args.next()).and_then(|number| {
                let score = args
                    .next()
                    .ok_or_else(|| "expected up or down".to_string())?
                    .parse::<FeedbackScore>()?;
                let comment = args
                    .next()
                    .map(str::trim)
                    .filter(|comment| !comment.is_empty())
                    .map(String::from);
                Ok(SlashCommand::Feedback {
                    number,
                    score,
                    comment,
                })
            })
        }
        "comment" => {
            let mut args = rest.splitn(2, char::is_whitespace);
            parse_number(args.next()).map(|number| SlashCommand::Comment {
                number,
                text: args.next().unwrap_or_default().trim().to_string(),
            })
        }
        "set" => {
            let mut args = rest.splitn(2, char::is_whitespace);
            args.next()
                .unwrap_or_default()
                .parse::<SettingKey>()
                .map(|key| SlashCommand::Set {
                    key,
                    value: args.next().unwrap_or_default().trim().to_string(),
                })
        }
        other => Err(format!("Unknown command: /{}", other)),
    };

    parsed.unwrap_or_else(SlashCommand::Invalid)
}
