use std::sync::Arc;

use anyhow::Result;
use cx_agent::auth::SessionProvider;
use cx_agent::chat::{ChatSession, ChatSettings, FeedbackOutcome};
use cx_agent::models::message::Role;
use cx_agent::providers::factory::{select_client, ClientSelection};

use crate::prompt::{InputType, Prompt, SettingKey, SlashCommand, HELP};

#[cfg(test)]
mod mock_client;

pub struct Session<'a> {
    chat: ChatSession,
    prompt: Box<dyn Prompt + 'a>,
    sessions: Arc<dyn SessionProvider>,
}

impl<'a> Session<'a> {
    pub fn new(
        chat: ChatSession,
        prompt: Box<impl Prompt + 'a>,
        sessions: Arc<dyn SessionProvider>,
    ) -> Self {
        Session {
            chat,
            prompt,
            sessions,
        }
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    pub async fn start(&mut self) -> Result<()> {
        self.prompt.ready();

        loop {
            let input = self.prompt.get_input()?;
            match input.input_type {
                InputType::Message => {
                    if let Some(content) = &input.content {
                        self.send(content).await;
                    }
                }
                InputType::Command(command) => {
                    if !self.handle_command(command).await {
                        break;
                    }
                }
                InputType::Exit => break,
                InputType::AskAgain => continue,
            }
        }
        self.prompt.close();
        Ok(())
    }

    /// Send a single message, print the reply and exit.
    pub async fn headless_start(&mut self, text: &str) -> Result<()> {
        self.send(text).await;
        self.prompt.close();
        match self.chat.messages().last() {
            Some(reply) if reply.is_error() => Err(anyhow::anyhow!("the agent reported an error")),
            Some(_) => Ok(()),
            None => Err(anyhow::anyhow!("nothing to send")),
        }
    }

    async fn send(&mut self, content: &str) {
        self.prompt.show_busy();
        let replied = self.chat.submit(content).await.is_some();
        self.prompt.hide_busy();

        if replied {
            let messages = self.chat.messages();
            if let Some(reply) = messages.last() {
                self.prompt.render(reply, messages.len());
            }
        }
    }

    /// Returns false when the session should end.
    async fn handle_command(&mut self, command: SlashCommand) -> bool {
        match command {
            SlashCommand::Help => self.prompt.notify(HELP),
            SlashCommand::New => {
                self.chat.new_conversation();
                self.prompt.notify("Started a new conversation.");
            }
            SlashCommand::Details(number) => self.toggle_details(number),
            SlashCommand::Comment { number, text } => {
                if self.assistant_index(number).is_some() {
                    self.chat.set_feedback_comment(number - 1, text);
                    self.prompt
                        .notify(&format!("Comment saved for message {}.", number));
                }
            }
            SlashCommand::Feedback {
                number,
                score,
                comment,
            } => {
                let Some(index) = self.assistant_index(number) else {
                    return true;
                };
                if let Some(comment) = comment {
                    self.chat.set_feedback_comment(index, comment);
                }
                let notice = match self.chat.submit_feedback(index, score).await {
                    FeedbackOutcome::Accepted => "Thank you for your feedback!",
                    FeedbackOutcome::Rejected => "Could not submit feedback, please try again.",
                    FeedbackOutcome::NotApplicable => {
                        "Feedback was already submitted for this message."
                    }
                };
                self.prompt.notify(notice);
            }
            SlashCommand::Config => {
                let summary = describe_settings(self.chat.settings());
                self.prompt.notify(&summary);
            }
            SlashCommand::Set { key, value } => {
                match apply_setting(self.chat.settings_mut(), key, &value) {
                    Ok(()) => {
                        let summary = describe_settings(self.chat.settings());
                        self.prompt.notify(&summary);
                    }
                    Err(e) => self.prompt.notify(&e),
                }
            }
            SlashCommand::SignOut => {
                if let Err(e) = self.sessions.sign_out().await {
                    tracing::error!(error = %e, "sign out failed");
                }
                self.chat.new_conversation();
                self.prompt.notify("Signed out.");
                return false;
            }
            SlashCommand::Invalid(reason) => self
                .prompt
                .notify(&format!("{}. Type /help for commands.", reason)),
        }
        true
    }

    fn toggle_details(&mut self, number: usize) {
        if number > self.chat.messages().len() {
            self.prompt.notify(&format!("No message {}.", number));
            return;
        }
        let index = number - 1;
        if self.chat.toggle_details(index) {
            let details = self.chat.messages()[index].details();
            self.prompt.render_details(number, &details);
        } else {
            self.prompt
                .notify(&format!("Details of message {} hidden.", number));
        }
    }

    /// Zero-based index of the assistant message shown as `number`.
    fn assistant_index(&mut self, number: usize) -> Option<usize> {
        let index = number.checked_sub(1)?;
        let is_assistant = self
            .chat
            .messages()
            .get(index)
            .is_some_and(|message| message.role == Role::Assistant);
        if !is_assistant {
            self.prompt
                .notify(&format!("Message {} is not a reply from the agent.", number));
            return None;
        }
        Some(index)
    }
}

fn apply_setting(settings: &mut ChatSettings, key: SettingKey, value: &str) -> Result<(), String> {
    let value = value.trim();
    match key {
        SettingKey::Model => {
            if value.is_empty() {
                return Err("model cannot be empty".to_string());
            }
            settings.model = value.to_string();
        }
        SettingKey::AgentCore => {
            settings.use_agent_core = match value.to_lowercase().as_str() {
                "on" | "true" | "yes" | "1" => true,
                "off" | "false" | "no" | "0" => false,
                other => return Err(format!("expected on or off, got '{}'", other)),
            };
        }
        SettingKey::Arn => settings.agent_runtime_arn = value.to_string(),
        SettingKey::Region => settings.region = value.to_string(),
        SettingKey::Token => settings.auth_token = value.to_string(),
        SettingKey::User => {
            settings.user_id = Some(value.to_string()).filter(|id| !id.is_empty());
        }
    }
    Ok(())
}

fn describe_settings(settings: &ChatSettings) -> String {
    let backend = match select_client(settings) {
        ClientSelection::Conversation => "conversation API".to_string(),
        ClientSelection::AgentCore(config) => format!("agent runtime ({})", config.host()),
    };
    let token = if settings.auth_token.trim().is_empty() {
        "not set"
    } else {
        "set"
    };
    format!(
        "Backend:    {}\nModel:      {}\nUser:       {}\nAgentCore:  {}\nRuntime:    {}\nRegion:     {}\nToken:      {}",
        backend,
        settings.model,
        settings.user_id.as_deref().unwrap_or("-"),
        if settings.use_agent_core { "on" } else { "off" },
        if settings.agent_runtime_arn.is_empty() {
            "-"
        } else {
            settings.agent_runtime_arn.as_str()
        },
        settings.region,
        token,
    )
}
