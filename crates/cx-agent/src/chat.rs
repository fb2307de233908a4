//! In-memory state of one open chat: history, conversation id, busy flag and
//! the per-message feedback/detail toggles.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::models::feedback::{FeedbackData, FeedbackScore};
use crate::models::message::{Message, MessageMetadata, Role};
use crate::models::response::{ApiResponse, STATUS_ERROR, STATUS_SUCCESS};
use crate::providers::base::PromptRequest;
use crate::providers::configs::DEFAULT_REGION;
use crate::providers::factory::{select_client, ClientFactory};

pub const DEFAULT_MODEL: &str = "bedrock/us.anthropic.claude-3-7-sonnet-20250219-v1:0";
pub const GENERIC_ERROR_MESSAGE: &str =
    "Sorry, I encountered an error while processing your message. Please try again.";

/// User-editable configuration, read again on every send.
#[derive(Clone, PartialEq)]
pub struct ChatSettings {
    pub model: String,
    pub user_id: Option<String>,
    pub use_agent_core: bool,
    pub agent_runtime_arn: String,
    pub region: String,
    pub auth_token: String,
    pub agent_core_endpoint: Option<String>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            user_id: None,
            use_agent_core: false,
            agent_runtime_arn: String::new(),
            region: DEFAULT_REGION.to_string(),
            auth_token: String::new(),
            agent_core_endpoint: None,
        }
    }
}

impl std::fmt::Debug for ChatSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSettings")
            .field("model", &self.model)
            .field("user_id", &self.user_id)
            .field("use_agent_core", &self.use_agent_core)
            .field("agent_runtime_arn", &self.agent_runtime_arn)
            .field("region", &self.region)
            .field("auth_token_set", &!self.auth_token.trim().is_empty())
            .field("agent_core_endpoint", &self.agent_core_endpoint)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    Idle,
    AwaitingReply,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackDraft {
    pub show: bool,
    pub comment: String,
    pub submitted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackOutcome {
    Accepted,
    Rejected,
    /// Not an assistant message, no conversation yet, or feedback already given.
    NotApplicable,
}

pub struct ChatSession {
    conversation_id: Option<String>,
    messages: Vec<Message>,
    state: ChatState,
    feedback: HashMap<usize, FeedbackDraft>,
    details: HashMap<usize, bool>,
    settings: ChatSettings,
    factory: Arc<dyn ClientFactory>,
}

impl ChatSession {
    pub fn new(settings: ChatSettings, factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            conversation_id: None,
            messages: Vec::new(),
            state: ChatState::Idle,
            feedback: HashMap::new(),
            details: HashMap::new(),
            settings,
            factory,
        }
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn state(&self) -> ChatState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == ChatState::AwaitingReply
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ChatSettings {
        &mut self.settings
    }

    /// Send `input` and append the reply.
    ///
    /// Blank input, or input arriving while a reply is pending, is ignored and
    /// returns `None`. Otherwise exactly one user message and exactly one
    /// assistant message are appended, and the assistant message is returned.
    pub async fn submit(&mut self, input: &str) -> Option<&Message> {
        let content = input.trim();
        if content.is_empty() || self.is_loading() {
            return None;
        }

        let conversation_id = self
            .conversation_id
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();

        self.messages.push(Message::user(content));
        self.state = ChatState::AwaitingReply;

        let selection = select_client(&self.settings);
        tracing::debug!(?selection, conversation_id = %conversation_id, "sending message");

        let request = PromptRequest::new(&conversation_id, content, &self.settings.model)
            .with_user_id(self.settings.user_id.clone());

        let result = match self.factory.create(selection) {
            Ok(client) => client.send_message(&request).await,
            Err(e) => Err(e),
        };

        let reply = match result {
            Ok(response) => self.assistant_message(response),
            Err(e) => {
                tracing::error!(error = %e, "failed to send message");
                Message::assistant(GENERIC_ERROR_MESSAGE)
                    .with_metadata(MessageMetadata::with_status(STATUS_ERROR))
            }
        };

        self.messages.push(reply);
        self.state = ChatState::Idle;
        self.messages.last()
    }

    fn assistant_message(&self, response: ApiResponse) -> Message {
        let mut metadata = MessageMetadata {
            model: Some(self.settings.model.clone()),
            status: Some(
                response
                    .status
                    .clone()
                    .unwrap_or_else(|| STATUS_SUCCESS.to_string()),
            ),
            ..Default::default()
        };
        if !response.tools().is_empty() {
            metadata.tools_used = Some(response.tools().join(","));
        }
        if let Some(extra) = &response.metadata {
            metadata.merge(extra);
        }

        Message::assistant(response.text()).with_metadata(metadata)
    }

    /// Forget the conversation id and clear the visible history.
    pub fn new_conversation(&mut self) {
        self.conversation_id = None;
        self.messages.clear();
        self.feedback.clear();
        self.details.clear();
    }

    pub fn feedback_draft(&self, index: usize) -> Option<&FeedbackDraft> {
        self.feedback.get(&index)
    }

    /// Open or close the feedback panel of a message, keeping any comment.
    pub fn toggle_feedback(&mut self, index: usize) -> bool {
        let draft = self.feedback.entry(index).or_default();
        draft.show = !draft.show;
        draft.show
    }

    pub fn set_feedback_comment<S: Into<String>>(&mut self, index: usize, comment: S) {
        let draft = self.feedback.entry(index).or_default();
        draft.show = true;
        draft.comment = comment.into();
    }

    pub fn toggle_details(&mut self, index: usize) -> bool {
        let shown = self.details.entry(index).or_insert(false);
        *shown = !*shown;
        *shown
    }

    pub fn details_shown(&self, index: usize) -> bool {
        self.details.get(&index).copied().unwrap_or(false)
    }

    /// Submit feedback for the assistant message at `index` using the backend
    /// the current settings select.
    pub async fn submit_feedback(&mut self, index: usize, score: FeedbackScore) -> FeedbackOutcome {
        let Some(conversation_id) = self.conversation_id.clone() else {
            tracing::warn!("feedback ignored: no active conversation");
            return FeedbackOutcome::NotApplicable;
        };
        let Some(message) = self
            .messages
            .get(index)
            .filter(|message| message.role == Role::Assistant)
        else {
            tracing::warn!(index, "feedback ignored: not an assistant message");
            return FeedbackOutcome::NotApplicable;
        };
        if self
            .feedback
            .get(&index)
            .is_some_and(|draft| draft.submitted)
        {
            return FeedbackOutcome::NotApplicable;
        }

        let comment = self
            .feedback
            .get(&index)
            .map(|draft| draft.comment.clone())
            .filter(|comment| !comment.is_empty());
        let feedback = FeedbackData::new(message.message_id(), conversation_id, score, comment);

        let accepted = match self.factory.create(select_client(&self.settings)) {
            Ok(client) => client.submit_feedback(&feedback).await,
            Err(e) => {
                tracing::error!(error = %e, "failed to build client for feedback");
                false
            }
        };

        if accepted {
            self.feedback.insert(
                index,
                FeedbackDraft {
                    show: false,
                    comment: String::new(),
                    submitted: true,
                },
            );
            FeedbackOutcome::Accepted
        } else {
            FeedbackOutcome::Rejected
        }
    }
}
