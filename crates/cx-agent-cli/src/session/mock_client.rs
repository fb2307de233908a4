use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use cx_agent::errors::{ClientError, ClientResult};
use cx_agent::models::feedback::FeedbackData;
use cx_agent::models::message::Message;
use cx_agent::models::response::ApiResponse;
use cx_agent::providers::base::{ChatClient, PromptRequest};
use cx_agent::providers::factory::{ClientFactory, ClientSelection};

use crate::prompt::{Input, InputType, Prompt};

// Mirrors the mock factory in the cx-agent crate, which is only compiled for
// that crate's own tests.

#[derive(Default)]
struct Calls {
    selections: Vec<ClientSelection>,
    requests: Vec<PromptRequest>,
    feedback: Vec<FeedbackData>,
}

/// Clients reply from a shared queue; a `None` entry fails the send.
#[derive(Clone, Default)]
pub struct MockClientFactory {
    replies: Arc<Mutex<VecDeque<Option<ApiResponse>>>>,
    calls: Arc<Mutex<Calls>>,
}

impl MockClientFactory {
    pub fn new(replies: Vec<Option<ApiResponse>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            calls: Arc::default(),
        }
    }

    pub fn selections(&self) -> Vec<ClientSelection> {
        self.calls.lock().unwrap().selections.clone()
    }

    pub fn requests(&self) -> Vec<PromptRequest> {
        self.calls.lock().unwrap().requests.clone()
    }

    pub fn feedback(&self) -> Vec<FeedbackData> {
        self.calls.lock().unwrap().feedback.clone()
    }
}

impl ClientFactory for MockClientFactory {
    fn create(&self, selection: ClientSelection) -> ClientResult<Box<dyn ChatClient>> {
        self.calls.lock().unwrap().selections.push(selection);
        Ok(Box::new(MockClient(self.clone())))
    }
}

struct MockClient(MockClientFactory);

#[async_trait]
impl ChatClient for MockClient {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn send_message(&self, request: &PromptRequest) -> ClientResult<ApiResponse> {
        self.0.calls.lock().unwrap().requests.push(request.clone());
        match self.0.replies.lock().unwrap().pop_front() {
            Some(Some(reply)) => Ok(reply),
            Some(None) => Err(ClientError::MissingAuthentication),
            None => Ok(ApiResponse::success("")),
        }
    }

    async fn submit_feedback(&self, feedback: &FeedbackData) -> bool {
        self.0.calls.lock().unwrap().feedback.push(feedback.clone());
        true
    }
}

#[derive(Clone, Debug, Default)]
pub struct PromptLog {
    pub rendered: Vec<(usize, String)>,
    pub details: Vec<(usize, String)>,
    pub notices: Vec<String>,
    pub closed: bool,
}

/// Feeds a fixed list of inputs, then exits.
#[derive(Clone, Default)]
pub struct ScriptedPrompt {
    inputs: Arc<Mutex<VecDeque<Input>>>,
    log: Arc<Mutex<PromptLog>>,
}

impl ScriptedPrompt {
    pub fn new(inputs: Vec<Input>) -> Self {
        Self {
            inputs: Arc::new(Mutex::new(inputs.into())),
            log: Arc::default(),
        }
    }

    pub fn log(&self) -> PromptLog {
        self.log.lock().unwrap().clone()
    }
}

impl Prompt for ScriptedPrompt {
    fn render(&mut self, message: &Message, number: usize) {
        self.log
            .lock()
            .unwrap()
            .rendered
            .push((number, message.content.clone()));
    }

    fn render_details(&mut self, number: usize, details: &str) {
        self.log
            .lock()
            .unwrap()
            .details
            .push((number, details.to_string()));
    }

    fn notify(&mut self, text: &str) {
        self.log.lock().unwrap().notices.push(text.to_string());
    }

    fn get_input(&mut self) -> Result<Input> {
        Ok(self
            .inputs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Input::of(InputType::Exit)))
    }

    fn show_busy(&mut self) {}

    fn hide_busy(&self) {}

    fn close(&mut self) {
        self.log.lock().unwrap().closed = true;
    }

    fn ready(&self) {}
}
