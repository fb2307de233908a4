use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::errors::{ClientError, ClientResult};
use crate::models::feedback::FeedbackData;
use crate::models::response::ApiResponse;
use crate::providers::base::{ChatClient, PromptRequest};
use crate::providers::factory::{ClientFactory, ClientSelection};

/// Everything the mock clients were asked to do, shared across instances.
#[derive(Default)]
pub struct MockLog {
    pub selections: Vec<ClientSelection>,
    pub requests: Vec<PromptRequest>,
    pub feedback: Vec<FeedbackData>,
}

/// A mock factory whose clients reply from a pre-configured queue.
///
/// `None` entries in the queue make the send fail with a missing-auth error.
#[derive(Clone, Default)]
pub struct MockClientFactory {
    replies: Arc<Mutex<Vec<Option<ApiResponse>>>>,
    feedback_accepted: bool,
    pub log: Arc<Mutex<MockLog>>,
}

impl MockClientFactory {
    pub fn new(replies: Vec<Option<ApiResponse>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies)),
            feedback_accepted: true,
            log: Arc::default(),
        }
    }

    pub fn rejecting_feedback(mut self) -> Self {
        self.feedback_accepted = false;
        self
    }
}

impl ClientFactory for MockClientFactory {
    fn create(&self, selection: ClientSelection) -> ClientResult<Box<dyn ChatClient>> {
        self.log.lock().unwrap().selections.push(selection);
        Ok(Box::new(MockClient {
            factory: self.clone(),
        }))
    }
}

struct MockClient {
    factory: MockClientFactory,
}

#[async_trait]
impl ChatClient for MockClient {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn send_message(&self, request: &PromptRequest) -> ClientResult<ApiResponse> {
        self.factory
            .log
            .lock()
            .unwrap()
            .requests
            .push(request.clone());
        let mut replies = self.factory.replies.lock().unwrap();
        if replies.is_empty() {
            return Ok(ApiResponse::success(""));
        }
        replies.remove(0).ok_or(ClientError::MissingAuthentication)
    }

    async fn submit_feedback(&self, feedback: &FeedbackData) -> bool {
        self.factory
            .log
            .lock()
            .unwrap()
            .feedback
            .push(feedback.clone());
        self.factory.feedback_accepted
    }
}
