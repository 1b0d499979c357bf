// Chat service - Stateless assistant questions outside a session
use crate::application::providers::ChatProvider;
use crate::domain::chat::chat_context;
use anyhow::Context;
use std::sync::Arc;

#[derive(Clone)]
pub struct ChatService {
    provider: Arc<dyn ChatProvider>,
}

impl ChatService {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self { provider }
    }

    /// `context` is passed through verbatim; callers without one get the
    /// generic no-reading context.
    pub async fn ask(&self, message: &str, context: Option<&str>) -> anyhow::Result<String> {
        let context = match context.filter(|c| !c.trim().is_empty()) {
            Some(context) => context.to_string(),
            None => chat_context(None),
        };
        self.provider
            .ask(message, &context)
            .await
            .context("Chat provider failed")
    }
}
