// Chat transcript domain model
use serde::Serialize;

use super::reading::Reading;

pub const CHAT_GREETING: &str = "Hello! I'm your air quality assistant. Ask me anything about the current conditions or health recommendations.";
pub const CHAT_APOLOGY: &str =
    "Sorry, I'm having trouble connecting right now. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
        }
    }
}

/// Context line handed to the chat provider alongside the user's question.
pub fn chat_context(reading: Option<&Reading>) -> String {
    match reading {
        Some(r) => format!(
            "The user is currently viewing data for {}. Current AQI is {} ({}) with {} as the primary pollutant.",
            r.location.name, r.current.aqi, r.current.category, r.current.primary_pollutant
        ),
        None => "The user has not selected a location yet.".to_string(),
    }
}
