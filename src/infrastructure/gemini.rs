// Gemini chat provider - generateContent REST call
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::providers::{ChatProvider, ProviderError};

const SYSTEM_INSTRUCTION: &str = "You are a helpful Air Quality and Health Assistant for Aura Quality app. Provide concise, accurate information about air quality and health impacts.";
pub const NO_REPLY_FALLBACK: &str = "Sorry, I could not process that.";

#[derive(Debug, Clone)]
pub struct GeminiChatProvider {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    system_instruction: Content<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiChatProvider {
    pub fn new(base_url: String, model: String, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key: api_key.filter(|k| !k.is_empty()),
            client: reqwest::Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self, api_key: &str) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url,
            self.model,
            urlencoding::encode(api_key)
        )
    }
}

fn prompt_text(prompt: &str, context: &str) -> String {
    format!("Context: {}\n\nUser question: {}", context, prompt)
}

fn first_text(response: GenerateResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .unwrap_or_else(|| NO_REPLY_FALLBACK.to_string())
}

#[async_trait]
impl ChatProvider for GeminiChatProvider {
    async fn ask(&self, prompt: &str, context: &str) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured("chat api key"))?;

        let text = prompt_text(prompt, context);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: &text }],
            }],
            system_instruction: Content {
                parts: vec![Part {
                    text: SYSTEM_INSTRUCTION,
                }],
            },
        };

        let response = self
            .client
            .post(self.endpoint(api_key))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(ProviderError::Network(format!(
                "chat provider returned status {}: {}",
                status, detail
            )));
        }

        let data = response.json::<GenerateResponse>().await?;
        Ok(first_text(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let text = prompt_text("Can I jog?", "AQI is 40");
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: &text }],
            }],
            system_instruction: Content {
                parts: vec![Part {
                    text: SYSTEM_INSTRUCTION,
                }],
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json["contents"][0]["parts"][0]["text"],
            "Context: AQI is 40\n\nUser question: Can I jog?"
        );
        assert!(json["systemInstruction"]["parts"][0]["text"].is_string());
    }

    #[test]
    fn test_reply_extraction() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Yes, air is clean."}]}}]}"#,
        )
        .unwrap();
        assert_eq!(first_text(response), "Yes, air is clean.");

        let empty: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert_eq!(first_text(empty), NO_REPLY_FALLBACK);
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let provider = GeminiChatProvider::new("http://localhost".into(), "m".into(), Some(String::new()));
        assert!(!provider.is_configured());
        let err = provider.ask("hi", "ctx").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }
}
