//! Chat completion: turn a transcript into an assistant reply.
//!
//! Single-turn only: each call carries the system prompt and one user
//! message. The assistant's conversational memory is the user's, not the
//! model's.

use crate::error::{VoiceError, VoiceResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

// OpenAI-compatible request/response
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

/// Backend that completes one user turn into a reply.
pub trait ChatBackend {
    fn complete(&self, system_prompt: &str, user_text: &str) -> VoiceResult<String>;
}

/// Production chat backend: OpenAI-compatible `/chat/completions`.
/// Uses `CHAT_API_URL`, `CHAT_API_KEY` (or OPENAI_API_KEY), `CHAT_MODEL`.
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    /// Base URL without trailing slash.
    pub base_url: String,
    /// Bearer API key.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    client: reqwest::blocking::Client,
}

impl OpenAiChat {
    /// Build from environment: CHAT_API_URL, CHAT_API_KEY (or OPENAI_API_KEY),
    /// CHAT_MODEL.
    pub fn from_env() -> VoiceResult<Self> {
        let base_url = std::env::var("CHAT_API_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let api_key = std::env::var("CHAT_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .map_err(|_| {
                VoiceError::Config("chat requires CHAT_API_KEY or OPENAI_API_KEY".to_string())
            })?;
        let model = std::env::var("CHAT_MODEL").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string());
        Self::new(base_url, api_key, model)
    }

    /// Create with explicit config.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> VoiceResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| VoiceError::Completion(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        })
    }
}

impl ChatBackend for OpenAiChat {
    fn complete(&self, system_prompt: &str, user_text: &str) -> VoiceResult<String> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_text.to_string(),
                },
            ],
            temperature: None,
        };
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| VoiceError::Completion(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().unwrap_or_default();
            return Err(VoiceError::Completion(format!(
                "chat API error {}: {}",
                status, body
            )));
        }
        let parsed: ChatResponse = res
            .json()
            .map_err(|e| VoiceError::Completion(e.to_string()))?;
        let reply = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| VoiceError::Completion("chat API returned no choices".to_string()))?;
        Ok(reply)
    }
}
