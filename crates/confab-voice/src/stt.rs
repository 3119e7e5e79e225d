//! Speech-to-Text: convert a recorded utterance into text.
//!
//! Implement `TranscriptionBackend` for any transcription service; the
//! production backend posts WAV bytes to an OpenAI-compatible
//! `/audio/transcriptions` endpoint.

use crate::error::{VoiceError, VoiceResult};
use crate::recorder::Utterance;
use crate::wav;
use std::time::Duration;

/// Backend for converting an utterance to text. An empty string means
/// nothing intelligible was heard.
pub trait TranscriptionBackend {
    fn transcribe(&self, utterance: &Utterance) -> VoiceResult<String>;
}

/// Production transcription backend: OpenAI-compatible API (OpenAI Whisper,
/// OpenRouter, a local faster-whisper server, etc.).
/// Uses `STT_API_URL` (e.g. https://api.openai.com/v1), `STT_API_KEY`, and
/// `STT_MODEL` (default whisper-1).
#[derive(Debug, Clone)]
pub struct OpenAiTranscriber {
    /// Base URL without trailing slash.
    pub base_url: String,
    /// Bearer API key.
    pub api_key: String,
    /// Model: whisper-1, gpt-4o-transcribe, etc.
    pub model: String,
    client: reqwest::blocking::Client,
}

impl OpenAiTranscriber {
    /// Build from environment: STT_API_URL, STT_API_KEY (or OPENAI_API_KEY),
    /// STT_MODEL.
    pub fn from_env() -> VoiceResult<Self> {
        let base_url = std::env::var("STT_API_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let api_key = std::env::var("STT_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .map_err(|_| {
                VoiceError::Config("transcription requires STT_API_KEY or OPENAI_API_KEY".to_string())
            })?;
        let model = std::env::var("STT_MODEL").unwrap_or_else(|_| "whisper-1".to_string());
        Self::new(base_url, api_key, model)
    }

    /// Create with explicit config.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> VoiceResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| VoiceError::Transcription(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        })
    }
}

impl TranscriptionBackend for OpenAiTranscriber {
    fn transcribe(&self, utterance: &Utterance) -> VoiceResult<String> {
        if utterance.samples.is_empty() {
            return Ok(String::new());
        }
        let wav_bytes = wav::encode_wav(&utterance.samples, utterance.sample_rate)?;
        let url = format!("{}/audio/transcriptions", self.base_url.trim_end_matches('/'));
        let part = reqwest::blocking::multipart::Part::bytes(wav_bytes)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| VoiceError::Transcription(e.to_string()))?;
        let form = reqwest::blocking::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone());
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .map_err(|e| VoiceError::Transcription(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().unwrap_or_default();
            return Err(VoiceError::Transcription(format!(
                "transcription API error {}: {}",
                status, body
            )));
        }
        let json: serde_json::Value = res
            .json()
            .map_err(|e| VoiceError::Transcription(e.to_string()))?;
        let text = json
            .get("text")
            .and_then(|t| t.as_str())
            .unwrap_or("")
            .trim()
            .to_string();
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_utterance_transcribes_to_empty_string() {
        let stt = OpenAiTranscriber::new("https://example.invalid/v1", "key", "whisper-1").unwrap();
        let utterance = Utterance {
            samples: vec![],
            sample_rate: 16000,
        };
        // No network call is made for empty audio.
        assert_eq!(stt.transcribe(&utterance).unwrap(), "");
    }
}
