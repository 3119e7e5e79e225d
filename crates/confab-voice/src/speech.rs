//! Speech output: remote synthesis, local offline fallback, playback.
//!
//! `SpeechOutput::speak` tries the remote synthesizer first and plays the
//! returned audio; any remote failure (timeout, network, auth) falls back
//! to the local engine exactly once. The caller never sees a remote
//! failure; local-engine failures do propagate.

use crate::error::{VoiceError, VoiceResult};
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use std::io::Cursor;
use std::path::Path;
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Backend that turns text into audio bytes (WAV/MP3). Return an empty vec
/// to skip playback.
pub trait TtsBackend {
    fn synthesize(&self, text: &str, lang: &str) -> VoiceResult<Vec<u8>>;
}

/// Production TTS backend: OpenAI-compatible `/audio/speech`.
/// Uses `TTS_API_URL`, `TTS_API_KEY` (or OPENAI_API_KEY), `TTS_MODEL`,
/// `TTS_VOICE`. The request timeout is the configured synthesis timeout,
/// set on this backend's own client rather than any shared state.
#[derive(Debug, Clone)]
pub struct OpenAiTts {
    /// Base URL without trailing slash.
    pub base_url: String,
    /// Bearer API key.
    pub api_key: String,
    /// TTS model: tts-1 (fast) or tts-1-hd (higher quality).
    pub model: String,
    /// Voice id (alloy, echo, fable, onyx, nova, shimmer, etc.).
    pub voice: String,
    client: reqwest::blocking::Client,
}

impl OpenAiTts {
    /// Build from environment: TTS_API_URL, TTS_API_KEY (or OPENAI_API_KEY),
    /// TTS_MODEL, TTS_VOICE.
    pub fn from_env(timeout: Duration) -> VoiceResult<Self> {
        let base_url = std::env::var("TTS_API_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let api_key = std::env::var("TTS_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .map_err(|_| {
                VoiceError::Config("synthesis requires TTS_API_KEY or OPENAI_API_KEY".to_string())
            })?;
        let model = std::env::var("TTS_MODEL").unwrap_or_else(|_| "tts-1".to_string());
        let voice = std::env::var("TTS_VOICE").unwrap_or_else(|_| "alloy".to_string());
        Self::new(base_url, api_key, model, voice, timeout)
    }

    /// Create with explicit config.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        voice: impl Into<String>,
        timeout: Duration,
    ) -> VoiceResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VoiceError::Synthesis(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            voice: voice.into(),
            client,
        })
    }
}

impl TtsBackend for OpenAiTts {
    fn synthesize(&self, text: &str, _lang: &str) -> VoiceResult<Vec<u8>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/audio/speech", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.model,
            "input": text,
            "voice": self.voice,
        });
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    VoiceError::SynthesisTimeout(e.to_string())
                } else {
                    VoiceError::Synthesis(e.to_string())
                }
            })?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().unwrap_or_default();
            return Err(VoiceError::Synthesis(format!(
                "TTS API error {}: {}",
                status, body
            )));
        }
        let bytes = res.bytes().map_err(|e| VoiceError::Synthesis(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Synchronous offline speech engine, the fallback when remote synthesis
/// fails. A failure here is a real error, never swallowed.
pub trait LocalSpeech {
    fn say(&self, text: &str) -> VoiceResult<()>;
}

/// Local engine that shells out to a speech command (`espeak` by default,
/// override with `LOCAL_SPEECH_CMD`). Blocks until the command exits.
#[derive(Debug, Clone)]
pub struct CommandSpeech {
    command: String,
}

impl CommandSpeech {
    pub fn from_env() -> Self {
        Self {
            command: std::env::var("LOCAL_SPEECH_CMD").unwrap_or_else(|_| "espeak".to_string()),
        }
    }

    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl LocalSpeech for CommandSpeech {
    fn say(&self, text: &str) -> VoiceResult<()> {
        let status = Command::new(&self.command)
            .arg(text)
            .status()
            .map_err(|e| VoiceError::LocalSpeech(format!("{}: {}", self.command, e)))?;
        if !status.success() {
            return Err(VoiceError::LocalSpeech(format!(
                "{} exited with {}",
                self.command, status
            )));
        }
        Ok(())
    }
}

/// Blocking playback of synthesized audio. Observes the shutdown flag and
/// stops mid-playback with `Interrupted`.
pub trait Playback {
    fn play_blocking(&self, bytes: &[u8], shutdown: &AtomicBool) -> VoiceResult<()>;
}

/// Playback through the default output device via rodio. The output stream
/// handle is `!Send`; construct this on the thread that plays.
pub struct RodioPlayback {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl RodioPlayback {
    pub fn new() -> VoiceResult<Self> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| VoiceError::Playback(e.to_string()))?;
        Ok(Self {
            _stream: stream,
            handle,
        })
    }
}

impl Playback for RodioPlayback {
    fn play_blocking(&self, bytes: &[u8], shutdown: &AtomicBool) -> VoiceResult<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        let sink =
            Sink::try_new(&self.handle).map_err(|e| VoiceError::Playback(e.to_string()))?;
        let source = rodio::Decoder::new(Cursor::new(bytes.to_vec()))
            .map_err(|e| VoiceError::Playback(format!("decode failed: {}", e)))?;
        sink.append(source.convert_samples::<f32>());

        while !sink.empty() {
            if shutdown.load(Ordering::Relaxed) {
                sink.stop();
                return Err(VoiceError::Interrupted);
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        Ok(())
    }
}

/// Speaks replies: remote synthesis with artifact persistence, local
/// fallback on remote failure, blocking playback.
pub struct SpeechOutput {
    tts: Box<dyn TtsBackend>,
    local: Box<dyn LocalSpeech>,
    playback: Box<dyn Playback>,
    lang: String,
    shutdown: Arc<AtomicBool>,
}

impl SpeechOutput {
    pub fn new(
        tts: Box<dyn TtsBackend>,
        local: Box<dyn LocalSpeech>,
        playback: Box<dyn Playback>,
        lang: impl Into<String>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            tts,
            local,
            playback,
            lang: lang.into(),
            shutdown,
        }
    }

    /// Speak `text`, persisting the synthesized audio at `artifact_path`.
    /// Remote failure falls back to the local engine once; the partial
    /// artifact is removed first so a failed synthesis leaves nothing
    /// behind. Playback interruption propagates as `Interrupted`.
    pub fn speak(&self, text: &str, artifact_path: &Path) -> VoiceResult<()> {
        match self.tts.synthesize(text, &self.lang) {
            Ok(bytes) => {
                if bytes.is_empty() {
                    debug!("synthesis returned no audio, nothing to play");
                    return Ok(());
                }
                std::fs::write(artifact_path, &bytes)?;
                info!(artifact = %artifact_path.display(), bytes = bytes.len(), "speaking");
                self.playback.play_blocking(&bytes, &self.shutdown)
            }
            Err(err) => {
                if artifact_path.exists() {
                    let _ = std::fs::remove_file(artifact_path);
                }
                warn!("remote synthesis failed ({}), using local engine", err);
                self.local.say(text)
            }
        }
    }
}
