//! Assistant configuration
//!
//! Defaults match the reference deployment (16kHz mono, 20ms frames, VAD
//! mode 2, 2.0s end-of-utterance silence, 1.5s answer silence). Every knob
//! can be overridden from the environment; `.env` is loaded by the binary
//! before `from_env` runs.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_SYSTEM_PROMPT: &str = "You are Confab's technical voice assistant. \
    Give concise, actionable answers with code snippets when helpful. \
    Keep it very brief and to the point.";

/// Configuration for one assistant session
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Sample rate in Hz (must be 8000, 16000, 32000, or 48000 for the VAD)
    pub sample_rate: u32,

    /// Frame duration in milliseconds (10, 20, or 30 — required by the VAD)
    pub frame_ms: u32,

    /// Capture channel count (downmixed to mono before classification)
    pub channels: u16,

    /// VAD aggressiveness (0 = most permissive, 3 = most restrictive)
    pub vad_mode: u8,

    /// Trailing silence that ends a normal utterance
    pub end_silence: Duration,

    /// Trailing silence that ends a yes/no continuation answer
    pub answer_silence: Duration,

    /// Directory for per-round artifacts (WAV, transcript, reply, speech)
    pub out_dir: PathBuf,

    /// System prompt sent with every chat completion
    pub system_prompt: String,

    /// Language hint for speech synthesis
    pub tts_lang: String,

    /// Hard timeout on the remote synthesis call
    pub synthesis_timeout: Duration,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            frame_ms: 20,
            channels: 1,
            vad_mode: 2,
            end_silence: Duration::from_millis(2000),
            answer_silence: Duration::from_millis(1500),
            out_dir: PathBuf::from("audio"),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            tts_lang: "en".to_string(),
            synthesis_timeout: Duration::from_secs(5),
        }
    }
}

impl AssistantConfig {
    /// Build a config from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            sample_rate: env_parse("VOICE_SAMPLE_RATE", defaults.sample_rate),
            frame_ms: env_parse("VOICE_FRAME_MS", defaults.frame_ms),
            channels: env_parse("VOICE_CHANNELS", defaults.channels),
            vad_mode: env_parse("VOICE_VAD_MODE", defaults.vad_mode),
            end_silence: Duration::from_secs_f64(env_parse(
                "VOICE_END_SILENCE_SECS",
                defaults.end_silence.as_secs_f64(),
            )),
            answer_silence: Duration::from_secs_f64(env_parse(
                "VOICE_ANSWER_SILENCE_SECS",
                defaults.answer_silence.as_secs_f64(),
            )),
            out_dir: std::env::var("VOICE_OUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.out_dir),
            system_prompt: std::env::var("VOICE_SYSTEM_PROMPT")
                .unwrap_or(defaults.system_prompt),
            tts_lang: std::env::var("TTS_LANG").unwrap_or(defaults.tts_lang),
            synthesis_timeout: Duration::from_secs_f64(env_parse(
                "TTS_TIMEOUT_SECS",
                defaults.synthesis_timeout.as_secs_f64(),
            )),
        }
    }

    /// Samples per frame at the configured rate.
    pub fn frame_len(&self) -> usize {
        (self.sample_rate as usize * self.frame_ms as usize) / 1000
    }
}

fn env_parse<T: FromStr + Copy>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
